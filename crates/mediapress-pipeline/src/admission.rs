//! Admission gate: bounds the number of concurrently in-flight ingestions.
//!
//! `acquire` is non-blocking; at capacity the caller gets an immediate
//! rejection, not a queue slot. A periodic sweep reaps slots that were never
//! released (a crashed request upstream of `release`), bounding leakage.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use mediapress_core::{AppError, Clock};
use uuid::Uuid;

/// One reservation for an in-flight ingestion.
#[derive(Clone, Copy, Debug)]
pub struct AdmissionSlot {
    id: Uuid,
    acquired_at: Instant,
}

impl AdmissionSlot {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn acquired_at(&self) -> Instant {
        self.acquired_at
    }
}

pub struct AdmissionGate {
    capacity: usize,
    stale_after: Duration,
    clock: Arc<dyn Clock>,
    // Single-writer discipline: every mutation goes through this one mutex.
    slots: Mutex<HashMap<Uuid, Instant>>,
}

impl AdmissionGate {
    pub fn new(capacity: usize, stale_after: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            capacity: capacity.max(1),
            stale_after,
            clock,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Reserve a slot, or reject immediately when at capacity.
    pub fn acquire(&self) -> Result<AdmissionSlot, AppError> {
        let now = self.clock.now();
        let mut slots = self.slots.lock().expect("admission slot table poisoned");
        if slots.len() >= self.capacity {
            tracing::warn!(
                capacity = self.capacity,
                in_flight = slots.len(),
                "Admission gate at capacity, rejecting upload"
            );
            return Err(AppError::TooManyConcurrentUploads);
        }
        let slot = AdmissionSlot {
            id: Uuid::new_v4(),
            acquired_at: now,
        };
        slots.insert(slot.id, slot.acquired_at);
        tracing::debug!(slot_id = %slot.id, in_flight = slots.len(), "Admission slot acquired");
        Ok(slot)
    }

    /// Release a slot. Releasing an already-reaped slot is a no-op.
    pub fn release(&self, slot: &AdmissionSlot) {
        let mut slots = self.slots.lock().expect("admission slot table poisoned");
        if slots.remove(&slot.id).is_some() {
            tracing::debug!(slot_id = %slot.id, in_flight = slots.len(), "Admission slot released");
        }
    }

    /// Remove slots older than the stale threshold. Returns the reaped count.
    pub fn sweep_stale(&self) -> usize {
        let now = self.clock.now();
        let mut slots = self.slots.lock().expect("admission slot table poisoned");
        let before = slots.len();
        slots.retain(|_, acquired_at| now.duration_since(*acquired_at) <= self.stale_after);
        let reaped = before - slots.len();
        if reaped > 0 {
            tracing::warn!(reaped, "Reaped stale admission slots");
        }
        reaped
    }

    pub fn in_flight(&self) -> usize {
        self.slots.lock().expect("admission slot table poisoned").len()
    }
}

/// RAII wrapper releasing its slot on drop, so every orchestrator exit path
/// gives the slot back without explicit bookkeeping.
pub struct SlotGuard {
    gate: Arc<AdmissionGate>,
    slot: AdmissionSlot,
}

impl SlotGuard {
    pub fn try_acquire(gate: &Arc<AdmissionGate>) -> Result<Self, AppError> {
        let slot = gate.acquire()?;
        Ok(Self {
            gate: gate.clone(),
            slot,
        })
    }

    pub fn slot(&self) -> &AdmissionSlot {
        &self.slot
    }
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.gate.release(&self.slot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediapress_core::{ManualClock, SystemClock};

    fn gate_with_clock(capacity: usize, clock: Arc<dyn Clock>) -> Arc<AdmissionGate> {
        Arc::new(AdmissionGate::new(
            capacity,
            Duration::from_secs(300),
            clock,
        ))
    }

    #[test]
    fn capacity_is_enforced() {
        let gate = gate_with_clock(2, Arc::new(SystemClock));
        let a = gate.acquire().unwrap();
        let _b = gate.acquire().unwrap();
        // The (capacity+1)-th concurrent acquire is a definitive rejection.
        assert!(matches!(
            gate.acquire(),
            Err(AppError::TooManyConcurrentUploads)
        ));
        gate.release(&a);
        assert!(gate.acquire().is_ok());
    }

    #[test]
    fn release_is_idempotent() {
        let gate = gate_with_clock(1, Arc::new(SystemClock));
        let slot = gate.acquire().unwrap();
        gate.release(&slot);
        gate.release(&slot);
        assert_eq!(gate.in_flight(), 0);
    }

    #[test]
    fn sweep_reaps_only_stale_slots() {
        let clock = Arc::new(ManualClock::new());
        let gate = gate_with_clock(3, clock.clone());
        let _old = gate.acquire().unwrap();
        clock.advance(Duration::from_secs(301));
        let _fresh = gate.acquire().unwrap();

        assert_eq!(gate.sweep_stale(), 1);
        assert_eq!(gate.in_flight(), 1);
    }

    #[test]
    fn guard_releases_on_drop() {
        let gate = gate_with_clock(1, Arc::new(SystemClock));
        {
            let _guard = SlotGuard::try_acquire(&gate).unwrap();
            assert_eq!(gate.in_flight(), 1);
        }
        assert_eq!(gate.in_flight(), 0);
    }
}
