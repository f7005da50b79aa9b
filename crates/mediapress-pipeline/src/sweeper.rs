//! Periodic sweeper for the admission gate and dedup index.
//!
//! One background task serves both: stale admission slots (crashed requests
//! that never released) and expired dedup entries share a cadence.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::admission::AdmissionGate;
use crate::dedup::DedupIndex;

pub struct Sweeper {
    gate: Arc<AdmissionGate>,
    dedup: Arc<DedupIndex>,
    interval: Duration,
}

impl Sweeper {
    pub fn new(gate: Arc<AdmissionGate>, dedup: Arc<DedupIndex>, interval: Duration) -> Self {
        Self {
            gate,
            dedup,
            interval,
        }
    }

    /// One sweep pass. Returns (reaped slots, evicted dedup entries).
    pub fn run_once(&self) -> (usize, usize) {
        let reaped = self.gate.sweep_stale();
        let evicted = self.dedup.evict_expired();
        (reaped, evicted)
    }

    /// Spawn the periodic sweep loop.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick fires immediately; skip it so a fresh start is quiet.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let (reaped, evicted) = self.run_once();
                if reaped > 0 || evicted > 0 {
                    tracing::info!(reaped, evicted, "Sweep pass complete");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediapress_core::{Clock, ManualClock};

    #[tokio::test]
    async fn run_once_reaps_and_evicts_deterministically() {
        let clock = Arc::new(ManualClock::new());
        let gate = Arc::new(AdmissionGate::new(
            4,
            Duration::from_secs(300),
            clock.clone() as Arc<dyn Clock>,
        ));
        let dedup = Arc::new(DedupIndex::new(
            Duration::from_secs(3600),
            clock.clone() as Arc<dyn Clock>,
        ));

        let _held = gate.acquire().unwrap();
        dedup.insert("fp".to_string(), "u".to_string(), "t".to_string());

        let sweeper = Sweeper::new(gate.clone(), dedup.clone(), Duration::from_secs(60));
        assert_eq!(sweeper.run_once(), (0, 0));

        clock.advance(Duration::from_secs(3601));
        assert_eq!(sweeper.run_once(), (1, 1));
        assert_eq!(gate.in_flight(), 0);
        assert!(dedup.is_empty());
    }
}
