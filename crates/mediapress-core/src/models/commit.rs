//! Storage targets and commit outcomes.

/// Which configured backend a target is written to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendChoice {
    /// Default blob store for images and ordinary-sized video.
    Primary,
    /// Secondary backend for payloads above the primary's practical ceiling.
    LargeObject,
}

/// One destination object to be written as part of a commit.
#[derive(Clone, Debug)]
pub struct StorageTarget {
    pub backend: BackendChoice,
    pub key: String,
    pub content_type: String,
}

/// Whether post-write verification confirmed the object.
///
/// `Unconfirmed` is a soft success: the write itself completed, but the
/// backend never acknowledged the object within the polling budget. Callers
/// surface it as a warning, not a failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Durability {
    Confirmed,
    Unconfirmed,
}

impl Durability {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Durability::Confirmed)
    }
}

/// Outcome of committing one storage target.
#[derive(Clone, Debug)]
pub struct CommitResult {
    pub url: String,
    pub key: String,
    pub durability: Durability,
}
