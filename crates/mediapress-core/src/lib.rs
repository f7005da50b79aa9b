//! Mediapress Core Library
//!
//! This crate provides the domain models, error taxonomy, configuration,
//! retry policy and clock abstraction shared across all mediapress components.

pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod retry;
pub mod storage_types;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::{AppError, ErrorMetadata};
pub use retry::RetryPolicy;
pub use storage_types::StorageBackend;
