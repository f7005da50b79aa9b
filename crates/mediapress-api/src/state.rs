//! Shared application state.

use std::sync::Arc;

use mediapress_core::Config;
use mediapress_pipeline::IngestPipeline;
use mediapress_storage::Storage;

pub struct AppState {
    pub config: Config,
    pub pipeline: Arc<IngestPipeline>,
    /// Secondary backend handle for presigned direct uploads, when configured.
    pub large_object: Option<Arc<dyn Storage>>,
}
