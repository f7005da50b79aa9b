//! Inbound upload request model.

/// Caller-supplied routing hints.
#[derive(Clone, Copy, Debug, Default)]
pub struct RoutingFlags {
    /// Route to the secondary large-object backend (honored for video only).
    pub prefer_large_object: bool,
}

/// One parsed upload, as handed to the pipeline by the transport layer.
///
/// The raw payload is owned for the request lifetime and dropped with the
/// request; the pipeline never retains it past the commit.
#[derive(Debug)]
pub struct UploadRequest {
    pub original_filename: String,
    pub declared_content_type: Option<String>,
    /// Byte count the transport claims to have delivered.
    pub declared_size: u64,
    pub folder: String,
    pub flags: RoutingFlags,
    pub data: Vec<u8>,
}
