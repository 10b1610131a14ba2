//! Application state for the API server

use crate::Config;
use crate::pipeline::Extractor;
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// Cloned for each request (cheap Arc clones).
#[derive(Clone)]
pub struct AppState {
    /// Runs extractions
    pub extractor: Arc<Extractor>,

    /// Configuration (read-only)
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(extractor: Arc<Extractor>, config: Arc<Config>) -> Self {
        Self { extractor, config }
    }
}
