//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`audio`] - Single-video, playlist and album extraction
//! - [`system`] - Health and OpenAPI

use serde::{Deserialize, Serialize};

mod audio;
mod system;

pub use audio::*;
pub use system::*;

/// Request body shared by every extraction endpoint
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ExtractRequest {
    /// Video or playlist URL
    #[schema(example = "https://www.youtube.com/watch?v=dQw4w9WgXcQ")]
    pub url: String,
}

/// Informational response that isn't an error
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct MessageResponse {
    /// What happened
    pub message: String,
}

/// Response of `GET /health`
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    /// Always `"healthy"` while the server answers
    pub status: String,
}
