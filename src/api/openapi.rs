//! OpenAPI documentation and schema generation

use utoipa::OpenApi;

/// OpenAPI documentation for the tubeaudio REST API
///
/// Served at `/openapi.json` and, when enabled, browsable at `/swagger-ui`.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "tubeaudio REST API",
        version = "0.1.0",
        description = "Extract YouTube audio as tagged 320 kbps MP3 files, one at a time or a whole playlist at once",
        license(
            name = "MIT"
        )
    ),
    servers(
        (url = "http://localhost:7783", description = "Local development server")
    ),
    paths(
        // Extraction
        crate::api::routes::extract_audio,
        crate::api::routes::extract_playlist,
        crate::api::routes::extract_album,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
    ),
    components(schemas(
        crate::api::routes::ExtractRequest,
        crate::api::routes::MessageResponse,
        crate::api::routes::HealthResponse,
        crate::types::PlaylistReport,
        crate::types::PlaylistEntryReport,
        crate::error::ApiError,
    )),
    tags(
        (name = "extraction", description = "Audio extraction - Single videos, playlist reports and playlist archives"),
        (name = "system", description = "System endpoints - Health checks and OpenAPI spec"),
    )
)]
pub struct ApiDoc;
