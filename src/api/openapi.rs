//! OpenAPI documentation and schema generation
//!
//! Defines the OpenAPI specification for the download-tracker REST API using
//! utoipa for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the download-tracker REST API
///
/// The spec can be accessed via:
/// - `/api/v1/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "download-tracker REST API",
        version = "0.1.0",
        description = "REST API for registering accounts, submitting image downloads and following their progress",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:3001", description = "Local development server")
    ),
    paths(
        // Accounts
        crate::api::routes::register,
        crate::api::routes::login,
        crate::api::routes::verify,
        crate::api::routes::logout,

        // Downloads
        crate::api::routes::list_jobs,
        crate::api::routes::create_job,
        crate::api::routes::get_job,
        crate::api::routes::get_job_file,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
        crate::api::routes::event_stream,
    ),
    components(schemas(
        // Core types from types.rs
        crate::types::JobId,
        crate::types::UserId,
        crate::types::Status,
        crate::types::JobInfo,
        crate::types::JobStats,
        crate::types::JobList,
        crate::types::ResultHandle,
        crate::types::UserInfo,
        crate::types::Session,
        crate::types::Event,

        // API request/response types from routes
        crate::api::routes::RegisterRequest,
        crate::api::routes::RegisterResponse,
        crate::api::routes::LoginRequest,
        crate::api::routes::CreateJobRequest,

        // Error types from error.rs
        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "auth", description = "Accounts - Register, log in and manage bearer sessions"),
        (name = "downloads", description = "Downloads - Submit image URLs and follow their progress"),
        (name = "system", description = "System endpoints - Health checks, OpenAPI spec, events"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Adds the bearer session scheme to the OpenAPI spec
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = &mut openapi.components {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::Http::new(
                        utoipa::openapi::security::HttpAuthScheme::Bearer,
                    ),
                ),
            );
        }
    }
}
