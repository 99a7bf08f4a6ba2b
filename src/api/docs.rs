use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::handlers::health::health_handler,
        crate::api::handlers::auth::logout_handler,
    ),
    components(
        schemas(
            crate::api::handlers::health::HealthResponse,
            crate::api::handlers::auth::LogoutResponse,
            crate::api::error::ErrorBody,
        )
    ),
    tags(
        (name = "auth", description = "Session termination"),
        (name = "health", description = "Service health")
    ),
    info(
        title = "sessiond API",
        description = "Cookie-session termination service"
    )
)]
pub struct ApiDoc;

pub fn docs_router() -> Router {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()).into()
}
