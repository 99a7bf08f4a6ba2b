use axum::{middleware, routing::get, routing::post, Router};
use tower_http::cors::{Any, CorsLayer};

use crate::auth::session::SessionService;
use crate::config::ApiServerConfig;
use crate::observability::trace_http_requests;

use super::{
    docs,
    handlers::{health_handler, logout_handler},
};

#[derive(Clone)]
pub struct ApiState {
    pub session_service: SessionService,
}

impl ApiState {
    pub fn new(session_service: SessionService) -> Self {
        Self { session_service }
    }
}

pub fn build_router(state: ApiState, config: &ApiServerConfig) -> Router {
    let router = Router::new()
        .route("/api/auth/logout", post(logout_handler))
        .route("/health", get(health_handler))
        .with_state(state)
        .merge(docs::docs_router())
        .layer(middleware::from_fn(trace_http_requests));

    if config.enable_cors {
        router.layer(build_cors_layer(config))
    } else {
        router
    }
}

fn build_cors_layer(config: &ApiServerConfig) -> CorsLayer {
    if config.cors_origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<axum::http::HeaderValue> =
        config.cors_origins.iter().filter_map(|origin| origin.parse().ok()).collect();
    CorsLayer::new().allow_origin(origins).allow_methods(Any).allow_headers(Any)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_helpers::create_test_pool;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_router_serves_health() {
        let pool = create_test_pool().await;
        let state = ApiState::new(SessionService::with_sqlx(pool));
        let router = build_router(state, &ApiServerConfig::default());

        let response = router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let pool = create_test_pool().await;
        let state = ApiState::new(SessionService::with_sqlx(pool));
        let router = build_router(state, &ApiServerConfig::default());

        let response = router
            .oneshot(Request::builder().uri("/api/auth/login").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
