use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, Response},
    Router,
};
use serde::de::DeserializeOwned;
use sessiond::{
    api::routes::{build_router, ApiState},
    auth::session::SessionService,
    config::ApiServerConfig,
    storage::{self, create_pool, AuditLogRepository, DbPool, SqlxSessionRepository},
};
use tower::ServiceExt;

static NEXT_DB_ID: AtomicU64 = AtomicU64::new(0);

pub struct TestApp {
    pub pool: DbPool,
    pub session_service: SessionService,
    pub repository: Arc<SqlxSessionRepository>,
    pub audit_repository: Arc<AuditLogRepository>,
}

impl TestApp {
    pub fn router(&self) -> Router {
        build_router(ApiState::new(self.session_service.clone()), &ApiServerConfig::default())
    }

    /// Router built over a different session service (e.g. one backed by a
    /// failing repository).
    pub fn router_with_service(&self, session_service: SessionService) -> Router {
        build_router(ApiState::new(session_service), &ApiServerConfig::default())
    }
}

pub async fn setup_test_app() -> TestApp {
    let db_id = NEXT_DB_ID.fetch_add(1, Ordering::Relaxed);
    let config = sessiond::config::DatabaseConfig {
        url: format!("sqlite:file:sessiond_it_{}?mode=memory&cache=shared", db_id),
        max_connections: 5,
        min_connections: 1,
        auto_migrate: false,
        ..Default::default()
    };

    let pool = create_pool(&config).await.expect("create sqlite pool");
    storage::run_migrations(&pool).await.expect("run migrations for tests");

    let repository = Arc::new(SqlxSessionRepository::new(pool.clone()));
    let audit_repository = Arc::new(AuditLogRepository::new(pool.clone()));
    let session_service = SessionService::new(repository.clone(), audit_repository.clone());

    TestApp { pool, session_service, repository, audit_repository }
}

pub async fn send_request(
    router: Router,
    method: Method,
    path: &str,
    cookie: Option<&str>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }

    let request = builder.body(Body::empty()).expect("build request");
    router.oneshot(request).await.expect("request")
}

pub async fn read_json<T: DeserializeOwned>(response: Response<Body>) -> T {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("read body");
    serde_json::from_slice(&bytes).expect("parse json")
}

/// All Set-Cookie header values on a response.
pub fn set_cookie_headers(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok().map(|s| s.to_string()))
        .collect()
}

/// Assert the response carries a removal cookie for the session token.
pub fn assert_clears_session_cookie(response: &Response<Body>) {
    let cookies = set_cookie_headers(response);
    let removal = cookies
        .iter()
        .find(|value| value.starts_with("auth-token="))
        .unwrap_or_else(|| panic!("no auth-token Set-Cookie header, got: {:?}", cookies));
    assert!(
        removal.contains("Max-Age=0") || removal.contains("Expires="),
        "auth-token cookie is not expired: {}",
        removal
    );
}
