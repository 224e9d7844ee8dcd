// Module: http
// HTTP/JSON REST API for the inventory, mounted under /api/app

pub mod application;
pub mod cluster;
pub mod error;
pub mod health;
pub mod instance;
pub mod namespace;

use axum::Router;
use inventory_core::bootstrap::Services;
use inventory_core::service::{
    ApplicationInstanceService, ApplicationService, ClusterService, NamespaceService,
};
use inventory_core::sync::NacosSynchronizer;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::{AppError, AppResult};

/// Prefix of every inventory route
pub const API_PREFIX: &str = "/api/app";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub cluster_service: Arc<ClusterService>,
    pub namespace_service: Arc<NamespaceService>,
    pub application_service: Arc<ApplicationService>,
    pub instance_service: Arc<ApplicationInstanceService>,
    pub synchronizer: Arc<NacosSynchronizer>,
}

impl From<&Services> for AppState {
    fn from(services: &Services) -> Self {
        Self {
            cluster_service: Arc::new(services.cluster_service.clone()),
            namespace_service: Arc::new(services.namespace_service.clone()),
            application_service: Arc::new(services.application_service.clone()),
            instance_service: Arc::new(services.instance_service.clone()),
            synchronizer: Arc::clone(&services.synchronizer),
        }
    }
}

/// Create the HTTP router with all routes
pub fn create_router(services: &Services) -> Router {
    let state = AppState::from(services);

    let api = Router::new()
        .merge(cluster::create_cluster_router())
        .merge(namespace::create_namespace_router())
        .merge(application::create_application_router())
        .merge(instance::create_instance_router());

    let router = Router::new()
        // Health check endpoints
        .merge(health::create_health_router())
        .nest(API_PREFIX, api);

    // Apply layers before state
    let router = router
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    // Apply state to all routes (must be last)
    router.with_state(state)
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        Router,
    };
    use inventory_core::{bootstrap::init_services, Config};
    use sqlx::PgPool;
    use tower::ServiceExt;

    use super::{create_router, error::ErrorResponse};

    /// Router over a pool that never connects; only paths that fail before
    /// reaching the database are usable
    pub fn router() -> Router {
        let pool = PgPool::connect_lazy("postgresql://test").unwrap();
        let services = init_services(pool, &Config::default()).unwrap();
        create_router(&services)
    }

    pub async fn send(router: Router, method: &str, uri: &str, body: Option<serde_json::Value>) -> (StatusCode, Vec<u8>) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    pub fn error_body(bytes: &[u8]) -> ErrorResponse {
        serde_json::from_slice(bytes).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{router, send};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(router(), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"OK");
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let (status, _) = send(router(), "GET", "/api/app/unknown", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_routes_require_prefix() {
        let (status, _) = send(router(), "GET", "/clusters", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
