//! Application instance endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use inventory_core::models::{ApplicationInstance, CreateInstanceRequest, UpdateInstanceRequest};

use crate::http::{AppResult, AppState};

/// Create instance routes
pub fn create_instance_router() -> Router<AppState> {
    Router::new()
        .route("/instances", get(list_instances))
        .route("/instance", post(create_instance).put(update_instance))
        .route("/instance/{id}", get(get_instance).delete(delete_instance))
}

pub async fn list_instances(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<ApplicationInstance>>> {
    Ok(Json(state.instance_service.list().await?))
}

pub async fn get_instance(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApplicationInstance>> {
    Ok(Json(state.instance_service.get(id).await?))
}

/// Register an instance by hand
///
/// A missing `instance_id` becomes `"{application}-{host}:{port}"` and a
/// missing `uri` is derived from `secure`, host and port.
pub async fn create_instance(
    State(state): State<AppState>,
    Json(req): Json<CreateInstanceRequest>,
) -> AppResult<Json<ApplicationInstance>> {
    Ok(Json(state.instance_service.create(req).await?))
}

pub async fn update_instance(
    State(state): State<AppState>,
    Json(req): Json<UpdateInstanceRequest>,
) -> AppResult<Json<ApplicationInstance>> {
    Ok(Json(state.instance_service.update(req).await?))
}

pub async fn delete_instance(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    state.instance_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use crate::http::test_support::{router, send};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_instance_rejects_unknown_status() {
        let body = json!({
            "application_id": 1,
            "host": "10.0.0.1",
            "port": 8080,
            "status": "SLEEPING"
        });
        let (status, _) = send(router(), "POST", "/api/app/instance", Some(body)).await;
        assert!(status.is_client_error());
    }

    #[tokio::test]
    async fn test_missing_body_is_client_error() {
        let (status, _) = send(router(), "PUT", "/api/app/instance", None).await;
        assert!(status.is_client_error());
    }

    #[tokio::test]
    async fn test_method_not_allowed() {
        let (status, _) = send(router(), "PATCH", "/api/app/instance/1", None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }
}
