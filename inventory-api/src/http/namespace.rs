//! Namespace endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use inventory_core::models::{
    Application, CreateNamespaceRequest, Namespace, Page, PageQuery, UpdateNamespaceRequest,
};

use crate::http::{AppResult, AppState};

/// Create namespace routes
pub fn create_namespace_router() -> Router<AppState> {
    Router::new()
        .route("/namespaces", get(list_namespaces))
        .route("/namespace", post(create_namespace).put(update_namespace))
        .route("/namespace/{id}", get(get_namespace).delete(delete_namespace))
        .route("/namespace/{id}/applications", get(list_namespace_applications))
}

pub async fn list_namespaces(State(state): State<AppState>) -> AppResult<Json<Vec<Namespace>>> {
    Ok(Json(state.namespace_service.list().await?))
}

pub async fn get_namespace(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Namespace>> {
    Ok(Json(state.namespace_service.get(id).await?))
}

pub async fn create_namespace(
    State(state): State<AppState>,
    Json(req): Json<CreateNamespaceRequest>,
) -> AppResult<Json<Namespace>> {
    Ok(Json(state.namespace_service.create(req).await?))
}

pub async fn update_namespace(
    State(state): State<AppState>,
    Json(req): Json<UpdateNamespaceRequest>,
) -> AppResult<Json<Namespace>> {
    Ok(Json(state.namespace_service.update(req).await?))
}

pub async fn delete_namespace(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    state.namespace_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Applications of a namespace, ordered by name
///
/// GET /namespace/{id}/applications?page=1&page_size=20
pub async fn list_namespace_applications(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Page<Application>>> {
    Ok(Json(
        state
            .application_service
            .query_applications(id, query.into())
            .await?,
    ))
}

#[cfg(test)]
mod tests {
    use crate::http::test_support::{error_body, router, send};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_namespace_rejects_blank_name() {
        let body = json!({"cluster_id": 1, "name": ""});
        let (status, bytes) = send(router(), "POST", "/api/app/namespace", Some(body)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(error_body(&bytes).error.contains("name"));
    }

    #[tokio::test]
    async fn test_update_namespace_rejects_blank_name() {
        let body = json!({"id": 3, "name": " ", "status": "INACTIVE"});
        let (status, _) = send(router(), "PUT", "/api/app/namespace", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_invalid_page_query_is_client_error() {
        let (status, _) = send(router(), "GET", "/api/app/namespace/1/applications?page=first", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
