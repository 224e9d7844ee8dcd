//! Application endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use inventory_core::models::{
    Application, ApplicationInstance, CreateApplicationRequest, Page, PageQuery,
    UpdateApplicationRequest,
};

use crate::http::{AppResult, AppState};

/// Create application routes
pub fn create_application_router() -> Router<AppState> {
    Router::new()
        .route("/applications", get(list_applications))
        .route("/application", post(create_application).put(update_application))
        .route("/application/{id}", get(get_application).delete(delete_application))
        .route("/application/{id}/instances", get(list_application_instances))
}

pub async fn list_applications(State(state): State<AppState>) -> AppResult<Json<Vec<Application>>> {
    Ok(Json(state.application_service.list().await?))
}

pub async fn get_application(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Application>> {
    Ok(Json(state.application_service.get(id).await?))
}

pub async fn create_application(
    State(state): State<AppState>,
    Json(req): Json<CreateApplicationRequest>,
) -> AppResult<Json<Application>> {
    Ok(Json(state.application_service.create(req).await?))
}

pub async fn update_application(
    State(state): State<AppState>,
    Json(req): Json<UpdateApplicationRequest>,
) -> AppResult<Json<Application>> {
    Ok(Json(state.application_service.update(req).await?))
}

pub async fn delete_application(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    state.application_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Instances of an application, ordered by instance id
///
/// GET /application/{id}/instances?page=1&page_size=20
pub async fn list_application_instances(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Page<ApplicationInstance>>> {
    Ok(Json(
        state
            .instance_service
            .query_instances(id, query.into())
            .await?,
    ))
}

#[cfg(test)]
mod tests {
    use crate::http::test_support::{router, send};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_application_rejects_blank_name() {
        let body = json!({"namespace_id": 1, "name": "\t"});
        let (status, _) = send(router(), "POST", "/api/app/application", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_application_requires_namespace_id() {
        let body = json!({"name": "orders"});
        let (status, _) = send(router(), "POST", "/api/app/application", Some(body)).await;
        assert!(status.is_client_error());
    }
}
