//! Cluster endpoints
//!
//! Creating or updating a Nacos cluster also schedules a background
//! reconciliation of it.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use inventory_core::{
    models::{Cluster, CreateClusterRequest, Namespace, UpdateClusterRequest},
    sync::ClusterSyncStats,
};

use crate::http::{AppResult, AppState};

/// Create cluster routes
pub fn create_cluster_router() -> Router<AppState> {
    Router::new()
        .route("/clusters", get(list_clusters))
        .route("/cluster", post(create_cluster).put(update_cluster))
        .route("/cluster/{id}", get(get_cluster).delete(delete_cluster))
        .route("/cluster/{id}/sync", post(sync_cluster))
        .route("/cluster/{id}/namespaces", get(list_cluster_namespaces))
}

pub async fn list_clusters(State(state): State<AppState>) -> AppResult<Json<Vec<Cluster>>> {
    Ok(Json(state.cluster_service.list().await?))
}

pub async fn get_cluster(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Cluster>> {
    Ok(Json(state.cluster_service.get(id).await?))
}

pub async fn create_cluster(
    State(state): State<AppState>,
    Json(req): Json<CreateClusterRequest>,
) -> AppResult<Json<Cluster>> {
    let cluster = state.cluster_service.create(req).await?;
    state.synchronizer.spawn_sync(cluster.clone());
    Ok(Json(cluster))
}

pub async fn update_cluster(
    State(state): State<AppState>,
    Json(req): Json<UpdateClusterRequest>,
) -> AppResult<Json<Cluster>> {
    let cluster = state.cluster_service.update(req).await?;
    state.synchronizer.spawn_sync(cluster.clone());
    Ok(Json(cluster))
}

pub async fn delete_cluster(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    let cluster = state.cluster_service.get(id).await?;
    state.cluster_service.delete(id).await?;
    state.synchronizer.invalidate_client(&cluster.url);
    Ok(StatusCode::NO_CONTENT)
}

/// Reconcile one Nacos cluster now and report what changed
pub async fn sync_cluster(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ClusterSyncStats>> {
    Ok(Json(state.synchronizer.sync_cluster_by_id(id).await?))
}

pub async fn list_cluster_namespaces(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<Namespace>>> {
    Ok(Json(state.namespace_service.list_by_cluster(id).await?))
}
