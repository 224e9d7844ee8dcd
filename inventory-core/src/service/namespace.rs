//! Namespace management service

use tracing::info;

use crate::{
    models::{CreateNamespaceRequest, Namespace, NamespaceStatus, NewNamespace, UpdateNamespaceRequest},
    repository::{ClusterRepository, NamespaceRepository},
    validation::NameValidator,
    Error, Result,
};

/// Namespace management service
#[derive(Clone, Debug)]
pub struct NamespaceService {
    repo: NamespaceRepository,
    cluster_repo: ClusterRepository,
}

impl NamespaceService {
    #[must_use]
    pub const fn new(repo: NamespaceRepository, cluster_repo: ClusterRepository) -> Self {
        Self { repo, cluster_repo }
    }

    async fn ensure_cluster(&self, cluster_id: i64) -> Result<()> {
        if self.cluster_repo.get_by_id(cluster_id).await?.is_none() {
            return Err(Error::not_found("Cluster", cluster_id));
        }
        Ok(())
    }

    pub async fn create(&self, req: CreateNamespaceRequest) -> Result<Namespace> {
        NameValidator::new("name").validate(&req.name)?;
        self.ensure_cluster(req.cluster_id).await?;

        let namespace = self
            .repo
            .create(&NewNamespace {
                cluster_id: req.cluster_id,
                name: req.name,
                status: req.status,
                description: req.description,
            })
            .await?;

        info!(namespace_id = namespace.id, cluster_id = namespace.cluster_id, name = %namespace.name, "Namespace created");
        Ok(namespace)
    }

    /// Overwrite name, status and description
    pub async fn update(&self, req: UpdateNamespaceRequest) -> Result<Namespace> {
        NameValidator::new("name").validate(&req.name)?;

        let mut namespace = self.get(req.id).await?;
        namespace.name = req.name;
        namespace.status = req.status;
        namespace.description = req.description;

        self.repo
            .update(&namespace)
            .await?
            .ok_or_else(|| Error::not_found("Namespace", req.id))
    }

    /// Find by `(cluster_id, name)` and overwrite, or insert
    pub async fn save_or_update(&self, namespace: &NewNamespace) -> Result<Namespace> {
        NameValidator::new("name").validate(&namespace.name)?;
        self.repo.upsert(namespace).await
    }

    pub async fn get(&self, id: i64) -> Result<Namespace> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| Error::not_found("Namespace", id))
    }

    pub async fn get_by_cluster_and_name(&self, cluster_id: i64, name: &str) -> Result<Option<Namespace>> {
        self.repo.get_by_cluster_and_name(cluster_id, name).await
    }

    pub async fn list(&self) -> Result<Vec<Namespace>> {
        self.repo.list().await
    }

    pub async fn list_by_cluster(&self, cluster_id: i64) -> Result<Vec<Namespace>> {
        self.ensure_cluster(cluster_id).await?;
        self.repo.list_by_cluster(cluster_id).await
    }

    pub async fn list_active_by_cluster(&self, cluster_id: i64) -> Result<Vec<Namespace>> {
        self.repo
            .list_by_cluster_and_status(cluster_id, NamespaceStatus::Active)
            .await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        if self.repo.delete(id).await? {
            info!(namespace_id = id, "Namespace deleted");
            Ok(())
        } else {
            Err(Error::not_found("Namespace", id))
        }
    }
}
