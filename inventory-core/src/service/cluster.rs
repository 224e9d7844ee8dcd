//! Cluster management service

use tracing::info;

use crate::{
    models::{Cluster, ClusterType, CreateClusterRequest, NewCluster, UpdateClusterRequest},
    repository::ClusterRepository,
    validation::{NameValidator, UrlValidator},
    Error, Result,
};

/// Cluster management service
#[derive(Clone, Debug)]
pub struct ClusterService {
    repo: ClusterRepository,
}

impl ClusterService {
    #[must_use]
    pub const fn new(repo: ClusterRepository) -> Self {
        Self { repo }
    }

    pub(crate) fn validate(name: &str, url: &str) -> Result<()> {
        NameValidator::new("name").validate(name)?;
        UrlValidator::new().validate("url", url)?;
        Ok(())
    }

    pub async fn create(&self, req: CreateClusterRequest) -> Result<Cluster> {
        Self::validate(&req.name, &req.url)?;

        let cluster = self.repo.create(&NewCluster::from(req)).await?;
        info!(cluster_id = cluster.id, name = %cluster.name, cluster_type = %cluster.cluster_type, "Cluster created");
        Ok(cluster)
    }

    /// Overwrite name, url and description; credentials only when supplied
    pub async fn update(&self, req: UpdateClusterRequest) -> Result<Cluster> {
        Self::validate(&req.name, &req.url)?;

        let mut cluster = self.get(req.id).await?;
        cluster.name = req.name;
        cluster.url = req.url;
        cluster.description = req.description;
        if req.username.is_some() {
            cluster.username = req.username;
        }
        if req.password.is_some() {
            cluster.password = req.password;
        }

        self.repo
            .update(&cluster)
            .await?
            .ok_or_else(|| Error::not_found("Cluster", req.id))
    }

    /// Find by name and overwrite, or insert
    pub async fn save_or_update(&self, cluster: &NewCluster) -> Result<Cluster> {
        Self::validate(&cluster.name, &cluster.url)?;
        self.repo.upsert(cluster).await
    }

    pub async fn get(&self, id: i64) -> Result<Cluster> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| Error::not_found("Cluster", id))
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Option<Cluster>> {
        self.repo.get_by_name(name).await
    }

    pub async fn list(&self) -> Result<Vec<Cluster>> {
        self.repo.list().await
    }

    pub async fn list_by_type(&self, cluster_type: ClusterType) -> Result<Vec<Cluster>> {
        self.repo.list_by_type(cluster_type).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        if self.repo.delete(id).await? {
            info!(cluster_id = id, "Cluster deleted");
            Ok(())
        } else {
            Err(Error::not_found("Cluster", id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::PgPool;

    fn service() -> ClusterService {
        let pool = PgPool::connect_lazy("postgresql://test").unwrap();
        ClusterService::new(ClusterRepository::new(pool))
    }

    #[tokio::test]
    async fn test_create_rejects_blank_name_before_database() {
        let req = CreateClusterRequest {
            name: "  ".to_string(),
            cluster_type: ClusterType::Nacos,
            url: "127.0.0.1:8848".to_string(),
            username: None,
            password: None,
            description: None,
        };

        let err = service().create(req).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_save_or_update_rejects_bad_url() {
        let cluster = NewCluster::new("prod", ClusterType::Nacos, "http://");
        let err = service().save_or_update(&cluster).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(msg) if msg.contains("url")));
    }
}
