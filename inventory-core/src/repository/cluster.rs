use sqlx::PgPool;

use crate::{
    models::{Cluster, ClusterType, NewCluster},
    Result,
};

/// Cluster repository for database operations
#[derive(Clone)]
pub struct ClusterRepository {
    pool: PgPool,
}

impl std::fmt::Debug for ClusterRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterRepository")
            .field("pool", &"PgPool")
            .finish()
    }
}

impl ClusterRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new cluster
    pub async fn create(&self, cluster: &NewCluster) -> Result<Cluster> {
        let row = sqlx::query_as::<_, Cluster>(
            r"
            INSERT INTO app_clusters (name, cluster_type, url, username, password, description)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            ",
        )
        .bind(&cluster.name)
        .bind(cluster.cluster_type)
        .bind(&cluster.url)
        .bind(&cluster.username)
        .bind(&cluster.password)
        .bind(&cluster.description)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn upsert(&self, cluster: &NewCluster) -> Result<Cluster> {
        self.upsert_with_executor(cluster, &self.pool).await
    }

    /// Insert, or overwrite type, url, description and any supplied
    /// credentials of the cluster with the same name
    pub async fn upsert_with_executor<'e, E>(&self, cluster: &NewCluster, executor: E) -> Result<Cluster>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let row = sqlx::query_as::<_, Cluster>(
            r"
            INSERT INTO app_clusters (name, cluster_type, url, username, password, description)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (name) DO UPDATE
            SET cluster_type = EXCLUDED.cluster_type,
                url = EXCLUDED.url,
                username = COALESCE(EXCLUDED.username, app_clusters.username),
                password = COALESCE(EXCLUDED.password, app_clusters.password),
                description = EXCLUDED.description,
                updated_at = NOW()
            RETURNING *
            ",
        )
        .bind(&cluster.name)
        .bind(cluster.cluster_type)
        .bind(&cluster.url)
        .bind(&cluster.username)
        .bind(&cluster.password)
        .bind(&cluster.description)
        .fetch_one(executor)
        .await?;

        Ok(row)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Cluster>> {
        let row = sqlx::query_as::<_, Cluster>("SELECT * FROM app_clusters WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Option<Cluster>> {
        let row = sqlx::query_as::<_, Cluster>("SELECT * FROM app_clusters WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    pub async fn list(&self) -> Result<Vec<Cluster>> {
        let rows = sqlx::query_as::<_, Cluster>("SELECT * FROM app_clusters ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    pub async fn list_by_type(&self, cluster_type: ClusterType) -> Result<Vec<Cluster>> {
        let rows = sqlx::query_as::<_, Cluster>(
            "SELECT * FROM app_clusters WHERE cluster_type = $1 ORDER BY id",
        )
        .bind(cluster_type)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Write every mutable column of `cluster`; `None` if the row is gone
    pub async fn update(&self, cluster: &Cluster) -> Result<Option<Cluster>> {
        let row = sqlx::query_as::<_, Cluster>(
            r"
            UPDATE app_clusters
            SET name = $2, cluster_type = $3, url = $4, username = $5, password = $6,
                description = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            ",
        )
        .bind(cluster.id)
        .bind(&cluster.name)
        .bind(cluster.cluster_type)
        .bind(&cluster.url)
        .bind(&cluster.username)
        .bind(&cluster.password)
        .bind(&cluster.description)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Delete a cluster and, through cascading keys, everything under it
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM app_clusters WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewNamespace;
    use crate::repository::NamespaceRepository;
    use crate::test_helpers::{seed_cluster, test_pool, unique_name};

    #[tokio::test]
    async fn test_repository_debug_hides_pool() {
        let pool = PgPool::connect_lazy("postgresql://test").unwrap();
        let repo = ClusterRepository::new(pool);
        assert_eq!(format!("{repo:?}"), r#"ClusterRepository { pool: "PgPool" }"#);
    }

    #[tokio::test]
    #[ignore = "Requires database"]
    async fn test_upsert_keeps_id_and_stored_password() {
        let pool = test_pool().await;
        let repo = ClusterRepository::new(pool);

        let mut new = NewCluster::new(unique_name("upsert"), ClusterType::Nacos, "http://nacos:8848");
        new.username = Some("nacos".to_string());
        new.password = Some("secret".to_string());
        let created = repo.upsert(&new).await.unwrap();

        new.url = "http://nacos-2:8848".to_string();
        new.password = None;
        let updated = repo.upsert(&new).await.unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.url, "http://nacos-2:8848");
        assert_eq!(updated.username.as_deref(), Some("nacos"));
        assert_eq!(updated.password.as_deref(), Some("secret"));
    }

    #[tokio::test]
    #[ignore = "Requires database"]
    async fn test_cluster_type_round_trips_through_text_column() {
        let pool = test_pool().await;
        let repo = ClusterRepository::new(pool.clone());
        let cluster = repo
            .create(&NewCluster::new(unique_name("k8s"), ClusterType::Kubernetes, "https://k8s:6443"))
            .await
            .unwrap();

        let stored: String = sqlx::query_scalar("SELECT cluster_type FROM app_clusters WHERE id = $1")
            .bind(cluster.id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(stored, "kubernetes");

        let listed = repo.list_by_type(ClusterType::Kubernetes).await.unwrap();
        assert!(listed.iter().any(|c| c.id == cluster.id));
        assert_eq!(repo.get_by_id(cluster.id).await.unwrap(), Some(cluster));
    }

    #[tokio::test]
    #[ignore = "Requires database"]
    async fn test_duplicate_name_is_already_exists() {
        let pool = test_pool().await;
        let repo = ClusterRepository::new(pool);
        let new = NewCluster::new(unique_name("dup"), ClusterType::Nacos, "http://nacos:8848");

        repo.create(&new).await.unwrap();
        let err = repo.create(&new).await.unwrap_err();
        assert!(matches!(err, crate::Error::AlreadyExists(_)));
    }

    #[tokio::test]
    #[ignore = "Requires database"]
    async fn test_delete_cascades_to_namespaces() {
        let pool = test_pool().await;
        let repo = ClusterRepository::new(pool.clone());
        let cluster = seed_cluster(&pool).await;
        let namespace = NamespaceRepository::new(pool.clone())
            .create(&NewNamespace::new(cluster.id, "public"))
            .await
            .unwrap();

        assert!(repo.delete(cluster.id).await.unwrap());
        assert!(!repo.delete(cluster.id).await.unwrap());
        assert!(NamespaceRepository::new(pool).get_by_id(namespace.id).await.unwrap().is_none());
    }
}
