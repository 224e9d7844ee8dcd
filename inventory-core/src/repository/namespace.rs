use sqlx::PgPool;

use crate::{
    models::{Namespace, NamespaceStatus, NewNamespace},
    Result,
};

/// Namespace repository for database operations
#[derive(Clone)]
pub struct NamespaceRepository {
    pool: PgPool,
}

impl std::fmt::Debug for NamespaceRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamespaceRepository")
            .field("pool", &"PgPool")
            .finish()
    }
}

impl NamespaceRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, namespace: &NewNamespace) -> Result<Namespace> {
        let row = sqlx::query_as::<_, Namespace>(
            r"
            INSERT INTO app_namespaces (cluster_id, name, status, description)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            ",
        )
        .bind(namespace.cluster_id)
        .bind(&namespace.name)
        .bind(namespace.status)
        .bind(&namespace.description)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn upsert(&self, namespace: &NewNamespace) -> Result<Namespace> {
        self.upsert_with_executor(namespace, &self.pool).await
    }

    /// Insert, or overwrite status and description of the namespace with the
    /// same `(cluster_id, name)`, using a provided executor (pool or transaction)
    pub async fn upsert_with_executor<'e, E>(&self, namespace: &NewNamespace, executor: E) -> Result<Namespace>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let row = sqlx::query_as::<_, Namespace>(
            r"
            INSERT INTO app_namespaces (cluster_id, name, status, description)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (cluster_id, name) DO UPDATE
            SET status = EXCLUDED.status,
                description = EXCLUDED.description,
                updated_at = NOW()
            RETURNING *
            ",
        )
        .bind(namespace.cluster_id)
        .bind(&namespace.name)
        .bind(namespace.status)
        .bind(&namespace.description)
        .fetch_one(executor)
        .await?;

        Ok(row)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Namespace>> {
        let row = sqlx::query_as::<_, Namespace>("SELECT * FROM app_namespaces WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    pub async fn get_by_cluster_and_name(&self, cluster_id: i64, name: &str) -> Result<Option<Namespace>> {
        let row = sqlx::query_as::<_, Namespace>(
            "SELECT * FROM app_namespaces WHERE cluster_id = $1 AND name = $2",
        )
        .bind(cluster_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn list(&self) -> Result<Vec<Namespace>> {
        let rows = sqlx::query_as::<_, Namespace>("SELECT * FROM app_namespaces ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    pub async fn list_by_cluster(&self, cluster_id: i64) -> Result<Vec<Namespace>> {
        let rows = sqlx::query_as::<_, Namespace>(
            "SELECT * FROM app_namespaces WHERE cluster_id = $1 ORDER BY name",
        )
        .bind(cluster_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn list_by_cluster_and_status(
        &self,
        cluster_id: i64,
        status: NamespaceStatus,
    ) -> Result<Vec<Namespace>> {
        self.list_by_cluster_and_status_with_executor(cluster_id, status, &self.pool)
            .await
    }

    pub async fn list_by_cluster_and_status_with_executor<'e, E>(
        &self,
        cluster_id: i64,
        status: NamespaceStatus,
        executor: E,
    ) -> Result<Vec<Namespace>>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let rows = sqlx::query_as::<_, Namespace>(
            "SELECT * FROM app_namespaces WHERE cluster_id = $1 AND status = $2 ORDER BY name",
        )
        .bind(cluster_id)
        .bind(status)
        .fetch_all(executor)
        .await?;

        Ok(rows)
    }

    /// Write name, status and description; `None` if the row is gone
    pub async fn update(&self, namespace: &Namespace) -> Result<Option<Namespace>> {
        let row = sqlx::query_as::<_, Namespace>(
            r"
            UPDATE app_namespaces
            SET name = $2, status = $3, description = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            ",
        )
        .bind(namespace.id)
        .bind(&namespace.name)
        .bind(namespace.status)
        .bind(&namespace.description)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM app_namespaces WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{seed_cluster, test_pool};

    #[tokio::test]
    #[ignore = "Requires database"]
    async fn test_upsert_updates_status_in_place() {
        let pool = test_pool().await;
        let cluster = seed_cluster(&pool).await;
        let repo = NamespaceRepository::new(pool);

        let created = repo.upsert(&NewNamespace::new(cluster.id, "public")).await.unwrap();
        let mut stale = NewNamespace::new(cluster.id, "public");
        stale.status = NamespaceStatus::Unknown;
        let updated = repo.upsert(&stale).await.unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.status, NamespaceStatus::Unknown);
        assert_eq!(repo.list_by_cluster(cluster.id).await.unwrap(), vec![updated]);
    }

    #[tokio::test]
    #[ignore = "Requires database"]
    async fn test_list_by_cluster_and_status_filters() {
        let pool = test_pool().await;
        let cluster = seed_cluster(&pool).await;
        let repo = NamespaceRepository::new(pool);

        repo.create(&NewNamespace::new(cluster.id, "prod")).await.unwrap();
        let mut inactive = NewNamespace::new(cluster.id, "dev");
        inactive.status = NamespaceStatus::Inactive;
        repo.create(&inactive).await.unwrap();

        let active = repo
            .list_by_cluster_and_status(cluster.id, NamespaceStatus::Active)
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "prod");

        let found = repo.get_by_cluster_and_name(cluster.id, "dev").await.unwrap().unwrap();
        assert_eq!(found.status, NamespaceStatus::Inactive);
    }

    #[tokio::test]
    #[ignore = "Requires database"]
    async fn test_duplicate_name_in_cluster_is_already_exists() {
        let pool = test_pool().await;
        let cluster = seed_cluster(&pool).await;
        let repo = NamespaceRepository::new(pool);

        repo.create(&NewNamespace::new(cluster.id, "public")).await.unwrap();
        let err = repo.create(&NewNamespace::new(cluster.id, "public")).await.unwrap_err();
        assert!(matches!(err, crate::Error::AlreadyExists(_)));
    }

    #[tokio::test]
    #[ignore = "Requires database"]
    async fn test_missing_cluster_is_not_found() {
        let pool = test_pool().await;
        let repo = NamespaceRepository::new(pool);

        let err = repo.create(&NewNamespace::new(i64::MAX, "public")).await.unwrap_err();
        assert!(matches!(err, crate::Error::NotFound(_)));
    }
}
