use sqlx::PgPool;

use crate::{
    models::{ApplicationInstance, NewInstance, PageParams},
    Result,
};

/// Instance rows joined with their application so `service_id` is populated
const SELECT_INSTANCE: &str = r"
    SELECT i.*, a.name AS service_id
    FROM app_instances i
    JOIN applications a ON a.id = i.application_id
";

/// Instance repository for database operations
#[derive(Clone)]
pub struct InstanceRepository {
    pool: PgPool,
}

impl std::fmt::Debug for InstanceRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceRepository")
            .field("pool", &"PgPool")
            .finish()
    }
}

impl InstanceRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, instance: &NewInstance) -> Result<ApplicationInstance> {
        let row = sqlx::query_as::<_, ApplicationInstance>(
            r"
            WITH row AS (
                INSERT INTO app_instances
                (application_id, instance_id, host, port, secure, uri, metadata, status, description)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                RETURNING *
            )
            SELECT row.*, a.name AS service_id
            FROM row JOIN applications a ON a.id = row.application_id
            ",
        )
        .bind(instance.application_id)
        .bind(&instance.instance_id)
        .bind(&instance.host)
        .bind(instance.port)
        .bind(instance.secure)
        .bind(&instance.uri)
        .bind(&instance.metadata)
        .bind(instance.status)
        .bind(&instance.description)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn upsert(&self, instance: &NewInstance) -> Result<ApplicationInstance> {
        self.upsert_with_executor(instance, &self.pool).await
    }

    /// Insert, or overwrite the instance with the same `instance_id`
    /// (possibly moving it to another application), using a provided
    /// executor (pool or transaction)
    pub async fn upsert_with_executor<'e, E>(&self, instance: &NewInstance, executor: E) -> Result<ApplicationInstance>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let row = sqlx::query_as::<_, ApplicationInstance>(
            r"
            WITH row AS (
                INSERT INTO app_instances
                (application_id, instance_id, host, port, secure, uri, metadata, status, description)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                ON CONFLICT (instance_id) DO UPDATE
                SET application_id = EXCLUDED.application_id,
                    host = EXCLUDED.host,
                    port = EXCLUDED.port,
                    secure = EXCLUDED.secure,
                    uri = EXCLUDED.uri,
                    metadata = EXCLUDED.metadata,
                    status = EXCLUDED.status,
                    description = COALESCE(EXCLUDED.description, app_instances.description),
                    updated_at = NOW()
                RETURNING *
            )
            SELECT row.*, a.name AS service_id
            FROM row JOIN applications a ON a.id = row.application_id
            ",
        )
        .bind(instance.application_id)
        .bind(&instance.instance_id)
        .bind(&instance.host)
        .bind(instance.port)
        .bind(instance.secure)
        .bind(&instance.uri)
        .bind(&instance.metadata)
        .bind(instance.status)
        .bind(&instance.description)
        .fetch_one(executor)
        .await?;

        Ok(row)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<ApplicationInstance>> {
        let row = sqlx::query_as::<_, ApplicationInstance>(&format!("{SELECT_INSTANCE} WHERE i.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    pub async fn get_by_instance_id(&self, instance_id: &str) -> Result<Option<ApplicationInstance>> {
        let row = sqlx::query_as::<_, ApplicationInstance>(&format!(
            "{SELECT_INSTANCE} WHERE i.instance_id = $1"
        ))
        .bind(instance_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn list(&self) -> Result<Vec<ApplicationInstance>> {
        let rows = sqlx::query_as::<_, ApplicationInstance>(&format!("{SELECT_INSTANCE} ORDER BY i.id"))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// One page of an application's instances, with the total count
    pub async fn list_by_application(
        &self,
        application_id: i64,
        page: PageParams,
    ) -> Result<(Vec<ApplicationInstance>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM app_instances WHERE application_id = $1")
            .bind(application_id)
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, ApplicationInstance>(&format!(
            "{SELECT_INSTANCE} WHERE i.application_id = $1 ORDER BY i.instance_id LIMIT $2 OFFSET $3"
        ))
        .bind(application_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((rows, total))
    }

    pub async fn list_all_by_application(&self, application_id: i64) -> Result<Vec<ApplicationInstance>> {
        self.list_all_by_application_with_executor(application_id, &self.pool)
            .await
    }

    pub async fn list_all_by_application_with_executor<'e, E>(
        &self,
        application_id: i64,
        executor: E,
    ) -> Result<Vec<ApplicationInstance>>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let rows = sqlx::query_as::<_, ApplicationInstance>(&format!(
            "{SELECT_INSTANCE} WHERE i.application_id = $1 ORDER BY i.instance_id"
        ))
        .bind(application_id)
        .fetch_all(executor)
        .await?;

        Ok(rows)
    }

    /// Write the network identity, metadata and status; `None` if the row is gone
    pub async fn update(&self, instance: &ApplicationInstance) -> Result<Option<ApplicationInstance>> {
        let row = sqlx::query_as::<_, ApplicationInstance>(
            r"
            WITH row AS (
                UPDATE app_instances
                SET instance_id = $2, host = $3, port = $4, secure = $5, uri = $6,
                    metadata = $7, status = $8, updated_at = NOW()
                WHERE id = $1
                RETURNING *
            )
            SELECT row.*, a.name AS service_id
            FROM row JOIN applications a ON a.id = row.application_id
            ",
        )
        .bind(instance.id)
        .bind(&instance.instance_id)
        .bind(&instance.host)
        .bind(instance.port)
        .bind(instance.secure)
        .bind(&instance.uri)
        .bind(&instance.metadata)
        .bind(instance.status)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM app_instances WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_many(&self, ids: &[i64]) -> Result<u64> {
        self.delete_many_with_executor(ids, &self.pool).await
    }

    pub async fn delete_many_with_executor<'e, E>(&self, ids: &[i64], executor: E) -> Result<u64>
    where
        E: sqlx::PgExecutor<'e>,
    {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query("DELETE FROM app_instances WHERE id = ANY($1)")
            .bind(ids)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::models::{Application, InstanceStatus, NewApplication, NewNamespace};
    use crate::repository::{ApplicationRepository, NamespaceRepository};
    use crate::test_helpers::{seed_cluster, test_pool, unique_name};

    async fn seed_application(pool: &PgPool, name: &str) -> Application {
        let cluster = seed_cluster(pool).await;
        let namespace = NamespaceRepository::new(pool.clone())
            .create(&NewNamespace::new(cluster.id, "public"))
            .await
            .unwrap();
        ApplicationRepository::new(pool.clone())
            .create(&NewApplication::new(namespace.id, name))
            .await
            .unwrap()
    }

    fn new_instance(application_id: i64, instance_id: &str, port: i32) -> NewInstance {
        NewInstance {
            application_id,
            instance_id: instance_id.to_string(),
            host: "10.0.0.1".to_string(),
            port,
            secure: false,
            uri: Some(format!("http://10.0.0.1:{port}")),
            metadata: json!({"zone": "a"}),
            status: InstanceStatus::Up,
            description: None,
        }
    }

    #[tokio::test]
    async fn test_delete_many_empty_is_noop() {
        let pool = PgPool::connect_lazy("postgresql://test").unwrap();
        let repo = InstanceRepository::new(pool);
        assert_eq!(repo.delete_many(&[]).await.unwrap(), 0);
    }

    #[tokio::test]
    #[ignore = "Requires database"]
    async fn test_rows_carry_application_name_as_service_id() {
        let pool = test_pool().await;
        let application = seed_application(&pool, "orders").await;
        let repo = InstanceRepository::new(pool);

        let created = repo
            .create(&new_instance(application.id, &unique_name("orders"), 8080))
            .await
            .unwrap();
        assert_eq!(created.service_id.as_deref(), Some("orders"));
        assert_eq!(created.metadata, json!({"zone": "a"}));

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
        let by_instance_id = repo.get_by_instance_id(&created.instance_id).await.unwrap();
        assert_eq!(by_instance_id, Some(created));
    }

    #[tokio::test]
    #[ignore = "Requires database"]
    async fn test_upsert_by_instance_id_moves_between_applications() {
        let pool = test_pool().await;
        let orders = seed_application(&pool, "orders").await;
        let billing = seed_application(&pool, "billing").await;
        let repo = InstanceRepository::new(pool);
        let instance_id = unique_name("shared");

        let first = repo.upsert(&new_instance(orders.id, &instance_id, 8080)).await.unwrap();
        let mut moved = new_instance(billing.id, &instance_id, 9090);
        moved.status = InstanceStatus::Down;
        let second = repo.upsert(&moved).await.unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.application_id, billing.id);
        assert_eq!(second.service_id.as_deref(), Some("billing"));
        assert_eq!(second.port, 9090);
        assert_eq!(second.status, InstanceStatus::Down);
        assert!(repo.list_all_by_application(orders.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    #[ignore = "Requires database"]
    async fn test_list_by_application_pages_and_counts() {
        let pool = test_pool().await;
        let application = seed_application(&pool, "orders").await;
        let repo = InstanceRepository::new(pool);
        let prefix = unique_name("orders");
        for port in [8081, 8082, 8083] {
            repo.create(&new_instance(application.id, &format!("{prefix}:{port}"), port))
                .await
                .unwrap();
        }

        let (rows, total) = repo
            .list_by_application(application.id, PageParams::new(Some(2), Some(2)))
            .await
            .unwrap();
        assert_eq!(total, 3);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].instance_id, format!("{prefix}:8083"));

        let ids: Vec<_> = repo
            .list_all_by_application(application.id)
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(repo.delete_many(&ids[..2]).await.unwrap(), 2);
        assert_eq!(repo.list_all_by_application(application.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    #[ignore = "Requires database"]
    async fn test_out_of_range_port_is_rejected_by_constraint() {
        let pool = test_pool().await;
        let application = seed_application(&pool, "orders").await;
        let repo = InstanceRepository::new(pool);

        let err = repo
            .create(&new_instance(application.id, &unique_name("orders"), 70000))
            .await
            .unwrap_err();
        assert!(matches!(err, crate::Error::InvalidInput(_)));
    }
}
