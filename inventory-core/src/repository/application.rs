use sqlx::PgPool;

use crate::{
    models::{Application, NewApplication, PageParams},
    Result,
};

/// Application repository for database operations
#[derive(Clone)]
pub struct ApplicationRepository {
    pool: PgPool,
}

impl std::fmt::Debug for ApplicationRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationRepository")
            .field("pool", &"PgPool")
            .finish()
    }
}

impl ApplicationRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, application: &NewApplication) -> Result<Application> {
        let row = sqlx::query_as::<_, Application>(
            r"
            INSERT INTO applications (namespace_id, name, description)
            VALUES ($1, $2, $3)
            RETURNING *
            ",
        )
        .bind(application.namespace_id)
        .bind(&application.name)
        .bind(&application.description)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn upsert(&self, application: &NewApplication) -> Result<Application> {
        self.upsert_with_executor(application, &self.pool).await
    }

    /// Insert, or overwrite the description of the application with the same
    /// `(namespace_id, name)`, using a provided executor (pool or transaction)
    pub async fn upsert_with_executor<'e, E>(&self, application: &NewApplication, executor: E) -> Result<Application>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let row = sqlx::query_as::<_, Application>(
            r"
            INSERT INTO applications (namespace_id, name, description)
            VALUES ($1, $2, $3)
            ON CONFLICT (namespace_id, name) DO UPDATE
            SET description = COALESCE(EXCLUDED.description, applications.description),
                updated_at = NOW()
            RETURNING *
            ",
        )
        .bind(application.namespace_id)
        .bind(&application.name)
        .bind(&application.description)
        .fetch_one(executor)
        .await?;

        Ok(row)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Application>> {
        let row = sqlx::query_as::<_, Application>("SELECT * FROM applications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    pub async fn get_by_namespace_and_name(&self, namespace_id: i64, name: &str) -> Result<Option<Application>> {
        let row = sqlx::query_as::<_, Application>(
            "SELECT * FROM applications WHERE namespace_id = $1 AND name = $2",
        )
        .bind(namespace_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn list(&self) -> Result<Vec<Application>> {
        let rows = sqlx::query_as::<_, Application>("SELECT * FROM applications ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// One page of a namespace's applications, with the total count
    pub async fn list_by_namespace(
        &self,
        namespace_id: i64,
        page: PageParams,
    ) -> Result<(Vec<Application>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM applications WHERE namespace_id = $1")
            .bind(namespace_id)
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, Application>(
            r"
            SELECT * FROM applications
            WHERE namespace_id = $1
            ORDER BY name
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(namespace_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((rows, total))
    }

    pub async fn list_all_by_namespace(&self, namespace_id: i64) -> Result<Vec<Application>> {
        self.list_all_by_namespace_with_executor(namespace_id, &self.pool).await
    }

    pub async fn list_all_by_namespace_with_executor<'e, E>(
        &self,
        namespace_id: i64,
        executor: E,
    ) -> Result<Vec<Application>>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let rows = sqlx::query_as::<_, Application>(
            "SELECT * FROM applications WHERE namespace_id = $1 ORDER BY name",
        )
        .bind(namespace_id)
        .fetch_all(executor)
        .await?;

        Ok(rows)
    }

    /// Write name and description; `None` if the row is gone
    pub async fn update(&self, application: &Application) -> Result<Option<Application>> {
        let row = sqlx::query_as::<_, Application>(
            r"
            UPDATE applications
            SET name = $2, description = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            ",
        )
        .bind(application.id)
        .bind(&application.name)
        .bind(&application.description)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM applications WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_many(&self, ids: &[i64]) -> Result<u64> {
        self.delete_many_with_executor(ids, &self.pool).await
    }

    /// Delete by id list, returning the number of rows removed
    pub async fn delete_many_with_executor<'e, E>(&self, ids: &[i64], executor: E) -> Result<u64>
    where
        E: sqlx::PgExecutor<'e>,
    {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query("DELETE FROM applications WHERE id = ANY($1)")
            .bind(ids)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }
}
