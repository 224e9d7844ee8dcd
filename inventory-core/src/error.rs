use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Registry error: {0}")]
    Registry(#[from] inventory_nacos::NacosError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// `NotFound` for an entity kind and id, e.g. "Cluster 7 not found"
    #[must_use]
    pub fn not_found(kind: &str, id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{kind} {id} not found"))
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            // Map "no rows" to NotFound
            sqlx::Error::RowNotFound => Self::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().unwrap_or_default();
                match code.as_ref() {
                    // PostgreSQL unique_violation
                    "23505" => {
                        let constraint = db_err.constraint().unwrap_or_default();
                        if constraint.starts_with("app_clusters") {
                            Self::AlreadyExists("Cluster name already taken".to_string())
                        } else if constraint.starts_with("app_namespaces") {
                            Self::AlreadyExists("Namespace already exists in this cluster".to_string())
                        } else if constraint.starts_with("applications") {
                            Self::AlreadyExists("Application already exists in this namespace".to_string())
                        } else if constraint.starts_with("app_instances") {
                            Self::AlreadyExists("Instance id already registered".to_string())
                        } else {
                            Self::AlreadyExists("Resource already exists".to_string())
                        }
                    }
                    // PostgreSQL foreign_key_violation
                    "23503" => Self::NotFound("Referenced resource not found".to_string()),
                    // PostgreSQL check_violation
                    "23514" => Self::InvalidInput("Constraint check failed".to_string()),
                    // PostgreSQL not_null_violation
                    "23502" => Self::InvalidInput("Required field is missing".to_string()),
                    _ => Self::Database(err),
                }
            }
            _ => Self::Database(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err: Error = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_pool_errors_stay_database() {
        let err: Error = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, Error::Database(_)));
    }

    #[test]
    fn test_not_found_message() {
        assert_eq!(
            Error::not_found("Cluster", 7).to_string(),
            "Not found: Cluster 7 not found"
        );
    }

    #[test]
    fn test_registry_error_conversion() {
        let err: Error = inventory_nacos::NacosError::InvalidUrl("bad".to_string()).into();
        assert!(matches!(err, Error::Registry(_)));
    }
}
