//! Application models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Application model
///
/// A named service inside a namespace; the name doubles as the service id of
/// its instances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Application {
    pub id: i64,
    pub name: String,
    pub namespace_id: i64,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Application row to insert or upsert, keyed by `(namespace_id, name)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewApplication {
    pub namespace_id: i64,
    pub name: String,
    pub description: Option<String>,
}

impl NewApplication {
    #[must_use]
    pub fn new(namespace_id: i64, name: impl Into<String>) -> Self {
        Self {
            namespace_id,
            name: name.into(),
            description: None,
        }
    }
}

/// Create application request
#[derive(Debug, Clone, Deserialize)]
pub struct CreateApplicationRequest {
    pub namespace_id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Update application request
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateApplicationRequest {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}
