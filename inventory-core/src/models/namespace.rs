//! Namespace models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Namespace lifecycle status
///
/// `Unknown` marks a namespace the registry no longer reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NamespaceStatus {
    #[default]
    Active,
    Inactive,
    Unknown,
}

impl NamespaceStatus {
    const fn as_db_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for NamespaceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_db_str())
    }
}

impl std::str::FromStr for NamespaceStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "unknown" => Ok(Self::Unknown),
            _ => Err(anyhow::anyhow!("Invalid namespace status: {s}")),
        }
    }
}

// Database mapping: NamespaceStatus <-> TEXT
impl sqlx::Type<sqlx::Postgres> for NamespaceStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

impl sqlx::Encode<'_, sqlx::Postgres> for NamespaceStatus {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        <&str as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.as_db_str(), buf)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Postgres> for NamespaceStatus {
    fn decode(
        value: sqlx::postgres::PgValueRef<'r>,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        s.parse().map_err(|e: anyhow::Error| e.into())
    }
}

/// Namespace model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Namespace {
    pub id: i64,
    pub name: String,
    pub status: NamespaceStatus,
    pub cluster_id: i64,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Namespace row to insert or upsert, keyed by `(cluster_id, name)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNamespace {
    pub cluster_id: i64,
    pub name: String,
    pub status: NamespaceStatus,
    pub description: Option<String>,
}

impl NewNamespace {
    #[must_use]
    pub fn new(cluster_id: i64, name: impl Into<String>) -> Self {
        Self {
            cluster_id,
            name: name.into(),
            status: NamespaceStatus::Active,
            description: None,
        }
    }
}

impl From<Namespace> for NewNamespace {
    fn from(ns: Namespace) -> Self {
        Self {
            cluster_id: ns.cluster_id,
            name: ns.name,
            status: ns.status,
            description: ns.description,
        }
    }
}

/// Create namespace request
#[derive(Debug, Clone, Deserialize)]
pub struct CreateNamespaceRequest {
    pub cluster_id: i64,
    pub name: String,
    #[serde(default)]
    pub status: NamespaceStatus,
    #[serde(default)]
    pub description: Option<String>,
}

/// Update namespace request
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateNamespaceRequest {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub status: NamespaceStatus,
    #[serde(default)]
    pub description: Option<String>,
}
