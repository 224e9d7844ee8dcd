//! Cluster models
//!
//! A cluster is one service-discovery backend (a Nacos server, a Consul
//! datacenter, a Kubernetes API server...) identified by its URL.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of service-discovery backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClusterType {
    Kubernetes,
    #[default]
    Nacos,
    Eureka,
    Zookeeper,
    Consul,
}

impl ClusterType {
    pub const ALL: [Self; 5] = [
        Self::Kubernetes,
        Self::Nacos,
        Self::Eureka,
        Self::Zookeeper,
        Self::Consul,
    ];

    /// Human readable product name
    #[must_use]
    pub const fn value(self) -> &'static str {
        match self {
            Self::Kubernetes => "Kubernetes",
            Self::Nacos => "Nacos",
            Self::Eureka => "Eureka",
            Self::Zookeeper => "Zookeeper",
            Self::Consul => "Consul",
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Kubernetes => "Kubernetes service discovery",
            Self::Nacos => "Alibaba Nacos naming service",
            Self::Eureka => "Netflix Eureka registry",
            Self::Zookeeper => "Apache Zookeeper",
            Self::Consul => "HashiCorp Consul catalog",
        }
    }

    #[must_use]
    pub const fn logo(self) -> &'static str {
        match self {
            Self::Kubernetes => "https://kubernetes.io/images/wheel.svg",
            Self::Nacos => "https://img.alicdn.com/imgextra/i1/O1CN01YjDURc26ODF5FQt4d_!!6000000007651-55-tps-123-24.svg",
            Self::Eureka => "eureka.png",
            Self::Zookeeper => "https://zookeeper.apache.org/images/zookeeper_small.gif",
            Self::Consul => "https://djeqr6to3dedg.cloudfront.net/repo-logos/library/consul/live/logo.png",
        }
    }

    /// Whether a live registry adapter exists for this type
    #[must_use]
    pub const fn is_syncable(self) -> bool {
        matches!(self, Self::Nacos)
    }

    const fn as_db_str(self) -> &'static str {
        match self {
            Self::Kubernetes => "kubernetes",
            Self::Nacos => "nacos",
            Self::Eureka => "eureka",
            Self::Zookeeper => "zookeeper",
            Self::Consul => "consul",
        }
    }
}

impl std::fmt::Display for ClusterType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_db_str())
    }
}

impl std::str::FromStr for ClusterType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "kubernetes" => Ok(Self::Kubernetes),
            "nacos" => Ok(Self::Nacos),
            "eureka" => Ok(Self::Eureka),
            "zookeeper" => Ok(Self::Zookeeper),
            "consul" => Ok(Self::Consul),
            _ => Err(anyhow::anyhow!("Invalid cluster type: {s}")),
        }
    }
}

// Database mapping: ClusterType <-> TEXT
impl sqlx::Type<sqlx::Postgres> for ClusterType {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

impl sqlx::Encode<'_, sqlx::Postgres> for ClusterType {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        <&str as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.as_db_str(), buf)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Postgres> for ClusterType {
    fn decode(
        value: sqlx::postgres::PgValueRef<'r>,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        s.parse().map_err(|e: anyhow::Error| e.into())
    }
}

/// Cluster model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Cluster {
    pub id: i64,
    pub name: String,
    pub cluster_type: ClusterType,
    pub url: String,
    pub username: Option<String>,
    /// Never returned over the API
    #[serde(skip_serializing, default)]
    pub password: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Cluster row to insert or upsert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCluster {
    pub name: String,
    pub cluster_type: ClusterType,
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub description: Option<String>,
}

impl NewCluster {
    #[must_use]
    pub fn new(name: impl Into<String>, cluster_type: ClusterType, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cluster_type,
            url: url.into(),
            username: None,
            password: None,
            description: None,
        }
    }
}

/// Create cluster request
#[derive(Debug, Clone, Deserialize)]
pub struct CreateClusterRequest {
    pub name: String,
    #[serde(rename = "type", alias = "cluster_type")]
    pub cluster_type: ClusterType,
    pub url: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl From<CreateClusterRequest> for NewCluster {
    fn from(req: CreateClusterRequest) -> Self {
        Self {
            name: req.name,
            cluster_type: req.cluster_type,
            url: req.url,
            username: req.username,
            password: req.password,
            description: req.description,
        }
    }
}

/// Update cluster request
///
/// Credentials are only replaced when supplied.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateClusterRequest {
    pub id: i64,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}
