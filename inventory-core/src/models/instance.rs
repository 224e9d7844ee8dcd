//! Application instance models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Instance health as last reported
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstanceStatus {
    Unknown,
    #[default]
    Up,
    Down,
    OutOfService,
}

impl InstanceStatus {
    const fn as_db_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Up => "up",
            Self::Down => "down",
            Self::OutOfService => "out_of_service",
        }
    }
}

impl std::fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_db_str())
    }
}

impl std::str::FromStr for InstanceStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "unknown" => Ok(Self::Unknown),
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            "out_of_service" => Ok(Self::OutOfService),
            _ => Err(anyhow::anyhow!("Invalid instance status: {s}")),
        }
    }
}

// Database mapping: InstanceStatus <-> TEXT
impl sqlx::Type<sqlx::Postgres> for InstanceStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

impl sqlx::Encode<'_, sqlx::Postgres> for InstanceStatus {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        <&str as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.as_db_str(), buf)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Postgres> for InstanceStatus {
    fn decode(
        value: sqlx::postgres::PgValueRef<'r>,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        s.parse().map_err(|e: anyhow::Error| e.into())
    }
}

/// Application instance model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ApplicationInstance {
    pub id: i64,
    /// Registry-wide unique id, `"{service_id}-{host}:{port}"` unless supplied
    pub instance_id: String,
    pub host: String,
    pub port: i32,
    pub secure: bool,
    pub uri: Option<String>,
    /// Always a JSON object
    pub metadata: Value,
    pub status: InstanceStatus,
    pub application_id: i64,
    /// Name of the owning application
    #[sqlx(default)]
    pub service_id: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ApplicationInstance {
    #[must_use]
    pub fn service_id(&self) -> Option<&str> {
        self.service_id.as_deref()
    }

    /// Scheme of `uri`, if it parses
    #[must_use]
    pub fn scheme(&self) -> Option<String> {
        self.uri
            .as_deref()
            .and_then(|uri| url::Url::parse(uri).ok())
            .map(|u| u.scheme().to_string())
    }

    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.secure || self.scheme().as_deref() == Some("https")
    }
}

/// Instance row to insert or upsert, keyed by `instance_id`
#[derive(Debug, Clone, PartialEq)]
pub struct NewInstance {
    pub application_id: i64,
    pub instance_id: String,
    pub host: String,
    pub port: i32,
    pub secure: bool,
    pub uri: Option<String>,
    pub metadata: Value,
    pub status: InstanceStatus,
    pub description: Option<String>,
}

/// Create instance request
#[derive(Debug, Clone, Deserialize)]
pub struct CreateInstanceRequest {
    pub application_id: i64,
    #[serde(default)]
    pub instance_id: Option<String>,
    pub host: String,
    pub port: i32,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
    #[serde(default)]
    pub status: InstanceStatus,
    #[serde(default)]
    pub description: Option<String>,
}

/// Update instance request
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateInstanceRequest {
    pub id: i64,
    pub instance_id: String,
    pub host: String,
    pub port: i32,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
    #[serde(default)]
    pub status: InstanceStatus,
}

/// A process announcing itself, used by `InventoryFacade::register`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceRegistration {
    /// Application name
    pub service_id: String,
    pub instance_id: Option<String>,
    pub host: String,
    pub port: u16,
    pub secure: bool,
    pub uri: Option<String>,
    pub metadata: HashMap<String, String>,
}

impl InstanceRegistration {
    #[must_use]
    pub fn new(service_id: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            service_id: service_id.into(),
            instance_id: None,
            host: host.into(),
            port,
            secure: false,
            uri: None,
            metadata: HashMap::new(),
        }
    }

    #[must_use]
    pub const fn scheme(&self) -> &'static str {
        if self.secure {
            "https"
        } else {
            "http"
        }
    }

    /// Supplied instance id, or `"{service_id}-{host}:{port}"`
    #[must_use]
    pub fn resolved_instance_id(&self) -> String {
        self.instance_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| format!("{}-{}:{}", self.service_id, self.host, self.port))
    }

    /// Supplied uri, or `"{scheme}://{host}:{port}"`
    #[must_use]
    pub fn resolved_uri(&self) -> String {
        self.uri
            .clone()
            .filter(|uri| !uri.trim().is_empty())
            .unwrap_or_else(|| format!("{}://{}:{}", self.scheme(), self.host, self.port))
    }
}
