//! Nacos Open API response types

use std::collections::HashMap;

use serde::Deserialize;

/// Generic console API response wrapper
#[derive(Debug, Deserialize)]
pub struct NacosResult<T> {
    pub code: i64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<T>,
}

/// Response of `POST /v1/auth/login`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    /// Token lifetime in seconds
    #[serde(default)]
    pub token_ttl: u64,
    #[serde(default)]
    pub global_admin: bool,
}

/// One entry of `GET /v1/console/namespaces`
///
/// The built-in public namespace is reported with an empty id.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceInfo {
    #[serde(rename = "namespace", default)]
    pub namespace_id: String,
    #[serde(default)]
    pub namespace_show_name: String,
    #[serde(default)]
    pub namespace_desc: Option<String>,
    #[serde(default)]
    pub quota: i32,
    #[serde(default)]
    pub config_count: i32,
    #[serde(rename = "type", default)]
    pub r#type: i32,
}

/// Response of `GET /v1/ns/service/list`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ServiceNamePage {
    /// Total number of services in the namespace (all pages)
    #[serde(default)]
    pub count: u64,
    /// Service names on this page
    #[serde(default)]
    pub doms: Vec<String>,
}

/// Response of `GET /v1/ns/instance/list`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceList {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub hosts: Vec<NacosInstance>,
}

/// A registered service instance
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NacosInstance {
    #[serde(default)]
    pub instance_id: Option<String>,
    pub ip: String,
    pub port: u16,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub healthy: bool,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub cluster_name: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

const fn default_weight() -> f64 {
    1.0
}

const fn default_enabled() -> bool {
    true
}

impl NacosInstance {
    /// Whether the registry would route traffic to this instance
    #[must_use]
    pub const fn is_serving(&self) -> bool {
        self.healthy && self.enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_list_deserialize() {
        let json = r#"{
            "code": 200,
            "message": null,
            "data": [
                {"namespace": "", "namespaceShowName": "public", "quota": 200, "configCount": 3, "type": 0},
                {"namespace": "dev", "namespaceShowName": "Development", "namespaceDesc": "dev env", "quota": 200, "configCount": 0, "type": 2}
            ]
        }"#;
        let resp: NacosResult<Vec<NamespaceInfo>> = serde_json::from_str(json).unwrap();
        assert_eq!(resp.code, 200);
        let data = resp.data.unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0].namespace_id, "");
        assert_eq!(data[0].namespace_desc, None);
        assert_eq!(data[1].namespace_id, "dev");
        assert_eq!(data[1].namespace_desc.as_deref(), Some("dev env"));
        assert_eq!(data[1].r#type, 2);
    }

    #[test]
    fn test_instance_defaults() {
        let json = r#"{"hosts": [{"ip": "10.0.0.7", "port": 8080}]}"#;
        let list: InstanceList = serde_json::from_str(json).unwrap();
        let host = &list.hosts[0];
        assert_eq!(host.instance_id, None);
        assert!(host.enabled);
        assert!(!host.healthy);
        assert!(!host.is_serving());
        assert!((host.weight - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_service_page_missing_doms() {
        let page: ServiceNamePage = serde_json::from_str(r#"{"count": 0}"#).unwrap();
        assert!(page.doms.is_empty());
    }
}
