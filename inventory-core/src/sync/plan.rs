//! Pure diffing of local rows against a registry listing
//!
//! Nothing here touches the database or the network; the synchronizer feeds
//! in both sides and applies the resulting plan inside one transaction.

use std::collections::{HashMap, HashSet};

use inventory_nacos::{NacosInstance, NamespaceInfo, DEFAULT_NAMESPACE_ID};

use crate::models::{
    Application, ApplicationInstance, InstanceStatus, Namespace, NamespaceStatus, NewInstance,
    NewNamespace,
};

/// Registry namespace id, with the built-in empty id mapped to `public`
#[must_use]
pub fn resolve_namespace_id(info: &NamespaceInfo) -> &str {
    if info.namespace_id.trim().is_empty() {
        DEFAULT_NAMESPACE_ID
    } else {
        &info.namespace_id
    }
}

/// Namespace rows to save for one cluster
///
/// Locally `ACTIVE` namespaces still reported remotely are kept as they are,
/// unseen remote namespaces are added as `ACTIVE`, and locally `ACTIVE`
/// namespaces the registry no longer reports become `UNKNOWN`.
#[must_use]
pub fn plan_namespaces(
    cluster_id: i64,
    local_active: Vec<Namespace>,
    remote: &[NamespaceInfo],
) -> Vec<NewNamespace> {
    let mut local: HashMap<String, Namespace> = local_active
        .into_iter()
        .map(|ns| (ns.name.clone(), ns))
        .collect();
    let mut seen = HashSet::new();
    let mut planned = Vec::with_capacity(remote.len() + local.len());

    for info in remote {
        let name = resolve_namespace_id(info);
        if !seen.insert(name.to_string()) {
            continue;
        }

        match local.remove(name) {
            Some(existing) => planned.push(NewNamespace::from(existing)),
            None => planned.push(NewNamespace {
                cluster_id,
                name: name.to_string(),
                status: NamespaceStatus::Active,
                description: info.namespace_desc.clone().filter(|d| !d.is_empty()),
            }),
        }
    }

    let mut stale: Vec<_> = local.into_values().collect();
    stale.sort_by(|a, b| a.name.cmp(&b.name));
    planned.extend(stale.into_iter().map(|ns| NewNamespace {
        status: NamespaceStatus::Unknown,
        ..NewNamespace::from(ns)
    }));

    planned
}

/// Application changes for one namespace
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationPlan {
    /// Local applications absent from the registry
    pub delete_ids: Vec<i64>,
    /// Every remote service name, deduplicated, in listing order
    pub upsert_names: Vec<String>,
}

#[must_use]
pub fn plan_applications(local: &[Application], remote_names: &[String]) -> ApplicationPlan {
    let mut seen = HashSet::new();
    let upsert_names: Vec<String> = remote_names
        .iter()
        .filter(|name| !name.trim().is_empty() && seen.insert(name.as_str()))
        .cloned()
        .collect();

    let delete_ids = local
        .iter()
        .filter(|app| !seen.contains(app.name.as_str()))
        .map(|app| app.id)
        .collect();

    ApplicationPlan {
        delete_ids,
        upsert_names,
    }
}

/// Instance changes for one application
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstancePlan {
    pub delete_ids: Vec<i64>,
    pub upserts: Vec<NewInstance>,
}

/// Map a registry instance onto an inventory row of `application_id`
#[must_use]
pub fn instance_from_registry(application_id: i64, service_name: &str, remote: &NacosInstance) -> NewInstance {
    let instance_id = remote
        .instance_id
        .clone()
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| format!("{service_name}-{}:{}", remote.ip, remote.port));
    let secure = remote
        .metadata
        .get("secure")
        .is_some_and(|v| v.eq_ignore_ascii_case("true"));
    let scheme = if secure { "https" } else { "http" };
    let metadata = remote
        .metadata
        .iter()
        .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
        .collect::<serde_json::Map<_, _>>();

    NewInstance {
        application_id,
        instance_id,
        host: remote.ip.clone(),
        port: i32::from(remote.port),
        secure,
        uri: Some(format!("{scheme}://{}:{}", remote.ip, remote.port)),
        metadata: serde_json::Value::Object(metadata),
        status: if remote.is_serving() {
            InstanceStatus::Up
        } else {
            InstanceStatus::Down
        },
        description: None,
    }
}

#[must_use]
pub fn plan_instances(
    application_id: i64,
    service_name: &str,
    local: &[ApplicationInstance],
    remote: &[NacosInstance],
) -> InstancePlan {
    let mut seen = HashSet::new();
    let upserts: Vec<NewInstance> = remote
        .iter()
        .map(|r| instance_from_registry(application_id, service_name, r))
        .filter(|i| seen.insert(i.instance_id.clone()))
        .collect();

    let delete_ids = local
        .iter()
        .filter(|i| !seen.contains(&i.instance_id))
        .map(|i| i.id)
        .collect();

    InstancePlan { delete_ids, upserts }
}
