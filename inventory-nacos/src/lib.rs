// Nacos Open API client
//
// Pure HTTP client for the read-only parts of the Nacos v1 Open API that the
// inventory reconciler needs. Independent of the inventory data model so it
// can be used standalone.
//
// Architecture:
// - inventory-nacos: HTTP client + wire types
// - inventory-core/sync: RegistryClient adapter and reconciliation

pub mod client;
pub mod error;
pub mod types;

pub use client::{
    resolve_base_url, NacosClient, NacosClientConfig, DEFAULT_CONTEXT_PATH, DEFAULT_NAMESPACE_ID,
};
pub use error::NacosError;
pub use types::{InstanceList, LoginResponse, NacosInstance, NamespaceInfo, ServiceNamePage};
