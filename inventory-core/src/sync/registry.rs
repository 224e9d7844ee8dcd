//! Registry client seam
//!
//! The synchronizer only talks to a registry through `RegistryClient`, so the
//! paging and diffing logic can be driven by a mock in tests.

use async_trait::async_trait;
use inventory_nacos::{NacosClient, NacosInstance, NamespaceInfo, ServiceNamePage};
#[cfg(test)]
use mockall::automock;

use crate::Result;

/// Read-only view of a live service registry
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// All namespaces known to the registry
    async fn list_namespaces(&self) -> Result<Vec<NamespaceInfo>>;

    /// One page of service names (`page_no` starts at 1)
    async fn list_service_names(
        &self,
        namespace_id: &str,
        page_no: u32,
        page_size: u32,
    ) -> Result<ServiceNamePage>;

    /// Every instance of a service, healthy or not
    async fn list_instances(&self, namespace_id: &str, service_name: &str) -> Result<Vec<NacosInstance>>;
}

#[async_trait]
impl RegistryClient for NacosClient {
    async fn list_namespaces(&self) -> Result<Vec<NamespaceInfo>> {
        Ok(NacosClient::list_namespaces(self).await?)
    }

    async fn list_service_names(
        &self,
        namespace_id: &str,
        page_no: u32,
        page_size: u32,
    ) -> Result<ServiceNamePage> {
        Ok(NacosClient::list_service_names(self, namespace_id, None, page_no, page_size).await?)
    }

    async fn list_instances(&self, namespace_id: &str, service_name: &str) -> Result<Vec<NacosInstance>> {
        Ok(NacosClient::list_instances(self, namespace_id, service_name)
            .await?
            .hosts)
    }
}

/// Read every service name of a namespace, one page at a time
///
/// Stops once `count` names have been collected or a page comes back empty.
pub async fn collect_service_names(
    client: &dyn RegistryClient,
    namespace_id: &str,
    page_size: u32,
) -> Result<Vec<String>> {
    let page_size = page_size.max(1);
    let mut names = Vec::new();
    let mut page_no = 1;

    loop {
        let page = client
            .list_service_names(namespace_id, page_no, page_size)
            .await?;
        if page.doms.is_empty() {
            break;
        }

        names.extend(page.doms);
        if names.len() as u64 >= page.count {
            break;
        }
        page_no += 1;
    }

    Ok(names)
}
