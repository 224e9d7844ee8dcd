//! Nacos reconciliation
//!
//! For each Nacos cluster the synchronizer first reads everything it needs
//! from the registry, then applies the namespace, application and instance
//! plans in a single transaction. A registry failure therefore changes
//! nothing, and a database failure rolls the whole cluster back.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use inventory_nacos::{NacosClient, NacosClientConfig, NacosInstance, NamespaceInfo};
use sqlx::PgPool;
use tracing::{debug, error, info, warn};

use super::plan::{plan_applications, plan_instances, plan_namespaces, resolve_namespace_id};
use super::registry::{collect_service_names, RegistryClient};
use crate::{
    config::NacosSyncConfig,
    models::{Cluster, ClusterType, NamespaceStatus, NewApplication},
    repository::{ApplicationRepository, ClusterRepository, InstanceRepository, NamespaceRepository},
    Error, Result,
};

/// Builds a registry client for a cluster on first use of its URL
pub type ClientFactory = dyn Fn(&Cluster) -> Result<Arc<dyn RegistryClient>> + Send + Sync;

/// Runtime knobs taken from `NacosSyncConfig`
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub page_size: u32,
    pub context_path: String,
    pub request_timeout: Duration,
    pub sync_instances: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            page_size: 100,
            context_path: inventory_nacos::DEFAULT_CONTEXT_PATH.to_string(),
            request_timeout: Duration::from_secs(30),
            sync_instances: false,
        }
    }
}

impl TryFrom<&NacosSyncConfig> for SyncSettings {
    type Error = Error;

    fn try_from(config: &NacosSyncConfig) -> Result<Self> {
        Ok(Self {
            page_size: config.page_size,
            context_path: config.context_path.clone(),
            request_timeout: config.request_timeout().map_err(Error::InvalidInput)?,
            sync_instances: config.sync_instances,
        })
    }
}

/// Counters from one cluster reconciliation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct ClusterSyncStats {
    pub namespaces_active: usize,
    pub namespaces_unknown: usize,
    pub applications_upserted: usize,
    pub applications_deleted: u64,
    pub instances_upserted: usize,
    pub instances_deleted: u64,
}

/// Outcome of a `sync_all` pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub synced: usize,
    pub failed: usize,
}

/// Registry data for one namespace, fetched before any write
struct RemoteNamespace {
    name: String,
    services: Vec<RemoteService>,
}

struct RemoteService {
    name: String,
    instances: Vec<NacosInstance>,
}

pub struct NacosSynchronizer {
    pool: PgPool,
    clusters: ClusterRepository,
    namespaces: NamespaceRepository,
    applications: ApplicationRepository,
    instances: InstanceRepository,
    settings: SyncSettings,
    clients: DashMap<String, Arc<dyn RegistryClient>>,
    factory: Box<ClientFactory>,
}

impl std::fmt::Debug for NacosSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NacosSynchronizer")
            .field("settings", &self.settings)
            .field("cached_clients", &self.clients.len())
            .finish_non_exhaustive()
    }
}

impl NacosSynchronizer {
    /// Synchronizer backed by real Nacos HTTP clients
    #[must_use]
    pub fn new(pool: PgPool, settings: SyncSettings) -> Self {
        let context_path = settings.context_path.clone();
        let timeout = settings.request_timeout;
        let factory = move |cluster: &Cluster| -> Result<Arc<dyn RegistryClient>> {
            let mut config = NacosClientConfig::new(&cluster.url)
                .with_context_path(context_path.clone())
                .with_timeout(timeout);
            config.username.clone_from(&cluster.username);
            config.password.clone_from(&cluster.password);
            Ok(Arc::new(NacosClient::new(config)?))
        };

        Self::with_client_factory(pool, settings, Box::new(factory))
    }

    #[must_use]
    pub fn with_client_factory(pool: PgPool, settings: SyncSettings, factory: Box<ClientFactory>) -> Self {
        Self {
            clusters: ClusterRepository::new(pool.clone()),
            namespaces: NamespaceRepository::new(pool.clone()),
            applications: ApplicationRepository::new(pool.clone()),
            instances: InstanceRepository::new(pool.clone()),
            pool,
            settings,
            clients: DashMap::new(),
            factory,
        }
    }

    /// Cached client for the cluster's URL, created on first use
    pub fn client_for(&self, cluster: &Cluster) -> Result<Arc<dyn RegistryClient>> {
        if let Some(client) = self.clients.get(&cluster.url) {
            return Ok(client.clone());
        }

        let entry = self.clients.entry(cluster.url.clone());
        let client = match entry {
            dashmap::mapref::entry::Entry::Occupied(e) => e.get().clone(),
            dashmap::mapref::entry::Entry::Vacant(e) => {
                let client = (self.factory)(cluster)?;
                debug!(url = %cluster.url, "Registry client created");
                e.insert(client).clone()
            }
        };

        Ok(client)
    }

    /// Drop the cached client for a URL so the next sync picks up new credentials
    pub fn invalidate_client(&self, url: &str) {
        self.clients.remove(url);
    }

    #[must_use]
    pub fn cached_clients(&self) -> usize {
        self.clients.len()
    }

    /// Reconcile every Nacos cluster; one cluster failing does not stop the rest
    pub async fn sync_all(&self) -> Result<SyncSummary> {
        let clusters = self.clusters.list_by_type(ClusterType::Nacos).await?;
        let mut summary = SyncSummary::default();

        for cluster in &clusters {
            match self.sync_cluster(cluster).await {
                Ok(stats) => {
                    summary.synced += 1;
                    info!(cluster_id = cluster.id, cluster = %cluster.name, ?stats, "Cluster synchronized");
                }
                Err(e) => {
                    summary.failed += 1;
                    error!(cluster_id = cluster.id, cluster = %cluster.name, error = %e, "Cluster synchronization failed");
                }
            }
        }

        Ok(summary)
    }

    /// Reconcile one cluster by id
    pub async fn sync_cluster_by_id(&self, cluster_id: i64) -> Result<ClusterSyncStats> {
        let cluster = self
            .clusters
            .get_by_id(cluster_id)
            .await?
            .ok_or_else(|| Error::not_found("Cluster", cluster_id))?;

        self.sync_cluster(&cluster).await
    }

    /// Reconcile one cluster against its registry
    pub async fn sync_cluster(&self, cluster: &Cluster) -> Result<ClusterSyncStats> {
        if !cluster.cluster_type.is_syncable() {
            return Err(Error::InvalidInput(format!(
                "Cluster '{}' is of type {}, only Nacos clusters can be synchronized",
                cluster.name,
                cluster.cluster_type.value()
            )));
        }

        let client = self.client_for(cluster)?;
        let remote_namespaces = client.list_namespaces().await?;
        let remote = self.fetch_remote(client.as_ref(), &remote_namespaces).await?;

        self.apply(cluster, &remote_namespaces, remote).await
    }

    async fn fetch_remote(
        &self,
        client: &dyn RegistryClient,
        namespaces: &[NamespaceInfo],
    ) -> Result<Vec<RemoteNamespace>> {
        let mut remote = Vec::with_capacity(namespaces.len());

        for info in namespaces {
            let namespace_id = resolve_namespace_id(info);
            let names = collect_service_names(client, namespace_id, self.settings.page_size).await?;

            let mut services = Vec::with_capacity(names.len());
            for name in names {
                let instances = if self.settings.sync_instances {
                    client.list_instances(namespace_id, &name).await?
                } else {
                    Vec::new()
                };
                services.push(RemoteService { name, instances });
            }

            remote.push(RemoteNamespace {
                name: namespace_id.to_string(),
                services,
            });
        }

        Ok(remote)
    }

    async fn apply(
        &self,
        cluster: &Cluster,
        remote_namespaces: &[NamespaceInfo],
        remote: Vec<RemoteNamespace>,
    ) -> Result<ClusterSyncStats> {
        let mut stats = ClusterSyncStats::default();
        let mut tx = self.pool.begin().await?;

        let local_active = self
            .namespaces
            .list_by_cluster_and_status_with_executor(cluster.id, NamespaceStatus::Active, &mut *tx)
            .await?;
        let planned = plan_namespaces(cluster.id, local_active, remote_namespaces);

        let mut by_name: std::collections::HashMap<String, RemoteNamespace> =
            remote.into_iter().map(|ns| (ns.name.clone(), ns)).collect();

        for new_namespace in &planned {
            let namespace = self
                .namespaces
                .upsert_with_executor(new_namespace, &mut *tx)
                .await?;

            if namespace.status != NamespaceStatus::Active {
                stats.namespaces_unknown += 1;
                continue;
            }
            stats.namespaces_active += 1;

            let services = by_name
                .remove(&namespace.name)
                .map(|ns| ns.services)
                .unwrap_or_default();
            self.apply_applications(namespace.id, services, &mut tx, &mut stats)
                .await?;
        }

        tx.commit().await?;
        Ok(stats)
    }

    async fn apply_applications(
        &self,
        namespace_id: i64,
        services: Vec<RemoteService>,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        stats: &mut ClusterSyncStats,
    ) -> Result<()> {
        let local = self
            .applications
            .list_all_by_namespace_with_executor(namespace_id, &mut **tx)
            .await?;
        let names: Vec<String> = services.iter().map(|s| s.name.clone()).collect();
        let plan = plan_applications(&local, &names);

        stats.applications_deleted += self
            .applications
            .delete_many_with_executor(&plan.delete_ids, &mut **tx)
            .await?;

        let mut instances_by_service: std::collections::HashMap<String, Vec<NacosInstance>> =
            services.into_iter().map(|s| (s.name, s.instances)).collect();

        for name in &plan.upsert_names {
            let application = self
                .applications
                .upsert_with_executor(&NewApplication::new(namespace_id, name), &mut **tx)
                .await?;
            stats.applications_upserted += 1;

            if !self.settings.sync_instances {
                continue;
            }

            let remote = instances_by_service.remove(name).unwrap_or_default();
            let local = self
                .instances
                .list_all_by_application_with_executor(application.id, &mut **tx)
                .await?;
            let plan = plan_instances(application.id, name, &local, &remote);

            stats.instances_deleted += self
                .instances
                .delete_many_with_executor(&plan.delete_ids, &mut **tx)
                .await?;
            for instance in &plan.upserts {
                self.instances
                    .upsert_with_executor(instance, &mut **tx)
                    .await?;
                stats.instances_upserted += 1;
            }
        }

        Ok(())
    }

    /// Run `sync_cluster` in the background, e.g. right after an API write
    pub fn spawn_sync(self: &Arc<Self>, cluster: Cluster) -> Option<tokio::task::JoinHandle<()>> {
        if !cluster.cluster_type.is_syncable() {
            return None;
        }

        self.invalidate_client(&cluster.url);
        let synchronizer = Arc::clone(self);
        Some(tokio::spawn(async move {
            match synchronizer.sync_cluster(&cluster).await {
                Ok(stats) => info!(cluster_id = cluster.id, ?stats, "Background cluster sync finished"),
                Err(e) => warn!(cluster_id = cluster.id, error = %e, "Background cluster sync failed"),
            }
        }))
    }

    /// Release every cached registry client
    pub fn shutdown(&self) {
        let count = self.clients.len();
        self.clients.clear();
        debug!(count, "Registry clients released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewNamespace;
    use crate::sync::registry::MockRegistryClient;
    use crate::test_helpers::{seed_cluster, test_pool};
    use chrono::Utc;
    use inventory_nacos::ServiceNamePage;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn cluster(id: i64, url: &str, cluster_type: ClusterType) -> Cluster {
        Cluster {
            id,
            name: format!("cluster-{id}"),
            cluster_type,
            url: url.to_string(),
            username: None,
            password: None,
            description: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn counting_synchronizer(created: Arc<AtomicUsize>) -> NacosSynchronizer {
        let pool = PgPool::connect_lazy("postgresql://test").unwrap();
        let factory = move |_: &Cluster| -> Result<Arc<dyn RegistryClient>> {
            created.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(MockRegistryClient::new()))
        };
        NacosSynchronizer::with_client_factory(pool, SyncSettings::default(), Box::new(factory))
    }

    #[tokio::test]
    async fn test_client_cache_is_keyed_by_url() {
        let created = Arc::new(AtomicUsize::new(0));
        let sync = counting_synchronizer(created.clone());

        sync.client_for(&cluster(1, "http://a:8848", ClusterType::Nacos)).unwrap();
        sync.client_for(&cluster(2, "http://a:8848", ClusterType::Nacos)).unwrap();
        sync.client_for(&cluster(3, "http://b:8848", ClusterType::Nacos)).unwrap();

        assert_eq!(created.load(Ordering::SeqCst), 2);
        assert_eq!(sync.cached_clients(), 2);
    }

    #[tokio::test]
    async fn test_invalidate_and_shutdown_clear_cache() {
        let created = Arc::new(AtomicUsize::new(0));
        let sync = counting_synchronizer(created.clone());
        let a = cluster(1, "http://a:8848", ClusterType::Nacos);

        sync.client_for(&a).unwrap();
        sync.invalidate_client(&a.url);
        sync.client_for(&a).unwrap();
        assert_eq!(created.load(Ordering::SeqCst), 2);

        sync.shutdown();
        assert_eq!(sync.cached_clients(), 0);
    }

    #[tokio::test]
    async fn test_non_nacos_cluster_is_rejected() {
        let created = Arc::new(AtomicUsize::new(0));
        let sync = counting_synchronizer(created.clone());

        let err = sync
            .sync_cluster(&cluster(1, "http://consul:8500", ClusterType::Consul))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(created.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_registry_failure_happens_before_any_write() {
        let pool = PgPool::connect_lazy("postgresql://test").unwrap();
        let factory = |_: &Cluster| -> Result<Arc<dyn RegistryClient>> {
            let mut client = MockRegistryClient::new();
            client.expect_list_namespaces().times(1).returning(|| {
                Err(inventory_nacos::NacosError::Network("connection refused".to_string()).into())
            });
            Ok(Arc::new(client))
        };
        let sync = NacosSynchronizer::with_client_factory(pool, SyncSettings::default(), Box::new(factory));

        // The lazy pool would fail to connect; a Registry error proves the
        // transaction was never opened.
        let err = sync
            .sync_cluster(&cluster(1, "http://a:8848", ClusterType::Nacos))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Registry(_)));
    }

    fn remote_namespace(id: &str) -> NamespaceInfo {
        NamespaceInfo {
            namespace_id: id.to_string(),
            namespace_show_name: id.to_string(),
            namespace_desc: None,
            quota: 200,
            config_count: 0,
            r#type: 2,
        }
    }

    /// Synchronizer whose registry reports `remote` as (namespace id, service names)
    fn registry_synchronizer(
        pool: PgPool,
        settings: SyncSettings,
        remote: Vec<(&'static str, Vec<String>)>,
        instances: Vec<NacosInstance>,
    ) -> NacosSynchronizer {
        let factory = move |_: &Cluster| -> Result<Arc<dyn RegistryClient>> {
            let mut client = MockRegistryClient::new();
            let namespaces: Vec<NamespaceInfo> = remote.iter().map(|(id, _)| remote_namespace(id)).collect();
            client
                .expect_list_namespaces()
                .returning(move || Ok(namespaces.clone()));
            let services = remote.clone();
            client
                .expect_list_service_names()
                .returning(move |namespace_id, _, _| {
                    let doms = services
                        .iter()
                        .find(|(id, _)| *id == namespace_id || (id.is_empty() && namespace_id == "public"))
                        .map(|(_, names)| names.clone())
                        .unwrap_or_default();
                    Ok(ServiceNamePage { count: doms.len() as u64, doms })
                });
            let hosts = instances.clone();
            client
                .expect_list_instances()
                .returning(move |_, _| Ok(hosts.clone()));
            Ok(Arc::new(client))
        };
        NacosSynchronizer::with_client_factory(pool, settings, Box::new(factory))
    }

    async fn application_names(pool: &PgPool, namespace_id: i64) -> Vec<String> {
        let mut names: Vec<String> = ApplicationRepository::new(pool.clone())
            .list_all_by_namespace(namespace_id)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.name)
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    #[ignore = "Requires database"]
    async fn test_sync_reconciles_namespaces_and_applications() {
        let pool = test_pool().await;
        let cluster = seed_cluster(&pool).await;
        let namespaces = NamespaceRepository::new(pool.clone());
        let applications = ApplicationRepository::new(pool.clone());

        let legacy = namespaces.create(&NewNamespace::new(cluster.id, "legacy")).await.unwrap();
        let public = namespaces.create(&NewNamespace::new(cluster.id, "public")).await.unwrap();
        applications.create(&NewApplication::new(public.id, "old")).await.unwrap();
        let orders = applications.create(&NewApplication::new(public.id, "orders")).await.unwrap();

        let sync = registry_synchronizer(
            pool.clone(),
            SyncSettings::default(),
            vec![
                ("", vec!["orders".to_string(), "payments".to_string()]),
                ("dev", vec!["carts".to_string()]),
            ],
            Vec::new(),
        );
        let stats = sync.sync_cluster(&cluster).await.unwrap();

        assert_eq!(stats.namespaces_active, 2);
        assert_eq!(stats.namespaces_unknown, 1);
        assert_eq!(stats.applications_deleted, 1);

        let legacy = namespaces.get_by_id(legacy.id).await.unwrap().unwrap();
        assert_eq!(legacy.status, NamespaceStatus::Unknown);
        assert_eq!(application_names(&pool, public.id).await, ["orders", "payments"]);
        // Surviving applications keep their rows
        assert!(applications.get_by_id(orders.id).await.unwrap().is_some());

        let dev = namespaces
            .get_by_cluster_and_name(cluster.id, "dev")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(dev.status, NamespaceStatus::Active);
        assert_eq!(application_names(&pool, dev.id).await, ["carts"]);
    }

    #[tokio::test]
    #[ignore = "Requires database"]
    async fn test_sync_writes_instances_when_enabled() {
        let pool = test_pool().await;
        let cluster = seed_cluster(&pool).await;
        let service = crate::test_helpers::unique_name("orders");
        let host = NacosInstance {
            instance_id: None,
            ip: "10.0.0.7".to_string(),
            port: 8080,
            weight: 1.0,
            healthy: true,
            enabled: true,
            cluster_name: None,
            metadata: std::collections::HashMap::new(),
        };

        let settings = SyncSettings {
            sync_instances: true,
            ..SyncSettings::default()
        };
        let sync = registry_synchronizer(pool.clone(), settings, vec![("", vec![service.clone()])], vec![host]);
        let stats = sync.sync_cluster(&cluster).await.unwrap();
        assert_eq!(stats.instances_upserted, 1);

        let instance = InstanceRepository::new(pool)
            .get_by_instance_id(&format!("{service}-10.0.0.7:8080"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(instance.service_id.as_deref(), Some(service.as_str()));
        assert_eq!(instance.uri.as_deref(), Some("http://10.0.0.7:8080"));
    }

    #[tokio::test]
    #[ignore = "Requires database"]
    async fn test_failed_sync_rolls_back_every_change() {
        let pool = test_pool().await;
        let cluster = seed_cluster(&pool).await;
        let namespaces = NamespaceRepository::new(pool.clone());
        let legacy = namespaces.create(&NewNamespace::new(cluster.id, "legacy")).await.unwrap();
        let public = namespaces.create(&NewNamespace::new(cluster.id, "public")).await.unwrap();
        ApplicationRepository::new(pool.clone())
            .create(&NewApplication::new(public.id, "old"))
            .await
            .unwrap();

        // Longer than the applications.name column, so the upsert fails after
        // `old` was already deleted inside the transaction
        let too_long = "x".repeat(300);
        let sync = registry_synchronizer(pool.clone(), SyncSettings::default(), vec![("", vec![too_long])], Vec::new());
        assert!(sync.sync_cluster(&cluster).await.is_err());

        let legacy = namespaces.get_by_id(legacy.id).await.unwrap().unwrap();
        assert_eq!(legacy.status, NamespaceStatus::Active);
        assert_eq!(application_names(&pool, public.id).await, ["old"]);
    }

    #[test]
    fn test_settings_from_config() {
        let mut config = NacosSyncConfig::default();
        config.request_timeout = "5s".to_string();
        config.sync_instances = true;

        let settings = SyncSettings::try_from(&config).unwrap();
        assert_eq!(settings.request_timeout, Duration::from_secs(5));
        assert!(settings.sync_instances);

        config.request_timeout = "never".to_string();
        assert!(SyncSettings::try_from(&config).is_err());
    }
}
