//! Service initialization and dependency injection

use std::sync::Arc;

use sqlx::PgPool;
use tracing::info;

use crate::{
    repository::{ApplicationRepository, ClusterRepository, InstanceRepository, NamespaceRepository},
    service::{
        ApplicationInstanceService, ApplicationService, ClusterService, InventoryFacade,
        NamespaceService,
    },
    sync::{NacosSynchronizer, SyncSettings},
    Config,
};

/// Container for all initialized services
#[derive(Clone, Debug)]
pub struct Services {
    pub cluster_service: ClusterService,
    pub namespace_service: NamespaceService,
    pub application_service: ApplicationService,
    pub instance_service: ApplicationInstanceService,
    /// Top-down registration of a running instance
    pub facade: InventoryFacade,
    /// Nacos reconciler shared by the scheduler and the HTTP API
    pub synchronizer: Arc<NacosSynchronizer>,
}

/// Initialize all core services
pub fn init_services(pool: PgPool, config: &Config) -> anyhow::Result<Services> {
    info!("Initializing services...");

    let cluster_repo = ClusterRepository::new(pool.clone());
    let namespace_repo = NamespaceRepository::new(pool.clone());
    let application_repo = ApplicationRepository::new(pool.clone());
    let instance_repo = InstanceRepository::new(pool.clone());

    let cluster_service = ClusterService::new(cluster_repo.clone());
    let namespace_service = NamespaceService::new(namespace_repo.clone(), cluster_repo);
    let application_service = ApplicationService::new(application_repo.clone(), namespace_repo);
    let instance_service = ApplicationInstanceService::new(instance_repo, application_repo);

    let facade = InventoryFacade::new(pool.clone());

    let settings = SyncSettings::try_from(&config.nacos)?;
    info!(
        page_size = settings.page_size,
        sync_instances = settings.sync_instances,
        "Nacos synchronizer initialized"
    );
    let synchronizer = Arc::new(NacosSynchronizer::new(pool, settings));

    info!("All services initialized");

    Ok(Services {
        cluster_service,
        namespace_service,
        application_service,
        instance_service,
        facade,
        synchronizer,
    })
}
