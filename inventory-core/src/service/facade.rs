//! Single entry point for registering a running instance
//!
//! Walks the hierarchy top-down inside one transaction, upserting each level
//! so repeated registrations of the same process converge on the same rows
//! and a failure at any level leaves nothing behind.

use sqlx::PgPool;
use tracing::info;

use crate::{
    models::{
        ApplicationInstance, InstanceRegistration, InstanceStatus, NewApplication, NewCluster,
        NewInstance, NewNamespace,
    },
    repository::{ApplicationRepository, ClusterRepository, InstanceRepository, NamespaceRepository},
    service::{ApplicationInstanceService, ClusterService},
    validation::NameValidator,
    Result,
};

#[derive(Clone)]
pub struct InventoryFacade {
    pool: PgPool,
    clusters: ClusterRepository,
    namespaces: NamespaceRepository,
    applications: ApplicationRepository,
    instances: InstanceRepository,
}

impl std::fmt::Debug for InventoryFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InventoryFacade").finish_non_exhaustive()
    }
}

impl InventoryFacade {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            clusters: ClusterRepository::new(pool.clone()),
            namespaces: NamespaceRepository::new(pool.clone()),
            applications: ApplicationRepository::new(pool.clone()),
            instances: InstanceRepository::new(pool.clone()),
            pool,
        }
    }

    /// Register `registration` under `cluster` / `namespace`
    ///
    /// The application is named after the registration's service id. A
    /// missing instance id becomes `"{service_id}-{host}:{port}"` and a
    /// missing uri `"{scheme}://{host}:{port}"`.
    pub async fn register(
        &self,
        cluster: &NewCluster,
        namespace: &str,
        registration: &InstanceRegistration,
    ) -> Result<ApplicationInstance> {
        ClusterService::validate(&cluster.name, &cluster.url)?;

        let mut tx = self.pool.begin().await?;

        let cluster = self.clusters.upsert_with_executor(cluster, &mut *tx).await?;

        NameValidator::new("namespace").validate(namespace)?;
        let namespace = self
            .namespaces
            .upsert_with_executor(&NewNamespace::new(cluster.id, namespace), &mut *tx)
            .await?;

        NameValidator::new("service_id").validate(&registration.service_id)?;
        let application = self
            .applications
            .upsert_with_executor(
                &NewApplication::new(namespace.id, &registration.service_id),
                &mut *tx,
            )
            .await?;

        let instance = NewInstance {
            application_id: application.id,
            instance_id: registration.resolved_instance_id(),
            host: registration.host.clone(),
            port: i32::from(registration.port),
            secure: registration.secure,
            uri: Some(registration.resolved_uri()),
            metadata: serde_json::to_value(&registration.metadata)?,
            status: InstanceStatus::Up,
            description: None,
        };
        ApplicationInstanceService::validate(
            &instance.instance_id,
            &instance.host,
            instance.port,
            instance.uri.as_deref(),
            &instance.metadata,
        )?;
        let instance = self.instances.upsert_with_executor(&instance, &mut *tx).await?;

        tx.commit().await?;

        info!(
            cluster = %cluster.name,
            namespace = %namespace.name,
            application = %application.name,
            instance_id = %instance.instance_id,
            "Instance registered"
        );

        Ok(instance)
    }
}
