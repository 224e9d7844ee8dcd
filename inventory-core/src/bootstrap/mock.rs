//! Demo inventory for local development
//!
//! Everything goes through the services' upserts, so seeding an already
//! seeded database only refreshes `updated_at`.

use tracing::info;

use crate::{
    bootstrap::services::Services,
    config::MockConfig,
    models::{ClusterType, InstanceStatus, NamespaceStatus, NewApplication, NewCluster, NewInstance, NewNamespace},
    Result,
};

const MOCK_HOST: &str = "127.0.0.1";
const MOCK_BASE_PORT: i32 = 8080;

/// Row counts written by `seed_mock_data`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MockSeedStats {
    pub clusters: usize,
    pub namespaces: usize,
    pub applications: usize,
    pub instances: usize,
}

/// Mock cluster for a type: `"{Type} Cluster"` at `"{type}://127.0.0.1"`
#[must_use]
pub fn mock_cluster(cluster_type: ClusterType) -> NewCluster {
    let mut cluster = NewCluster::new(
        format!("{} Cluster", cluster_type.value()),
        cluster_type,
        format!("{}://{MOCK_HOST}", cluster_type.value().to_lowercase()),
    );
    cluster.description = Some(cluster_type.description().to_string());
    cluster
}

/// Seed one cluster per cluster type with the configured fan-out
pub async fn seed_mock_data(services: &Services, config: &MockConfig) -> Result<MockSeedStats> {
    let mut stats = MockSeedStats::default();

    for cluster_type in ClusterType::ALL {
        let cluster = services
            .cluster_service
            .save_or_update(&mock_cluster(cluster_type))
            .await?;
        stats.clusters += 1;

        for i in 1..=config.namespaces_per_cluster {
            let namespace = services
                .namespace_service
                .save_or_update(&NewNamespace {
                    cluster_id: cluster.id,
                    name: format!("{}-Namespace-{i}", cluster.name),
                    status: NamespaceStatus::Active,
                    description: None,
                })
                .await?;
            stats.namespaces += 1;

            for j in 1..=config.applications_per_namespace {
                let application = services
                    .application_service
                    .save_or_update(&NewApplication::new(
                        namespace.id,
                        format!("{}-Application-{j}", namespace.name),
                    ))
                    .await?;
                stats.applications += 1;

                for k in 1..=config.instances_per_application {
                    let port = MOCK_BASE_PORT + i32::try_from(k).unwrap_or(i32::MAX - MOCK_BASE_PORT);
                    services
                        .instance_service
                        .save_or_update(&NewInstance {
                            application_id: application.id,
                            instance_id: format!("{}-{k}", application.name),
                            host: MOCK_HOST.to_string(),
                            port,
                            secure: false,
                            uri: Some(format!("http://{MOCK_HOST}:{port}/")),
                            metadata: serde_json::json!({ "mock": "true" }),
                            status: InstanceStatus::Up,
                            description: None,
                        })
                        .await?;
                    stats.instances += 1;
                }
            }
        }
    }

    info!(
        clusters = stats.clusters,
        namespaces = stats.namespaces,
        applications = stats.applications,
        instances = stats.instances,
        "Mock inventory seeded"
    );

    Ok(stats)
}
