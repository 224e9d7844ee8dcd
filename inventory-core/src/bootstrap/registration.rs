//! Self-registration of this process

use tracing::info;

use crate::{
    bootstrap::services::Services,
    config::{Config, RegistrationConfig},
    models::{ApplicationInstance, InstanceRegistration, NewCluster},
    Result,
};

/// Hostname of this machine, or `localhost` when it cannot be read
fn local_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

/// Build the registration for this process from configuration
#[must_use]
pub fn self_registration(registration: &RegistrationConfig, http_port: u16) -> InstanceRegistration {
    let host = registration
        .host
        .clone()
        .filter(|h| !h.trim().is_empty())
        .unwrap_or_else(local_hostname);
    let port = registration.port.unwrap_or(http_port);

    let mut instance = InstanceRegistration::new(&registration.service_name, host, port);
    instance.secure = registration.secure;
    instance.metadata.clone_from(&registration.metadata);
    instance
        .metadata
        .entry("version".to_string())
        .or_insert_with(|| env!("CARGO_PKG_VERSION").to_string());
    instance
}

/// Register this process in its own inventory when enabled
pub async fn register_self(services: &Services, config: &Config) -> Result<Option<ApplicationInstance>> {
    let registration = &config.registration;
    if !registration.enabled {
        return Ok(None);
    }

    let cluster = NewCluster::new(
        &registration.cluster_name,
        registration.cluster_type,
        &registration.cluster_url,
    );
    let namespace = if registration.namespace.trim().is_empty() {
        inventory_nacos::DEFAULT_NAMESPACE_ID
    } else {
        registration.namespace.as_str()
    };

    let instance = services
        .facade
        .register(&cluster, namespace, &self_registration(registration, config.server.http_port))
        .await?;

    info!(instance_id = %instance.instance_id, "Registered this process");
    Ok(Some(instance))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_registration_defaults() {
        let config = RegistrationConfig {
            host: Some("10.1.2.3".to_string()),
            ..RegistrationConfig::default()
        };

        let reg = self_registration(&config, 8080);
        assert_eq!(reg.port, 8080);
        assert_eq!(reg.resolved_instance_id(), "devops-inventory-10.1.2.3:8080");
        assert_eq!(reg.resolved_uri(), "http://10.1.2.3:8080");
        assert!(reg.metadata.contains_key("version"));
    }

    #[test]
    fn test_self_registration_overrides() {
        let mut config = RegistrationConfig {
            host: Some("inventory.internal".to_string()),
            port: Some(443),
            secure: true,
            ..RegistrationConfig::default()
        };
        config.metadata.insert("version".to_string(), "custom".to_string());

        let reg = self_registration(&config, 8080);
        assert_eq!(reg.resolved_uri(), "https://inventory.internal:443");
        assert_eq!(reg.metadata.get("version").map(String::as_str), Some("custom"));
    }

    #[test]
    fn test_hostname_fallback_is_never_empty() {
        assert!(!local_hostname().is_empty());
    }
}
