//! Application instance management service

use serde_json::Value;
use tracing::info;

use crate::{
    models::{
        ApplicationInstance, CreateInstanceRequest, NewInstance, Page, PageParams,
        UpdateInstanceRequest,
    },
    repository::{ApplicationRepository, InstanceRepository},
    validation::{validate_metadata, validate_port, NameValidator, UrlValidator, INSTANCE_ID_MAX},
    Error, Result,
};

/// Application instance management service
#[derive(Clone, Debug)]
pub struct ApplicationInstanceService {
    repo: InstanceRepository,
    application_repo: ApplicationRepository,
}

impl ApplicationInstanceService {
    #[must_use]
    pub const fn new(repo: InstanceRepository, application_repo: ApplicationRepository) -> Self {
        Self { repo, application_repo }
    }

    pub(crate) fn validate(instance_id: &str, host: &str, port: i32, uri: Option<&str>, metadata: &Value) -> Result<()> {
        NameValidator::new("instance_id")
            .with_max_length(INSTANCE_ID_MAX)
            .validate(instance_id)?;
        NameValidator::new("host").validate(host)?;
        validate_port(port)?;
        if let Some(uri) = uri {
            UrlValidator::new().require_scheme().validate("uri", uri)?;
        }
        validate_metadata(metadata)?;
        Ok(())
    }

    pub async fn create(&self, req: CreateInstanceRequest) -> Result<ApplicationInstance> {
        let application = self
            .application_repo
            .get_by_id(req.application_id)
            .await?
            .ok_or_else(|| Error::not_found("Application", req.application_id))?;

        let instance_id = req
            .instance_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| format!("{}-{}:{}", application.name, req.host, req.port));
        let scheme = if req.secure { "https" } else { "http" };
        let uri = req
            .uri
            .filter(|uri| !uri.trim().is_empty())
            .unwrap_or_else(|| format!("{scheme}://{}:{}", req.host, req.port));
        let metadata = req.metadata.unwrap_or_else(|| serde_json::json!({}));

        Self::validate(&instance_id, &req.host, req.port, Some(&uri), &metadata)?;

        let instance = self
            .repo
            .create(&NewInstance {
                application_id: application.id,
                instance_id,
                host: req.host,
                port: req.port,
                secure: req.secure,
                uri: Some(uri),
                metadata,
                status: req.status,
                description: req.description,
            })
            .await?;

        info!(instance_id = %instance.instance_id, application_id = instance.application_id, "Instance created");
        Ok(instance)
    }

    /// Overwrite identity, endpoint, metadata and status, returning the
    /// stored row
    pub async fn update(&self, req: UpdateInstanceRequest) -> Result<ApplicationInstance> {
        let mut instance = self.get(req.id).await?;

        let metadata = req.metadata.unwrap_or_else(|| instance.metadata.clone());
        Self::validate(&req.instance_id, &req.host, req.port, req.uri.as_deref(), &metadata)?;

        instance.instance_id = req.instance_id;
        instance.host = req.host;
        instance.port = req.port;
        instance.secure = req.secure;
        instance.uri = req.uri;
        instance.metadata = metadata;
        instance.status = req.status;

        self.repo
            .update(&instance)
            .await?
            .ok_or_else(|| Error::not_found("Instance", req.id))
    }

    /// Find by `instance_id` and overwrite, or insert
    pub async fn save_or_update(&self, instance: &NewInstance) -> Result<ApplicationInstance> {
        Self::validate(
            &instance.instance_id,
            &instance.host,
            instance.port,
            instance.uri.as_deref(),
            &instance.metadata,
        )?;
        self.repo.upsert(instance).await
    }

    pub async fn get(&self, id: i64) -> Result<ApplicationInstance> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| Error::not_found("Instance", id))
    }

    pub async fn get_by_instance_id(&self, instance_id: &str) -> Result<Option<ApplicationInstance>> {
        self.repo.get_by_instance_id(instance_id).await
    }

    pub async fn list(&self) -> Result<Vec<ApplicationInstance>> {
        self.repo.list().await
    }

    /// Page through an application's instances, ordered by instance id
    pub async fn query_instances(
        &self,
        application_id: i64,
        page: PageParams,
    ) -> Result<Page<ApplicationInstance>> {
        if self.application_repo.get_by_id(application_id).await?.is_none() {
            return Err(Error::not_found("Application", application_id));
        }

        let (items, total) = self.repo.list_by_application(application_id, page).await?;
        Ok(Page::new(items, total, page))
    }

    pub async fn list_all_by_application(&self, application_id: i64) -> Result<Vec<ApplicationInstance>> {
        self.repo.list_all_by_application(application_id).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        if self.repo.delete(id).await? {
            info!(id, "Instance deleted");
            Ok(())
        } else {
            Err(Error::not_found("Instance", id))
        }
    }

    pub async fn delete_all(&self, ids: &[i64]) -> Result<u64> {
        self.repo.delete_many(ids).await
    }
}
