//! Application management service

use tracing::info;

use crate::{
    models::{
        Application, CreateApplicationRequest, NewApplication, Page, PageParams,
        UpdateApplicationRequest,
    },
    repository::{ApplicationRepository, NamespaceRepository},
    validation::NameValidator,
    Error, Result,
};

/// Application management service
#[derive(Clone, Debug)]
pub struct ApplicationService {
    repo: ApplicationRepository,
    namespace_repo: NamespaceRepository,
}

impl ApplicationService {
    #[must_use]
    pub const fn new(repo: ApplicationRepository, namespace_repo: NamespaceRepository) -> Self {
        Self { repo, namespace_repo }
    }

    async fn ensure_namespace(&self, namespace_id: i64) -> Result<()> {
        if self.namespace_repo.get_by_id(namespace_id).await?.is_none() {
            return Err(Error::not_found("Namespace", namespace_id));
        }
        Ok(())
    }

    pub async fn create(&self, req: CreateApplicationRequest) -> Result<Application> {
        NameValidator::new("name").validate(&req.name)?;
        self.ensure_namespace(req.namespace_id).await?;

        let application = self
            .repo
            .create(&NewApplication {
                namespace_id: req.namespace_id,
                name: req.name,
                description: req.description,
            })
            .await?;

        info!(application_id = application.id, namespace_id = application.namespace_id, name = %application.name, "Application created");
        Ok(application)
    }

    /// Overwrite name and description
    pub async fn update(&self, req: UpdateApplicationRequest) -> Result<Application> {
        NameValidator::new("name").validate(&req.name)?;

        let mut application = self.get(req.id).await?;
        application.name = req.name;
        application.description = req.description;

        self.repo
            .update(&application)
            .await?
            .ok_or_else(|| Error::not_found("Application", req.id))
    }

    /// Find by `(namespace_id, name)` and overwrite, or insert
    pub async fn save_or_update(&self, application: &NewApplication) -> Result<Application> {
        NameValidator::new("name").validate(&application.name)?;
        self.repo.upsert(application).await
    }

    pub async fn get(&self, id: i64) -> Result<Application> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| Error::not_found("Application", id))
    }

    pub async fn list(&self) -> Result<Vec<Application>> {
        self.repo.list().await
    }

    /// Page through a namespace's applications, ordered by name
    pub async fn query_applications(&self, namespace_id: i64, page: PageParams) -> Result<Page<Application>> {
        self.ensure_namespace(namespace_id).await?;

        let (items, total) = self.repo.list_by_namespace(namespace_id, page).await?;
        Ok(Page::new(items, total, page))
    }

    pub async fn list_all_by_namespace(&self, namespace_id: i64) -> Result<Vec<Application>> {
        self.repo.list_all_by_namespace(namespace_id).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        if self.repo.delete(id).await? {
            info!(application_id = id, "Application deleted");
            Ok(())
        } else {
            Err(Error::not_found("Application", id))
        }
    }

    /// Delete every listed application, returning how many existed
    pub async fn delete_all(&self, ids: &[i64]) -> Result<u64> {
        let deleted = self.repo.delete_many(ids).await?;
        if deleted > 0 {
            info!(count = deleted, "Applications deleted");
        }
        Ok(deleted)
    }
}
