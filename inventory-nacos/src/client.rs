//! Nacos Open API HTTP client

use std::time::{Duration, Instant};

use reqwest::Client;
use tokio::sync::RwLock;
use url::Url;

use crate::error::{check_response, json_with_limit, NacosError};
use crate::types::{InstanceList, LoginResponse, NacosResult, NamespaceInfo, ServiceNamePage};

/// Default Nacos web context path
pub const DEFAULT_CONTEXT_PATH: &str = "/nacos";

/// Id of the namespace every Nacos server starts with
pub const DEFAULT_NAMESPACE_ID: &str = "public";

const LOGIN_ENDPOINT: &str = "/v1/auth/login";
const NAMESPACES_ENDPOINT: &str = "/v1/console/namespaces";
const SERVICES_LIST_ENDPOINT: &str = "/v1/ns/service/list";
const INSTANCES_LIST_ENDPOINT: &str = "/v1/ns/instance/list";

/// Tokens are refreshed this long before the server would expire them.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(30);

/// Connection settings for one Nacos server (or cluster VIP)
#[derive(Debug, Clone)]
pub struct NacosClientConfig {
    /// `host:port` or a full URL such as `https://nacos.internal:8848/nacos`
    pub server_addr: String,
    /// Appended when `server_addr` carries no path
    pub context_path: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout: Duration,
}

impl NacosClientConfig {
    #[must_use]
    pub fn new(server_addr: impl Into<String>) -> Self {
        Self {
            server_addr: server_addr.into(),
            context_path: DEFAULT_CONTEXT_PATH.to_string(),
            username: None,
            password: None,
            timeout: Duration::from_secs(30),
        }
    }

    #[must_use]
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    #[must_use]
    pub fn with_context_path(mut self, context_path: impl Into<String>) -> Self {
        self.context_path = context_path.into();
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn credentials(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(u), Some(p)) if !u.is_empty() => Some((u, p)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    refresh_at: Instant,
}

/// Nacos HTTP Client
///
/// Read-only subset of the v1 Open API used for inventory synchronization:
/// - Authentication (login, token caching)
/// - Console namespaces
/// - Naming service names and instances
#[derive(Debug)]
pub struct NacosClient {
    base_url: String,
    config: NacosClientConfig,
    client: Client,
    token: RwLock<Option<AccessToken>>,
}

impl NacosClient {
    pub fn new(config: NacosClientConfig) -> Result<Self, NacosError> {
        let base_url = resolve_base_url(&config.server_addr, &config.context_path)?;
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(config.timeout)
            .pool_max_idle_per_host(4)
            .build()?;

        Ok(Self {
            base_url,
            config,
            client,
            token: RwLock::new(None),
        })
    }

    /// Resolved API root, e.g. `http://127.0.0.1:8848/nacos`
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Log in and cache the access token
    ///
    /// Returns `None` when no credentials are configured.
    pub async fn login(&self) -> Result<Option<String>, NacosError> {
        let Some((username, password)) = self.config.credentials() else {
            return Ok(None);
        };

        let url = self.endpoint(LOGIN_ENDPOINT);
        let response = self
            .client
            .post(&url)
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;

        let response = check_response(response)?;
        let login: LoginResponse = json_with_limit(response).await?;

        let ttl = Duration::from_secs(login.token_ttl).saturating_sub(TOKEN_REFRESH_MARGIN);
        *self.token.write().await = Some(AccessToken {
            value: login.access_token.clone(),
            refresh_at: Instant::now() + ttl,
        });

        tracing::debug!(server = %self.base_url, ttl_secs = login.token_ttl, "Nacos login succeeded");
        Ok(Some(login.access_token))
    }

    /// Current access token, logging in again once the cached one is due
    async fn access_token(&self) -> Result<Option<String>, NacosError> {
        if self.config.credentials().is_none() {
            return Ok(None);
        }

        if let Some(token) = self.token.read().await.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(Some(token.value.clone()));
            }
        }

        self.login().await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, NacosError> {
        let url = self.endpoint(path);
        let mut request = self.client.get(&url).query(query);
        if let Some(token) = self.access_token().await? {
            request = request.query(&[("accessToken", token)]);
        }

        let response = check_response(request.send().await?)?;
        json_with_limit(response).await
    }

    /// List every namespace known to the server
    pub async fn list_namespaces(&self) -> Result<Vec<NamespaceInfo>, NacosError> {
        let resp: NacosResult<Vec<NamespaceInfo>> = self.get_json(NAMESPACES_ENDPOINT, &[]).await?;

        if resp.code != 200 {
            return Err(NacosError::Api {
                code: resp.code,
                message: resp.message.unwrap_or_default(),
            });
        }

        Ok(resp.data.unwrap_or_default())
    }

    /// List one page of service names
    ///
    /// # Arguments
    /// * `namespace_id` - Namespace to list
    /// * `group_name` - Optional group filter (server default group when `None`)
    /// * `page_no` - Page number (1-indexed)
    /// * `page_size` - Names per page
    pub async fn list_service_names(
        &self,
        namespace_id: &str,
        group_name: Option<&str>,
        page_no: u32,
        page_size: u32,
    ) -> Result<ServiceNamePage, NacosError> {
        let mut query = vec![
            ("namespaceId", namespace_id.to_string()),
            ("pageNo", page_no.to_string()),
            ("pageSize", page_size.to_string()),
        ];
        if let Some(group) = group_name {
            query.push(("groupName", group.to_string()));
        }

        self.get_json(SERVICES_LIST_ENDPOINT, &query).await
    }

    /// List all instances (healthy or not) of a service
    pub async fn list_instances(
        &self,
        namespace_id: &str,
        service_name: &str,
    ) -> Result<InstanceList, NacosError> {
        let query = [
            ("namespaceId", namespace_id.to_string()),
            ("serviceName", service_name.to_string()),
            ("healthyOnly", "false".to_string()),
        ];

        self.get_json(INSTANCES_LIST_ENDPOINT, &query).await
    }
}

/// Build the API root from a server address and context path
///
/// `127.0.0.1:8848` becomes `http://127.0.0.1:8848/nacos`; an address that
/// already carries a path keeps it.
pub fn resolve_base_url(server_addr: &str, context_path: &str) -> Result<String, NacosError> {
    let addr = server_addr.trim();
    if addr.is_empty() {
        return Err(NacosError::InvalidUrl("empty server address".to_string()));
    }

    let with_scheme = if addr.contains("://") {
        addr.to_string()
    } else {
        format!("http://{addr}")
    };

    let mut url = Url::parse(&with_scheme)?;
    if matches!(url.host_str(), None | Some("")) {
        return Err(NacosError::InvalidUrl(format!("missing host in '{addr}'")));
    }

    if url.path() == "/" || url.path().is_empty() {
        let context = context_path.trim().trim_matches('/');
        if context.is_empty() {
            url.set_path("");
        } else {
            url.set_path(&format!("/{context}"));
        }
    }
    url.set_query(None);

    Ok(url.as_str().trim_end_matches('/').to_string())
}
