//! Okapi client: login, paginated permission loads, snapshot assembly

use std::sync::Mutex;
use std::time::{Duration, Instant};

use capmig_core::{LoadSnapshot, ModulePermissions, PermissionRecord, PermissionUser};
use capmig_config::OkapiConfig;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::client::HttpClient;
use crate::error::{HttpError, Result};

const TENANT_HEADER: &str = "x-okapi-tenant";
const TOKEN_HEADER: &str = "x-okapi-token";

/// Login token with an explicit time to live, owned by the client
/// instance rather than any global state
#[derive(Debug, Default)]
struct TokenCache {
    token: Option<(String, Instant)>,
}

impl TokenCache {
    fn fresh(&self, ttl: Duration) -> Option<String> {
        self.token
            .as_ref()
            .filter(|(_, acquired)| acquired.elapsed() < ttl)
            .map(|(token, _)| token.clone())
    }

    fn store(&mut self, token: String) {
        self.token = Some((token, Instant::now()));
    }
}

#[derive(Debug, Deserialize)]
struct PermissionCollection {
    #[serde(default)]
    permissions: Vec<PermissionRecord>,
    #[serde(default, rename = "totalRecords")]
    total_records: usize,
}

#[derive(Debug, Deserialize)]
struct ModuleDescriptor {
    id: String,
    #[serde(default, rename = "permissionSets")]
    permission_sets: Vec<PermissionRecord>,
}

#[derive(Debug, Deserialize)]
struct PermissionUserCollection {
    #[serde(default, rename = "permissionUsers")]
    permission_users: Vec<PermissionUser>,
    #[serde(default, rename = "totalRecords")]
    total_records: usize,
}

/// REST client for the legacy Okapi platform
pub struct OkapiClient {
    http: HttpClient,
    config: OkapiConfig,
    token: Mutex<TokenCache>,
}

impl OkapiClient {
    pub fn new(http: HttpClient, config: OkapiConfig) -> Self {
        Self {
            http,
            config,
            token: Mutex::new(TokenCache::default()),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.url.trim_end_matches('/'), path)
    }

    fn tenant_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let tenant = HeaderValue::from_str(&self.config.tenant)
            .map_err(|e| HttpError::Auth(format!("invalid tenant value: {e}")))?;
        headers.insert(TENANT_HEADER, tenant);
        Ok(headers)
    }

    async fn auth_headers(&self) -> Result<HeaderMap> {
        let token = self.login().await?;
        let mut headers = self.tenant_headers()?;
        let value = HeaderValue::from_str(&token)
            .map_err(|e| HttpError::Auth(format!("invalid token value: {e}")))?;
        headers.insert(TOKEN_HEADER, value);
        Ok(headers)
    }

    /// Logs in against `/authn/login`, reusing the cached token while
    /// it is within its TTL
    pub async fn login(&self) -> Result<String> {
        let ttl = Duration::from_secs(self.config.token_ttl_secs);
        if let Ok(cache) = self.token.lock() {
            if let Some(token) = cache.fresh(ttl) {
                return Ok(token);
            }
        }

        let body = json!({
            "username": self.config.username,
            "password": self.config.password,
        });
        let response = self
            .http
            .post_json(&self.url("/authn/login"), self.tenant_headers()?, &body)
            .await?;
        let token = response
            .headers()
            .get(TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| HttpError::Auth("login response carried no token".to_string()))?;

        if let Ok(mut cache) = self.token.lock() {
            cache.store(token.clone());
        }
        debug!(tenant = %self.config.tenant, "okapi login succeeded");
        Ok(token)
    }

    /// Individually-declared permission sets
    pub async fn permissions(&self) -> Result<Vec<PermissionRecord>> {
        self.permission_pages(&[]).await
    }

    /// Flattened permission sets (`expandSubs=true`)
    pub async fn permissions_expanded(&self) -> Result<Vec<PermissionRecord>> {
        self.permission_pages(&[("expandSubs", "true".to_string())])
            .await
    }

    async fn permission_pages(
        &self,
        extra_query: &[(&str, String)],
    ) -> Result<Vec<PermissionRecord>> {
        let headers = self.auth_headers().await?;
        let mut out: Vec<PermissionRecord> = Vec::new();
        loop {
            let mut query = vec![
                ("start", (out.len() + 1).to_string()),
                ("length", self.config.page_size.to_string()),
            ];
            query.extend(extra_query.iter().cloned());

            let page: PermissionCollection = self
                .http
                .get_json(&self.url("/perms/permissions"), headers.clone(), &query)
                .await?;
            let fetched = page.permissions.len();
            out.extend(page.permissions);
            if fetched < self.config.page_size || out.len() >= page.total_records {
                break;
            }
        }
        Ok(out)
    }

    /// Permission sets declared in enabled module descriptors
    pub async fn module_permissions(&self) -> Result<Vec<ModulePermissions>> {
        let headers = self.auth_headers().await?;
        let url = format!(
            "{}?full=true",
            self.url(&format!("/_/proxy/tenants/{}/modules", self.config.tenant))
        );
        let descriptors: Vec<ModuleDescriptor> =
            self.http.get_json(&url, headers, &[]).await?;
        Ok(descriptors
            .into_iter()
            .map(|d| ModulePermissions {
                module_id: d.id,
                permission_sets: d.permission_sets,
            })
            .collect())
    }

    /// Per-user legacy permission assignments
    pub async fn permission_users(&self) -> Result<Vec<PermissionUser>> {
        let headers = self.auth_headers().await?;
        let mut out: Vec<PermissionUser> = Vec::new();
        loop {
            let query = vec![
                ("start", (out.len() + 1).to_string()),
                ("length", self.config.page_size.to_string()),
            ];
            let page: PermissionUserCollection = self
                .http
                .get_json(&self.url("/perms/users"), headers.clone(), &query)
                .await?;
            let fetched = page.permission_users.len();
            out.extend(page.permission_users);
            if fetched < self.config.page_size || out.len() >= page.total_records {
                break;
            }
        }
        Ok(out)
    }

    /// Loads the complete input snapshot the core operates on
    pub async fn load_snapshot(&self) -> Result<LoadSnapshot> {
        let all_permissions = self.permissions().await?;
        let all_permissions_expanded = self.permissions_expanded().await?;
        let okapi_permissions = self.module_permissions().await?;
        let permission_users = self.permission_users().await?;
        info!(
            permissions = all_permissions.len(),
            expanded = all_permissions_expanded.len(),
            modules = okapi_permissions.len(),
            users = permission_users.len(),
            "okapi snapshot loaded"
        );
        Ok(LoadSnapshot {
            all_permissions,
            all_permissions_expanded,
            okapi_permissions,
            permission_users,
        })
    }
}
