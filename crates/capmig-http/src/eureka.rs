//! Eureka client: capability/role collections and migration write-back

use std::collections::HashMap;

use capmig_core::{CapabilityLookup, CapabilityRef};
use capmig_config::EurekaConfig;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::client::HttpClient;
use crate::error::{HttpError, Result};

/// One Eureka role-entity endpoint. Capabilities, capability-sets and
/// roles share the same collection/CRUD shape, so a single generic
/// endpoint parameterized over path, collection field and id extraction
/// serves all three.
pub struct EntityEndpoint<T> {
    path: &'static str,
    collection_field: &'static str,
    id_of: fn(&T) -> &str,
}

impl<T: DeserializeOwned> EntityEndpoint<T> {
    pub const fn new(
        path: &'static str,
        collection_field: &'static str,
        id_of: fn(&T) -> &str,
    ) -> Self {
        Self {
            path,
            collection_field,
            id_of,
        }
    }

    pub fn entity_id<'a>(&self, entity: &'a T) -> &'a str {
        (self.id_of)(entity)
    }

    async fn fetch_all(
        &self,
        http: &HttpClient,
        base: &str,
        page_size: usize,
    ) -> Result<Vec<T>> {
        let mut out: Vec<T> = Vec::new();
        loop {
            let query = vec![
                ("offset", out.len().to_string()),
                ("limit", page_size.to_string()),
            ];
            let url = format!("{}{}", base.trim_end_matches('/'), self.path);
            let page: Value = http.get_json(&url, HeaderMap::new(), &query).await?;

            let items = page
                .get(self.collection_field)
                .and_then(Value::as_array)
                .cloned()
                .ok_or_else(|| {
                    HttpError::Decode(format!(
                        "collection field '{}' missing in {} response",
                        self.collection_field, self.path
                    ))
                })?;
            let total = page
                .get("totalRecords")
                .and_then(Value::as_u64)
                .unwrap_or(0) as usize;

            let fetched = items.len();
            for item in items {
                out.push(serde_json::from_value(item)?);
            }
            if fetched < page_size || out.len() >= total {
                break;
            }
        }
        debug!(path = self.path, count = out.len(), "eureka collection loaded");
        Ok(out)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capability {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub resource: String,
    #[serde(default)]
    pub action: String,
    /// Okapi permission name this capability was derived from
    #[serde(default)]
    pub permission: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

const CAPABILITIES: EntityEndpoint<Capability> =
    EntityEndpoint::new("/capabilities", "capabilities", |c| &c.id);
const CAPABILITY_SETS: EntityEndpoint<Capability> =
    EntityEndpoint::new("/capability-sets", "capabilitySets", |c| &c.id);
const ROLES: EntityEndpoint<Role> = EntityEndpoint::new("/roles", "roles", |r| &r.id);

/// REST client for the target Eureka platform
pub struct EurekaClient {
    http: HttpClient,
    config: EurekaConfig,
}

impl EurekaClient {
    pub fn new(http: HttpClient, config: EurekaConfig) -> Self {
        Self { http, config }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.url.trim_end_matches('/'), path)
    }

    pub async fn capabilities(&self) -> Result<Vec<Capability>> {
        CAPABILITIES
            .fetch_all(&self.http, &self.config.url, self.config.page_size)
            .await
    }

    pub async fn capability_sets(&self) -> Result<Vec<Capability>> {
        CAPABILITY_SETS
            .fetch_all(&self.http, &self.config.url, self.config.page_size)
            .await
    }

    pub async fn roles(&self) -> Result<Vec<Role>> {
        ROLES
            .fetch_all(&self.http, &self.config.url, self.config.page_size)
            .await
    }

    pub async fn create_role(&self, name: &str, description: Option<&str>) -> Result<Role> {
        let body = json!({ "name": name, "description": description });
        let response = self
            .http
            .post_json(&self.url("/roles"), HeaderMap::new(), &body)
            .await?;
        Ok(response.json().await?)
    }

    pub async fn assign_capabilities(
        &self,
        role_id: &str,
        capability_ids: &[String],
    ) -> Result<()> {
        let body = json!({ "roleId": role_id, "capabilityIds": capability_ids });
        self.http
            .post_json(&self.url("/roles/capabilities"), HeaderMap::new(), &body)
            .await?;
        Ok(())
    }

    pub async fn assign_capability_sets(
        &self,
        role_id: &str,
        capability_set_ids: &[String],
    ) -> Result<()> {
        let body = json!({ "roleId": role_id, "capabilitySetIds": capability_set_ids });
        self.http
            .post_json(&self.url("/roles/capability-sets"), HeaderMap::new(), &body)
            .await?;
        Ok(())
    }

    pub async fn assign_user_roles(&self, user_id: &str, role_ids: &[String]) -> Result<()> {
        let body = json!({ "userId": user_id, "roleIds": role_ids });
        self.http
            .post_json(&self.url("/roles/users"), HeaderMap::new(), &body)
            .await?;
        Ok(())
    }

    /// Loads both capability collections into an in-memory directory
    /// implementing the core's lookup contract
    pub async fn capability_directory(&self) -> Result<CapabilityDirectory> {
        let capabilities = self.capabilities().await?;
        let sets = self.capability_sets().await?;
        info!(
            capabilities = capabilities.len(),
            capability_sets = sets.len(),
            "eureka capability directory loaded"
        );
        Ok(CapabilityDirectory::new(capabilities, sets))
    }
}

/// Permission-name keyed view over the Eureka capability collections
#[derive(Debug, Default)]
pub struct CapabilityDirectory {
    capabilities: HashMap<String, CapabilityRef>,
    sets: HashMap<String, CapabilityRef>,
}

impl CapabilityDirectory {
    pub fn new(capabilities: Vec<Capability>, sets: Vec<Capability>) -> Self {
        Self {
            capabilities: index_by_permission(capabilities),
            sets: index_by_permission(sets),
        }
    }

    pub fn len(&self) -> usize {
        self.capabilities.len() + self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty() && self.sets.is_empty()
    }
}

impl CapabilityLookup for CapabilityDirectory {
    fn capability_set_by_permission(&self, permission_name: &str) -> Option<CapabilityRef> {
        self.sets.get(permission_name).cloned()
    }

    fn capability_by_permission(&self, permission_name: &str) -> Option<CapabilityRef> {
        self.capabilities.get(permission_name).cloned()
    }
}

fn index_by_permission(entities: Vec<Capability>) -> HashMap<String, CapabilityRef> {
    let mut out = HashMap::new();
    for entity in entities {
        let key = entity
            .permission
            .clone()
            .unwrap_or_else(|| entity.name.clone());
        out.entry(key).or_insert(CapabilityRef {
            id: entity.id,
            name: entity.name,
            resource: entity.resource,
            action: entity.action,
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capability(id: &str, permission: &str) -> Capability {
        Capability {
            id: id.to_string(),
            name: format!("name-{id}"),
            resource: "res".to_string(),
            action: "view".to_string(),
            permission: Some(permission.to_string()),
        }
    }

    #[test]
    fn test_directory_set_wins_over_capability() {
        let directory = CapabilityDirectory::new(
            vec![capability("cap-1", "perms.p")],
            vec![capability("set-1", "perms.p")],
        );
        let (kind, resolved) = directory.resolve("perms.p");
        assert_eq!(kind, capmig_core::ResolvedKind::CapabilitySet);
        assert_eq!(resolved.unwrap().id, "set-1");
    }

    #[test]
    fn test_directory_falls_back_to_name_key() {
        let mut entity = capability("cap-1", "ignored");
        entity.permission = None;
        let directory = CapabilityDirectory::new(vec![entity], vec![]);
        assert!(directory.capability_by_permission("name-cap-1").is_some());
    }

    #[test]
    fn test_directory_first_entity_wins_on_duplicate_key() {
        let directory = CapabilityDirectory::new(
            vec![capability("cap-1", "perms.p"), capability("cap-2", "perms.p")],
            vec![],
        );
        assert_eq!(
            directory.capability_by_permission("perms.p").unwrap().id,
            "cap-1"
        );
    }

    #[test]
    fn test_endpoint_id_extraction() {
        let role = Role {
            id: "r-1".to_string(),
            name: "Role".to_string(),
            description: None,
        };
        assert_eq!(ROLES.entity_id(&role), "r-1");
    }
}
