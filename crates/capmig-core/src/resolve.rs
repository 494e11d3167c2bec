//! Per-user role resolution under the distributed/consolidated strategies

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::analysis::PermissionAnalysis;
use crate::error::Result;
use crate::model::{Strategy, SynthesizedRole, UserRoles};

/// Pre-existing platform roles that must always be carried verbatim
/// for permissions they map
pub trait SystemRoleLookup {
    fn system_role_for(&self, permission_name: &str) -> Option<String>;
}

/// No system-generated roles at all
pub struct NoSystemRoles;

impl SystemRoleLookup for NoSystemRoles {
    fn system_role_for(&self, _permission_name: &str) -> Option<String> {
        None
    }
}

/// JWT-size safety valve. Applied after resolution only; it flags an
/// assignment for skipping but never changes which roles were chosen.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyValve {
    pub enabled: bool,
    /// Maximum serialized length of the representative token payload
    pub max_token_length: usize,
}

impl SafetyValve {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            max_token_length: 0,
        }
    }

    pub fn limit(max_token_length: usize) -> Self {
        Self {
            enabled: true,
            max_token_length,
        }
    }

    /// Length of a representative signed-token payload carrying the
    /// resolved role list
    fn payload_length(&self, user_id: &str, role_names: &[String]) -> Result<usize> {
        let payload = json!({
            "sub": user_id,
            "type": "access",
            "roles": role_names,
        });
        Ok(serde_json::to_string(&payload)?.len())
    }

    fn exceeds(&self, user_id: &str, role_names: &[String]) -> Result<bool> {
        if !self.enabled {
            return Ok(false);
        }
        Ok(self.payload_length(user_id, role_names)? > self.max_token_length)
    }
}

/// Aggregates synthesized roles per user and applies the assignment
/// strategy. Resolution is a straight pipeline per user: collect the
/// held roles, widen or narrow per strategy, size-check, finalize.
pub struct UserRoleResolver<'a> {
    analysis: &'a PermissionAnalysis,
    roles: &'a [SynthesizedRole],
    strategy: Strategy,
    system_roles: &'a dyn SystemRoleLookup,
    valve: SafetyValve,
}

impl<'a> UserRoleResolver<'a> {
    pub fn new(
        analysis: &'a PermissionAnalysis,
        roles: &'a [SynthesizedRole],
        strategy: Strategy,
    ) -> Self {
        Self {
            analysis,
            roles,
            strategy,
            system_roles: &NoSystemRoles,
            valve: SafetyValve::disabled(),
        }
    }

    pub fn with_system_roles(mut self, lookup: &'a dyn SystemRoleLookup) -> Self {
        self.system_roles = lookup;
        self
    }

    pub fn with_safety_valve(mut self, valve: SafetyValve) -> Self {
        self.valve = valve;
        self
    }

    pub fn resolve(&self) -> Result<Vec<UserRoles>> {
        let mut out = Vec::new();
        for (user_id, held) in self.collect_users() {
            let role_names = match self.strategy {
                Strategy::Distributed => self.widen(&held),
                Strategy::Consolidated => self.narrow(&held),
            };
            let skip = self.valve.exceeds(&user_id, &role_names)?;
            if skip {
                warn!(
                    user = %user_id,
                    roles = role_names.len(),
                    limit = self.valve.max_token_length,
                    "role list exceeds token size limit, flagging for skip"
                );
            }
            out.push(UserRoles {
                user_id,
                role_names,
                skip_role_assignment: skip,
            });
        }
        debug!(users = out.len(), strategy = %self.strategy, "user-role resolution complete");
        Ok(out)
    }

    /// user id -> held roles, in role insertion order then user
    /// first-seen order
    fn collect_users(&self) -> Vec<(String, Vec<&'a SynthesizedRole>)> {
        let mut order: Vec<String> = Vec::new();
        let mut held: Vec<Vec<&SynthesizedRole>> = Vec::new();
        for role in self.roles {
            for user_id in &role.assigned_user_ids {
                match order.iter().position(|u| u == user_id) {
                    Some(i) => held[i].push(role),
                    None => {
                        order.push(user_id.clone());
                        held.push(vec![role]);
                    }
                }
            }
        }
        order.into_iter().zip(held).collect()
    }

    /// Distributed: each held role also pulls in every other role whose
    /// source permission it reaches, plus mapped system roles.
    fn widen(&self, held: &[&SynthesizedRole]) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for role in held {
            push_unique(&mut names, &role.name);
            for expanded in &role.expanded_permissions {
                if let Some(other) = self
                    .roles
                    .iter()
                    .find(|r| r.source_permission_name == expanded.permission_name)
                {
                    if other.name != role.name {
                        push_unique(&mut names, &other.name);
                    }
                }
                if let Some(system) = self.system_roles.system_role_for(&expanded.permission_name)
                {
                    push_unique(&mut names, &system);
                }
            }
        }
        names
    }

    /// Consolidated: keep only the topmost held roles. A role is
    /// suppressed when another held role's source permission is one of
    /// its parents. Mapped system roles are added afterwards and are
    /// never suppression candidates.
    fn narrow(&self, held: &[&SynthesizedRole]) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for role in held {
            let parents = self.analysis.parents_of(&role.source_permission_name);
            let covered = held.iter().any(|other| {
                other.name != role.name
                    && parents.iter().any(|p| *p == other.source_permission_name)
            });
            if !covered {
                push_unique(&mut names, &role.name);
            }
        }
        for role in held {
            if !names.contains(&role.name) {
                continue;
            }
            for expanded in &role.expanded_permissions {
                if let Some(system) = self.system_roles.system_role_for(&expanded.permission_name)
                {
                    push_unique(&mut names, &system);
                }
            }
        }
        names
    }
}

fn push_unique(names: &mut Vec<String>, name: &str) {
    if !names.iter().any(|n| n == name) {
        names.push(name.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Classifier;
    use crate::model::{ExpandedPermission, PermissionRecord};

    fn role(name: &str, source: &str, users: &[&str], expanded: &[&str]) -> SynthesizedRole {
        SynthesizedRole {
            role_id: format!("id-{name}"),
            name: name.to_string(),
            description: None,
            source_permission_name: source.to_string(),
            expanded_permissions: expanded
                .iter()
                .map(|p| ExpandedPermission::direct(*p))
                .collect(),
            assigned_user_ids: users.iter().map(|u| u.to_string()).collect(),
        }
    }

    /// p2 is declared childOf p1; both mutable
    fn nested_analysis() -> PermissionAnalysis {
        let records = vec![
            PermissionRecord::new("p1")
                .mutable(true)
                .with_display_name("R1")
                .with_sub_permissions(["p2"]),
            PermissionRecord::new("p2")
                .mutable(true)
                .with_display_name("R2")
                .with_child_of(["p1"]),
        ];
        Classifier::new().classify(&records, &records.clone(), &[])
    }

    #[test]
    fn test_distributed_widens_to_nested_roles() {
        let analysis = nested_analysis();
        let roles = vec![
            role("R1", "p1", &["u"], &["p2"]),
            role("R2", "p2", &["u"], &[]),
        ];

        let resolved = UserRoleResolver::new(&analysis, &roles, Strategy::Distributed)
            .resolve()
            .unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].role_names, vec!["R1", "R2"]);
    }

    #[test]
    fn test_distributed_widens_even_when_only_parent_held() {
        let analysis = nested_analysis();
        let roles = vec![
            role("R1", "p1", &["u"], &["p2"]),
            role("R2", "p2", &[], &[]),
        ];

        let resolved = UserRoleResolver::new(&analysis, &roles, Strategy::Distributed)
            .resolve()
            .unwrap();
        assert_eq!(resolved[0].role_names, vec!["R1", "R2"]);
    }

    #[test]
    fn test_consolidated_suppresses_child_role() {
        let analysis = nested_analysis();
        let roles = vec![
            role("R1", "p1", &["u"], &["p2"]),
            role("R2", "p2", &["u"], &[]),
        ];

        let resolved = UserRoleResolver::new(&analysis, &roles, Strategy::Consolidated)
            .resolve()
            .unwrap();
        assert_eq!(resolved[0].role_names, vec!["R1"]);
    }

    #[test]
    fn test_consolidated_keeps_child_without_parent_role() {
        let analysis = nested_analysis();
        let roles = vec![role("R2", "p2", &["u"], &[])];

        let resolved = UserRoleResolver::new(&analysis, &roles, Strategy::Consolidated)
            .resolve()
            .unwrap();
        assert_eq!(resolved[0].role_names, vec!["R2"]);
    }

    struct StaticSystemRoles;

    impl SystemRoleLookup for StaticSystemRoles {
        fn system_role_for(&self, permission_name: &str) -> Option<String> {
            (permission_name == "p2").then(|| "system-bundle".to_string())
        }
    }

    #[test]
    fn test_system_roles_kept_under_both_strategies() {
        let analysis = nested_analysis();
        let roles = vec![
            role("R1", "p1", &["u"], &["p2"]),
            role("R2", "p2", &["u"], &[]),
        ];

        let distributed = UserRoleResolver::new(&analysis, &roles, Strategy::Distributed)
            .with_system_roles(&StaticSystemRoles)
            .resolve()
            .unwrap();
        assert!(distributed[0]
            .role_names
            .contains(&"system-bundle".to_string()));

        let consolidated = UserRoleResolver::new(&analysis, &roles, Strategy::Consolidated)
            .with_system_roles(&StaticSystemRoles)
            .resolve()
            .unwrap();
        assert!(consolidated[0]
            .role_names
            .contains(&"system-bundle".to_string()));
        // R2 itself is still suppressed.
        assert!(!consolidated[0].role_names.contains(&"R2".to_string()));
    }

    #[test]
    fn test_safety_valve_flags_but_keeps_roles() {
        let analysis = nested_analysis();
        let roles = vec![role("R1", "p1", &["u"], &[])];

        let resolved = UserRoleResolver::new(&analysis, &roles, Strategy::Distributed)
            .with_safety_valve(SafetyValve::limit(10))
            .resolve()
            .unwrap();
        assert!(resolved[0].skip_role_assignment);
        assert_eq!(resolved[0].role_names, vec!["R1"]);
    }

    #[test]
    fn test_safety_valve_disabled_never_flags() {
        let analysis = nested_analysis();
        let roles = vec![role("R1", "p1", &["u"], &[])];

        let resolved = UserRoleResolver::new(&analysis, &roles, Strategy::Distributed)
            .with_safety_valve(SafetyValve::disabled())
            .resolve()
            .unwrap();
        assert!(!resolved[0].skip_role_assignment);
    }

    #[test]
    fn test_users_from_multiple_roles_collected_once() {
        let analysis = nested_analysis();
        let roles = vec![
            role("R1", "p1", &["u1", "u2"], &[]),
            role("R2", "p2", &["u2"], &[]),
        ];

        let resolved = UserRoleResolver::new(&analysis, &roles, Strategy::Distributed)
            .resolve()
            .unwrap();
        let ids: Vec<&str> = resolved.iter().map(|u| u.user_id.as_str()).collect();
        assert_eq!(ids, vec!["u1", "u2"]);
        let u2 = resolved.iter().find(|u| u.user_id == "u2").unwrap();
        assert_eq!(u2.role_names, vec!["R1", "R2"]);
    }
}
