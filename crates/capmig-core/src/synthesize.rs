//! Role and capability-assignment synthesis from mutable permissions

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::analysis::PermissionAnalysis;
use crate::expand::SubPermissionExpander;
use crate::model::{
    AssignmentEntry, CapabilityRef, Category, PermissionUser, ResolvedKind,
    RoleCapabilityAssignment, SynthesizedRole,
};

/// Eureka-side resolution of permission names to capabilities.
///
/// A capability-set match always takes priority over a plain capability
/// match.
pub trait CapabilityLookup {
    fn capability_set_by_permission(&self, permission_name: &str) -> Option<CapabilityRef>;
    fn capability_by_permission(&self, permission_name: &str) -> Option<CapabilityRef>;

    fn resolve(&self, permission_name: &str) -> (ResolvedKind, Option<CapabilityRef>) {
        if let Some(set) = self.capability_set_by_permission(permission_name) {
            return (ResolvedKind::CapabilitySet, Some(set));
        }
        if let Some(capability) = self.capability_by_permission(permission_name) {
            return (ResolvedKind::Capability, Some(capability));
        }
        (ResolvedKind::NotFound, None)
    }
}

/// Supplemental view/edit capability bundles appended to roles whose
/// resolved set contains a trigger name. The edit bundle wins when both
/// trigger kinds are present.
pub trait ExtraCapabilities {
    fn is_edit_trigger(&self, permission_name: &str) -> bool;
    fn is_view_trigger(&self, permission_name: &str) -> bool;
    fn edit_bundle(&self) -> &[String];
    fn view_bundle(&self) -> &[String];
}

/// Role skipped for a structural reason, reported per-item
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedRole {
    pub permission_name: String,
    pub reason: String,
}

/// Everything the synthesizer produces for one run
#[derive(Debug, Clone, Default)]
pub struct SynthesisResult {
    pub roles: Vec<SynthesizedRole>,
    pub assignments: Vec<RoleCapabilityAssignment>,
    pub skipped: Vec<SkippedRole>,
}

impl SynthesisResult {
    pub fn role_by_name(&self, name: &str) -> Option<&SynthesizedRole> {
        self.roles.iter().find(|r| r.name == name)
    }

    pub fn role_by_source_permission(&self, permission_name: &str) -> Option<&SynthesizedRole> {
        self.roles
            .iter()
            .find(|r| r.source_permission_name == permission_name)
    }
}

/// Turns every mutable permission into a role plus resolved capability
/// assignment candidates.
pub struct RoleSynthesizer<'a> {
    analysis: &'a PermissionAnalysis,
    lookup: &'a dyn CapabilityLookup,
    extras: Option<&'a dyn ExtraCapabilities>,
}

impl<'a> RoleSynthesizer<'a> {
    pub fn new(analysis: &'a PermissionAnalysis, lookup: &'a dyn CapabilityLookup) -> Self {
        Self {
            analysis,
            lookup,
            extras: None,
        }
    }

    pub fn with_extras(mut self, extras: &'a dyn ExtraCapabilities) -> Self {
        self.extras = Some(extras);
        self
    }

    pub fn synthesize(&self, users: &[PermissionUser]) -> SynthesisResult {
        let expander = SubPermissionExpander::new(self.analysis);
        let mut result = SynthesisResult::default();

        for entry in self.analysis.mutable() {
            let name = match entry.display_name() {
                Some(n) if !n.trim().is_empty() => n.to_string(),
                _ => {
                    result.skipped.push(SkippedRole {
                        permission_name: entry.name.clone(),
                        reason: "no display name to derive a role name from".to_string(),
                    });
                    continue;
                }
            };

            let expansion = expander.expand(&entry.name);
            let role = SynthesizedRole {
                role_id: Uuid::new_v4().to_string(),
                name: name.clone(),
                description: entry.description().map(str::to_string),
                source_permission_name: entry.name.clone(),
                expanded_permissions: expansion.entries.clone(),
                assigned_user_ids: assigned_users(&entry.name, users),
            };

            let assignment = self.assign_capabilities(&role);
            result.roles.push(role);
            result.assignments.push(assignment);
        }

        debug!(
            roles = result.roles.len(),
            skipped = result.skipped.len(),
            "role synthesis complete"
        );
        result
    }

    /// Capability candidates are the directly-declared, non-mutable
    /// expansion entries. Both strategies apply this same per-entry
    /// filter; the strategies diverge later, in user-role resolution.
    fn assign_capabilities(&self, role: &SynthesizedRole) -> RoleCapabilityAssignment {
        let mut assignment = RoleCapabilityAssignment {
            role_name: role.name.clone(),
            entries: Vec::new(),
            not_found: Vec::new(),
        };
        let mut seen: Vec<String> = Vec::new();
        let mut duplicates = 0usize;

        for expanded in &role.expanded_permissions {
            if !expanded.is_direct() {
                continue;
            }
            if self.analysis.category_of(&expanded.permission_name) == Some(Category::Mutable) {
                continue;
            }
            if seen.contains(&expanded.permission_name) {
                duplicates += 1;
                continue;
            }
            seen.push(expanded.permission_name.clone());
            push_resolved(self.lookup, &mut assignment, &expanded.permission_name);
        }

        self.append_extras(&mut assignment, &mut seen);

        if duplicates > 0 {
            debug!(
                role = %assignment.role_name,
                duplicates,
                "dropped duplicate capability candidates"
            );
        }
        if !assignment.not_found.is_empty() {
            warn!(
                role = %assignment.role_name,
                count = assignment.not_found.len(),
                names = ?assignment.not_found,
                "capability candidates with no eureka match"
            );
        }
        assignment
    }

    fn append_extras(&self, assignment: &mut RoleCapabilityAssignment, seen: &mut Vec<String>) {
        let Some(extras) = self.extras else {
            return;
        };
        let has_edit = seen.iter().any(|n| extras.is_edit_trigger(n));
        let has_view = seen.iter().any(|n| extras.is_view_trigger(n));
        let bundle = if has_edit {
            extras.edit_bundle()
        } else if has_view {
            extras.view_bundle()
        } else {
            return;
        };

        for name in bundle {
            if seen.contains(name) {
                continue;
            }
            seen.push(name.clone());
            push_resolved(self.lookup, assignment, name);
        }
    }
}

fn push_resolved(
    lookup: &dyn CapabilityLookup,
    assignment: &mut RoleCapabilityAssignment,
    permission_name: &str,
) {
    let (kind, capability) = lookup.resolve(permission_name);
    if kind == ResolvedKind::NotFound {
        assignment.not_found.push(permission_name.to_string());
    }
    assignment.entries.push(AssignmentEntry {
        permission_name: permission_name.to_string(),
        kind,
        capability,
    });
}

/// Ordered set of user ids holding `permission_name`
fn assigned_users(permission_name: &str, users: &[PermissionUser]) -> Vec<String> {
    let mut out = Vec::new();
    for user in users {
        if user.permissions.iter().any(|p| p == permission_name)
            && !out.contains(&user.user_id)
        {
            out.push(user.user_id.clone());
        }
    }
    out
}
