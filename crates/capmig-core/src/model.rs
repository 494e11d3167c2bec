//! Permission and role data models

use serde::{Deserialize, Serialize};

/// Prefix marking synthetic system permissions, excluded from classification
pub const SYSTEM_PERMISSION_PREFIX: &str = "SYS#";

/// Which loader collection a permission declaration came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceKind {
    /// Individually declared permission sets (`/perms/permissions`)
    Ps,
    /// Pre-expanded permission sets (`/perms/permissions?expandSubs=true`)
    FlatPs,
    /// Permission sets declared inside module descriptors
    OkapiPs,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Ps => write!(f, "PS"),
            SourceKind::FlatPs => write!(f, "FLAT_PS"),
            SourceKind::OkapiPs => write!(f, "OKAPI_PS"),
        }
    }
}

/// One declaration of a permission set, as seen by one source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionRecord {
    #[serde(alias = "permissionName")]
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub mutable: bool,
    #[serde(default)]
    pub deprecated: bool,
    /// Immediate sub-permission names, order-preserving
    #[serde(default, rename = "subPermissions")]
    pub sub_permissions: Vec<String>,
    /// Parent permission names ("childOf")
    #[serde(default, rename = "childOf")]
    pub child_of: Vec<String>,
    #[serde(default)]
    pub module_id: Option<String>,
}

impl PermissionRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: None,
            description: None,
            mutable: false,
            deprecated: false,
            sub_permissions: Vec::new(),
            child_of: Vec::new(),
            module_id: None,
        }
    }

    /// Whether this is a synthetic system permission (`SYS#` prefix)
    pub fn is_system(&self) -> bool {
        self.name.starts_with(SYSTEM_PERMISSION_PREFIX)
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn mutable(mut self, mutable: bool) -> Self {
        self.mutable = mutable;
        self
    }

    pub fn deprecated(mut self, deprecated: bool) -> Self {
        self.deprecated = deprecated;
        self
    }

    pub fn with_sub_permissions<I, S>(mut self, subs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sub_permissions = subs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_child_of<I, S>(mut self, parents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.child_of = parents.into_iter().map(Into::into).collect();
        self
    }
}

/// Classification category for a permission name.
///
/// Rules are evaluated in this order; the first matching rule wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Deprecated,
    Invalid,
    Questionable,
    /// Platform-builtin permission, not migrated as a role
    Okapi,
    /// Tenant-created permission, migration candidate
    Mutable,
    Unprocessed,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Deprecated,
        Category::Invalid,
        Category::Questionable,
        Category::Okapi,
        Category::Mutable,
        Category::Unprocessed,
    ];
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Deprecated => write!(f, "deprecated"),
            Category::Invalid => write!(f, "invalid"),
            Category::Questionable => write!(f, "questionable"),
            Category::Okapi => write!(f, "okapi"),
            Category::Mutable => write!(f, "mutable"),
            Category::Unprocessed => write!(f, "unprocessed"),
        }
    }
}

/// One (source, record) pair inside a classified permission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDeclaration {
    pub source: SourceKind,
    pub record: PermissionRecord,
}

/// A unique permission name with every declaration seen for it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedPermission {
    pub name: String,
    /// Every declaration across all sources, first-seen order
    pub declarations: Vec<SourceDeclaration>,
    pub category: Category,
    /// Populated for invalid/questionable only
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub invalidity_reasons: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ClassifiedPermission {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declarations: Vec::new(),
            category: Category::Unprocessed,
            invalidity_reasons: Vec::new(),
            note: None,
        }
    }

    /// Distinct source kinds, first-seen order
    pub fn sources(&self) -> Vec<SourceKind> {
        let mut out = Vec::new();
        for decl in &self.declarations {
            if !out.contains(&decl.source) {
                out.push(decl.source);
            }
        }
        out
    }

    pub fn has_source(&self, source: SourceKind) -> bool {
        self.declarations.iter().any(|d| d.source == source)
    }

    /// First non-null display name across declarations
    pub fn display_name(&self) -> Option<&str> {
        self.declarations
            .iter()
            .find_map(|d| d.record.display_name.as_deref())
    }

    /// First non-null description across declarations
    pub fn description(&self) -> Option<&str> {
        self.declarations
            .iter()
            .find_map(|d| d.record.description.as_deref())
    }

    /// Order-preserving union of the declarations' sub-permission names
    pub fn sub_permission_union(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for decl in &self.declarations {
            for sub in &decl.record.sub_permissions {
                if !out.contains(sub) {
                    out.push(sub.clone());
                }
            }
        }
        out
    }

    /// Order-preserving union of the declarations' parent ("childOf") names
    pub fn parent_names(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for decl in &self.declarations {
            for parent in &decl.record.child_of {
                if !out.contains(parent) {
                    out.push(parent.clone());
                }
            }
        }
        out
    }

    pub fn all_deprecated(&self) -> bool {
        !self.declarations.is_empty() && self.declarations.iter().all(|d| d.record.deprecated)
    }

    pub fn all_mutable(&self) -> bool {
        !self.declarations.is_empty() && self.declarations.iter().all(|d| d.record.mutable)
    }
}

/// One entry in the sub-permission closure of a mutable permission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpandedPermission {
    pub permission_name: String,
    /// Chain of mutable ancestor names this entry was reached through;
    /// empty means a direct child of the expansion root
    pub expanded_from: Vec<String>,
}

impl ExpandedPermission {
    pub fn direct(permission_name: impl Into<String>) -> Self {
        Self {
            permission_name: permission_name.into(),
            expanded_from: Vec::new(),
        }
    }

    pub fn is_direct(&self) -> bool {
        self.expanded_from.is_empty()
    }
}

/// Role derived from one mutable permission set
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesizedRole {
    pub role_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub source_permission_name: String,
    pub expanded_permissions: Vec<ExpandedPermission>,
    /// Ordered set of user ids holding the source permission
    pub assigned_user_ids: Vec<String>,
}

/// How a capability candidate resolved against the Eureka lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvedKind {
    CapabilitySet,
    Capability,
    NotFound,
}

/// A resolved Eureka capability or capability-set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityRef {
    pub id: String,
    pub name: String,
    pub resource: String,
    pub action: String,
}

/// One capability candidate within a role's assignment list
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentEntry {
    pub permission_name: String,
    pub kind: ResolvedKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capability: Option<CapabilityRef>,
}

/// Per-role resolved capability/capability-set targets
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleCapabilityAssignment {
    pub role_name: String,
    pub entries: Vec<AssignmentEntry>,
    /// Permission names with no capability or capability-set match
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub not_found: Vec<String>,
}

/// Final per-user role resolution
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRoles {
    pub user_id: String,
    pub role_names: Vec<String>,
    /// Set when the safety valve rejected the assignment; roles are kept as computed
    #[serde(default)]
    pub skip_role_assignment: bool,
}

/// Role assignment strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Assign roles per originating permission, widening nested reachability
    Distributed,
    /// Keep only the topmost role in a containment chain per user
    Consolidated,
}

impl std::str::FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "distributed" => Ok(Strategy::Distributed),
            "consolidated" => Ok(Strategy::Consolidated),
            other => Err(format!("unknown strategy: {other}")),
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::Distributed => write!(f, "distributed"),
            Strategy::Consolidated => write!(f, "consolidated"),
        }
    }
}

/// Permission sets declared by one module descriptor
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModulePermissions {
    pub module_id: String,
    #[serde(default)]
    pub permission_sets: Vec<PermissionRecord>,
}

/// One user's legacy permission assignments
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionUser {
    pub user_id: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// Fully loaded input snapshot the core operates on
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadSnapshot {
    pub all_permissions: Vec<PermissionRecord>,
    pub all_permissions_expanded: Vec<PermissionRecord>,
    pub okapi_permissions: Vec<ModulePermissions>,
    pub permission_users: Vec<PermissionUser>,
}

impl LoadSnapshot {
    /// Flattens module descriptors into one OKAPI_PS record sequence,
    /// stamping each record with its module id
    pub fn okapi_records(&self) -> Vec<PermissionRecord> {
        let mut out = Vec::new();
        for module in &self.okapi_permissions {
            for record in &module.permission_sets {
                let mut record = record.clone();
                if record.module_id.is_none() {
                    record.module_id = Some(module.module_id.clone());
                }
                out.push(record);
            }
        }
        out
    }
}
