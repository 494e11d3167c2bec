//! Permission-set classification and capability-expansion engine.
//!
//! Takes the three Okapi permission-set collections (individually
//! declared, flattened, and module-declared), buckets every unique
//! permission name into exactly one category, expands mutable permission
//! sets into their sub-permission closure, synthesizes Eureka roles and
//! capability assignments, and resolves per-user role lists under the
//! distributed or consolidated strategy.
//!
//! The crate is pure and synchronous: it operates on a fully loaded
//! snapshot and performs no I/O.

pub mod analysis;
pub mod classifier;
pub mod error;
pub mod expand;
pub mod model;
pub mod questionable;
pub mod resolve;
pub mod synthesize;

pub use analysis::{AnalysisReport, CategoryCounts, PermissionAnalysis};
pub use classifier::Classifier;
pub use error::{Error, Result};
pub use expand::{Expansion, SubPermissionExpander};
pub use model::{
    AssignmentEntry, CapabilityRef, Category, ClassifiedPermission, ExpandedPermission,
    LoadSnapshot, ModulePermissions, PermissionRecord, PermissionUser, ResolvedKind,
    RoleCapabilityAssignment, SourceDeclaration, SourceKind, Strategy, SynthesizedRole,
    UserRoles, SYSTEM_PERMISSION_PREFIX,
};
pub use resolve::{NoSystemRoles, SafetyValve, SystemRoleLookup, UserRoleResolver};
pub use synthesize::{
    CapabilityLookup, ExtraCapabilities, RoleSynthesizer, SkippedRole, SynthesisResult,
};
