//! Assembled migration report

use capmig_core::{
    AnalysisReport, RoleCapabilityAssignment, SkippedRole, Strategy, SynthesizedRole, UserRoles,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Everything one analysis/migration run produced, ready for JSON or
/// workbook rendering
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationReport {
    pub generated_at: DateTime<Utc>,
    pub strategy: Strategy,
    pub analysis: AnalysisReport,
    pub roles: Vec<SynthesizedRole>,
    pub assignments: Vec<RoleCapabilityAssignment>,
    pub skipped_roles: Vec<SkippedRole>,
    pub user_roles: Vec<UserRoles>,
}

impl MigrationReport {
    pub fn new(strategy: Strategy, analysis: AnalysisReport) -> Self {
        Self {
            generated_at: Utc::now(),
            strategy,
            analysis,
            roles: Vec::new(),
            assignments: Vec::new(),
            skipped_roles: Vec::new(),
            user_roles: Vec::new(),
        }
    }

    pub fn with_synthesis(
        mut self,
        roles: Vec<SynthesizedRole>,
        assignments: Vec<RoleCapabilityAssignment>,
        skipped: Vec<SkippedRole>,
    ) -> Self {
        self.roles = roles;
        self.assignments = assignments;
        self.skipped_roles = skipped;
        self
    }

    pub fn with_user_roles(mut self, user_roles: Vec<UserRoles>) -> Self {
        self.user_roles = user_roles;
        self
    }
}
