//! CSV workbook rendering: one sheet file per classification bucket
//! plus role and user-role sheets

use std::path::{Path, PathBuf};

use capmig_core::{Category, ClassifiedPermission};
use tracing::info;

use crate::error::Result;
use crate::report::MigrationReport;

/// Renders a report as a directory of CSV sheet files
pub struct WorkbookWriter<'a> {
    output_dir: &'a Path,
}

impl<'a> WorkbookWriter<'a> {
    pub fn new(output_dir: &'a Path) -> Self {
        Self { output_dir }
    }

    pub fn write(&self, report: &MigrationReport) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(self.output_dir)?;
        let mut written = Vec::new();

        for category in Category::ALL {
            let entries = bucket_of(report, category);
            let path = self
                .output_dir
                .join(format!("classification-{category}.csv"));
            self.write_classification_sheet(&path, entries)?;
            written.push(path);
        }

        let roles = self.output_dir.join("roles.csv");
        self.write_roles_sheet(&roles, report)?;
        written.push(roles);

        let users = self.output_dir.join("user-roles.csv");
        self.write_user_roles_sheet(&users, report)?;
        written.push(users);

        info!(dir = %self.output_dir.display(), sheets = written.len(), "workbook written");
        Ok(written)
    }

    fn write_classification_sheet(
        &self,
        path: &Path,
        entries: &[ClassifiedPermission],
    ) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(["name", "sources", "displayName", "reasons", "note"])?;
        for entry in entries {
            let sources: Vec<String> = entry.sources().iter().map(|s| s.to_string()).collect();
            writer.write_record([
                entry.name.as_str(),
                &sources.join(";"),
                entry.display_name().unwrap_or(""),
                &entry.invalidity_reasons.join(";"),
                entry.note.as_deref().unwrap_or(""),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }

    fn write_roles_sheet(&self, path: &Path, report: &MigrationReport) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record([
            "roleName",
            "roleId",
            "sourcePermission",
            "capabilities",
            "unmatched",
            "users",
        ])?;
        for role in &report.roles {
            let assignment = report.assignments.iter().find(|a| a.role_name == role.name);
            let capabilities = assignment.map(|a| a.entries.len()).unwrap_or(0);
            let unmatched = assignment.map(|a| a.not_found.len()).unwrap_or(0);
            writer.write_record([
                role.name.as_str(),
                role.role_id.as_str(),
                role.source_permission_name.as_str(),
                &capabilities.to_string(),
                &unmatched.to_string(),
                &role.assigned_user_ids.len().to_string(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }

    fn write_user_roles_sheet(&self, path: &Path, report: &MigrationReport) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(["userId", "roles", "skipRoleAssignment"])?;
        for user in &report.user_roles {
            writer.write_record([
                user.user_id.as_str(),
                &user.role_names.join(";"),
                if user.skip_role_assignment { "true" } else { "false" },
            ])?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn bucket_of(report: &MigrationReport, category: Category) -> &[ClassifiedPermission] {
    match category {
        Category::Deprecated => &report.analysis.deprecated,
        Category::Invalid => &report.analysis.invalid,
        Category::Questionable => &report.analysis.questionable,
        Category::Okapi => &report.analysis.okapi,
        Category::Mutable => &report.analysis.mutable,
        Category::Unprocessed => &report.analysis.unprocessed,
    }
}
