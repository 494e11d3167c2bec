//! `capmig migrate` - replay synthesized roles and user assignments
//! against Eureka

use std::collections::HashMap;
use std::path::PathBuf;

use capmig_config::AppConfig;
use capmig_core::{
    Classifier, ResolvedKind, RoleCapabilityAssignment, RoleSynthesizer, SafetyValve, Strategy,
    SynthesizedRole, UserRoleResolver, UserRoles,
};
use capmig_http::{EurekaClient, HttpClient};
use tracing::{error, info, warn};

use crate::commands::{capability_directory, load_snapshot, Command};
use crate::error::{CliError, CliResult};

pub struct MigrateCommand {
    pub config: AppConfig,
    pub snapshot: Option<PathBuf>,
    pub strategy: Option<Strategy>,
    pub dry_run: bool,
}

/// Per-item failures are collected, never abort the run
#[derive(Debug, Default)]
struct MigrationOutcome {
    roles_created: usize,
    users_assigned: usize,
    users_skipped: usize,
    failures: Vec<String>,
}

#[async_trait::async_trait]
impl Command for MigrateCommand {
    async fn execute(&self) -> CliResult<()> {
        let strategy = self.strategy.unwrap_or(self.config.migration.strategy);
        if !self.dry_run {
            if self.snapshot.is_none() {
                capmig_config::validate(&self.config)?;
            } else if self.config.eureka.url.is_empty() {
                return Err(CliError::InvalidArgument {
                    message: "eureka.url must be configured to migrate".to_string(),
                });
            }
        }

        let snapshot = load_snapshot(&self.config, &self.snapshot).await?;
        let directory = capability_directory(&self.config).await?;

        let analysis = Classifier::new().classify_snapshot(&snapshot);
        let synthesis =
            RoleSynthesizer::new(&analysis, &directory).synthesize(&snapshot.permission_users);
        let valve = if self.config.migration.enforce_token_limit {
            SafetyValve::limit(self.config.migration.max_token_length)
        } else {
            SafetyValve::disabled()
        };
        let user_roles = UserRoleResolver::new(&analysis, &synthesis.roles, strategy)
            .with_safety_valve(valve)
            .resolve()?;

        if self.dry_run {
            for role in &synthesis.roles {
                println!(
                    "would create role '{}' with {} capability candidates",
                    role.name,
                    synthesis
                        .assignments
                        .iter()
                        .find(|a| a.role_name == role.name)
                        .map(|a| a.entries.len())
                        .unwrap_or(0),
                );
            }
            for user in &user_roles {
                if user.skip_role_assignment {
                    println!("would skip user {} (token size limit)", user.user_id);
                } else {
                    println!(
                        "would assign user {} roles: {}",
                        user.user_id,
                        user.role_names.join(", ")
                    );
                }
            }
            return Ok(());
        }

        let client = EurekaClient::new(HttpClient::with_defaults()?, self.config.eureka.clone());
        let outcome = migrate(
            &client,
            &synthesis.roles,
            &synthesis.assignments,
            &user_roles,
        )
        .await;

        println!(
            "migration complete: {} roles created, {} users assigned, {} users skipped, {} failures",
            outcome.roles_created,
            outcome.users_assigned,
            outcome.users_skipped,
            outcome.failures.len(),
        );
        for failure in &outcome.failures {
            eprintln!("  failed: {failure}");
        }
        Ok(())
    }
}

async fn migrate(
    client: &EurekaClient,
    roles: &[SynthesizedRole],
    assignments: &[RoleCapabilityAssignment],
    user_roles: &[UserRoles],
) -> MigrationOutcome {
    let mut outcome = MigrationOutcome::default();

    // One role listing covers both the existence check and the id
    // lookup for user assignment; pre-existing roles (earlier runs,
    // system-generated) keep their ids.
    let mut role_ids: HashMap<String, String> = match client.roles().await {
        Ok(existing) => existing.into_iter().map(|r| (r.name, r.id)).collect(),
        Err(e) => {
            error!(error = %e, "failed to list existing roles");
            outcome.failures.push(format!("role listing: {e}"));
            HashMap::new()
        }
    };

    for role in roles {
        if role_ids.contains_key(&role.name) {
            warn!(role = %role.name, "role already exists, reusing its id");
            continue;
        }
        match client.create_role(&role.name, role.description.as_deref()).await {
            Ok(created) => {
                role_ids.insert(role.name.clone(), created.id.clone());
                outcome.roles_created += 1;
                if let Some(assignment) = assignments.iter().find(|a| a.role_name == role.name) {
                    if let Err(e) = push_assignment(client, &created.id, assignment).await {
                        error!(role = %role.name, error = %e, "capability assignment failed");
                        outcome
                            .failures
                            .push(format!("capabilities for role '{}': {e}", role.name));
                    }
                }
            }
            Err(e) => {
                error!(role = %role.name, error = %e, "role creation failed");
                outcome.failures.push(format!("role '{}': {e}", role.name));
            }
        }
    }

    for user in user_roles {
        if user.skip_role_assignment {
            outcome.users_skipped += 1;
            continue;
        }
        let mut ids = Vec::new();
        for name in &user.role_names {
            match role_ids.get(name) {
                Some(id) => ids.push(id.clone()),
                // Creation failed earlier in this run; already counted.
                None => warn!(user = %user.user_id, role = %name, "no role id available, dropping from assignment"),
            }
        }
        if ids.is_empty() {
            continue;
        }
        match client.assign_user_roles(&user.user_id, &ids).await {
            Ok(()) => outcome.users_assigned += 1,
            Err(e) => {
                error!(user = %user.user_id, error = %e, "user role assignment failed");
                outcome
                    .failures
                    .push(format!("user '{}': {e}", user.user_id));
            }
        }
    }

    info!(
        roles = outcome.roles_created,
        users = outcome.users_assigned,
        skipped = outcome.users_skipped,
        failures = outcome.failures.len(),
        "migration run finished"
    );
    outcome
}

async fn push_assignment(
    client: &EurekaClient,
    role_id: &str,
    assignment: &RoleCapabilityAssignment,
) -> capmig_http::Result<()> {
    let mut capability_ids = Vec::new();
    let mut set_ids = Vec::new();
    for entry in &assignment.entries {
        match (entry.kind, &entry.capability) {
            (ResolvedKind::Capability, Some(capability)) => {
                capability_ids.push(capability.id.clone())
            }
            (ResolvedKind::CapabilitySet, Some(set)) => set_ids.push(set.id.clone()),
            // Unmatched names were already reported at synthesis time.
            _ => {}
        }
    }
    if !set_ids.is_empty() {
        client.assign_capability_sets(role_id, &set_ids).await?;
    }
    if !capability_ids.is_empty() {
        client.assign_capabilities(role_id, &capability_ids).await?;
    }
    Ok(())
}
