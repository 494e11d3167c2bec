//! Cross-crate pipeline tests: snapshot -> classification -> synthesis
//! -> resolution -> report files

use std::collections::HashMap;

use capmig_core::{
    CapabilityLookup, CapabilityRef, Category, Classifier, LoadSnapshot, ModulePermissions,
    PermissionRecord, PermissionUser, RoleSynthesizer, Strategy, UserRoleResolver,
};
use capmig_reports::{MigrationReport, WorkbookWriter};

#[derive(Default)]
struct Directory {
    sets: HashMap<String, CapabilityRef>,
    capabilities: HashMap<String, CapabilityRef>,
}

impl CapabilityLookup for Directory {
    fn capability_set_by_permission(&self, name: &str) -> Option<CapabilityRef> {
        self.sets.get(name).cloned()
    }

    fn capability_by_permission(&self, name: &str) -> Option<CapabilityRef> {
        self.capabilities.get(name).cloned()
    }
}

fn tenant_snapshot() -> LoadSnapshot {
    let manager = PermissionRecord::new("inv.manager")
        .mutable(true)
        .with_display_name("Inventory manager")
        .with_sub_permissions(["inv.editor", "inventory.items.delete"]);
    let editor = PermissionRecord::new("inv.editor")
        .mutable(true)
        .with_display_name("Inventory editor")
        .with_child_of(["inv.manager"])
        .with_sub_permissions(["inventory.items.edit"]);

    LoadSnapshot {
        all_permissions: vec![manager.clone(), editor.clone()],
        all_permissions_expanded: vec![
            manager.clone().with_sub_permissions([
                "inv.editor",
                "inventory.items.delete",
                "inventory.items.edit",
            ]),
            editor.clone(),
        ],
        okapi_permissions: vec![ModulePermissions {
            module_id: "mod-inventory-2.0".to_string(),
            permission_sets: vec![
                PermissionRecord::new("inventory.items.delete"),
                PermissionRecord::new("inventory.items.edit"),
            ],
        }],
        permission_users: vec![PermissionUser {
            user_id: "librarian".to_string(),
            permissions: vec!["inv.manager".to_string(), "inv.editor".to_string()],
        }],
    }
}

fn directory() -> Directory {
    let mut directory = Directory::default();
    for name in ["inventory.items.delete", "inventory.items.edit"] {
        directory.capabilities.insert(
            name.to_string(),
            CapabilityRef {
                id: format!("cap-{name}"),
                name: name.replace('.', "_"),
                resource: name.to_string(),
                action: "manage".to_string(),
            },
        );
    }
    directory
}

#[test]
fn pipeline_produces_a_complete_report() {
    let snapshot = tenant_snapshot();
    let analysis = Classifier::new().classify_snapshot(&snapshot);
    assert_eq!(analysis.category_of("inv.manager"), Some(Category::Mutable));
    assert_eq!(analysis.category_of("inv.editor"), Some(Category::Mutable));

    let lookup = directory();
    let synthesis =
        RoleSynthesizer::new(&analysis, &lookup).synthesize(&snapshot.permission_users);
    let user_roles = UserRoleResolver::new(&analysis, &synthesis.roles, Strategy::Consolidated)
        .resolve()
        .unwrap();

    let report = MigrationReport::new(Strategy::Consolidated, analysis.report())
        .with_synthesis(synthesis.roles, synthesis.assignments, synthesis.skipped)
        .with_user_roles(user_roles);

    assert_eq!(report.roles.len(), 2);
    assert_eq!(report.user_roles.len(), 1);
    // Consolidated: the editor role is covered by the manager role.
    assert_eq!(report.user_roles[0].role_names, vec!["Inventory manager"]);
}

#[test]
fn report_round_trips_through_gzip_json() {
    let snapshot = tenant_snapshot();
    let analysis = Classifier::new().classify_snapshot(&snapshot);
    let lookup = directory();
    let synthesis =
        RoleSynthesizer::new(&analysis, &lookup).synthesize(&snapshot.permission_users);
    let user_roles = UserRoleResolver::new(&analysis, &synthesis.roles, Strategy::Distributed)
        .resolve()
        .unwrap();
    let report = MigrationReport::new(Strategy::Distributed, analysis.report())
        .with_synthesis(synthesis.roles, synthesis.assignments, synthesis.skipped)
        .with_user_roles(user_roles);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.json.gz");
    capmig_reports::write_gzip_json(&path, &report).unwrap();
    let back: MigrationReport = capmig_reports::read_gzip_json(&path).unwrap();

    assert_eq!(back.strategy, Strategy::Distributed);
    assert_eq!(back.roles.len(), report.roles.len());
    assert_eq!(back.analysis.counts, report.analysis.counts);
    // Distributed: holding the manager role widens to the editor role.
    let librarian = &back.user_roles[0];
    assert_eq!(
        librarian.role_names,
        vec!["Inventory manager", "Inventory editor"]
    );
}

#[test]
fn workbook_renders_every_bucket() {
    let snapshot = tenant_snapshot();
    let analysis = Classifier::new().classify_snapshot(&snapshot);
    let report = MigrationReport::new(Strategy::Distributed, analysis.report());

    let dir = tempfile::tempdir().unwrap();
    let written = WorkbookWriter::new(dir.path()).write(&report).unwrap();
    assert_eq!(written.len(), 8);

    let mutable =
        std::fs::read_to_string(dir.path().join("classification-mutable.csv")).unwrap();
    assert!(mutable.contains("inv.manager"));
    assert!(mutable.contains("inv.editor"));
}

#[test]
fn snapshot_persists_for_offline_runs() {
    let snapshot = tenant_snapshot();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("snapshot.json.gz");
    capmig_reports::write_gzip_json(&path, &snapshot).unwrap();

    let restored: LoadSnapshot = capmig_reports::read_gzip_json(&path).unwrap();
    let original = Classifier::new().classify_snapshot(&snapshot).report();
    let reloaded = Classifier::new().classify_snapshot(&restored).report();
    assert_eq!(
        serde_json::to_string(&original).unwrap(),
        serde_json::to_string(&reloaded).unwrap()
    );
}
