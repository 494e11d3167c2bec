//! Inconsistent-metadata detection for multiply-declared permissions

use std::collections::BTreeSet;

use crate::model::{SourceDeclaration, SourceKind};

/// Field names reported in invalidity reasons
const FIELD_MUTABLE: &str = "mutable";
const FIELD_DEPRECATED: &str = "deprecated";
const FIELD_DISPLAY_NAME: &str = "displayName";
const FIELD_DESCRIPTION: &str = "description";
const FIELD_SUB_PERMISSIONS: &str = "subPermissions";

/// Returns the names of fields that disagree across `declarations`.
///
/// A permission counts as questionable only when exactly one field
/// disagrees; zero or two-plus disagreements fall through to the other
/// classification rules.
pub fn differing_fields(declarations: &[SourceDeclaration]) -> Vec<String> {
    let mut triggered = Vec::new();

    if !all_equal(declarations.iter().map(|d| d.record.mutable)) {
        triggered.push(FIELD_MUTABLE.to_string());
    }
    if !all_equal(declarations.iter().map(|d| d.record.deprecated)) {
        triggered.push(FIELD_DEPRECATED.to_string());
    }
    if !all_equal(declarations.iter().map(|d| d.record.display_name.as_deref())) {
        triggered.push(FIELD_DISPLAY_NAME.to_string());
    }
    if !all_equal(declarations.iter().map(|d| d.record.description.as_deref())) {
        triggered.push(FIELD_DESCRIPTION.to_string());
    }
    if sub_permissions_differ(declarations) {
        triggered.push(FIELD_SUB_PERMISSIONS.to_string());
    }

    triggered
}

fn all_equal<T: PartialEq>(mut values: impl Iterator<Item = T>) -> bool {
    match values.next() {
        Some(first) => values.all(|v| v == first),
        None => true,
    }
}

/// Three-valued sub-permission comparison.
///
/// Non-flattened declarations must agree with each other exactly. When
/// they do not, the flattened declaration still settles the matter:
/// flattening legitimately adds transitively-reachable names, so the
/// non-flat sets only need to be contained in the flattened set.
fn sub_permissions_differ(declarations: &[SourceDeclaration]) -> bool {
    let non_flat: Vec<BTreeSet<&str>> = declarations
        .iter()
        .filter(|d| d.source != SourceKind::FlatPs)
        .map(|d| sub_set(d))
        .collect();

    if all_equal(non_flat.iter()) {
        return false;
    }

    // Union of flat declarations; normally at most one exists.
    let flat: Option<BTreeSet<&str>> = declarations
        .iter()
        .filter(|d| d.source == SourceKind::FlatPs)
        .map(|d| sub_set(d))
        .reduce(|mut acc, s| {
            acc.extend(s);
            acc
        });

    match flat {
        Some(flat) => !non_flat.iter().all(|s| s.is_subset(&flat)),
        None => true,
    }
}

fn sub_set(declaration: &SourceDeclaration) -> BTreeSet<&str> {
    declaration
        .record
        .sub_permissions
        .iter()
        .map(String::as_str)
        .collect()
}
