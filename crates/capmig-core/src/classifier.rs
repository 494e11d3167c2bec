//! Three-source permission-set classification

use tracing::{debug, info, warn};

use crate::analysis::PermissionAnalysis;
use crate::model::{
    Category, ClassifiedPermission, LoadSnapshot, PermissionRecord, SourceDeclaration, SourceKind,
};
use crate::questionable;

/// Merges the three source collections and buckets every unique
/// non-system permission name into exactly one category.
#[derive(Debug, Default)]
pub struct Classifier;

impl Classifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify_snapshot(&self, snapshot: &LoadSnapshot) -> PermissionAnalysis {
        self.classify(
            &snapshot.all_permissions,
            &snapshot.all_permissions_expanded,
            &snapshot.okapi_records(),
        )
    }

    /// Classifies the individually-declared, flattened, and
    /// module-declared record sequences.
    pub fn classify(
        &self,
        ps: &[PermissionRecord],
        flat_ps: &[PermissionRecord],
        okapi_ps: &[PermissionRecord],
    ) -> PermissionAnalysis {
        let mut analysis = PermissionAnalysis::new();

        for (source, records) in [
            (SourceKind::Ps, ps),
            (SourceKind::FlatPs, flat_ps),
            (SourceKind::OkapiPs, okapi_ps),
        ] {
            merge_source(&mut analysis, source, records);
            debug!(
                source = %source,
                records = records.len(),
                system = analysis.system_count(source),
                "merged permission source"
            );
        }

        for entry in analysis.entries_mut() {
            let decision = decide(entry);
            entry.category = decision.category;
            entry.invalidity_reasons = decision.reasons;
            entry.note = decision.note;
        }

        log_counts(&analysis);
        analysis
    }
}

fn merge_source(analysis: &mut PermissionAnalysis, source: SourceKind, records: &[PermissionRecord]) {
    for record in records {
        if record.is_system() {
            analysis.record_system(source, &record.name);
            continue;
        }
        let entry = analysis.entry_mut(&record.name);
        entry.declarations.push(SourceDeclaration {
            source,
            record: record.clone(),
        });
    }
}

struct Decision {
    category: Category,
    reasons: Vec<String>,
    note: Option<String>,
}

impl Decision {
    fn of(category: Category) -> Self {
        Self {
            category,
            reasons: Vec::new(),
            note: None,
        }
    }

    fn with_reason(category: Category, reason: String) -> Self {
        Self {
            category,
            reasons: vec![reason],
            note: None,
        }
    }
}

/// Applies the classification rules in fixed priority order;
/// the first matching rule wins.
fn decide(entry: &ClassifiedPermission) -> Decision {
    // Rule 1: deprecated everywhere it is user-visible.
    let non_okapi: Vec<&SourceDeclaration> = entry
        .declarations
        .iter()
        .filter(|d| d.source != SourceKind::OkapiPs)
        .collect();
    if !non_okapi.is_empty() && non_okapi.iter().all(|d| d.record.deprecated) {
        let mut decision = Decision::of(Category::Deprecated);
        decision.note = Some("Deprecated (not in okapi)".to_string());
        return decision;
    }
    if entry.all_deprecated() {
        return Decision::of(Category::Deprecated);
    }

    // Rule 2: declared by a single source only.
    let sources = entry.sources();
    if sources.len() == 1 {
        return Decision::with_reason(
            Category::Invalid,
            format!("single def in {}", sources[0]),
        );
    }

    // Rule 3: exactly one inconsistent field.
    let differing = questionable::differing_fields(&entry.declarations);
    if differing.len() == 1 {
        let mut decision = Decision::of(Category::Questionable);
        decision.reasons = differing;
        return decision;
    }

    // Rule 4: anything a module descriptor declares is platform-owned.
    if entry.has_source(SourceKind::OkapiPs) {
        return Decision::of(Category::Okapi);
    }

    // Rule 5: source-count anomaly.
    if sources.len() != 2 {
        let mut names: Vec<String> = sources.iter().map(|s| s.to_string()).collect();
        names.sort();
        return Decision::with_reason(
            Category::Invalid,
            format!("multiple def in [{}]", names.join(", ")),
        );
    }

    // Rule 6: tenant-created permission set, the migration candidate.
    if entry.all_mutable() {
        return Decision::of(Category::Mutable);
    }

    // Deliberate catch-all, e.g. PS/FLAT_PS pair with mismatched
    // mutable flags and no other anomaly.
    Decision::of(Category::Unprocessed)
}

fn log_counts(analysis: &PermissionAnalysis) {
    let counts = analysis.counts();
    info!(
        deprecated = counts.deprecated,
        questionable = counts.questionable,
        okapi = counts.okapi,
        mutable = counts.mutable,
        unprocessed = counts.unprocessed,
        system = analysis.system_names().len(),
        "permission classification complete"
    );
    if counts.invalid > 0 {
        warn!(invalid = counts.invalid, "invalid permission definitions found");
    } else {
        info!(invalid = 0usize, "no invalid permission definitions");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> PermissionRecord {
        PermissionRecord::new(name)
    }

    #[test]
    fn test_two_source_mutable_with_okapi_only_child() {
        let ps = vec![record("perms.foo")
            .mutable(true)
            .with_sub_permissions(["perms.bar"])];
        let flat = vec![record("perms.foo")
            .mutable(true)
            .with_sub_permissions(["perms.bar", "perms.baz"])];
        let okapi = vec![record("perms.bar")];

        let analysis = Classifier::new().classify(&ps, &flat, &okapi);
        assert_eq!(analysis.category_of("perms.foo"), Some(Category::Mutable));
        assert_eq!(analysis.category_of("perms.bar"), Some(Category::Invalid));
    }

    #[test]
    fn test_single_source_is_invalid_with_reason() {
        let analysis = Classifier::new().classify(&[record("perms.solo")], &[], &[]);
        let entry = analysis.get("perms.solo").unwrap();
        assert_eq!(entry.category, Category::Invalid);
        assert_eq!(entry.invalidity_reasons, vec!["single def in PS"]);
    }

    #[test]
    fn test_deprecated_outside_okapi_gets_note() {
        let ps = vec![record("perms.old").deprecated(true)];
        let flat = vec![record("perms.old").deprecated(true)];
        let okapi = vec![record("perms.old")];

        let analysis = Classifier::new().classify(&ps, &flat, &okapi);
        let entry = analysis.get("perms.old").unwrap();
        assert_eq!(entry.category, Category::Deprecated);
        assert_eq!(entry.note.as_deref(), Some("Deprecated (not in okapi)"));
    }

    #[test]
    fn test_deprecated_everywhere_has_no_note() {
        let ps = vec![record("perms.old").deprecated(true)];
        let flat = vec![record("perms.old").deprecated(true)];
        let okapi = vec![record("perms.old").deprecated(true)];

        let analysis = Classifier::new().classify(&ps, &flat, &okapi);
        let entry = analysis.get("perms.old").unwrap();
        assert_eq!(entry.category, Category::Deprecated);
        assert!(entry.note.is_none());
    }

    #[test]
    fn test_okapi_declaration_wins_over_mutable() {
        let ps = vec![record("users.all").mutable(true)];
        let flat = vec![record("users.all").mutable(true)];
        let okapi = vec![record("users.all").mutable(true)];

        let analysis = Classifier::new().classify(&ps, &flat, &okapi);
        assert_eq!(analysis.category_of("users.all"), Some(Category::Okapi));
    }

    #[test]
    fn test_questionable_takes_priority_over_okapi() {
        let ps = vec![record("perms.odd").with_display_name("Odd")];
        let flat = vec![record("perms.odd").with_display_name("Odd")];
        let okapi = vec![record("perms.odd").with_display_name("Different")];

        let analysis = Classifier::new().classify(&ps, &flat, &okapi);
        let entry = analysis.get("perms.odd").unwrap();
        assert_eq!(entry.category, Category::Questionable);
        assert_eq!(entry.invalidity_reasons, vec!["displayName"]);
    }

    #[test]
    fn test_mismatched_mutable_flags_fall_to_unprocessed() {
        // Two differing fields means not questionable; no okapi source,
        // two sources, not uniformly mutable: the deliberate catch-all.
        let ps = vec![record("perms.mixed")
            .mutable(true)
            .with_display_name("A")];
        let flat = vec![record("perms.mixed")
            .mutable(false)
            .with_display_name("B")];

        let analysis = Classifier::new().classify(&ps, &flat, &[]);
        assert_eq!(
            analysis.category_of("perms.mixed"),
            Some(Category::Unprocessed)
        );
    }

    #[test]
    fn test_system_permissions_excluded_from_classification() {
        let ps = vec![record("SYS#mod-users"), record("perms.real").mutable(true)];
        let flat = vec![record("SYS#mod-users"), record("perms.real").mutable(true)];

        let analysis = Classifier::new().classify(&ps, &flat, &[]);
        assert!(analysis.get("SYS#mod-users").is_none());
        assert_eq!(analysis.system_names(), ["SYS#mod-users"]);
        assert_eq!(analysis.system_count(SourceKind::Ps), 1);
        assert_eq!(analysis.category_of("perms.real"), Some(Category::Mutable));
    }

    #[test]
    fn test_partition_invariant() {
        let ps = vec![
            record("a").mutable(true),
            record("b").deprecated(true),
            record("c"),
            record("SYS#s"),
        ];
        let flat = vec![
            record("a").mutable(true),
            record("b").deprecated(true),
            record("d").with_display_name("D"),
        ];
        let okapi = vec![record("d").with_display_name("E"), record("e")];

        let analysis = Classifier::new().classify(&ps, &flat, &okapi);
        let bucketed: usize = Category::ALL
            .iter()
            .map(|&c| analysis.bucket(c).count())
            .sum();
        assert_eq!(bucketed, analysis.len());
        assert_eq!(analysis.len() + analysis.system_names().len(), 6);
    }

    #[test]
    fn test_classification_is_idempotent() {
        let ps = vec![record("a").mutable(true), record("b")];
        let flat = vec![record("a").mutable(true), record("c").deprecated(true)];
        let okapi = vec![record("c").deprecated(true)];

        let classifier = Classifier::new();
        let first = classifier.classify(&ps, &flat, &okapi).report();
        let second = classifier.classify(&ps, &flat, &okapi).report();
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}
