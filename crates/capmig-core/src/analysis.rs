//! Classification result container

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::{Category, ClassifiedPermission, SourceKind};

/// Per-category entry counts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCounts {
    pub deprecated: usize,
    pub invalid: usize,
    pub questionable: usize,
    pub okapi: usize,
    pub mutable: usize,
    pub unprocessed: usize,
}

impl CategoryCounts {
    pub fn get(&self, category: Category) -> usize {
        match category {
            Category::Deprecated => self.deprecated,
            Category::Invalid => self.invalid,
            Category::Questionable => self.questionable,
            Category::Okapi => self.okapi,
            Category::Mutable => self.mutable,
            Category::Unprocessed => self.unprocessed,
        }
    }

    fn bump(&mut self, category: Category) {
        match category {
            Category::Deprecated => self.deprecated += 1,
            Category::Invalid => self.invalid += 1,
            Category::Questionable => self.questionable += 1,
            Category::Okapi => self.okapi += 1,
            Category::Mutable => self.mutable += 1,
            Category::Unprocessed => self.unprocessed += 1,
        }
    }
}

/// Result of classifying the three source collections.
///
/// Entries keep insertion order; the six category buckets are views over
/// the same entry list, so together with the system-name set they always
/// partition the input name universe.
#[derive(Debug, Clone, Default)]
pub struct PermissionAnalysis {
    entries: Vec<ClassifiedPermission>,
    index: HashMap<String, usize>,
    system_names: Vec<String>,
    system_counts: HashMap<SourceKind, usize>,
}

impl PermissionAnalysis {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a system (`SYS#`) permission name for one source
    pub(crate) fn record_system(&mut self, source: SourceKind, name: &str) {
        *self.system_counts.entry(source).or_insert(0) += 1;
        if !self.system_names.iter().any(|n| n == name) {
            self.system_names.push(name.to_string());
        }
    }

    /// Returns the working entry for `name`, creating it on first sight
    pub(crate) fn entry_mut(&mut self, name: &str) -> &mut ClassifiedPermission {
        if let Some(&i) = self.index.get(name) {
            return &mut self.entries[i];
        }
        let i = self.entries.len();
        self.index.insert(name.to_string(), i);
        self.entries.push(ClassifiedPermission::new(name));
        &mut self.entries[i]
    }

    pub(crate) fn entries_mut(&mut self) -> &mut [ClassifiedPermission] {
        &mut self.entries
    }

    pub fn get(&self, name: &str) -> Option<&ClassifiedPermission> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    pub fn category_of(&self, name: &str) -> Option<Category> {
        self.get(name).map(|e| e.category)
    }

    pub fn is_system(&self, name: &str) -> bool {
        name.starts_with(crate::model::SYSTEM_PERMISSION_PREFIX)
            || self.system_names.iter().any(|n| n == name)
    }

    /// All classified entries, insertion order
    pub fn iter(&self) -> impl Iterator<Item = &ClassifiedPermission> {
        self.entries.iter()
    }

    /// One category bucket, insertion order
    pub fn bucket(&self, category: Category) -> impl Iterator<Item = &ClassifiedPermission> {
        self.entries.iter().filter(move |e| e.category == category)
    }

    pub fn mutable(&self) -> impl Iterator<Item = &ClassifiedPermission> {
        self.bucket(Category::Mutable)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn system_names(&self) -> &[String] {
        &self.system_names
    }

    pub fn system_count(&self, source: SourceKind) -> usize {
        self.system_counts.get(&source).copied().unwrap_or(0)
    }

    pub fn counts(&self) -> CategoryCounts {
        let mut counts = CategoryCounts::default();
        for entry in &self.entries {
            counts.bump(entry.category);
        }
        counts
    }

    /// Parent ("childOf") names declared for `name`, union across declarations
    pub fn parents_of(&self, name: &str) -> Vec<String> {
        self.get(name)
            .map(|e| e.parent_names())
            .unwrap_or_default()
    }

    /// Owned, serializable rendering with one list per bucket
    pub fn report(&self) -> AnalysisReport {
        let mut report = AnalysisReport {
            counts: self.counts(),
            system_permission_names: self.system_names.clone(),
            ..Default::default()
        };
        for entry in &self.entries {
            let bucket = match entry.category {
                Category::Deprecated => &mut report.deprecated,
                Category::Invalid => &mut report.invalid,
                Category::Questionable => &mut report.questionable,
                Category::Okapi => &mut report.okapi,
                Category::Mutable => &mut report.mutable,
                Category::Unprocessed => &mut report.unprocessed,
            };
            bucket.push(entry.clone());
        }
        report
    }
}

/// Serializable classification report, one list per category bucket
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub counts: CategoryCounts,
    pub deprecated: Vec<ClassifiedPermission>,
    pub invalid: Vec<ClassifiedPermission>,
    pub questionable: Vec<ClassifiedPermission>,
    pub okapi: Vec<ClassifiedPermission>,
    pub mutable: Vec<ClassifiedPermission>,
    pub unprocessed: Vec<ClassifiedPermission>,
    pub system_permission_names: Vec<String>,
}
