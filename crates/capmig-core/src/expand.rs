//! Transitive sub-permission closure for mutable permission sets

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::analysis::PermissionAnalysis;
use crate::model::{Category, ExpandedPermission};

/// Closure of one mutable permission's sub-permissions
#[derive(Debug, Clone, Default)]
pub struct Expansion {
    pub root: String,
    /// Direct entries (empty `expanded_from`) first, then nested ones,
    /// each in first-reached order
    pub entries: Vec<ExpandedPermission>,
    /// Names with no classification at all; reported, never fatal
    pub unknown: Vec<String>,
}

impl Expansion {
    pub fn contains(&self, permission_name: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.permission_name == permission_name)
    }

    pub fn get(&self, permission_name: &str) -> Option<&ExpandedPermission> {
        self.entries
            .iter()
            .find(|e| e.permission_name == permission_name)
    }
}

/// Expands mutable permissions against a classification result.
///
/// Recursion descends only into mutable permissions, carries an explicit
/// visited set for cycle protection, and records the mutable ancestor
/// chain each name was reached through.
pub struct SubPermissionExpander<'a> {
    analysis: &'a PermissionAnalysis,
}

impl<'a> SubPermissionExpander<'a> {
    pub fn new(analysis: &'a PermissionAnalysis) -> Self {
        Self { analysis }
    }

    pub fn expand(&self, root: &str) -> Expansion {
        let mut state = WalkState {
            visited: HashSet::from([root.to_string()]),
            order: Vec::new(),
            reached: HashMap::new(),
            unknown: Vec::new(),
        };
        self.walk(root, &[], &mut state);

        if !state.unknown.is_empty() {
            warn!(
                root,
                count = state.unknown.len(),
                names = ?state.unknown,
                "expansion reached undeclared permission names"
            );
        }

        // Direct entries take precedence in the output ordering.
        let mut entries = Vec::with_capacity(state.order.len());
        for name in &state.order {
            let entry = &state.reached[name];
            if entry.is_direct() {
                entries.push(entry.clone());
            }
        }
        for name in &state.order {
            let entry = &state.reached[name];
            if !entry.is_direct() {
                entries.push(entry.clone());
            }
        }

        debug!(root, entries = entries.len(), "expanded sub-permissions");
        Expansion {
            root: root.to_string(),
            entries,
            unknown: state.unknown,
        }
    }

    fn walk(&self, current: &str, chain: &[String], state: &mut WalkState) {
        let subs = match self.analysis.get(current) {
            Some(entry) => entry.sub_permission_union(),
            None => return,
        };

        for sub in subs {
            if sub == current || self.analysis.is_system(&sub) {
                continue;
            }

            record(&mut state.reached, &mut state.order, &sub, chain);

            match self.analysis.category_of(&sub) {
                Some(Category::Mutable) => {
                    if state.visited.insert(sub.clone()) {
                        let mut next = chain.to_vec();
                        next.push(sub.clone());
                        self.walk(&sub, &next, state);
                    }
                }
                Some(_) => {}
                None => {
                    if !state.unknown.contains(&sub) {
                        state.unknown.push(sub);
                    }
                }
            }
        }
    }
}

struct WalkState {
    visited: HashSet<String>,
    order: Vec<String>,
    reached: HashMap<String, ExpandedPermission>,
    unknown: Vec<String>,
}

/// Records one reached name. A name reached again as a direct child is
/// promoted to direct; otherwise ancestors accumulate.
fn record(
    reached: &mut HashMap<String, ExpandedPermission>,
    order: &mut Vec<String>,
    name: &str,
    chain: &[String],
) {
    match reached.get_mut(name) {
        None => {
            order.push(name.to_string());
            reached.insert(
                name.to_string(),
                ExpandedPermission {
                    permission_name: name.to_string(),
                    expanded_from: chain.to_vec(),
                },
            );
        }
        Some(existing) => {
            if chain.is_empty() {
                existing.expanded_from.clear();
            } else if !existing.is_direct() {
                for ancestor in chain {
                    if !existing.expanded_from.contains(ancestor) {
                        existing.expanded_from.push(ancestor.clone());
                    }
                }
            }
        }
    }
}
