//! Cache hierarchy: per-namespace roots and lazily-created group nodes.
//!
//! Every task is indexed at its namespace root; grouped tasks are indexed a
//! second time under their group node, so a namespace sweep is O(total
//! tasks) without enumerating groups. Labels live in the node the task was
//! registered into, at most one live task per label per node.

use crate::types::TaskId;
use std::collections::BTreeMap;

/// One cache node: the unlabeled index in insertion order plus the label
/// index.
#[derive(Debug, Default)]
pub(crate) struct CacheNode {
    order: Vec<TaskId>,
    labels: BTreeMap<String, TaskId>,
}

impl CacheNode {
    /// Appends `id` to the insertion-ordered index.
    pub(crate) fn insert(&mut self, id: TaskId) {
        self.order.push(id);
    }

    /// Removes `id` from the insertion-ordered index.
    pub(crate) fn remove_id(&mut self, id: TaskId) {
        self.order.retain(|other| *other != id);
    }

    /// Maps `label` to `id`, returning the displaced id if the label was
    /// occupied.
    pub(crate) fn set_label(&mut self, label: String, id: TaskId) -> Option<TaskId> {
        self.labels.insert(label, id)
    }

    /// Resolves a label to its current id.
    pub(crate) fn label(&self, label: &str) -> Option<TaskId> {
        self.labels.get(label).copied()
    }

    /// Removes the label mapping only if it still points at `id`.
    ///
    /// A collision overwrites the mapping before the incumbent's record is
    /// torn down, so teardown must not clobber the successor's entry.
    pub(crate) fn remove_label_if(&mut self, label: &str, id: TaskId) {
        if self.labels.get(label) == Some(&id) {
            self.labels.remove(label);
        }
    }

    /// Snapshot of the indexed ids in insertion order.
    pub(crate) fn ids(&self) -> Vec<TaskId> {
        self.order.clone()
    }

    /// Number of indexed tasks.
    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }
}

/// Cache hierarchy for one namespace: root node plus group nodes.
#[derive(Debug, Default)]
pub(crate) struct NamespaceCache {
    pub(crate) root: CacheNode,
    pub(crate) groups: BTreeMap<String, CacheNode>,
}

impl NamespaceCache {
    /// The node for an exact group name, if it exists.
    pub(crate) fn group(&self, name: &str) -> Option<&CacheNode> {
        self.groups.get(name)
    }

    /// The node for an exact group name, created lazily.
    pub(crate) fn group_mut(&mut self, name: &str) -> &mut CacheNode {
        self.groups.entry(name.to_owned()).or_default()
    }

    /// Names of existing groups matching `pattern`, in map order.
    ///
    /// Patterns broadcast over what exists; they never create groups.
    pub(crate) fn matching_groups(&self, pattern: &GroupPattern) -> Vec<String> {
        self.groups
            .keys()
            .filter(|name| pattern.matches(name))
            .cloned()
            .collect()
    }
}

/// Exact name or pattern, for selecting groups.
#[derive(Debug, Clone)]
pub enum GroupMatch {
    /// A single group by exact name.
    Exact(String),
    /// Every existing group whose name matches the pattern.
    Pattern(GroupPattern),
}

/// A `*`-glob over group names.
///
/// `*` matches any run of characters (including none); everything else
/// matches literally. `net.*` selects `net.a` and `net.b` but not `other`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupPattern {
    raw: String,
}

impl GroupPattern {
    /// Builds a pattern from its glob source.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// The glob source.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether `name` matches this pattern.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        glob_match(self.raw.as_bytes(), name.as_bytes())
    }
}

/// Iterative glob match with backtracking over the most recent `*`.
fn glob_match(pattern: &[u8], text: &[u8]) -> bool {
    let mut p = 0;
    let mut t = 0;
    let mut star: Option<usize> = None;
    let mut mark = 0;

    while t < text.len() {
        if p < pattern.len() && pattern[p] == text[t] {
            p += 1;
            t += 1;
        } else if p < pattern.len() && pattern[p] == b'*' {
            star = Some(p);
            mark = t;
            p += 1;
        } else if let Some(s) = star {
            p = s + 1;
            mark += 1;
            t = mark;
        } else {
            return false;
        }
    }
    while p < pattern.len() && pattern[p] == b'*' {
        p += 1;
    }
    p == pattern.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TaskId;

    fn id(n: u32) -> TaskId {
        TaskId::new_for_test(n, 0)
    }

    #[test]
    fn insertion_order_survives_removal() {
        let mut node = CacheNode::default();
        node.insert(id(1));
        node.insert(id(2));
        node.insert(id(3));
        node.remove_id(id(2));
        assert_eq!(node.ids(), vec![id(1), id(3)]);
    }

    #[test]
    fn label_overwrite_reports_displaced_id() {
        let mut node = CacheNode::default();
        assert_eq!(node.set_label("spinner".into(), id(1)), None);
        assert_eq!(node.set_label("spinner".into(), id(2)), Some(id(1)));
        assert_eq!(node.label("spinner"), Some(id(2)));
    }

    #[test]
    fn stale_label_removal_is_a_no_op() {
        let mut node = CacheNode::default();
        node.set_label("spinner".into(), id(2));
        // The displaced task's teardown must not clobber the successor.
        node.remove_label_if("spinner", id(1));
        assert_eq!(node.label("spinner"), Some(id(2)));
        node.remove_label_if("spinner", id(2));
        assert_eq!(node.label("spinner"), None);
    }

    #[test]
    fn glob_semantics() {
        let pat = GroupPattern::new("net.*");
        assert!(pat.matches("net.a"));
        assert!(pat.matches("net."));
        assert!(!pat.matches("net"));
        assert!(!pat.matches("other"));

        assert!(GroupPattern::new("*").matches("anything"));
        assert!(GroupPattern::new("*zombie*").matches("gc:zombie"));
        assert!(GroupPattern::new("a*c").matches("abc"));
        assert!(GroupPattern::new("a*c").matches("ac"));
        assert!(!GroupPattern::new("a*c").matches("ab"));
        assert!(GroupPattern::new("").matches(""));
        assert!(!GroupPattern::new("").matches("x"));
    }

    #[test]
    fn patterns_never_create_groups() {
        let mut cache = NamespaceCache::default();
        cache.group_mut("net.a");
        cache.group_mut("net.b");
        cache.group_mut("other");
        let matched = cache.matching_groups(&GroupPattern::new("net.*"));
        assert_eq!(matched, vec!["net.a".to_owned(), "net.b".to_owned()]);
        assert_eq!(cache.groups.len(), 3);
    }
}
