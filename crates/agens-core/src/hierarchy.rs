//! Label inheritance traversal.
//!
//! Labels form a multiple-inheritance DAG (`CREATE VLABEL vulcan INHERITS
//! (humanoid, telepathic)`). The hierarchy is built from the catalog's
//! parent/child pairs.

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

/// Parent/child relationships between labels of one kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelHierarchy {
    parents: BTreeMap<String, Vec<String>>,
    children: BTreeMap<String, Vec<String>>,
    labels: BTreeSet<String>,
}

impl LabelHierarchy {
    /// Build from `(parent, child)` pairs.
    pub fn from_pairs<I, P, C>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (P, C)>,
        P: Into<String>,
        C: Into<String>,
    {
        let mut hierarchy = Self::default();
        for (parent, child) in pairs {
            hierarchy.add(parent.into(), child.into());
        }
        hierarchy
    }

    /// Register a label that takes part in no inheritance relationship.
    pub fn add_label(&mut self, label: impl Into<String>) {
        self.labels.insert(label.into());
    }

    fn add(&mut self, parent: String, child: String) {
        self.labels.insert(parent.clone());
        self.labels.insert(child.clone());
        let parents = self.parents.entry(child.clone()).or_default();
        if !parents.contains(&parent) {
            parents.push(parent.clone());
        }
        let children = self.children.entry(parent).or_default();
        if !children.contains(&child) {
            children.push(child);
        }
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    /// Direct parents in declaration order.
    pub fn parents(&self, label: &str) -> &[String] {
        self.parents.get(label).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Direct children.
    pub fn children(&self, label: &str) -> &[String] {
        self.children.get(label).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All ancestors, breadth-first, each listed once.
    pub fn ancestors(&self, label: &str) -> Vec<String> {
        self.walk(label, |l| self.parents(l))
    }

    /// All descendants, breadth-first, each listed once.
    pub fn descendants(&self, label: &str) -> Vec<String> {
        self.walk(label, |l| self.children(l))
    }

    /// The label followed by its ancestors.
    pub fn is_a(&self, label: &str) -> Vec<String> {
        let mut out = vec![label.to_string()];
        out.extend(self.ancestors(label));
        out
    }

    /// True when `label` equals `ancestor` or inherits from it.
    pub fn inherits_from(&self, label: &str, ancestor: &str) -> bool {
        label == ancestor || self.ancestors(label).iter().any(|a| a == ancestor)
    }

    fn walk<'a, F>(&'a self, start: &str, next: F) -> Vec<String>
    where
        F: Fn(&str) -> &'a [String],
    {
        let mut seen: HashSet<&str> = HashSet::new();
        seen.insert(start);
        let mut queue: VecDeque<&str> = VecDeque::new();
        let mut out = Vec::new();
        for n in next(start) {
            if seen.insert(n) {
                queue.push_back(n);
            }
        }
        while let Some(label) = queue.pop_front() {
            out.push(label.to_string());
            for n in next(label) {
                if seen.insert(n) {
                    queue.push_back(n);
                }
            }
        }
        out
    }

    /// Labels without parents.
    pub fn roots(&self) -> Vec<&str> {
        self.labels
            .iter()
            .filter(|l| self.parents(l).is_empty())
            .map(String::as_str)
            .collect()
    }

    /// `(parent, child)` pairs, sorted by parent.
    pub fn pairs(&self) -> Vec<(&str, &str)> {
        self.children
            .iter()
            .flat_map(|(p, cs)| cs.iter().map(move |c| (p.as_str(), c.as_str())))
            .collect()
    }

    /// Indented text tree. A label with several parents appears under each.
    pub fn render_tree(&self) -> String {
        let mut out = String::new();
        for root in self.roots() {
            self.render_node(root, 0, &mut Vec::new(), &mut out);
        }
        out
    }

    fn render_node<'a>(&'a self, label: &'a str, depth: usize, path: &mut Vec<&'a str>, out: &mut String) {
        out.push_str(&"  ".repeat(depth));
        out.push_str(label);
        out.push('\n');
        if path.contains(&label) {
            return;
        }
        path.push(label);
        for child in self.children(label) {
            self.render_node(child, depth + 1, path, out);
        }
        path.pop();
    }
}
