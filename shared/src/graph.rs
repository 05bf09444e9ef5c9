//! Foreign-key dependency graph and load ordering
//!
//! Tables are ordered with Kahn's algorithm so every parent precedes the
//! children that reference it. Ties are broken by table name, which keeps the
//! order (and therefore export output) stable for an unchanged schema.

use crate::errors::GraphError;
use crate::schema::{ForeignKeyEdge, Table};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Why an edge did not become an ordering constraint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoredEdge {
    SelfReference(ForeignKeyEdge),
    UnknownTable(ForeignKeyEdge),
}

/// child -> parents plus the inverse parent -> children
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    tables: BTreeSet<String>,
    parents: BTreeMap<String, BTreeSet<String>>,
    children: BTreeMap<String, BTreeSet<String>>,
    ignored: Vec<IgnoredEdge>,
}

impl DependencyGraph {
    /// Build the graph from introspected tables and edges.
    ///
    /// Tables without columns are not nodes. Duplicate edges between the same
    /// pair collapse into one dependency.
    pub fn build(tables: &[Table], edges: &[ForeignKeyEdge]) -> Self {
        let mut graph = Self {
            tables: tables
                .iter()
                .filter(|t| !t.columns.is_empty())
                .map(|t| t.name.clone())
                .collect(),
            ..Self::default()
        };

        for edge in edges {
            if edge.is_self_reference() {
                graph.ignored.push(IgnoredEdge::SelfReference(edge.clone()));
                continue;
            }
            if !graph.tables.contains(&edge.child) || !graph.tables.contains(&edge.parent) {
                graph.ignored.push(IgnoredEdge::UnknownTable(edge.clone()));
                continue;
            }
            graph
                .parents
                .entry(edge.child.clone())
                .or_default()
                .insert(edge.parent.clone());
            graph
                .children
                .entry(edge.parent.clone())
                .or_default()
                .insert(edge.child.clone());
        }

        graph
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn contains(&self, table: &str) -> bool {
        self.tables.contains(table)
    }

    /// Tables `table` depends on
    pub fn parents_of(&self, table: &str) -> impl Iterator<Item = &str> {
        self.parents
            .get(table)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    /// Tables that depend on `table`
    pub fn dependents_of(&self, table: &str) -> impl Iterator<Item = &str> {
        self.children
            .get(table)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    /// Edges dropped while building the graph
    pub fn ignored_edges(&self) -> &[IgnoredEdge] {
        &self.ignored
    }

    /// Compute a load order with parents strictly before children.
    ///
    /// Fails with [`GraphError::Cycle`] when some tables can never reach zero
    /// remaining parents.
    pub fn load_order(&self) -> Result<LoadOrder, GraphError> {
        let mut remaining: BTreeMap<&str, usize> = self
            .tables
            .iter()
            .map(|t| (t.as_str(), self.parents.get(t).map_or(0, BTreeSet::len)))
            .collect();

        let mut queue: VecDeque<&str> = remaining
            .iter()
            .filter(|&(_, &count)| count == 0)
            .map(|(&name, _)| name)
            .collect();

        let mut ordered = Vec::with_capacity(self.tables.len());

        while let Some(table) = queue.pop_front() {
            ordered.push(table.to_string());
            for child in self.dependents_of(table) {
                if let Some(count) = remaining.get_mut(child) {
                    *count -= 1;
                    if *count == 0 {
                        queue.push_back(child);
                    }
                }
            }
        }

        if ordered.len() < self.tables.len() {
            let placed: BTreeSet<&str> = ordered.iter().map(String::as_str).collect();
            let unresolved = self
                .tables
                .iter()
                .filter(|t| !placed.contains(t.as_str()))
                .cloned()
                .collect();
            return Err(GraphError::Cycle { unresolved });
        }

        Ok(LoadOrder(ordered))
    }
}

/// Tables in an order safe for loading (parents first)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadOrder(Vec<String>);

impl LoadOrder {
    /// Wrap an order that did not come from the sorter, e.g. a hand-maintained
    /// fallback list. The caller vouches for its correctness.
    pub fn trusted(tables: Vec<String>) -> Self {
        Self(tables)
    }

    pub fn tables(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Children first; the order used when erasing data
    pub fn reversed(&self) -> Vec<&str> {
        self.iter().rev().collect()
    }

    pub fn position(&self, table: &str) -> Option<usize> {
        self.0.iter().position(|t| t == table)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for LoadOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}
