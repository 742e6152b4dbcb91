//! Identifier index for dependency reference lookup.

use crate::model::{Identifier, MatchableId, NodeId, PackageGraph};
use std::collections::HashMap;

/// Identifier → nodes carrying it.
///
/// Collisions are expected: several nodes may share a digest or a duplicated
/// `bom-ref`. Hit lists keep node order. Identifiers with an empty value are
/// not indexed, since they would match every other empty value.
#[derive(Debug, Default)]
pub struct IdentifierIndex {
    by_identifier: HashMap<Identifier, Vec<NodeId>>,
}

impl IdentifierIndex {
    /// Index every identifier of every node in `graph`.
    #[must_use]
    pub fn build(graph: &PackageGraph) -> Self {
        let mut by_identifier: HashMap<Identifier, Vec<NodeId>> = HashMap::new();
        for (id, package) in graph.iter() {
            for identifier in &package.info.identifiers {
                if identifier.value.is_empty() {
                    continue;
                }
                let hits = by_identifier.entry(identifier.clone()).or_default();
                if hits.last() != Some(&id) {
                    hits.push(id);
                }
            }
        }
        Self { by_identifier }
    }

    /// Nodes carrying exactly `identifier`
    #[must_use]
    pub fn get(&self, identifier: &Identifier) -> &[NodeId] {
        self.by_identifier
            .get(identifier)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Distinct nodes hit by any identifier of `group`, in first-hit order.
    #[must_use]
    pub fn candidates(&self, group: &MatchableId) -> Vec<NodeId> {
        let mut found: Vec<NodeId> = Vec::new();
        for identifier in group.identifiers() {
            for &node in self.get(identifier) {
                if !found.contains(&node) {
                    found.push(node);
                }
            }
        }
        found
    }

    /// Number of distinct identifiers indexed
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_identifier.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_identifier.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PackageInfo, RawPackage};

    fn add(graph: &mut PackageGraph, name: &str, ids: &[Identifier]) -> NodeId {
        let mut raw = RawPackage::new(name, format!("pkg:generic/{name}@1"));
        raw.identifiers = ids.to_vec();
        graph.add_node(PackageInfo::from_raw(&raw).expect("valid package"))
    }

    #[test]
    fn test_collisions_keep_node_order() {
        let mut graph = PackageGraph::new();
        let a = add(&mut graph, "a", &[Identifier::new("sha-1", "dup")]);
        let b = add(&mut graph, "b", &[Identifier::new("sha-1", "dup")]);
        let index = IdentifierIndex::build(&graph);
        assert_eq!(index.get(&Identifier::new("sha-1", "dup")), &[a, b]);
    }

    #[test]
    fn test_empty_values_not_indexed() {
        let mut graph = PackageGraph::new();
        add(&mut graph, "a", &[Identifier::new("cpe", "")]);
        let index = IdentifierIndex::build(&graph);
        assert!(index.is_empty());
    }

    #[test]
    fn test_candidates_distinct() {
        let mut graph = PackageGraph::new();
        let a = add(
            &mut graph,
            "a",
            &[Identifier::bom_ref("a"), Identifier::new("sha-1", "x")],
        );
        let group = MatchableId::new(&[Identifier::bom_ref("a"), Identifier::new("sha-1", "x")]);
        let index = IdentifierIndex::build(&graph);
        assert_eq!(index.candidates(&group), vec![a]);
    }
}
