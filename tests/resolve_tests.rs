//! Dependency graph resolution tests.
//!
//! Covers the documented resolution scenarios, determinism and the
//! reachability guarantees of acyclic inputs.

use sbom_join::model::{Identifier, NodeId, PackageGraph, PackageWithDependencyRefs, RawPackage};
use sbom_join::{resolve, Sbom};

// ============================================================================
// Helpers
// ============================================================================

fn record(name: &str, purl: &str, doc_ref: &str) -> PackageWithDependencyRefs {
    PackageWithDependencyRefs::new(
        RawPackage::new(name, purl)
            .with_version("1")
            .with_identifier(Identifier::bom_ref(doc_ref)),
    )
}

fn names(graph: &PackageGraph, ids: &[NodeId]) -> Vec<String> {
    ids.iter().map(|&id| graph[id].info.name.clone()).collect()
}

/// Edge list as (parent name, child name) pairs in link order
fn edges(graph: &PackageGraph) -> Vec<(String, String)> {
    graph
        .iter()
        .flat_map(|(_, p)| {
            p.dependencies()
                .iter()
                .map(|&d| (p.info.name.clone(), graph[d].info.name.clone()))
                .collect::<Vec<_>>()
        })
        .collect()
}

// ============================================================================
// Scenarios
// ============================================================================

mod scenarios {
    use super::*;

    #[test]
    fn single_reference_is_linked() {
        let a = record("A", "pkg:pypi/foo@1", "a").depends_on(vec![Identifier::bom_ref("b")]);
        let b = record("B", "pkg:pypi/bar@1", "b");

        let res = resolve(&[a, b]);
        let a_id = NodeId::from_index(0);
        let b_id = NodeId::from_index(1);

        assert_eq!(res.graph[b_id].parents(), [a_id]);
        assert_eq!(res.graph[a_id].dependencies(), [b_id]);
        assert_eq!(res.roots, [a_id]);
        assert!(res.error.is_none());
    }

    #[test]
    fn dangling_reference_is_dropped() {
        let a = record("A", "pkg:pypi/foo@1", "a").depends_on(vec![Identifier::bom_ref("missing")]);
        let b = record("B", "pkg:pypi/bar@1", "b");

        let res = resolve(&[a, b]);
        assert_eq!(res.graph.len(), 2);
        assert_eq!(res.graph.edge_count(), 0);
        assert_eq!(names(&res.graph, &res.roots), ["A", "B"]);
        assert!(res.error.is_none());
    }

    #[test]
    fn duplicate_references_link_once() {
        let a = record("A", "pkg:pypi/foo@1", "a")
            .depends_on(vec![Identifier::bom_ref("b")])
            .depends_on(vec![Identifier::bom_ref("b"), Identifier::bom_ref("b")]);
        let b = record("B", "pkg:pypi/bar@1", "b");

        let res = resolve(&[a, b]);
        assert_eq!(res.graph.edge_count(), 1);
    }

    #[test]
    fn reference_by_purl_identifier() {
        let mut a = record("A", "pkg:npm/a@1", "a");
        a.dependencies.push(vec![Identifier::purl("pkg:npm/b@1")]);
        let b = PackageWithDependencyRefs::new(
            RawPackage::new("B", "pkg:npm/b@1").with_identifier(Identifier::purl("pkg:npm/b@1")),
        );
        let res = resolve(&[a, b]);
        assert_eq!(edges(&res.graph), [("A".to_string(), "B".to_string())]);
    }

    #[test]
    fn cyclic_input_is_linked_as_declared() {
        let a = record("A", "pkg:npm/a@1", "a").depends_on(vec![Identifier::bom_ref("b")]);
        let b = record("B", "pkg:npm/b@1", "b").depends_on(vec![Identifier::bom_ref("a")]);

        let res = resolve(&[a, b]);
        assert_eq!(res.graph.edge_count(), 2);
        assert!(res.roots.is_empty());
        assert!(res.graph.has_cycle());
        // Traversal terminates and visits each node once.
        assert_eq!(res.graph.walk_from(&[NodeId::from_index(0)]).len(), 2);
    }

    #[test]
    fn self_reference_is_kept_as_edge() {
        let a = record("A", "pkg:npm/a@1", "a").depends_on(vec![Identifier::bom_ref("a")]);
        let res = resolve(&[a]);
        assert_eq!(res.graph.edge_count(), 1);
        assert!(res.roots.is_empty());
    }
}

// ============================================================================
// Record errors
// ============================================================================

mod record_errors {
    use super::*;

    #[test]
    fn malformed_records_are_batched() {
        let good = record("good", "pkg:npm/good@1", "good");
        let no_purl = record("no-purl", "", "x");
        let bad_purl = record("bad-purl", "definitely not a purl", "y");

        let res = resolve(&[no_purl, good, bad_purl]);
        assert_eq!(res.graph.len(), 1);

        let err = res.error.expect("batch error");
        let indices: Vec<usize> = err.errors.iter().map(|e| e.index).collect();
        assert_eq!(indices, [0, 2]);
        assert!(err.to_string().contains("no-purl"));
    }

    #[test]
    fn from_records_keeps_usable_records() {
        let good = record("good", "pkg:npm/good@1", "good");
        let bad = record("bad", "", "bad");
        let (sbom, err) = Sbom::from_records("doc.json", &[good, bad]);
        assert_eq!(sbom.package_count(), 1);
        assert_eq!(err.map(|e| e.len()), Some(1));
    }
}

// ============================================================================
// Determinism and reachability
// ============================================================================

/// A layered acyclic document: `width` packages per layer, every package
/// depending on two packages of the next layer.
fn layered(layers: usize, width: usize) -> Vec<PackageWithDependencyRefs> {
    let mut records = Vec::new();
    for layer in 0..layers {
        for i in 0..width {
            let name = format!("p{layer}-{i}");
            let mut rec = record(&name, &format!("pkg:npm/{name}@1"), &name);
            if layer + 1 < layers {
                for j in [i, (i + 1) % width] {
                    rec = rec.depends_on(vec![Identifier::bom_ref(format!("p{}-{j}", layer + 1))]);
                }
            }
            records.push(rec);
        }
    }
    records
}

#[test]
fn resolution_is_deterministic() {
    let records = layered(5, 7);
    let first = resolve(&records);
    for _ in 0..5 {
        let again = resolve(&records);
        assert_eq!(again.graph, first.graph);
        assert_eq!(again.roots, first.roots);
    }
}

#[test]
fn acyclic_graph_reachable_from_roots() {
    let records = layered(6, 5);
    let res = resolve(&records);

    assert!(!res.graph.has_cycle());
    assert_eq!(res.roots.len(), 5);
    for &root in &res.roots {
        assert!(res.graph[root].parents().is_empty());
    }
    assert!(res.graph.unreachable_from(&res.roots).is_empty());
    assert_eq!(res.graph.walk_from(&res.roots).len(), res.graph.len());
}
