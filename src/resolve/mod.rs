//! Dependency graph resolution.
//!
//! Turns the per-package identifier references of one document into a linked
//! [`PackageGraph`]:
//!
//! 1. every record is normalized into a node, in input order (invalid records
//!    are skipped and reported in a [`ResolveError`] batch)
//! 2. every node identifier is indexed
//! 3. each reference group is looked up in the index and narrowed to its
//!    targets (see [`select_targets`])
//! 4. targets are linked, duplicate edges ignored
//!
//! References that match nothing are dropped: they usually point at packages
//! outside the document. Resolution never walks the graph, so cyclic input is
//! linked as declared.

mod index;

pub use index::IdentifierIndex;

use crate::error::{RecordError, ResolveError};
use crate::model::{
    MatchableId, NodeId, PackageGraph, PackageInfo, PackageWithDependencyRefs, Sbom,
};

/// Output of [`resolve`].
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// All nodes, in input order (skipped records excluded)
    pub graph: PackageGraph,
    /// Nodes without parents, in input order
    pub roots: Vec<NodeId>,
    /// Records that could not be normalized
    pub error: Option<ResolveError>,
}

/// Resolve one document's records into a package graph.
#[must_use]
pub fn resolve(records: &[PackageWithDependencyRefs]) -> Resolution {
    let mut graph = PackageGraph::with_capacity(records.len());
    let mut linked: Vec<(NodeId, &PackageWithDependencyRefs)> = Vec::with_capacity(records.len());
    let mut errors: Vec<RecordError> = Vec::new();

    for (index, record) in records.iter().enumerate() {
        match PackageInfo::from_raw(&record.package) {
            Ok(info) => linked.push((graph.add_node(info), record)),
            Err(reason) => {
                tracing::warn!(index, name = %record.package.name, "Skipping package record: {}", reason);
                errors.push(RecordError {
                    index,
                    name: record.package.name.trim().to_string(),
                    reason,
                });
            }
        }
    }

    let index = IdentifierIndex::build(&graph);
    let mut dropped = 0usize;

    for &(source, record) in &linked {
        for group in &record.dependencies {
            let group = MatchableId::new(group);
            if group.is_empty() {
                continue;
            }
            let targets = select_targets(&graph, &index, &group);
            if targets.is_empty() {
                dropped += 1;
                tracing::debug!(
                    package = %graph[source].info.name,
                    reference = %group,
                    "Dependency reference matched no package"
                );
                continue;
            }
            for target in targets {
                graph.link(source, target);
            }
        }
    }

    let roots = graph.roots();
    tracing::debug!(
        packages = graph.len(),
        edges = graph.edge_count(),
        roots = roots.len(),
        dropped,
        "Resolved dependency graph"
    );

    Resolution {
        graph,
        roots,
        error: if errors.is_empty() {
            None
        } else {
            Some(ResolveError { errors })
        },
    }
}

/// Choose the dependency targets of one reference group.
///
/// - a single candidate is taken as is
/// - candidates for which the group is a consistent subset win, and are all
///   linked since the group cannot tell them apart
/// - otherwise candidates that contradict the group on a shared identifier
///   type are rejected; if the rest still project differently onto the group,
///   only those with the most exact identifier hits are kept
#[must_use]
pub fn select_targets(
    graph: &PackageGraph,
    index: &IdentifierIndex,
    group: &MatchableId,
) -> Vec<NodeId> {
    let candidates = index.candidates(group);
    if candidates.len() <= 1 {
        return candidates;
    }

    let identifiers_of = |node: NodeId| graph[node].info.identifiers.as_slice();

    let consistent: Vec<NodeId> = candidates
        .iter()
        .copied()
        .filter(|&node| group.is_consistent_subset_of(identifiers_of(node)))
        .collect();
    if !consistent.is_empty() {
        return consistent;
    }

    let compatible: Vec<NodeId> = candidates
        .into_iter()
        .filter(|&node| group.is_compatible_with(identifiers_of(node)))
        .collect();
    if compatible.len() <= 1 {
        return compatible;
    }

    let first_projection = group.project_onto(identifiers_of(compatible[0]));
    if compatible[1..]
        .iter()
        .all(|&node| group.project_onto(identifiers_of(node)) == first_projection)
    {
        return compatible;
    }

    let hits: Vec<usize> = compatible
        .iter()
        .map(|&node| group.exact_hits(identifiers_of(node)))
        .collect();
    let best = hits.iter().copied().max().unwrap_or(0);
    compatible
        .into_iter()
        .zip(hits)
        .filter(|&(_, h)| h == best)
        .map(|(node, _)| node)
        .collect()
}

impl Sbom {
    /// Resolve a document's records into an inventory.
    ///
    /// The returned error lists skipped records; the inventory holds every
    /// record that could be normalized.
    #[must_use]
    pub fn from_records(
        source: impl Into<String>,
        records: &[PackageWithDependencyRefs],
    ) -> (Self, Option<ResolveError>) {
        let Resolution {
            graph,
            roots,
            error,
        } = resolve(records);
        (Self::new(source, graph, &roots), error)
    }
}
