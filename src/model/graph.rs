//! Arena-backed package dependency graph.
//!
//! Nodes live in one `Vec` and refer to each other by [`NodeId`]. Parent and
//! dependency lists are plain index lists, so malformed input with cycles
//! cannot create owning loops. Every traversal here carries a visited set.

use super::package::PackageInfo;
use serde::Serialize;
use std::collections::VecDeque;
use std::ops::Index;

/// Index of a package within its [`PackageGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(usize);

impl NodeId {
    /// Node id for a position; only meaningful for the graph it came from
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        Self(index)
    }

    /// Position of the node in insertion order
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// A graph node: a package plus its relations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Package {
    #[serde(flatten)]
    pub info: PackageInfo,
    parents: Vec<NodeId>,
    dependencies: Vec<NodeId>,
}

impl Package {
    /// Packages that depend on this one, in link order
    #[must_use]
    pub fn parents(&self) -> &[NodeId] {
        &self.parents
    }

    /// Packages this one depends on, in link order
    #[must_use]
    pub fn dependencies(&self) -> &[NodeId] {
        &self.dependencies
    }

    /// A package nothing depends on
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }
}

/// Flat package graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PackageGraph {
    nodes: Vec<Package>,
}

impl PackageGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
        }
    }

    /// Append a package with no relations
    pub fn add_node(&mut self, info: PackageInfo) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Package {
            info,
            parents: Vec::new(),
            dependencies: Vec::new(),
        });
        id
    }

    /// Record that `parent` depends on `child`.
    ///
    /// Returns false if the edge already existed or an id is out of range.
    pub fn link(&mut self, parent: NodeId, child: NodeId) -> bool {
        if parent.0 >= self.nodes.len() || child.0 >= self.nodes.len() {
            return false;
        }
        if self.nodes[parent.0].dependencies.contains(&child) {
            return false;
        }
        self.nodes[parent.0].dependencies.push(child);
        self.nodes[child.0].parents.push(parent);
        true
    }

    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Package> {
        self.nodes.get(id.0)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Package)> {
        self.nodes.iter().enumerate().map(|(i, p)| (NodeId(i), p))
    }

    /// Number of dependency edges
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|p| p.dependencies.len()).sum()
    }

    /// Nodes without parents, in insertion order
    #[must_use]
    pub fn roots(&self) -> Vec<NodeId> {
        self.iter()
            .filter(|(_, p)| p.is_root())
            .map(|(id, _)| id)
            .collect()
    }

    /// First node whose canonical purl equals `purl`
    #[must_use]
    pub fn find_by_purl(&self, purl: &str) -> Option<NodeId> {
        self.iter()
            .find(|(_, p)| p.info.key() == purl)
            .map(|(id, _)| id)
    }

    /// Breadth-first walk along dependency edges.
    ///
    /// Each reachable node is yielded once, starting nodes first.
    #[must_use]
    pub fn walk_from(&self, starts: &[NodeId]) -> Vec<NodeId> {
        let mut visited = vec![false; self.nodes.len()];
        let mut order = Vec::new();
        let mut queue: VecDeque<NodeId> = VecDeque::new();

        for &start in starts {
            if start.0 < self.nodes.len() && !visited[start.0] {
                visited[start.0] = true;
                queue.push_back(start);
            }
        }

        while let Some(id) = queue.pop_front() {
            order.push(id);
            for &dep in &self.nodes[id.0].dependencies {
                if !visited[dep.0] {
                    visited[dep.0] = true;
                    queue.push_back(dep);
                }
            }
        }

        order
    }

    /// Nodes not reachable from `starts`
    #[must_use]
    pub fn unreachable_from(&self, starts: &[NodeId]) -> Vec<NodeId> {
        let mut reached = vec![false; self.nodes.len()];
        for id in self.walk_from(starts) {
            reached[id.0] = true;
        }
        self.iter()
            .filter(|(id, _)| !reached[id.0])
            .map(|(id, _)| id)
            .collect()
    }

    /// Detect a dependency cycle (self-loops included).
    #[must_use]
    pub fn has_cycle(&self) -> bool {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            InProgress,
            Done,
        }

        let mut marks = vec![Mark::Unvisited; self.nodes.len()];

        for start in 0..self.nodes.len() {
            if marks[start] != Mark::Unvisited {
                continue;
            }
            // (node, next dependency position)
            let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
            marks[start] = Mark::InProgress;

            while let Some(top) = stack.last_mut() {
                let (node, next) = *top;
                if let Some(&dep) = self.nodes[node].dependencies.get(next) {
                    top.1 += 1;
                    match marks[dep.0] {
                        Mark::InProgress => return true,
                        Mark::Unvisited => {
                            marks[dep.0] = Mark::InProgress;
                            stack.push((dep.0, 0));
                        }
                        Mark::Done => {}
                    }
                } else {
                    marks[node] = Mark::Done;
                    stack.pop();
                }
            }
        }

        false
    }
}

impl Index<NodeId> for PackageGraph {
    type Output = Package;

    fn index(&self, id: NodeId) -> &Self::Output {
        &self.nodes[id.0]
    }
}
