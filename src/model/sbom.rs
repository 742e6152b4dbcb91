//! Resolved package inventory.

use super::graph::{NodeId, PackageGraph};
use super::package::PackageInfo;
use super::purl::Purl;
use serde::Serialize;

/// A resolved inventory: all packages of one or more documents, linked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Sbom {
    /// Where the inventory came from (file path, or a joined list of sources)
    pub source: String,
    /// Every resolved package
    pub packages: PackageGraph,
    /// Purls of the packages nothing else depends on
    pub root_packages: Vec<Purl>,
}

impl Sbom {
    /// Assemble an inventory from a graph and its root nodes.
    ///
    /// Root purls keep the order of `roots`; repeated purls are listed once.
    #[must_use]
    pub fn new(source: impl Into<String>, packages: PackageGraph, roots: &[NodeId]) -> Self {
        let mut root_packages: Vec<Purl> = Vec::with_capacity(roots.len());
        for &id in roots {
            if let Some(pkg) = packages.get(id) {
                if !root_packages.contains(&pkg.info.purl) {
                    root_packages.push(pkg.info.purl.clone());
                }
            }
        }
        Self {
            source: source.into(),
            packages,
            root_packages,
        }
    }

    /// Number of packages
    #[must_use]
    pub fn package_count(&self) -> usize {
        self.packages.len()
    }

    /// Nodes whose purl is listed in `root_packages`
    #[must_use]
    pub fn root_nodes(&self) -> Vec<NodeId> {
        self.packages
            .iter()
            .filter(|(_, p)| self.root_packages.contains(&p.info.purl))
            .map(|(id, _)| id)
            .collect()
    }

    /// The flat package list handed to vulnerability scanners
    #[must_use]
    pub fn package_infos(&self) -> Vec<PackageInfo> {
        self.packages.iter().map(|(_, p)| p.info.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RawPackage;

    #[test]
    fn test_new_dedupes_root_purls() {
        let mut graph = PackageGraph::new();
        let raw = RawPackage::new("a", "pkg:generic/a@1");
        let a1 = graph.add_node(PackageInfo::from_raw(&raw).expect("valid"));
        let a2 = graph.add_node(PackageInfo::from_raw(&raw).expect("valid"));
        let sbom = Sbom::new("doc.json", graph, &[a1, a2]);
        assert_eq!(sbom.root_packages.len(), 1);
        assert_eq!(sbom.root_nodes(), vec![a1, a2]);
        assert_eq!(sbom.package_infos().len(), 2);
    }
}
