//! Declaration/discovery inventory join.
//!
//! Combines inventories of two evidence classes into one de-duplicated
//! inventory keyed by canonical purl:
//!
//! - *declaration* inventories (manifests, lockfiles) are authoritative: every
//!   package is kept, and packages with the same purl are merged field by field
//! - records that share a purl but disagree on name or version cannot be
//!   merged; both are kept as separate packages and a diagnostic is emitted
//! - *discovery* inventories (scanners) only add packages that are not already
//!   represented, either by purl, by `name@version`, or, for packages whose
//!   version is unknown, by bare name
//!
//! Dependency edges of the inputs are carried over between retained packages.

mod diagnostics;

pub use diagnostics::JoinDiagnostic;

use crate::config::JoinConfig;
use crate::model::{is_version_unknown_with, NodeId, PackageGraph, PackageInfo, Sbom};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};

/// Evidence class of an input inventory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvidenceClass {
    Declaration,
    Discovery,
}

/// Result of a join: the inventory and everything that was not taken as is.
#[derive(Debug, Clone, Default)]
pub struct JoinOutcome {
    pub sbom: Sbom,
    pub diagnostics: Vec<JoinDiagnostic>,
}

/// Join inventories with the default unknown-version sentinels.
#[must_use]
pub fn join_sboms(declared: &[Sbom], discovered: &[Sbom]) -> JoinOutcome {
    join_sboms_with(declared, discovered, &JoinConfig::default())
}

/// Join inventories.
///
/// Inputs are never modified. Packages appear in the result in first-insertion
/// order: declaration inventories first, then discovery inventories.
#[must_use]
pub fn join_sboms_with(declared: &[Sbom], discovered: &[Sbom], config: &JoinConfig) -> JoinOutcome {
    let mut joiner = Joiner::new(config);

    let inputs = declared
        .iter()
        .map(|sbom| (sbom, EvidenceClass::Declaration))
        .chain(discovered.iter().map(|sbom| (sbom, EvidenceClass::Discovery)));

    for (input, (sbom, class)) in inputs.enumerate() {
        for (node, package) in sbom.packages.iter() {
            let is_root = package.is_root() && sbom.root_packages.contains(&package.info.purl);
            joiner.add(input, node, &package.info, class, is_root, &sbom.source);
        }
    }

    let all: Vec<&Sbom> = declared.iter().chain(discovered).collect();
    let outcome = joiner.finish(&all);

    tracing::info!(
        declared = declared.len(),
        discovered = discovered.len(),
        packages = outcome.sbom.package_count(),
        roots = outcome.sbom.root_packages.len(),
        diagnostics = outcome.diagnostics.len(),
        "Joined inventories"
    );

    outcome
}

struct Entry {
    info: PackageInfo,
    was_root: bool,
}

struct Joiner<'a> {
    config: &'a JoinConfig,
    /// Keyed by (canonical purl, occurrence); occurrence > 0 only after a
    /// merge conflict under the same purl.
    entries: IndexMap<(String, usize), Entry>,
    seen_names: HashSet<String>,
    seen_name_versions: HashSet<String>,
    /// (input inventory, input node) → entry index
    retained: HashMap<(usize, NodeId), usize>,
    diagnostics: Vec<JoinDiagnostic>,
}

impl<'a> Joiner<'a> {
    fn new(config: &'a JoinConfig) -> Self {
        Self {
            config,
            entries: IndexMap::new(),
            seen_names: HashSet::new(),
            seen_name_versions: HashSet::new(),
            retained: HashMap::new(),
            diagnostics: Vec::new(),
        }
    }

    fn add(
        &mut self,
        input: usize,
        node: NodeId,
        info: &PackageInfo,
        class: EvidenceClass,
        is_root: bool,
        source: &str,
    ) {
        let purl = info.key().to_string();
        let mut occurrence = 0;
        while let Some((idx, _, entry)) = self.entries.get_full_mut(&(purl.clone(), occurrence)) {
            if let Some(merged) = entry.info.merge(info) {
                entry.info = merged;
                entry.was_root |= is_root;
                self.retained.insert((input, node), idx);
                return;
            }
            occurrence += 1;
        }

        if occurrence > 0 {
            let first = &self.entries[&(purl.clone(), 0)];
            let diagnostic = JoinDiagnostic::MergeConflict {
                purl: purl.clone(),
                existing: describe(&first.info),
                incoming: describe(info),
                source: source.to_string(),
            };
            tracing::warn!("{}", diagnostic);
            self.diagnostics.push(diagnostic);
        } else if class == EvidenceClass::Discovery {
            if let Some(diagnostic) = self.already_represented(info, source) {
                tracing::debug!("{}", diagnostic);
                self.diagnostics.push(diagnostic);
                return;
            }
        }

        self.insert(input, node, info, is_root, (purl, occurrence));
    }

    fn insert(
        &mut self,
        input: usize,
        node: NodeId,
        info: &PackageInfo,
        is_root: bool,
        key: (String, usize),
    ) {
        self.seen_names.insert(info.name.clone());
        if let Some(name_version) = info.name_at_version() {
            self.seen_name_versions.insert(name_version);
        }
        let (idx, _) = self.entries.insert_full(
            key,
            Entry {
                info: info.clone(),
                was_root: is_root,
            },
        );
        self.retained.insert((input, node), idx);
    }

    /// Check whether a discovered package is known under another identity.
    fn already_represented(&self, info: &PackageInfo, source: &str) -> Option<JoinDiagnostic> {
        let version = info.version.as_deref();
        if is_version_unknown_with(version, &self.config.extra_unknown_versions) {
            return self
                .seen_names
                .contains(&info.name)
                .then(|| JoinDiagnostic::SkippedUnknownVersion {
                    purl: info.key().to_string(),
                    name: info.name.clone(),
                    version: info.version.clone(),
                    source: source.to_string(),
                });
        }

        let name_version = info.name_at_version()?;
        self.seen_name_versions
            .contains(&name_version)
            .then(|| JoinDiagnostic::SkippedKnownVersion {
                purl: info.key().to_string(),
                name_version,
                source: source.to_string(),
            })
    }

    fn finish(self, inputs: &[&Sbom]) -> JoinOutcome {
        let mut graph = PackageGraph::with_capacity(self.entries.len());
        let mut was_root = Vec::with_capacity(self.entries.len());
        for (_, entry) in self.entries {
            graph.add_node(entry.info);
            was_root.push(entry.was_root);
        }

        for (input, sbom) in inputs.iter().enumerate() {
            for (node, package) in sbom.packages.iter() {
                let Some(&parent) = self.retained.get(&(input, node)) else {
                    continue;
                };
                for &dep in package.dependencies() {
                    let Some(&child) = self.retained.get(&(input, dep)) else {
                        continue;
                    };
                    // Distinct input nodes may collapse onto one entry.
                    if parent != child {
                        graph.link(NodeId::from_index(parent), NodeId::from_index(child));
                    }
                }
            }
        }

        let roots: Vec<NodeId> = graph
            .iter()
            .filter(|(id, package)| was_root[id.index()] && package.is_root())
            .map(|(id, _)| id)
            .collect();

        let mut sources: Vec<&str> = Vec::new();
        for sbom in inputs {
            let source = sbom.source.as_str();
            if !source.is_empty() && !sources.contains(&source) {
                sources.push(source);
            }
        }

        JoinOutcome {
            sbom: Sbom::new(sources.join(", "), graph, &roots),
            diagnostics: self.diagnostics,
        }
    }
}

fn describe(info: &PackageInfo) -> String {
    info.name_at_version()
        .unwrap_or_else(|| info.name.clone())
}
