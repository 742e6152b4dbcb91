//! Property-based tests for identifier matching and resolution.
//!
//! Ensures normalization and match keys behave as set operations, and that
//! resolution of random acyclic documents always yields a well-formed graph.

use proptest::prelude::*;
use sbom_join::model::{
    match_key, normalize_identifiers, Identifier, MatchableId, PackageWithDependencyRefs,
    RawPackage,
};
use sbom_join::resolve;

fn identifier() -> impl Strategy<Value = Identifier> {
    (
        prop_oneof![
            Just("bom-ref".to_string()),
            Just("CPE".to_string()),
            Just(" sha-256 ".to_string()),
            "[a-z]{1,6}",
            Just(String::new()),
        ],
        "\\PC{0,12}",
    )
        .prop_map(|(t, v)| Identifier::new(t, v))
}

fn identifiers() -> impl Strategy<Value = Vec<Identifier>> {
    prop::collection::vec(identifier(), 0..8)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn normalization_is_idempotent(ids in identifiers()) {
        let once = normalize_identifiers(&ids);
        let twice = normalize_identifiers(&once);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn match_key_ignores_order(ids in identifiers(), seed in any::<u64>()) {
        let mut shuffled = ids.clone();
        // Deterministic permutation from the seed
        let len = shuffled.len();
        if len > 1 {
            let mut s = seed;
            for i in (1..len).rev() {
                s = s.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
                let j = (s >> 33) as usize % (i + 1);
                shuffled.swap(i, j);
            }
        }
        prop_assert_eq!(match_key(&ids), match_key(&shuffled));
    }

    #[test]
    fn consistent_subset_is_reflexive(ids in identifiers()) {
        let matcher = MatchableId::new(&ids);
        let normalized = normalize_identifiers(&ids);
        prop_assert!(matcher.is_consistent_subset_of(&normalized));
    }

    #[test]
    fn subset_of_superset_is_consistent(ids in identifiers(), extra in identifiers()) {
        let normalized = normalize_identifiers(&ids);
        let superset = normalize_identifiers(normalized.iter().chain(&extra));
        // Extra values of types already present can make the projection pick
        // another value, so only types new to the superset are added here.
        let fresh: Vec<Identifier> = extra
            .iter()
            .filter(|e| !normalized.iter().any(|n| n.id_type.as_str() == e.id_type.as_str().trim().to_lowercase()))
            .cloned()
            .collect();
        let superset_fresh = normalize_identifiers(normalized.iter().chain(&fresh));
        let matcher = MatchableId::new(&normalized);
        prop_assert!(matcher.is_consistent_subset_of(&superset_fresh));
        prop_assert!(matcher.is_compatible_with(&superset));
    }

    #[test]
    fn resolve_random_dag_is_well_formed(
        edges in prop::collection::vec((0usize..20, 0usize..20), 0..60)
    ) {
        let n = 20;
        let mut records: Vec<PackageWithDependencyRefs> = (0..n)
            .map(|i| {
                PackageWithDependencyRefs::new(
                    RawPackage::new(format!("p{i}"), format!("pkg:npm/p{i}@1"))
                        .with_version("1")
                        .with_identifier(Identifier::bom_ref(format!("p{i}"))),
                )
            })
            .collect();
        // Only forward edges, so the document is acyclic
        for (a, b) in edges {
            let (from, to) = (a.min(b), a.max(b));
            if from != to {
                records[from]
                    .dependencies
                    .push(vec![Identifier::bom_ref(format!("p{to}"))]);
            }
        }

        let res = resolve(&records);
        prop_assert_eq!(res.graph.len(), n);
        prop_assert!(!res.graph.has_cycle());
        for &root in &res.roots {
            prop_assert!(res.graph[root].parents().is_empty());
        }
        prop_assert!(res.graph.unreachable_from(&res.roots).is_empty());

        let again = resolve(&records);
        prop_assert_eq!(again.graph, res.graph);
    }
}

#[test]
fn shared_type_only_comparison() {
    let group = MatchableId::new(&[Identifier::new("a", "1")]);
    let agreeing = normalize_identifiers(&[Identifier::new("a", "1"), Identifier::new("b", "2")]);
    let conflicting =
        normalize_identifiers(&[Identifier::new("a", "2"), Identifier::new("b", "2")]);
    assert!(group.is_consistent_subset_of(&agreeing));
    assert!(!group.is_consistent_subset_of(&conflicting));
}
