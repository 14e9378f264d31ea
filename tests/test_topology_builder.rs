//! Integration tests for topology construction
//!
//! Covers the structural contracts of the three tree shapes, determinism,
//! and loading the shipped registry file.

use routebench::registry::{DomainRecord, DomainRegistry};
use routebench::topology::{self, DispatchNode, NodeRole, TopologyKind};
use std::collections::HashMap;
use std::path::Path;

fn record(name: &str, leaf_handlers: &[&str]) -> DomainRecord {
    DomainRecord {
        name: name.to_string(),
        description: format!("Handles {name} requests"),
        keywords: vec![name.to_string()],
        leaf_handlers: leaf_handlers.iter().map(|s| s.to_string()).collect(),
        sample_queries: vec![format!("A sample {name} query")],
    }
}

fn registry(records: Vec<DomainRecord>) -> DomainRegistry {
    DomainRegistry::new(records, HashMap::new()).unwrap()
}

#[test]
fn test_flat_domain_child_count_matches_domain_count() {
    let registry = registry(vec![
        record("travel", &["flights", "hotels"]),
        record("finance", &["banking"]),
        record("hr", &[]),
    ]);

    let root = topology::build(&registry, TopologyKind::FlatDomain);
    assert_eq!(root.role, NodeRole::Dispatcher);
    assert_eq!(root.children.len(), 3);
    assert!(root.children.iter().all(DispatchNode::is_leaf));

    for domain in ["travel", "finance", "hr"] {
        let child = root.child(&format!("{domain}_agent")).unwrap();
        assert!(child
            .rendered_instruction
            .contains(&format!("[ROUTED_TO: {domain}_agent]")));
    }
}

#[test]
fn test_two_level_structure_and_leaf_fallback() {
    let registry = registry(vec![
        record("finance", &["banking", "expenses"]),
        record("hr", &[]),
    ]);

    let root = topology::build(&registry, TopologyKind::TwoLevel);
    assert_eq!(root.children.len(), 2);

    let finance = root.child("finance_domain").unwrap();
    assert_eq!(finance.role, NodeRole::Dispatcher);
    assert_eq!(finance.children.len(), 2);
    assert!(finance.child("finance_banking").is_some());
    assert!(finance.child("finance_expenses").is_some());

    let hr = root.child("hr_domain").unwrap();
    assert!(hr.is_leaf());
    assert!(hr.children.is_empty());
}

#[test]
fn test_flat_leaf_spans_all_domains_without_intermediate_layer() {
    let registry = registry(vec![
        record("travel", &["flights", "hotels", "cars"]),
        record("finance", &["banking"]),
        record("hr", &[]),
    ]);

    let root = topology::build(&registry, TopologyKind::FlatLeaf);
    // 3 travel leaves + 1 finance leaf + 1 fallback leaf for hr.
    assert_eq!(root.children.len(), 5);
    assert!(root.children.iter().all(DispatchNode::is_leaf));
    assert!(root.child("travel_flights").is_some());
    assert!(root.child("travel_cars").is_some());
    assert!(root.child("finance_banking").is_some());
    assert!(root.child("hr_agent").is_some());
}

#[test]
fn test_namespacing_keeps_same_leaf_name_distinct_across_domains() {
    let registry = registry(vec![
        record("legal", &["compliance"]),
        record("security", &["compliance"]),
    ]);

    let root = topology::build(&registry, TopologyKind::FlatLeaf);
    assert!(root.child("legal_compliance").is_some());
    assert!(root.child("security_compliance").is_some());
}

#[test]
fn test_identifiers_unique_within_each_tree() {
    let registry = registry(vec![
        record("travel", &["flights", "hotels"]),
        record("finance", &["banking", "expenses"]),
        record("hr", &[]),
    ]);

    for kind in TopologyKind::ALL {
        let root = topology::build(&registry, kind);
        let mut seen = std::collections::HashSet::new();
        let mut stack = vec![&root];
        while let Some(node) = stack.pop() {
            assert!(
                seen.insert(node.identifier.clone()),
                "duplicate identifier {} in {kind}",
                node.identifier
            );
            stack.extend(node.children.iter());
        }
    }
}

#[test]
fn test_rebuilding_yields_structurally_identical_trees() {
    let registry = registry(vec![
        record("travel", &["flights"]),
        record("finance", &["banking", "expenses"]),
    ]);

    for kind in TopologyKind::ALL {
        let first = topology::build(&registry, kind);
        let second = topology::build(&registry, kind);
        assert_eq!(first, second);
    }
}

#[test]
fn test_shipped_registry_builds_all_topologies() {
    let registry = DomainRegistry::load_from_file(Path::new("registry.toml")).unwrap();
    assert_eq!(registry.len(), 12);
    assert_eq!(registry.leaf_count(), 48);

    let flat = topology::build(&registry, TopologyKind::FlatDomain);
    assert_eq!(flat.children.len(), 12);

    let two_level = topology::build(&registry, TopologyKind::TwoLevel);
    assert_eq!(two_level.children.len(), 12);

    let flat_leaf = topology::build(&registry, TopologyKind::FlatLeaf);
    assert_eq!(flat_leaf.children.len(), registry.leaf_count());

    // Scoped descriptions survive duplicated leaf names.
    let legal = two_level.child("legal_domain").unwrap();
    let security = two_level.child("security_domain").unwrap();
    let legal_compliance = legal.child("legal_compliance").unwrap();
    let security_compliance = security.child("security_compliance").unwrap();
    assert_ne!(
        legal_compliance.rendered_instruction,
        security_compliance.rendered_instruction
    );
}
