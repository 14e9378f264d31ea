//! Topology construction
//!
//! Builds one of the three delegation-tree shapes from the registry. The
//! build is deterministic: the same registry and kind always produce a
//! structurally identical tree.

use super::instruction;
use super::{DispatchNode, TopologyKind};
use crate::registry::DomainRegistry;
use tracing::debug;

/// Root identifier of the flat-domain tree
pub const FLAT_DOMAIN_ROOT: &str = "central_coordinator";
/// Root identifier of the two-level tree
pub const TWO_LEVEL_ROOT: &str = "distributed_coordinator";
/// Root identifier of the flat-leaf tree
pub const FLAT_LEAF_ROOT: &str = "leaf_coordinator";

/// Build a delegation tree of the given kind from the registry
pub fn build(registry: &DomainRegistry, kind: TopologyKind) -> DispatchNode {
    let root = match kind {
        TopologyKind::FlatDomain => build_flat_domain(registry),
        TopologyKind::TwoLevel => build_two_level(registry),
        TopologyKind::FlatLeaf => build_flat_leaf(registry),
    };
    debug!(
        topology = %kind,
        nodes = root.node_count(),
        children = root.children.len(),
        "built delegation tree"
    );
    root
}

/// Flat-domain: root dispatcher with one leaf per domain.
fn build_flat_domain(registry: &DomainRegistry) -> DispatchNode {
    let mut leaves = Vec::with_capacity(registry.len());
    let mut child_lines = Vec::with_capacity(registry.len());

    for domain in registry.domains() {
        let identifier = format!("{}_agent", domain.name);
        let rendered = instruction::flat_domain_leaf(domain, &identifier);
        child_lines.push(instruction::child_line(&identifier, &domain.description));
        leaves.push(DispatchNode::leaf(
            identifier,
            instruction::domain_summary(domain),
            rendered,
        ));
    }

    let root_instruction = instruction::root_dispatcher(
        "You are the central routing coordinator. Your ONLY job is to route queries to domain agents.",
        &child_lines,
    );

    DispatchNode::dispatcher(
        FLAT_DOMAIN_ROOT.to_string(),
        "Central coordinator routing directly to domain agents".to_string(),
        root_instruction,
        leaves,
    )
}

/// Two-level: root dispatcher over per-domain dispatchers over leaf handlers.
/// A domain with no leaf handlers becomes a leaf itself.
fn build_two_level(registry: &DomainRegistry) -> DispatchNode {
    let mut domain_nodes = Vec::with_capacity(registry.len());
    let mut child_lines = Vec::with_capacity(registry.len());

    for domain in registry.domains() {
        let identifier = format!("{}_domain", domain.name);
        child_lines.push(instruction::child_line(&identifier, &domain.description));

        let node = if domain.leaf_handlers.is_empty() {
            DispatchNode::leaf(
                identifier,
                domain.description.clone(),
                instruction::domain_leaf(domain),
            )
        } else {
            let mut sub_leaves = Vec::with_capacity(domain.leaf_handlers.len());
            let mut leaf_lines = Vec::with_capacity(domain.leaf_handlers.len());
            for leaf in &domain.leaf_handlers {
                let leaf_id = format!("{}_{leaf}", domain.name);
                let leaf_desc = registry.leaf_description(&domain.name, leaf);
                leaf_lines.push(format!("- {leaf}: {leaf_desc}"));
                sub_leaves.push(DispatchNode::leaf(
                    leaf_id,
                    format!("{leaf}: {leaf_desc}"),
                    instruction::sub_leaf(&domain.name, leaf, &leaf_desc),
                ));
            }
            DispatchNode::dispatcher(
                identifier,
                domain.description.clone(),
                instruction::domain_dispatcher(domain, &leaf_lines),
                sub_leaves,
            )
        };
        domain_nodes.push(node);
    }

    let root_instruction = instruction::root_dispatcher(
        "You are the root coordinator for distributed routing. Route user queries to the appropriate domain agent.",
        &child_lines,
    );

    DispatchNode::dispatcher(
        TWO_LEVEL_ROOT.to_string(),
        "Root coordinator routing to domain dispatchers".to_string(),
        root_instruction,
        domain_nodes,
    )
}

/// Flat-leaf: root dispatcher with one leaf per leaf handler across all
/// domains, identifiers namespaced `{domain}_{leaf}`. A domain with no leaf
/// handlers contributes a single `{domain}_agent` leaf.
fn build_flat_leaf(registry: &DomainRegistry) -> DispatchNode {
    let mut leaves = Vec::new();
    let mut child_lines = Vec::new();

    for domain in registry.domains() {
        if domain.leaf_handlers.is_empty() {
            let identifier = format!("{}_agent", domain.name);
            child_lines.push(instruction::child_line(&identifier, &domain.description));
            leaves.push(DispatchNode::leaf(
                identifier.clone(),
                domain.description.clone(),
                instruction::flat_leaf(
                    &domain.name,
                    &domain.name,
                    &domain.description,
                    &identifier,
                ),
            ));
            continue;
        }

        for leaf in &domain.leaf_handlers {
            let identifier = format!("{}_{leaf}", domain.name);
            let leaf_desc = registry.leaf_description(&domain.name, leaf);
            child_lines.push(instruction::child_line(&identifier, &leaf_desc));
            leaves.push(DispatchNode::leaf(
                identifier.clone(),
                format!("{leaf}: {leaf_desc}"),
                instruction::flat_leaf(&domain.name, leaf, &leaf_desc, &identifier),
            ));
        }
    }

    let root_instruction = instruction::root_dispatcher(
        "You are the leaf routing coordinator. Route user queries directly to the single most appropriate handler.",
        &child_lines,
    );

    DispatchNode::dispatcher(
        FLAT_LEAF_ROOT.to_string(),
        "Coordinator routing directly to leaf handlers across all domains".to_string(),
        root_instruction,
        leaves,
    )
}
