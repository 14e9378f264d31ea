//! Delegation-tree modeling
//!
//! A topology is a tree of dispatch nodes: dispatchers forward a request to
//! exactly one child, leaves answer and stop delegation. Trees are built
//! fresh per run from the registry and never mutated afterwards, so they can
//! be shared across concurrent executions without locking.

mod builder;
mod instruction;

pub use builder::build;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The three delegation-tree shapes under comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TopologyKind {
    /// One root dispatcher, one leaf per domain
    FlatDomain,
    /// Root dispatcher over per-domain dispatchers over leaf handlers
    TwoLevel,
    /// One root dispatcher, one leaf per leaf handler across all domains
    FlatLeaf,
}

impl TopologyKind {
    /// All kinds, in comparison order
    pub const ALL: [TopologyKind; 3] = [
        TopologyKind::FlatDomain,
        TopologyKind::TwoLevel,
        TopologyKind::FlatLeaf,
    ];

    /// Stable label used in reports and logs
    pub fn label(&self) -> &'static str {
        match self {
            TopologyKind::FlatDomain => "flat-domain",
            TopologyKind::TwoLevel => "two-level",
            TopologyKind::FlatLeaf => "flat-leaf",
        }
    }
}

impl fmt::Display for TopologyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TopologyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "flat-domain" => Ok(TopologyKind::FlatDomain),
            "two-level" => Ok(TopologyKind::TwoLevel),
            "flat-leaf" => Ok(TopologyKind::FlatLeaf),
            _ => Err(format!(
                "unknown topology kind '{s}' (expected flat-domain, two-level, or flat-leaf)"
            )),
        }
    }
}

/// Node role within a delegation tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    Dispatcher,
    Leaf,
}

/// A node in a delegation tree
///
/// The root is always a dispatcher. Identifiers are unique within one tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchNode {
    pub identifier: String,
    pub role: NodeRole,
    /// Short description shown to the parent dispatcher
    pub description: String,
    /// Text the completion service is conditioned on at this node
    pub rendered_instruction: String,
    /// Ordered children; empty for leaves
    pub children: Vec<DispatchNode>,
}

impl DispatchNode {
    pub fn dispatcher<I: Into<String>, D: Into<String>>(
        identifier: I,
        description: D,
        rendered_instruction: String,
        children: Vec<DispatchNode>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            role: NodeRole::Dispatcher,
            description: description.into(),
            rendered_instruction,
            children,
        }
    }

    pub fn leaf<I: Into<String>, D: Into<String>>(
        identifier: I,
        description: D,
        rendered_instruction: String,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            role: NodeRole::Leaf,
            description: description.into(),
            rendered_instruction,
            children: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.role == NodeRole::Leaf
    }

    /// Find a direct child by identifier
    pub fn child(&self, identifier: &str) -> Option<&DispatchNode> {
        self.children.iter().find(|c| c.identifier == identifier)
    }

    /// Total node count including this node
    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(DispatchNode::node_count)
            .sum::<usize>()
    }
}
