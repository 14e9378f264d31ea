//! Routebench - Query-Dispatch Topology Evaluation
//!
//! A harness for comparing delegation-tree shapes when routing natural-
//! language requests to specialized handlers through an LLM completion
//! service.
//!
//! # Overview
//!
//! This crate provides:
//! - Topology modeling: flat-domain, two-level, and flat-leaf delegation trees
//! - Dispatch execution with ordered trace capture and per-query timeouts
//! - Marker-protocol parsing of routing decisions from free-text output
//! - Per-run evaluation and multi-run aggregation with CSV export
//!
//! # Quick Start
//!
//! ```rust
//! use routebench::registry::{DomainRecord, DomainRegistry};
//! use routebench::topology::{self, TopologyKind};
//! use std::collections::HashMap;
//!
//! let domains = vec![DomainRecord {
//!     name: "finance".to_string(),
//!     description: "Manages financial matters".to_string(),
//!     keywords: vec!["bank".to_string(), "payment".to_string()],
//!     leaf_handlers: vec!["banking".to_string(), "expenses".to_string()],
//!     sample_queries: vec!["Check my bank balance".to_string()],
//! }];
//! let registry = DomainRegistry::new(domains, HashMap::new()).unwrap();
//!
//! // Build the same registry into different tree shapes.
//! let flat = topology::build(&registry, TopologyKind::FlatDomain);
//! let two_level = topology::build(&registry, TopologyKind::TwoLevel);
//! assert_eq!(flat.children.len(), 1);
//! assert_eq!(two_level.child("finance_domain").unwrap().children.len(), 2);
//!
//! // Routing decisions come back through the marker protocol.
//! let routed = routebench::marker::parse("[ROUTED_TO: finance_banking]", &[]);
//! assert_eq!(routed, "finance_banking");
//! ```

pub mod completion;
pub mod config;
pub mod error;
pub mod eval;
pub mod executor;
pub mod marker;
pub mod observability;
pub mod registry;
pub mod report;
pub mod testing;
pub mod topology;

pub use completion::{OutputEvent, ServiceError, SessionContext, SessionService};
pub use config::ExperimentConfig;
pub use error::{HarnessError, HarnessResult};
pub use eval::{is_correct, summarize, RunMetrics};
pub use executor::{DispatchExecutor, DispatchTrace, RoutingResult};
pub use registry::{DomainRecord, DomainRegistry, QueryCase};
pub use report::{aggregate, ComparisonReport, TopologyRuns, Winner};
pub use topology::{DispatchNode, NodeRole, TopologyKind};
