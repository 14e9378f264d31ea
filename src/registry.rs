//! Domain registry and query fixtures
//!
//! The registry is static configuration data: an ordered list of domain
//! records plus per-domain leaf-handler descriptions, loaded once and shared
//! read-only across every topology build and concurrent execution.
//!
//! Leaf descriptions are keyed by `(domain, leaf)` pair. The same leaf name
//! may legitimately appear under several domains (`compliance`, `reporting`,
//! `planning`, ...) and each occurrence keeps its own text instead of
//! silently overwriting the others.

use crate::error::{HarnessError, HarnessResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// One domain in the registry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DomainRecord {
    /// Unique lowercase snake identifier
    pub name: String,
    /// Free-text description embedded into instructions
    pub description: String,
    /// Keyword set; order carries no meaning
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Leaf-handler names owned by this domain, possibly empty
    #[serde(default)]
    pub leaf_handlers: Vec<String>,
    /// Used only to enrich instructions, never for scoring
    #[serde(default)]
    pub sample_queries: Vec<String>,
}

/// A query fixture: the text to dispatch and the domain it should land in
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryCase {
    pub text: String,
    pub expected_domain: String,
}

/// Wire format of the registry TOML file
#[derive(Debug, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    domains: Vec<DomainRecord>,
    /// `[leaves.<domain>]` tables: leaf name -> description
    #[serde(default)]
    leaves: HashMap<String, HashMap<String, String>>,
}

/// Wire format of the query fixture TOML file
#[derive(Debug, Deserialize)]
struct QueryFile {
    #[serde(default)]
    queries: Vec<QueryCase>,
}

/// Immutable domain registry shared across builds and executions
#[derive(Debug, Clone)]
pub struct DomainRegistry {
    domains: Vec<DomainRecord>,
    leaf_descriptions: HashMap<(String, String), String>,
}

impl DomainRegistry {
    /// Build a registry from records and per-domain leaf descriptions
    ///
    /// An empty domain list is a fundamental configuration error.
    pub fn new(
        domains: Vec<DomainRecord>,
        leaves: HashMap<String, HashMap<String, String>>,
    ) -> HarnessResult<Self> {
        if domains.is_empty() {
            return Err(HarnessError::registry("registry contains no domains"));
        }

        let mut leaf_descriptions = HashMap::new();
        for (domain, entries) in leaves {
            for (leaf, description) in entries {
                leaf_descriptions.insert((domain.clone(), leaf), description);
            }
        }

        Ok(Self {
            domains,
            leaf_descriptions,
        })
    }

    /// Load a registry from a TOML file
    pub fn load_from_file(path: &Path) -> HarnessResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            HarnessError::registry(format!("failed to read {}: {e}", path.display()))
        })?;
        let file: RegistryFile = toml::from_str(&content).map_err(|e| {
            HarnessError::registry(format!("failed to parse {}: {e}", path.display()))
        })?;
        Self::new(file.domains, file.leaves)
    }

    /// Ordered domain records
    pub fn domains(&self) -> &[DomainRecord] {
        &self.domains
    }

    /// Number of domains
    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    /// Description for a `(domain, leaf)` pair
    ///
    /// A leaf referenced by a domain but missing from the description tables
    /// resolves to a generic placeholder rather than failing construction.
    pub fn leaf_description(&self, domain: &str, leaf: &str) -> String {
        self.leaf_descriptions
            .get(&(domain.to_string(), leaf.to_string()))
            .cloned()
            .unwrap_or_else(|| format!("Handles {leaf} requests within the {domain} domain"))
    }

    /// Total leaf-handler count across all domains
    pub fn leaf_count(&self) -> usize {
        self.domains.iter().map(|d| d.leaf_handlers.len()).sum()
    }
}

/// Load query fixtures from a TOML file
pub fn load_query_file(path: &Path) -> HarnessResult<Vec<QueryCase>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| HarnessError::registry(format!("failed to read {}: {e}", path.display())))?;
    let file: QueryFile = toml::from_str(&content)
        .map_err(|e| HarnessError::registry(format!("failed to parse {}: {e}", path.display())))?;
    if file.queries.is_empty() {
        return Err(HarnessError::registry(format!(
            "{} contains no queries",
            path.display()
        )));
    }
    Ok(file.queries)
}
