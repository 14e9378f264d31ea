//! Instruction rendering for dispatch nodes
//!
//! Every node carries a rendered natural-language instruction. Dispatcher
//! instructions are assembled from child descriptions, a fixed delegation
//! rule set, and static disambiguation hints for phrasings the domain
//! taxonomy is known to confuse.

use crate::registry::DomainRecord;

/// Fixed rule set rendered into every root dispatcher instruction
const DISPATCH_RULES: &str = "\
**CRITICAL RULES:**
1. You MUST ALWAYS delegate to exactly one of your children - never answer queries yourself
2. Read ALL available options before deciding
3. Be decisive - when in doubt, pick the closest match and delegate immediately";

/// Keyword -> domain overrides for known ambiguous phrasings
///
/// These are configuration constants, not derived logic. They compensate for
/// taxonomy overlap (payroll phrasing reads like finance, training enrollment
/// reads like learning_development, and so on).
const ROUTING_HINTS: &[(&[&str], &str)] = &[
    (&["expense", "payment", "spending", "report cost"], "finance"),
    (
        &["when do I get paid", "paycheck", "salary inquiry", "payroll"],
        "hr",
    ),
    (&["training", "enroll in course", "enroll in program"], "hr"),
    (&["flight", "hotel", "vacation", "trip"], "travel"),
    (
        &["order", "return", "refund", "delivery"],
        "customer_service",
    ),
];

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max).collect();
        format!("{cut}...")
    }
}

fn hint_block() -> String {
    let lines: Vec<String> = ROUTING_HINTS
        .iter()
        .map(|(phrases, target)| {
            let quoted: Vec<String> = phrases.iter().map(|p| format!("\"{p}\"")).collect();
            format!("- {} -> the {target} branch", quoted.join(", "))
        })
        .collect();
    format!("**ROUTING HINTS FOR AMBIGUOUS CASES:**\n{}", lines.join("\n"))
}

/// Description embedded into a flat-domain leaf and shown to its parent:
/// the domain description enriched with keywords and up to 3 sample queries.
pub(super) fn domain_summary(domain: &DomainRecord) -> String {
    let mut summary = domain.description.clone();
    if !domain.keywords.is_empty() {
        summary.push_str(&format!("\n\nKeywords: {}", domain.keywords.join(", ")));
    }
    for query in domain.sample_queries.iter().take(3) {
        summary.push_str(&format!("\n      - \"{query}\""));
    }
    summary
}

/// Instruction for a flat-domain leaf: self-identify via the marker protocol.
pub(super) fn flat_domain_leaf(domain: &DomainRecord, identifier: &str) -> String {
    format!(
        "You are the {name} agent.\n\n{summary}\n\n\
         Acknowledge you are handling this request as the {name} agent.\n\
         Start your response with: [ROUTED_TO: {identifier}]",
        name = domain.name,
        summary = domain_summary(domain),
    )
}

/// Instruction for a two-level leaf handler under a domain dispatcher.
pub(super) fn sub_leaf(domain_name: &str, leaf: &str, description: &str) -> String {
    format!(
        "You are the {leaf} sub-agent within the {domain_name} domain.\n\
         Description: {description}\n\
         Keep your response brief.\n\
         Start your response with: [ROUTED_TO: {domain_name}_{leaf}]"
    )
}

/// Instruction for a two-level domain dispatcher listing only its own leaves.
pub(super) fn domain_dispatcher(domain: &DomainRecord, leaf_lines: &[String]) -> String {
    format!(
        "You are the {name} domain agent.\n\
         Description: {description}\n\
         Your keywords: {keywords}\n\n\
         You route queries to your specialized sub-agents:\n{leaves}\n\n\
         {rules}\n\n\
         After routing, indicate with: [ROUTED_TO: {name}]",
        name = domain.name,
        description = domain.description,
        keywords = domain.keywords.join(", "),
        leaves = leaf_lines.join("\n"),
        rules = DISPATCH_RULES,
    )
}

/// Instruction for a two-level domain node with no leaf handlers: it answers
/// in place like a leaf.
pub(super) fn domain_leaf(domain: &DomainRecord) -> String {
    format!(
        "You are the {name} domain agent.\n\
         Description: {description}\n\
         Your keywords: {keywords}\n\n\
         Handle this request directly.\n\
         Start your response with: [ROUTED_TO: {name}]",
        name = domain.name,
        description = domain.description,
        keywords = domain.keywords.join(", "),
    )
}

/// Instruction for a flat-leaf handler, namespaced `{domain}_{leaf}`.
pub(super) fn flat_leaf(domain_name: &str, leaf: &str, description: &str, identifier: &str) -> String {
    format!(
        "You are the {leaf} handler of the {domain_name} domain.\n\
         Description: {description}\n\
         Acknowledge you are handling this request.\n\
         Start your response with: [ROUTED_TO: {identifier}]"
    )
}

/// Root dispatcher instruction: role line, rules, child listing, hints.
pub(super) fn root_dispatcher(role_line: &str, child_lines: &[String]) -> String {
    format!(
        "{role_line}\n\n{rules}\n\n\
         **Available children ({count} total):**\n{children}\n\n\
         {hints}\n\n\
         Now route the query and DELEGATE immediately.",
        rules = DISPATCH_RULES,
        count = child_lines.len(),
        children = child_lines.join("\n"),
        hints = hint_block(),
    )
}

/// One listing line for a child of a root dispatcher.
pub(super) fn child_line(identifier: &str, description: &str) -> String {
    format!("- **{identifier}**: {}", truncate(description, 80))
}
