//! Marker protocol parsing
//!
//! Nodes are instructed to include `[ROUTED_TO: <id>]` or `[HANDLED_BY: <id>]`
//! in their output. Parsing scans the full concatenated response; the last
//! non-empty marker wins, since nodes closer to the leaf speak later and are
//! more specific. When no marker is present the trace itself is inspected:
//! coordinator-style identifiers are dropped and the last remaining one is
//! taken. Models sometimes delegate correctly but forget the marker literal,
//! so both tiers are required.

use once_cell::sync::Lazy;
use regex::Regex;

/// Sentinel identifier when no routing target can be resolved
pub const UNKNOWN: &str = "unknown";

static MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[(?:ROUTED_TO|HANDLED_BY):([^\]]*)\]").expect("marker pattern is valid")
});

/// Extract the terminal routed-to identifier from a response and its trace
///
/// Total and deterministic: always returns a non-empty identifier, falling
/// back to [`UNKNOWN`] when both the response and the trace are silent.
pub fn parse(response_text: &str, trace: &[String]) -> String {
    let mut routed = None;
    for captures in MARKER_RE.captures_iter(response_text) {
        let identifier = captures[1].trim();
        if !identifier.is_empty() {
            routed = Some(identifier.to_string());
        }
    }
    if let Some(identifier) = routed {
        return identifier;
    }

    let filtered: Vec<&String> = trace
        .iter()
        .filter(|author| {
            let lowered = author.to_lowercase();
            !lowered.contains("coordinator") && !lowered.contains("category")
        })
        .collect();
    if let Some(last) = filtered.last() {
        return (*last).clone();
    }
    if let Some(last) = trace.last() {
        return last.clone();
    }

    UNKNOWN.to_string()
}
