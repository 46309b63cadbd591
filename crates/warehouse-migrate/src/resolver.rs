//! Logical-to-physical table name resolution.
//!
//! Operators ask for tables by the names they remember; the source catalog
//! frequently disagrees ("InvoiceDetail" vs "InvoiceDet"). The resolver
//! matches a logical name against discovered descriptors: exact
//! case-insensitive substring first, then keyword overlap. It is a pure
//! function of its inputs and is testable with literal catalogs.

use serde::{Deserialize, Serialize};

use crate::catalog::TableDescriptor;

/// How certain a name-resolution match is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// Case-insensitive exact substring match of the logical name inside
    /// the discovered table name.
    High,
    /// Overlap on one or more keywords derived from the logical name,
    /// without an exact substring match.
    Medium,
}

/// A ranked resolution candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchCandidate {
    pub descriptor: TableDescriptor,
    pub confidence: Confidence,
}

/// Split a logical name into lowercase keywords on case boundaries and
/// separator characters: "InvoiceDetail" -> ["invoice", "detail"],
/// "AppSch_Appointment" -> ["app", "sch", "appointment"].
pub fn keywords(logical_name: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();

    for ch in logical_name.chars() {
        if ch == '_' || ch == '-' || ch == ' ' || ch == '.' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
        } else if ch.is_uppercase() && !current.is_empty() {
            words.push(std::mem::take(&mut current));
            current.push(ch.to_ascii_lowercase());
        } else {
            current.push(ch.to_ascii_lowercase());
        }
    }
    if !current.is_empty() {
        words.push(current);
    }

    words.dedup();
    words
}

/// Resolve a logical name against a discovered catalog.
///
/// Returns candidates ranked High before Medium; within a tier, shorter
/// table names first (most specific match). An empty result means the
/// caller must treat the name as not found.
pub fn resolve(logical_name: &str, catalog: &[TableDescriptor]) -> Vec<MatchCandidate> {
    let needle = logical_name.to_lowercase();

    let mut high: Vec<MatchCandidate> = catalog
        .iter()
        .filter(|t| t.name.to_lowercase().contains(&needle))
        .map(|t| MatchCandidate {
            descriptor: t.clone(),
            confidence: Confidence::High,
        })
        .collect();
    high.sort_by_key(|c| c.descriptor.name.len());

    if !high.is_empty() {
        return high;
    }

    let words = keywords(logical_name);
    let mut medium: Vec<MatchCandidate> = catalog
        .iter()
        .filter(|t| {
            let name = t.name.to_lowercase();
            words.iter().any(|w| name.contains(w.as_str()))
        })
        .map(|t| MatchCandidate {
            descriptor: t.clone(),
            confidence: Confidence::Medium,
        })
        .collect();
    medium.sort_by_key(|c| c.descriptor.name.len());

    medium
}

/// Pick the candidate an unattended run should use: the first High
/// candidate, else the first Medium candidate, else none.
pub fn auto_select(candidates: &[MatchCandidate]) -> Option<&MatchCandidate> {
    candidates.first()
}
