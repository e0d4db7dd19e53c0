use crate::domain::model::{AffiliationSummary, ReconciledRecord};
use std::collections::HashMap;

/// Sentinel group for records with a missing or blank affiliation.
pub const UNKNOWN_AFFILIATION: &str = "Unknown";

/// Groups reconciled records by affiliation and counts account status.
///
/// The grouping key is the trimmed, lowercased affiliation, so "MIT" and
/// "mit " land in one group; the displayed spelling is the first one seen.
/// Output follows first-seen group order. Sorting is left to callers.
pub fn aggregate(records: &[ReconciledRecord]) -> Vec<AffiliationSummary> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut summaries: Vec<AffiliationSummary> = Vec::new();

    for rec in records {
        let display = rec
            .record
            .affiliation
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(UNKNOWN_AFFILIATION);
        let key = display.to_lowercase();

        let slot = *index.entry(key).or_insert_with(|| {
            summaries.push(AffiliationSummary {
                affiliation: display.to_string(),
                total: 0,
                created: 0,
                needed: 0,
            });
            summaries.len() - 1
        });

        let summary = &mut summaries[slot];
        summary.total += 1;
        if rec.has_account {
            summary.created += 1;
        } else {
            summary.needed += 1;
        }
    }

    summaries
}

/// Case-insensitive substring search over affiliation names. An empty term
/// matches everything.
pub fn search_affiliations<'a>(
    summaries: &'a [AffiliationSummary],
    term: &str,
) -> Vec<&'a AffiliationSummary> {
    let needle = term.trim().to_lowercase();
    summaries
        .iter()
        .filter(|summary| summary.affiliation.to_lowercase().contains(&needle))
        .collect()
}

/// Top `n` summaries by total registrations, descending. Stable, so groups
/// with equal totals keep their first-seen order.
pub fn top_by_total(summaries: &[AffiliationSummary], n: usize) -> Vec<AffiliationSummary> {
    let mut sorted = summaries.to_vec();
    sorted.sort_by(|a, b| b.total.cmp(&a.total));
    sorted.truncate(n);
    sorted
}
