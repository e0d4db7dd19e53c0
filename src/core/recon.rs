use crate::domain::model::{
    id_range, Cohort, DirectoryUser, ReconciledRecord, TabularRecord, Track,
};
use crate::utils::error::Result;
use std::collections::HashSet;

/// Canonical form used for email matching on both sides of the join.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Set of normalized directory emails. Absent or blank emails are skipped.
pub fn directory_email_set(users: &[DirectoryUser]) -> HashSet<String> {
    users
        .iter()
        .filter_map(|user| user.email.as_deref())
        .map(normalize_email)
        .filter(|email| !email.is_empty())
        .collect()
}

/// Filters one roster to the ID range registered for `(track, cohort)` and
/// marks each surviving record against the directory email set.
///
/// The filter is stable: output order follows input order. Records whose ID
/// falls outside the range are dropped, never assigned to a nearest range.
pub fn reconcile_roster(
    emails: &HashSet<String>,
    roster: &[TabularRecord],
    track: Track,
    cohort: Cohort,
) -> Vec<ReconciledRecord> {
    let range = id_range(track, cohort);

    roster
        .iter()
        .filter(|record| range.contains(record.id))
        .map(|record| {
            let has_account = record
                .email
                .as_deref()
                .map(|email| emails.contains(&normalize_email(email)))
                .unwrap_or(false);
            ReconciledRecord {
                record: record.clone(),
                has_account,
            }
        })
        .collect()
}

/// Reconciles both rosters against the directory for one cohort.
///
/// Fails before doing any work when `cohort` is not a recognized identifier.
pub fn reconcile(
    directory_users: &[DirectoryUser],
    contributor_roster: &[TabularRecord],
    lead_roster: &[TabularRecord],
    cohort: &str,
) -> Result<(Vec<ReconciledRecord>, Vec<ReconciledRecord>)> {
    let cohort: Cohort = cohort.parse()?;
    let emails = directory_email_set(directory_users);

    tracing::debug!(
        "🔗 Reconciling {} + {} roster records against {} directory emails ({})",
        contributor_roster.len(),
        lead_roster.len(),
        emails.len(),
        cohort
    );

    Ok((
        reconcile_roster(&emails, contributor_roster, Track::Contributor, cohort),
        reconcile_roster(&emails, lead_roster, Track::Lead, cohort),
    ))
}

/// Records still missing a directory account, input order preserved.
pub fn filter_missing(records: &[ReconciledRecord]) -> Vec<ReconciledRecord> {
    records
        .iter()
        .filter(|record| !record.has_account)
        .cloned()
        .collect()
}
