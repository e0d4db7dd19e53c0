use crate::core::aggregate::aggregate;
use crate::core::recon::{directory_email_set, filter_missing, reconcile_roster};
use crate::core::session::Session;
use crate::domain::model::{
    AffiliationSummary, Cohort, DirectoryUser, ReconciledRecord, TabularRecord, Track,
    AFFILIATION_FIELD,
};
use crate::domain::ports::{DirectorySource, RosterSource, Storage};
use crate::utils::error::{ReconError, Result};
use chrono::{DateTime, Utc};

/// Everything derived for one track in one run.
#[derive(Debug, Clone)]
pub struct TrackReport {
    pub track: Track,
    pub reconciled: Vec<ReconciledRecord>,
    pub missing: Vec<ReconciledRecord>,
    pub summary: Vec<AffiliationSummary>,
}

impl TrackReport {
    pub fn created_count(&self) -> usize {
        self.reconciled.len() - self.missing.len()
    }

    pub fn needed_count(&self) -> usize {
        self.missing.len()
    }
}

#[derive(Debug, Clone)]
pub struct ReconReport {
    pub generated_at: DateTime<Utc>,
    pub cohort: Cohort,
    pub directory_user_count: usize,
    pub contributor: TrackReport,
    pub lead: TrackReport,
}

impl ReconReport {
    pub fn for_track(&self, track: Track) -> &TrackReport {
        match track {
            Track::Contributor => &self.contributor,
            Track::Lead => &self.lead,
        }
    }
}

/// Orchestrates fetch, reconciliation, aggregation and CSV output.
pub struct ReconEngine<R: RosterSource, D: DirectorySource, S: Storage> {
    contributor_source: R,
    lead_source: R,
    directory_source: D,
    storage: S,
}

impl<R: RosterSource, D: DirectorySource, S: Storage> ReconEngine<R, D, S> {
    pub fn new(contributor_source: R, lead_source: R, directory_source: D, storage: S) -> Self {
        Self {
            contributor_source,
            lead_source,
            directory_source,
            storage,
        }
    }

    pub async fn run(&self, session: &mut Session) -> Result<ReconReport> {
        // The cohort string is validated before any network traffic.
        let cohort: Cohort = session.cohort().parse()?;

        tracing::info!("🚀 Starting reconciliation run for {}", cohort);

        let contributor_roster = self.roster(&self.contributor_source, session).await?;
        let lead_roster = self.roster(&self.lead_source, session).await?;
        let directory_users = self.directory(session).await?;

        let report = self.transform(cohort, &contributor_roster, &lead_roster, &directory_users);

        self.load(&report).await?;

        tracing::info!(
            "✅ Run complete: {} contributor / {} lead records reconciled",
            report.contributor.reconciled.len(),
            report.lead.reconciled.len()
        );
        Ok(report)
    }

    async fn roster(&self, source: &R, session: &mut Session) -> Result<Vec<TabularRecord>> {
        let key = source.cache_key();
        if let Some(cached) = session.roster_cached(&key) {
            tracing::debug!("💾 Using {} cached roster records", cached.len());
            return Ok(cached.clone());
        }
        let records = source.fetch_roster().await?;
        session.store_roster(key, records.clone());
        Ok(records)
    }

    async fn directory(&self, session: &mut Session) -> Result<Vec<DirectoryUser>> {
        let key = self.directory_source.cache_key();
        if let Some(cached) = session.directory_cached(&key) {
            tracing::debug!("💾 Using {} cached directory users", cached.len());
            return Ok(cached.clone());
        }
        let users = self.directory_source.fetch_all_users().await?;
        session.store_directory(key, users.clone());
        Ok(users)
    }

    fn transform(
        &self,
        cohort: Cohort,
        contributor_roster: &[TabularRecord],
        lead_roster: &[TabularRecord],
        directory_users: &[DirectoryUser],
    ) -> ReconReport {
        let emails = directory_email_set(directory_users);

        let contributor = Self::track_report(
            Track::Contributor,
            reconcile_roster(&emails, contributor_roster, Track::Contributor, cohort),
        );
        let lead = Self::track_report(
            Track::Lead,
            reconcile_roster(&emails, lead_roster, Track::Lead, cohort),
        );

        ReconReport {
            generated_at: Utc::now(),
            cohort,
            directory_user_count: directory_users.len(),
            contributor,
            lead,
        }
    }

    fn track_report(track: Track, reconciled: Vec<ReconciledRecord>) -> TrackReport {
        let missing = filter_missing(&reconciled);
        let summary = aggregate(&reconciled);
        TrackReport {
            track,
            reconciled,
            missing,
            summary,
        }
    }

    async fn load(&self, report: &ReconReport) -> Result<()> {
        for track_report in [&report.contributor, &report.lead] {
            let stem = track_report.track.file_stem();

            self.storage
                .write_file(
                    &format!("{}_roster.csv", stem),
                    &roster_csv(&track_report.reconciled)?,
                )
                .await?;
            self.storage
                .write_file(
                    &format!("{}_missing.csv", stem),
                    &roster_csv(&track_report.missing)?,
                )
                .await?;
            self.storage
                .write_file(
                    &format!("{}_summary.csv", stem),
                    &summary_csv(&track_report.summary)?,
                )
                .await?;

            tracing::debug!("📁 Wrote roster, missing and summary CSVs for {}", stem);
        }
        Ok(())
    }
}

fn roster_csv(records: &[ReconciledRecord]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "Full Name",
        AFFILIATION_FIELD,
        "Id",
        "Email Address",
        "has_gitlab_account",
    ])?;

    for rec in records {
        let id = rec.record.id.to_string();
        writer.write_record([
            rec.record.full_name.as_str(),
            rec.record.affiliation.as_deref().unwrap_or(""),
            id.as_str(),
            rec.record.email.as_deref().unwrap_or(""),
            rec.account_label(),
        ])?;
    }

    finish_csv(writer)
}

fn summary_csv(summaries: &[AffiliationSummary]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "Affiliation",
        "total_registrations",
        "no_of_accounts_created",
        "no_of_accounts_needed",
    ])?;

    for summary in summaries {
        let total = summary.total.to_string();
        let created = summary.created.to_string();
        let needed = summary.needed.to_string();
        writer.write_record([
            summary.affiliation.as_str(),
            total.as_str(),
            created.as_str(),
            needed.as_str(),
        ])?;
    }

    finish_csv(writer)
}

fn finish_csv(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
    writer
        .into_inner()
        .map_err(|e| ReconError::ProcessingError {
            message: format!("CSV buffer error: {}", e),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{GitLabClient, TabularApiClient};
    use httpmock::prelude::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                files: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    fn roster_row(id: i64, name: &str, affiliation: &str, email: &str) -> serde_json::Value {
        serde_json::json!({
            "Id": id,
            "Full Name": name,
            "Affiliation (College/Company/Organization Name)": affiliation,
            "Email Address": email,
        })
    }

    #[tokio::test]
    async fn full_run_writes_reports_and_caches_fetches() {
        let server = MockServer::start();

        let contributor_mock = server.mock(|when, then| {
            when.method(GET).path("/contributors");
            then.status(200).json_body(serde_json::json!({
                "list": [
                    roster_row(5, "Ada", "ACME", "X@Y.com"),
                    roster_row(30000, "Zed", "ACME", "z@w.com"),
                ]
            }));
        });
        let lead_mock = server.mock(|when, then| {
            when.method(GET).path("/leads");
            then.status(200).json_body(serde_json::json!({
                "list": [roster_row(7, "Lin", "Globex", "lin@g.org")]
            }));
        });
        let directory_mock = server.mock(|when, then| {
            when.method(GET).path("/api/v4/users").query_param("page", "1");
            then.status(200)
                .json_body(serde_json::json!([{"id": 1, "email": "x@y.com"}]));
        });

        let storage = MockStorage::new();
        let engine = ReconEngine::new(
            TabularApiClient::new(server.url("/contributors"), "t"),
            TabularApiClient::new(server.url("/leads"), "t"),
            GitLabClient::new(server.base_url(), "d"),
            storage.clone(),
        );

        let mut session = Session::new("cohort1", Track::Contributor);
        let report = engine.run(&mut session).await.unwrap();

        assert_eq!(report.cohort, Cohort::Cohort1);
        assert_eq!(report.directory_user_count, 1);

        // Record 30000 is outside the cohort1 contributor range.
        assert_eq!(report.contributor.reconciled.len(), 1);
        assert!(report.contributor.reconciled[0].has_account);
        assert_eq!(report.contributor.created_count(), 1);
        assert_eq!(report.contributor.needed_count(), 0);

        assert_eq!(report.lead.reconciled.len(), 1);
        assert_eq!(report.lead.needed_count(), 1);

        let summary = &report.contributor.summary;
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].affiliation, "ACME");
        assert_eq!(summary[0].total, 1);
        assert_eq!(summary[0].created, 1);
        assert_eq!(summary[0].needed, 0);

        for name in [
            "contributor_roster.csv",
            "contributor_missing.csv",
            "contributor_summary.csv",
            "lead_roster.csv",
            "lead_missing.csv",
            "lead_summary.csv",
        ] {
            assert!(storage.get_file(name).await.is_some(), "missing {}", name);
        }

        let roster = String::from_utf8(storage.get_file("contributor_roster.csv").await.unwrap())
            .unwrap();
        assert!(roster.contains("has_gitlab_account"));
        assert!(roster.contains("Ada"));
        assert!(roster.contains("Yes"));
        assert!(!roster.contains("Zed"));

        // A second run on the same session is served from the cache.
        engine.run(&mut session).await.unwrap();
        contributor_mock.assert_hits(1);
        lead_mock.assert_hits(1);
        directory_mock.assert_hits(1);

        // After refresh the sources are hit again.
        session.refresh();
        engine.run(&mut session).await.unwrap();
        contributor_mock.assert_hits(2);
        lead_mock.assert_hits(2);
        directory_mock.assert_hits(2);
    }

    #[tokio::test]
    async fn invalid_cohort_fails_before_any_fetch() {
        let server = MockServer::start();
        let roster_mock = server.mock(|when, then| {
            when.method(GET).path_contains("/");
            then.status(200).json_body(serde_json::json!({"list": []}));
        });

        let engine = ReconEngine::new(
            TabularApiClient::new(server.url("/contributors"), "t"),
            TabularApiClient::new(server.url("/leads"), "t"),
            GitLabClient::new(server.base_url(), "d"),
            MockStorage::new(),
        );

        let mut session = Session::new("cohort3", Track::Contributor);
        let err = engine.run(&mut session).await.unwrap_err();
        assert!(matches!(err, ReconError::InvalidCohortError { .. }));
        roster_mock.assert_hits(0);
    }

    #[tokio::test]
    async fn roster_fetch_failure_propagates() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/contributors");
            then.status(502);
        });

        let engine = ReconEngine::new(
            TabularApiClient::new(server.url("/contributors"), "t"),
            TabularApiClient::new(server.url("/leads"), "t"),
            GitLabClient::new(server.base_url(), "d"),
            MockStorage::new(),
        );

        let mut session = Session::new("cohort1", Track::Contributor);
        assert!(engine.run(&mut session).await.is_err());
    }
}
