use crate::domain::model::TabularRecord;
use crate::domain::ports::RosterSource;
use crate::utils::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

/// Records requested per page. The source caps responses at this size, so a
/// shorter page signals exhaustion.
pub const TABULAR_PAGE_SIZE: usize = 1000;

/// Field projection sent with every page request.
pub const ROSTER_FIELDS: &str =
    "Full Name,Affiliation (College/Company/Organization Name),Id,Email Address";

#[derive(Debug, Deserialize)]
struct RecordPage {
    #[serde(default)]
    list: Vec<TabularRecord>,
}

/// Sequential paginated client for the tabular roster API.
///
/// Transport, HTTP-status and decode failures are returned as errors; an
/// empty dataset is `Ok(vec![])`, so callers can tell the two apart.
#[derive(Debug, Clone)]
pub struct TabularApiClient {
    endpoint: String,
    token: String,
    page_size: usize,
    client: Client,
}

impl TabularApiClient {
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            token: token.into(),
            page_size: TABULAR_PAGE_SIZE,
            client: Client::new(),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }
}

#[async_trait]
impl RosterSource for TabularApiClient {
    async fn fetch_roster(&self) -> Result<Vec<TabularRecord>> {
        let mut records = Vec::new();
        let mut offset = 0usize;

        loop {
            tracing::debug!("📡 Requesting roster page at offset {}", offset);

            let response = self
                .client
                .get(&self.endpoint)
                .header("accept", "application/json")
                .header("xc-token", &self.token)
                .query(&[
                    ("limit", self.page_size.to_string()),
                    ("offset", offset.to_string()),
                    ("fields", ROSTER_FIELDS.to_string()),
                ])
                .send()
                .await?
                .error_for_status()?;

            let page: RecordPage = response.json().await?;
            let count = page.list.len();
            records.extend(page.list);
            offset += self.page_size;

            tracing::debug!("📄 Page returned {} records", count);

            // A short page (including zero records) means the dataset is done.
            if count < self.page_size {
                break;
            }
        }

        tracing::info!(
            "📊 Fetched {} roster records from {}",
            records.len(),
            self.endpoint
        );
        Ok(records)
    }

    fn cache_key(&self) -> String {
        format!("{}|{}", self.endpoint, self.token)
    }
}
