use crate::domain::model::DirectoryUser;
use crate::domain::ports::DirectorySource;
use crate::utils::error::{ReconError, Result};
use async_trait::async_trait;
use reqwest::Client;

/// Users requested per directory page.
pub const DIRECTORY_PER_PAGE: usize = 100;

/// Pagination metadata header reported by GitLab-compatible servers.
pub const TOTAL_PAGES_HEADER: &str = "x-total-pages";

const DEFAULT_CONCURRENT_REQUESTS: usize = 5;

/// Client for the user-directory API.
///
/// Page 1 is fetched first; the total page count is read from the
/// `x-total-pages` response header and the remaining pages are fetched in
/// bounded concurrent batches, concatenated in page order. When the server
/// does not report pagination metadata, pages are walked sequentially until
/// a short page. Any failing page fails the whole fetch.
#[derive(Debug, Clone)]
pub struct GitLabClient {
    base_url: String,
    token: String,
    per_page: usize,
    concurrent_requests: usize,
    client: Client,
}

impl GitLabClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            per_page: DIRECTORY_PER_PAGE,
            concurrent_requests: DEFAULT_CONCURRENT_REQUESTS,
            client: Client::new(),
        }
    }

    pub fn with_per_page(mut self, per_page: usize) -> Self {
        self.per_page = per_page;
        self
    }

    pub fn with_concurrency(mut self, concurrent_requests: usize) -> Self {
        self.concurrent_requests = concurrent_requests.max(1);
        self
    }

    fn users_url(&self) -> String {
        format!("{}/api/v4/users", self.base_url.trim_end_matches('/'))
    }

    async fn fetch_page(&self, page: usize) -> Result<Vec<DirectoryUser>> {
        tracing::debug!("📡 Requesting directory page {}", page);

        let response = self
            .client
            .get(self.users_url())
            .header("PRIVATE-TOKEN", &self.token)
            .query(&[
                ("per_page", self.per_page.to_string()),
                ("page", page.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?;

        let users: Vec<DirectoryUser> = response.json().await?;
        Ok(users)
    }

    /// Pages 2..=total in batches, results kept in page order regardless of
    /// completion order.
    async fn fetch_remaining_concurrent(
        &self,
        total_pages: usize,
        users: &mut Vec<DirectoryUser>,
    ) -> Result<()> {
        let pages: Vec<usize> = (2..=total_pages).collect();

        for batch in pages.chunks(self.concurrent_requests) {
            let mut handles = Vec::with_capacity(batch.len());
            for &page in batch {
                let client = self.clone();
                handles.push(tokio::spawn(async move { client.fetch_page(page).await }));
            }
            for handle in handles {
                let page_users = handle.await.map_err(|e| ReconError::ProcessingError {
                    message: format!("directory page task failed: {}", e),
                })??;
                users.extend(page_users);
            }
        }

        Ok(())
    }

    /// Fallback when the server reports no page count: walk pages until one
    /// comes back short.
    async fn fetch_remaining_sequential(&self, users: &mut Vec<DirectoryUser>) -> Result<()> {
        let mut page = 2usize;
        loop {
            let page_users = self.fetch_page(page).await?;
            let count = page_users.len();
            users.extend(page_users);
            if count < self.per_page {
                break;
            }
            page += 1;
        }
        Ok(())
    }
}

#[async_trait]
impl DirectorySource for GitLabClient {
    async fn fetch_all_users(&self) -> Result<Vec<DirectoryUser>> {
        let response = self
            .client
            .get(self.users_url())
            .header("PRIVATE-TOKEN", &self.token)
            .query(&[
                ("per_page", self.per_page.to_string()),
                ("page", "1".to_string()),
            ])
            .send()
            .await?
            .error_for_status()?;

        let total_pages: Option<usize> = response
            .headers()
            .get(TOTAL_PAGES_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse().ok());

        let mut users: Vec<DirectoryUser> = response.json().await?;
        let first_page_count = users.len();

        match total_pages {
            Some(total) if total > 1 => {
                tracing::debug!("📄 Directory reports {} pages", total);
                self.fetch_remaining_concurrent(total, &mut users).await?;
            }
            Some(_) => {}
            None if first_page_count >= self.per_page => {
                tracing::debug!("📄 No pagination metadata, walking pages sequentially");
                self.fetch_remaining_sequential(&mut users).await?;
            }
            None => {}
        }

        tracing::info!("📊 Fetched {} directory users", users.len());
        Ok(users)
    }

    fn cache_key(&self) -> String {
        format!("{}|{}", self.users_url(), self.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use std::time::Duration;

    fn users_body(emails: &[&str]) -> serde_json::Value {
        let users: Vec<serde_json::Value> = emails
            .iter()
            .map(|email| serde_json::json!({"id": 1, "email": email}))
            .collect();
        serde_json::Value::Array(users)
    }

    #[tokio::test]
    async fn honors_total_pages_header_and_keeps_page_order() {
        let server = MockServer::start();

        let page1 = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v4/users")
                .query_param("per_page", "2")
                .query_param("page", "1")
                .header("PRIVATE-TOKEN", "dir-token");
            then.status(200)
                .header(TOTAL_PAGES_HEADER, "3")
                .json_body(users_body(&["a@x.org", "b@x.org"]));
        });
        // Page 2 answers last; its users must still come before page 3's.
        let page2 = server.mock(|when, then| {
            when.method(GET).path("/api/v4/users").query_param("page", "2");
            then.status(200)
                .delay(Duration::from_millis(200))
                .json_body(users_body(&["c@x.org", "d@x.org"]));
        });
        let page3 = server.mock(|when, then| {
            when.method(GET).path("/api/v4/users").query_param("page", "3");
            then.status(200).json_body(users_body(&["e@x.org"]));
        });

        let client = GitLabClient::new(server.base_url(), "dir-token").with_per_page(2);
        let users = client.fetch_all_users().await.unwrap();

        page1.assert();
        page2.assert();
        page3.assert();

        let emails: Vec<&str> = users.iter().filter_map(|u| u.email.as_deref()).collect();
        assert_eq!(
            emails,
            vec!["a@x.org", "b@x.org", "c@x.org", "d@x.org", "e@x.org"]
        );
    }

    #[tokio::test]
    async fn short_first_page_without_header_stops_immediately() {
        let server = MockServer::start();

        let page1 = server.mock(|when, then| {
            when.method(GET).path("/api/v4/users").query_param("page", "1");
            then.status(200).json_body(users_body(&["only@x.org"]));
        });

        let client = GitLabClient::new(server.base_url(), "dir-token").with_per_page(2);
        let users = client.fetch_all_users().await.unwrap();

        page1.assert();
        assert_eq!(users.len(), 1);
    }

    #[tokio::test]
    async fn missing_header_falls_back_to_short_page_walk() {
        let server = MockServer::start();

        let page1 = server.mock(|when, then| {
            when.method(GET).path("/api/v4/users").query_param("page", "1");
            then.status(200).json_body(users_body(&["a@x.org", "b@x.org"]));
        });
        let page2 = server.mock(|when, then| {
            when.method(GET).path("/api/v4/users").query_param("page", "2");
            then.status(200).json_body(users_body(&["c@x.org", "d@x.org"]));
        });
        let page3 = server.mock(|when, then| {
            when.method(GET).path("/api/v4/users").query_param("page", "3");
            then.status(200).json_body(users_body(&["e@x.org"]));
        });

        let client = GitLabClient::new(server.base_url(), "dir-token").with_per_page(2);
        let users = client.fetch_all_users().await.unwrap();

        page1.assert();
        page2.assert();
        page3.assert();
        assert_eq!(users.len(), 5);
    }

    #[tokio::test]
    async fn decode_failure_on_any_page_fails_the_batch() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(GET).path("/api/v4/users").query_param("page", "1");
            then.status(200)
                .header(TOTAL_PAGES_HEADER, "2")
                .json_body(users_body(&["a@x.org", "b@x.org"]));
        });
        server.mock(|when, then| {
            when.method(GET).path("/api/v4/users").query_param("page", "2");
            then.status(200).body("<html>not json</html>");
        });

        let client = GitLabClient::new(server.base_url(), "dir-token").with_per_page(2);
        assert!(client.fetch_all_users().await.is_err());
    }

    #[tokio::test]
    async fn unauthorized_is_surfaced() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(GET).path("/api/v4/users");
            then.status(401);
        });

        let client = GitLabClient::new(server.base_url(), "bad-token");
        assert!(client.fetch_all_users().await.is_err());
    }
}
