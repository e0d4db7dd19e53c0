use crate::domain::model::{DirectoryUser, TabularRecord};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Source of raw roster records (the tabular API in production).
#[async_trait]
pub trait RosterSource: Send + Sync {
    async fn fetch_roster(&self) -> Result<Vec<TabularRecord>>;

    /// Key for session-scoped request deduplication. Two sources with the
    /// same key return the same data for the life of one session.
    fn cache_key(&self) -> String;
}

/// Source of directory accounts (the GitLab-compatible API in production).
#[async_trait]
pub trait DirectorySource: Send + Sync {
    async fn fetch_all_users(&self) -> Result<Vec<DirectoryUser>>;

    fn cache_key(&self) -> String;
}

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn roster_endpoint(&self) -> &str;
    fn lead_endpoint(&self) -> &str;
    fn roster_token(&self) -> &str;
    fn directory_endpoint(&self) -> &str;
    fn directory_token(&self) -> &str;
    fn output_path(&self) -> &str;
    fn concurrent_requests(&self) -> usize;
}
