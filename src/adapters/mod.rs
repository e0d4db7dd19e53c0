// Adapters layer: concrete clients for the external HTTP sources.

pub mod gitlab;
pub mod tabular;

pub use gitlab::GitLabClient;
pub use tabular::TabularApiClient;
