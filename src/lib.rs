pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::{CliConfig, ResolvedConfig};
pub use crate::config::cli::LocalStorage;

pub use crate::adapters::{GitLabClient, TabularApiClient};
pub use crate::core::engine::{ReconEngine, ReconReport, TrackReport};
pub use crate::core::session::Session;
pub use crate::domain::model::{Cohort, Track};
pub use crate::utils::error::{ReconError, Result};
