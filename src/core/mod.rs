pub mod aggregate;
pub mod engine;
pub mod recon;
pub mod session;

pub use crate::domain::model::{
    AffiliationSummary, Cohort, DirectoryUser, IdRange, ReconciledRecord, TabularRecord, Track,
};
pub use crate::domain::ports::{ConfigProvider, DirectorySource, RosterSource, Storage};
pub use crate::utils::error::Result;
