use crate::utils::error::ReconError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Upstream column name for the affiliation field, kept verbatim so the
/// serde mapping and the CSV output match the source table.
pub const AFFILIATION_FIELD: &str = "Affiliation (College/Company/Organization Name)";

/// One raw roster entry from the tabular source. Null or absent affiliation
/// and email come through as `None` instead of failing deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TabularRecord {
    #[serde(rename = "Id")]
    pub id: i64,

    #[serde(rename = "Full Name", default)]
    pub full_name: String,

    #[serde(
        rename = "Affiliation (College/Company/Organization Name)",
        default
    )]
    pub affiliation: Option<String>,

    #[serde(rename = "Email Address", default)]
    pub email: Option<String>,
}

/// A directory account. Only the email matters for reconciliation; every
/// other field of the upstream payload is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryUser {
    #[serde(default)]
    pub email: Option<String>,
}

/// A roster entry with its directory-account status resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciledRecord {
    #[serde(flatten)]
    pub record: TabularRecord,
    pub has_account: bool,
}

impl ReconciledRecord {
    /// Label used in the `has_gitlab_account` output column.
    pub fn account_label(&self) -> &'static str {
        if self.has_account {
            "Yes"
        } else {
            "No"
        }
    }
}

/// The two participant tracks carried by the roster source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Track {
    #[default]
    Contributor,
    Lead,
}

impl Track {
    /// Stem used for output file names, e.g. `contributor_roster.csv`.
    pub fn file_stem(&self) -> &'static str {
        match self {
            Track::Contributor => "contributor",
            Track::Lead => "lead",
        }
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Track::Contributor => write!(f, "contributors"),
            Track::Lead => write!(f, "leads"),
        }
    }
}

impl FromStr for Track {
    type Err = ReconError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "contributor" | "contributors" => Ok(Track::Contributor),
            "lead" | "leads" => Ok(Track::Lead),
            other => Err(ReconError::InvalidConfigValueError {
                field: "track".to_string(),
                value: other.to_string(),
                reason: "expected 'contributor' or 'lead'".to_string(),
            }),
        }
    }
}

/// Intake batches. Anything other than the two known identifiers is an
/// invalid-argument error at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cohort {
    Cohort1,
    Cohort2,
}

impl fmt::Display for Cohort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cohort::Cohort1 => write!(f, "cohort1"),
            Cohort::Cohort2 => write!(f, "cohort2"),
        }
    }
}

impl FromStr for Cohort {
    type Err = ReconError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cohort1" => Ok(Cohort::Cohort1),
            "cohort2" => Ok(Cohort::Cohort2),
            other => Err(ReconError::InvalidCohortError {
                value: other.to_string(),
            }),
        }
    }
}

/// Closed integer interval `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdRange {
    pub start: i64,
    pub end: i64,
}

impl IdRange {
    pub const fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, id: i64) -> bool {
        id >= self.start && id <= self.end
    }
}

/// ID range registered for a (track, cohort) pair. Ranges within one track
/// are non-overlapping and ordered.
pub fn id_range(track: Track, cohort: Cohort) -> IdRange {
    match (track, cohort) {
        (Track::Contributor, Cohort::Cohort1) => IdRange::new(0, 25000),
        (Track::Contributor, Cohort::Cohort2) => IdRange::new(25001, 44126),
        (Track::Lead, Cohort::Cohort1) => IdRange::new(0, 1730),
        (Track::Lead, Cohort::Cohort2) => IdRange::new(1731, 2348),
    }
}

/// Per-affiliation account counts. `total == created + needed` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffiliationSummary {
    pub affiliation: String,
    pub total: u64,
    pub created: u64,
    pub needed: u64,
}
