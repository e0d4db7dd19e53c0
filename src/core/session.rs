use crate::domain::model::{DirectoryUser, TabularRecord, Track};
use std::collections::HashMap;

/// Explicit per-run application state.
///
/// Holds the current cohort/track selection and the fetch caches. The caches
/// are request deduplication for the life of one session, keyed by source
/// endpoint + credentials; they are not a correctness mechanism. Mutation
/// happens only through `set_cohort`, `set_track` and `refresh`.
#[derive(Debug, Default)]
pub struct Session {
    cohort: String,
    track: Track,
    rosters: HashMap<String, Vec<TabularRecord>>,
    directories: HashMap<String, Vec<DirectoryUser>>,
}

impl Session {
    pub fn new(cohort: impl Into<String>, track: Track) -> Self {
        Self {
            cohort: cohort.into(),
            track,
            rosters: HashMap::new(),
            directories: HashMap::new(),
        }
    }

    pub fn cohort(&self) -> &str {
        &self.cohort
    }

    pub fn track(&self) -> Track {
        self.track
    }

    /// Changing the cohort keeps the fetch caches; the cohort filter is
    /// applied downstream of the raw fetches.
    pub fn set_cohort(&mut self, cohort: impl Into<String>) {
        self.cohort = cohort.into();
    }

    pub fn set_track(&mut self, track: Track) {
        self.track = track;
    }

    /// Drops all cached fetch results, forcing the next run to hit the APIs.
    pub fn refresh(&mut self) {
        self.rosters.clear();
        self.directories.clear();
    }

    pub fn roster_cached(&self, key: &str) -> Option<&Vec<TabularRecord>> {
        self.rosters.get(key)
    }

    pub fn store_roster(&mut self, key: String, records: Vec<TabularRecord>) {
        self.rosters.insert(key, records);
    }

    pub fn directory_cached(&self, key: &str) -> Option<&Vec<DirectoryUser>> {
        self.directories.get(key)
    }

    pub fn store_directory(&mut self, key: String, users: Vec<DirectoryUser>) {
        self.directories.insert(key, users);
    }
}
