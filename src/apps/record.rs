use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::common::package::BackendKind;

fn default_source() -> BackendKind {
    BackendKind::Unknown
}

pub const DEFAULT_CATEGORY: &str = "Utilities";

/// One entry of the curated app list. Identity is `name`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AppRecord {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Backend recorded when the app was added; informational only
    #[serde(default = "default_source")]
    pub source: BackendKind,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub conflicts: BTreeSet<String>,
}

impl AppRecord {
    /// A record with the defaults used when an app is added by name
    pub fn new(name: impl Into<String>, source: BackendKind) -> Self {
        let name = name.into();
        Self {
            description: format!("Default description for {}", name),
            name,
            source,
            category: DEFAULT_CATEGORY.to_string(),
            conflicts: BTreeSet::new(),
        }
    }

    pub fn conflicts_with(&self, other: &str) -> bool {
        self.conflicts.contains(other)
    }
}

/// Entries may be plain names (older lists) or full records
#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum RawEntry {
    Name(String),
    Record(AppRecord),
}

impl From<RawEntry> for AppRecord {
    fn from(raw: RawEntry) -> Self {
        match raw {
            RawEntry::Name(name) => AppRecord::new(name, BackendKind::Unknown),
            RawEntry::Record(record) => record,
        }
    }
}
