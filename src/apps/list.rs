use anyhow::Context;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::record::{AppRecord, RawEntry};
use crate::common::package::{BackendKind, SystemProbe, is_valid_package_name, resolver};
use crate::ui::prelude::*;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{0} is already in the list")]
    Duplicate(String),
    #[error("{0} is not in the list")]
    NotFound(String),
    #[error("'{0}' is not a valid package name")]
    InvalidName(String),
    #[error("{0} is not available in pacman or AUR")]
    Unavailable(String),
    #[error(transparent)]
    Io(#[from] anyhow::Error),
}

/// The user's curated apps, kept sorted by name with unique names
#[derive(Debug, Clone)]
pub struct CuratedList {
    path: PathBuf,
    records: Vec<AppRecord>,
}

impl CuratedList {
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            records: Vec::new(),
        }
    }

    /// Load the list from `path`.
    ///
    /// A missing file is an empty list. Content that is not a YAML sequence
    /// also loads as empty, and entries without a usable name are skipped.
    pub fn load(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        if !path.exists() {
            return Ok(Self::empty(path));
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("reading app list {}", path.display()))?;
        let records = parse_entries(&contents, &path);
        Ok(Self::from_records(path, records))
    }

    pub fn from_records(path: impl Into<PathBuf>, records: Vec<AppRecord>) -> Self {
        let mut list = Self::empty(path);
        for record in records {
            if !list.contains(&record.name) {
                list.records.push(record);
            }
        }
        list.sort();
        list
    }

    pub fn save(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("creating app list directory")?;
        }
        let yaml = serde_yaml::to_string(&self.records).context("serializing app list")?;
        fs::write(&self.path, yaml)
            .with_context(|| format!("writing app list {}", self.path.display()))?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self) -> &[AppRecord] {
        &self.records
    }

    pub fn names(&self) -> Vec<String> {
        self.records.iter().map(|r| r.name.clone()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&AppRecord> {
        self.records.iter().find(|r| r.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn insert(&mut self, record: AppRecord) -> Result<(), CatalogError> {
        if self.contains(&record.name) {
            return Err(CatalogError::Duplicate(record.name));
        }
        self.records.push(record);
        self.sort();
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Result<AppRecord, CatalogError> {
        let index = self
            .records
            .iter()
            .position(|r| r.name == name)
            .ok_or_else(|| CatalogError::NotFound(name.to_string()))?;
        Ok(self.records.remove(index))
    }

    /// Pairs `(app, other)` from `names` where app's record lists other as
    /// a conflict
    pub fn conflicts_among(&self, names: &[String]) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        for name in names {
            let Some(record) = self.get(name) else {
                continue;
            };
            for other in names {
                if other != name && record.conflicts_with(other) {
                    pairs.push((name.clone(), other.clone()));
                }
            }
        }
        pairs
    }

    /// Add `name` after checking that some backend can supply it, then save.
    pub fn add_app(
        &mut self,
        probe: &dyn SystemProbe,
        name: &str,
    ) -> Result<&AppRecord, CatalogError> {
        let name = name.trim();
        if !is_valid_package_name(name) {
            return Err(CatalogError::InvalidName(name.to_string()));
        }
        if self.contains(name) {
            return Err(CatalogError::Duplicate(name.to_string()));
        }

        let source = resolver::resolve_backend(probe, name);
        if source == BackendKind::Unknown {
            return Err(CatalogError::Unavailable(name.to_string()));
        }

        self.insert(AppRecord::new(name, source))?;
        self.save()?;
        self.get(name)
            .ok_or_else(|| CatalogError::NotFound(name.to_string()))
    }

    /// Remove `name` and save
    pub fn drop_app(&mut self, name: &str) -> Result<AppRecord, CatalogError> {
        let removed = self.remove(name)?;
        self.save()?;
        Ok(removed)
    }

    fn sort(&mut self) {
        self.records.sort_by(|a, b| a.name.cmp(&b.name));
    }
}

fn parse_entries(contents: &str, path: &Path) -> Vec<AppRecord> {
    let values: Vec<serde_yaml::Value> = match serde_yaml::from_str(contents) {
        Ok(serde_yaml::Value::Sequence(values)) => values,
        Ok(serde_yaml::Value::Null) => return Vec::new(),
        Ok(_) | Err(_) => {
            emit(
                Level::Warn,
                "apps.list.invalid",
                &format!(
                    "{} {} is not a list of apps, treating it as empty",
                    char::from(NerdFont::Warning),
                    path.display()
                ),
                Some(json!({ "path": path.display().to_string() })),
            );
            return Vec::new();
        }
    };

    values
        .into_iter()
        .filter_map(|value| match serde_yaml::from_value::<RawEntry>(value) {
            Ok(raw) => Some(AppRecord::from(raw)),
            Err(err) => {
                emit(
                    Level::Debug,
                    "apps.list.skip",
                    &format!("Skipping malformed entry: {}", err),
                    None,
                );
                None
            }
        })
        .filter(|record| !record.name.trim().is_empty())
        .collect()
}
