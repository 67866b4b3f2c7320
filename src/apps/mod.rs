//! The curated app list and the commands working on it

pub mod commands;
mod list;
mod record;

pub use list::{CatalogError, CuratedList};
pub use record::AppRecord;
