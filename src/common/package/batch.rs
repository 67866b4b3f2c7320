//! Batched package operations.
//!
//! Apps are grouped by backend so each backend gets a single terminal
//! window and a single elevation prompt for the whole group.

use serde::Serialize;
use std::collections::HashSet;

use super::manager::{BackendKind, Mode};
use super::probe::SystemProbe;
use super::resolver::{installed_backend, resolve_backend};
use crate::common::terminal::LaunchCommand;

/// One backend invocation covering a group of apps
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallJob {
    pub app_names: Vec<String>,
    pub backend: BackendKind,
    pub mode: Mode,
}

impl InstallJob {
    /// The command line for this job, or `None` for the Unknown backend
    pub fn command(&self, elevation: &[String]) -> Option<LaunchCommand> {
        let template = self.backend.template()?;
        Some(LaunchCommand::argv(template.command_line(
            self.mode,
            elevation,
            &self.app_names,
        )))
    }
}

/// Apps grouped by backend, plus the ones no backend could handle
#[derive(Debug, Default, PartialEq, Eq)]
pub struct InstallPlan {
    pub jobs: Vec<InstallJob>,
    pub dropped: Vec<String>,
}

impl InstallPlan {
    /// Pick the backend for a single app.
    ///
    /// Install asks the sync databases; remove uses whichever backend reported
    /// the app installed instead of re-resolving availability. Names that are
    /// not valid package names resolve to `Unknown` and get dropped.
    pub fn backend_for(probe: &dyn SystemProbe, app: &str, mode: Mode) -> BackendKind {
        match mode {
            Mode::Install => resolve_backend(probe, app),
            Mode::Remove => installed_backend(probe, app),
        }
    }

    /// Group `apps` by backend. Input order is kept inside each group, the
    /// official repo group comes first and duplicate names are ignored.
    pub fn build(probe: &dyn SystemProbe, apps: &[String], mode: Mode) -> Self {
        let mut seen = HashSet::new();
        let mut resolved: Vec<(String, BackendKind)> = Vec::new();
        for app in apps {
            if !seen.insert(app.as_str()) {
                continue;
            }
            resolved.push((app.clone(), Self::backend_for(probe, app, mode)));
        }
        Self::from_resolved(resolved, mode)
    }

    /// A plan for exactly one app, without grouping
    pub fn single(probe: &dyn SystemProbe, app: &str, mode: Mode) -> Self {
        let backend = Self::backend_for(probe, app, mode);
        Self::from_resolved(vec![(app.to_string(), backend)], mode)
    }

    pub fn from_resolved(resolved: Vec<(String, BackendKind)>, mode: Mode) -> Self {
        let mut plan = Self::default();

        for kind in BackendKind::PRIORITY {
            let app_names: Vec<String> = resolved
                .iter()
                .filter(|(_, backend)| *backend == kind)
                .map(|(name, _)| name.clone())
                .collect();
            if !app_names.is_empty() {
                plan.jobs.push(InstallJob {
                    app_names,
                    backend: kind,
                    mode,
                });
            }
        }

        plan.dropped = resolved
            .into_iter()
            .filter(|(_, backend)| *backend == BackendKind::Unknown)
            .map(|(name, _)| name)
            .collect();

        plan
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn app_count(&self) -> usize {
        self.jobs.iter().map(|job| job.app_names.len()).sum()
    }

    /// Human readable summary used for confirmation prompts
    pub fn summary(&self) -> String {
        let mut msg = String::new();
        for job in &self.jobs {
            msg.push_str(&format!("{} via {}:\n", capitalize(job.mode.verb()), job.backend));
            for name in &job.app_names {
                msg.push_str(&format!("  • {}\n", name));
            }
        }
        if !self.dropped.is_empty() {
            msg.push_str(&format!(
                "Not available from any source: {}\n",
                self.dropped.join(", ")
            ));
        }
        msg
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
