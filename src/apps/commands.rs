//! Handlers for the app list commands (`list`, `status`, `install`, ...)

use anyhow::{Result, bail};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use super::list::CuratedList;
use crate::common::package::{Dispatcher, Mode, SystemProbe, resolver};
use crate::common::progress::create_spinner;
use crate::common::terminal::TerminalLauncher;
use crate::refresh::{RefreshCoordinator, RefreshView};
use crate::ui::prelude::*;

pub fn list_apps(list: &CuratedList) {
    if list.is_empty() {
        emit(
            Level::Info,
            "apps.list.empty",
            &format!(
                "{} No apps in {}. Add one with `archapps add <name>`.",
                char::from(NerdFont::Info),
                list.path().display()
            ),
            None,
        );
        return;
    }

    for record in list.records() {
        emit(
            Level::Info,
            "apps.list.item",
            &format!(
                "{} {:<24} {:<12} {:<12} {}",
                char::from(NerdFont::Package),
                record.name,
                record.source.display_name(),
                record.category,
                record.description
            ),
            serde_json::to_value(record).ok(),
        );
    }
}

/// Print which curated apps are missing, or installed with `installed`
pub async fn show_status(
    probe: Arc<dyn SystemProbe>,
    list: &CuratedList,
    installed: bool,
    grace: Duration,
) -> Result<()> {
    let view = if installed {
        RefreshView::Installed
    } else {
        RefreshView::Missing
    };

    let (mut coordinator, mut updates) = RefreshCoordinator::new(probe);
    let pb = create_spinner(format!("Checking {} apps...", list.len()));
    let update = coordinator
        .refresh_now(&mut updates, list.names(), view)
        .await;
    pb.finish_and_clear();
    coordinator.shutdown(grace).await;

    let apps = update.map(|update| update.apps).unwrap_or_default();
    for app in &apps {
        emit(
            Level::Info,
            "apps.status.item",
            &format!("{} {}", char::from(NerdFont::Package), app),
            Some(json!({ "app": app, "installed": installed })),
        );
    }

    let (code, message) = match (installed, apps.is_empty()) {
        (false, true) => ("apps.status.all_installed", "All apps installed!".to_string()),
        (true, true) => ("apps.status.none_installed", "No apps to remove.".to_string()),
        (false, false) => (
            "apps.status.summary",
            format!("{} of {} apps not installed", apps.len(), list.len()),
        ),
        (true, false) => (
            "apps.status.summary",
            format!("{} of {} apps installed", apps.len(), list.len()),
        ),
    };
    emit(
        Level::Success,
        code,
        &message,
        Some(json!({ "count": apps.len(), "total": list.len() })),
    );
    Ok(())
}

/// Install or remove `apps`. With no names, every curated app that needs the
/// operation is used. With `wait`, each launched terminal is polled until it
/// exits.
pub fn run_batch(
    probe: &dyn SystemProbe,
    launcher: &dyn TerminalLauncher,
    elevation: Vec<String>,
    list: &CuratedList,
    apps: Vec<String>,
    mode: Mode,
    wait: Option<Duration>,
) -> Result<()> {
    let apps = if apps.is_empty() {
        let pb = create_spinner("Checking which apps are installed...".to_string());
        let names = list.names();
        let pending = match mode {
            Mode::Install => resolver::filter_uninstalled(probe, &names),
            Mode::Remove => resolver::filter_installed(probe, &names),
        };
        pb.finish_and_clear();
        pending
    } else {
        apps
    };

    if apps.is_empty() {
        let message = match mode {
            Mode::Install => "All apps installed!",
            Mode::Remove => "No apps to remove.",
        };
        emit(
            Level::Success,
            "apps.batch.nothing_to_do",
            &format!("{} {}", char::from(NerdFont::Check), message),
            None,
        );
        return Ok(());
    }

    if mode == Mode::Install {
        warn_conflicts(list, &apps);
    }

    let dispatcher = Dispatcher::new(probe, launcher, elevation);
    let mut report = dispatcher.dispatch(&apps, mode)?;
    if report.launched.is_empty() {
        bail!(
            "Nothing to {}: no backend can handle {}",
            mode.verb(),
            report.dropped.join(", ")
        );
    }

    let Some(interval) = wait else {
        let started: Vec<&str> = report.launched_apps().collect();
        if !started.is_empty() {
            emit(
                Level::Info,
                "apps.batch.started",
                &format!(
                    "{} {} app(s) handed to the terminal, close it when done",
                    char::from(NerdFont::Info),
                    started.len()
                ),
                Some(json!({ "apps": started })),
            );
        }
        return Ok(());
    };

    let mut failed = 0;
    for launched in &mut report.launched {
        let exit = launched.handle.poll_until_exit(interval)?;
        let apps = launched.job.app_names.join(", ");
        if exit.success() {
            emit(
                Level::Success,
                "apps.batch.finished",
                &format!(
                    "{} Finished {} of {}",
                    char::from(NerdFont::Check),
                    mode.verb(),
                    apps
                ),
                Some(json!({ "apps": launched.job.app_names, "code": exit.code })),
            );
        } else {
            failed += 1;
            emit(
                Level::Error,
                "apps.batch.failed",
                &format!(
                    "{} {} of {} exited with {:?}",
                    char::from(NerdFont::Cross),
                    mode.verb(),
                    apps,
                    exit.code
                ),
                Some(json!({ "apps": launched.job.app_names, "code": exit.code })),
            );
        }
    }

    if failed > 0 {
        bail!("{} {} job(s) failed", failed, mode.verb());
    }
    Ok(())
}

/// Warn about selected apps that the list marks as conflicting
pub fn warn_conflicts(list: &CuratedList, apps: &[String]) {
    for (app, other) in list.conflicts_among(apps) {
        emit(
            Level::Warn,
            "apps.conflict",
            &format!(
                "{} {} conflicts with {}, installing both may fail",
                char::from(NerdFont::Warning),
                app,
                other
            ),
            Some(json!({ "app": app, "conflicts_with": other })),
        );
    }
}

pub fn add_app(probe: &dyn SystemProbe, list: &mut CuratedList, name: &str) -> Result<()> {
    let record = list.add_app(probe, name)?;
    emit(
        Level::Success,
        "apps.add",
        &format!(
            "{} Added {} from {}",
            char::from(NerdFont::Check),
            record.name,
            record.source.display_name()
        ),
        serde_json::to_value(record).ok(),
    );
    Ok(())
}

pub fn drop_app(list: &mut CuratedList, name: &str) -> Result<()> {
    let record = list.drop_app(name)?;
    emit(
        Level::Success,
        "apps.drop",
        &format!(
            "{} Removed {} from {}",
            char::from(NerdFont::Trash),
            record.name,
            list.path().display()
        ),
        None,
    );
    Ok(())
}

/// Report which backend would supply each name
pub fn resolve_apps(probe: &dyn SystemProbe, names: &[String]) {
    for name in names {
        let backend = resolver::resolve_backend(probe, name);
        let installed = resolver::is_installed(probe, name);
        emit(
            Level::Info,
            "apps.resolve",
            &format!(
                "{} {:<24} {}{}",
                char::from(NerdFont::Question),
                name,
                backend.display_name(),
                if installed { " (installed)" } else { "" }
            ),
            Some(json!({ "app": name, "backend": backend, "installed": installed })),
        );
    }
}

/// List explicitly installed packages per backend
pub fn list_explicit(probe: &dyn SystemProbe) {
    for (backend, packages) in resolver::explicitly_installed(probe) {
        emit(
            Level::Info,
            "apps.explicit.header",
            &format!(
                "{} {} ({} packages)",
                char::from(NerdFont::List),
                backend.display_name(),
                packages.len()
            ),
            Some(json!({ "backend": backend, "packages": packages })),
        );
        if get_output_format() == OutputFormat::Text {
            for package in &packages {
                emit(Level::Info, "apps.explicit.item", &format!("  {}", package), None);
            }
            separator();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apps::AppRecord;
    use crate::common::package::BackendKind;
    use crate::common::package::fakes::{FakeProbe, RecordingLauncher};

    fn curated(names: &[&str]) -> CuratedList {
        CuratedList::from_records(
            "/unused/apps.yaml",
            names
                .iter()
                .map(|name| AppRecord::new(*name, BackendKind::OfficialRepo))
                .collect(),
        )
    }

    fn pkexec() -> Vec<String> {
        vec!["pkexec".to_string()]
    }

    #[test]
    fn test_batch_without_names_installs_missing_apps() {
        let probe = FakeProbe::new()
            .with_installed("pacman", "git")
            .with_available("pacman", "vlc")
            .with_available("pacman", "zed");
        let launcher = RecordingLauncher::default();
        let list = curated(&["git", "vlc", "zed"]);

        run_batch(&probe, &launcher, pkexec(), &list, Vec::new(), Mode::Install, None).unwrap();

        let commands = launcher.commands();
        assert_eq!(commands.len(), 1);
        let argv = commands[0].to_argv();
        assert!(argv.ends_with(&["vlc".to_string(), "zed".to_string()]));
        assert!(!argv.contains(&"git".to_string()));
    }

    #[test]
    fn test_batch_with_everything_installed_launches_nothing() {
        let probe = FakeProbe::new().with_installed("pacman", "git");
        let launcher = RecordingLauncher::without_terminal();
        let list = curated(&["git"]);

        run_batch(&probe, &launcher, pkexec(), &list, Vec::new(), Mode::Install, None).unwrap();
        assert!(launcher.commands().is_empty());
    }

    #[test]
    fn test_batch_wait_polls_launched_jobs() {
        let probe = FakeProbe::new().with_installed("pacman", "git");
        let launcher = RecordingLauncher::default();
        let list = curated(&["git"]);

        run_batch(
            &probe,
            &launcher,
            pkexec(),
            &list,
            Vec::new(),
            Mode::Remove,
            Some(Duration::from_millis(10)),
        )
        .unwrap();
        assert_eq!(launcher.commands().len(), 1);
    }

    #[test]
    fn test_batch_of_unknown_apps_is_an_error() {
        let probe = FakeProbe::new();
        let launcher = RecordingLauncher::default();
        let list = curated(&[]);

        let result = run_batch(
            &probe,
            &launcher,
            pkexec(),
            &list,
            vec!["totally-fake-pkg-xyz".to_string()],
            Mode::Install,
            None,
        );
        assert!(result.is_err());
        assert!(launcher.commands().is_empty());
    }

    #[test]
    fn test_failed_job_is_reported_when_waiting() {
        let probe = FakeProbe::new().with_available("pacman", "vlc");
        let launcher = RecordingLauncher::exiting_with(1);
        let list = curated(&["vlc"]);

        let result = run_batch(
            &probe,
            &launcher,
            pkexec(),
            &list,
            vec!["vlc".to_string()],
            Mode::Install,
            Some(Duration::from_millis(10)),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_batch_without_terminal_is_an_error() {
        let probe = FakeProbe::new().with_available("pacman", "vlc");
        let launcher = RecordingLauncher::without_terminal();
        let list = curated(&[]);

        let result = run_batch(
            &probe,
            &launcher,
            pkexec(),
            &list,
            vec!["vlc".to_string()],
            Mode::Install,
            None,
        );
        assert!(result.is_err());
    }
}
