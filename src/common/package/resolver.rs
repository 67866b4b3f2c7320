//! Availability resolution and install-state checks.

use super::manager::{BackendKind, is_valid_package_name};
use super::probe::SystemProbe;

/// Decide which backend can supply `app`.
///
/// The official repo is asked first and always wins; the AUR helper is only
/// consulted when it is installed.
pub fn resolve_backend(probe: &dyn SystemProbe, app: &str) -> BackendKind {
    first_backend_answering(probe, app, |template| template.info_args)
}

/// Which backend's local database reports `app` as installed
pub fn installed_backend(probe: &dyn SystemProbe, app: &str) -> BackendKind {
    first_backend_answering(probe, app, |template| template.query_args)
}

pub fn is_installed(probe: &dyn SystemProbe, app: &str) -> bool {
    installed_backend(probe, app) != BackendKind::Unknown
}

/// Apps from `names` that are not installed, in input order
pub fn filter_uninstalled(probe: &dyn SystemProbe, names: &[String]) -> Vec<String> {
    retain_by_state(probe, names, false, || false).unwrap_or_default()
}

/// Apps from `names` that are installed, in input order
pub fn filter_installed(probe: &dyn SystemProbe, names: &[String]) -> Vec<String> {
    retain_by_state(probe, names, true, || false).unwrap_or_default()
}

/// Keep the apps whose installed state equals `installed`, checking them one
/// by one in input order. `should_stop` is consulted before each check; once
/// it returns true the partial result is discarded and `None` is returned.
pub fn retain_by_state(
    probe: &dyn SystemProbe,
    names: &[String],
    installed: bool,
    should_stop: impl Fn() -> bool,
) -> Option<Vec<String>> {
    let mut kept = Vec::new();
    for name in names {
        if should_stop() {
            return None;
        }
        if is_installed(probe, name) == installed {
            kept.push(name.clone());
        }
    }
    Some(kept)
}

/// Explicitly installed packages per backend (`pacman -Qenq`, `paru -Qemq`)
pub fn explicitly_installed(probe: &dyn SystemProbe) -> Vec<(BackendKind, Vec<String>)> {
    BackendKind::PRIORITY
        .iter()
        .filter_map(|kind| {
            let template = kind.template()?;
            if kind.needs_presence_check() && !probe.backend_present(template.program) {
                return None;
            }
            Some((*kind, probe.query_lines(template.program, template.explicit_args)))
        })
        .collect()
}

fn first_backend_answering(
    probe: &dyn SystemProbe,
    app: &str,
    args_of: impl Fn(&super::manager::CommandTemplate) -> &'static [&'static str],
) -> BackendKind {
    if !is_valid_package_name(app) {
        return BackendKind::Unknown;
    }
    for kind in BackendKind::PRIORITY {
        let Some(template) = kind.template() else {
            continue;
        };
        if kind.needs_presence_check() && !probe.backend_present(template.program) {
            continue;
        }
        let mut args: Vec<&str> = args_of(template).to_vec();
        args.extend(["--", app]);
        if probe.query_succeeds(template.program, &args) {
            return kind;
        }
    }
    BackendKind::Unknown
}
