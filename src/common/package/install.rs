//! Launching install and remove jobs in a terminal.

use serde_json::json;

use super::batch::{InstallJob, InstallPlan};
use super::manager::Mode;
use super::probe::SystemProbe;
use crate::common::terminal::{LaunchCommand, LaunchError, ProcessHandle, TerminalLauncher};
use crate::ui::prelude::*;

/// A job whose terminal has been started
#[derive(Debug)]
pub struct LaunchedJob {
    pub job: InstallJob,
    pub command: LaunchCommand,
    pub handle: ProcessHandle,
}

/// Outcome of a dispatch. The launched processes keep running on their own;
/// poll the handles to observe completion.
#[derive(Debug, Default)]
pub struct DispatchReport {
    pub launched: Vec<LaunchedJob>,
    pub dropped: Vec<String>,
}

impl DispatchReport {
    pub fn launched_apps(&self) -> impl Iterator<Item = &str> {
        self.launched
            .iter()
            .flat_map(|launched| launched.job.app_names.iter().map(String::as_str))
    }
}

/// Routes apps to their backend and starts one terminal per backend
pub struct Dispatcher<'a> {
    probe: &'a dyn SystemProbe,
    launcher: &'a dyn TerminalLauncher,
    elevation: Vec<String>,
}

impl<'a> Dispatcher<'a> {
    pub fn new(
        probe: &'a dyn SystemProbe,
        launcher: &'a dyn TerminalLauncher,
        elevation: Vec<String>,
    ) -> Self {
        Self {
            probe,
            launcher,
            elevation,
        }
    }

    /// Group `apps` by backend for `mode` without launching anything
    pub fn plan(&self, apps: &[String], mode: Mode) -> InstallPlan {
        match apps {
            [single] => InstallPlan::single(self.probe, single, mode),
            _ => InstallPlan::build(self.probe, apps, mode),
        }
    }

    /// Resolve and launch. Apps no backend can handle are dropped and logged.
    /// A launch failure aborts the remaining jobs and is returned; nothing is
    /// retried.
    pub fn dispatch(&self, apps: &[String], mode: Mode) -> Result<DispatchReport, LaunchError> {
        let plan = self.plan(apps, mode);
        self.execute(plan)
    }

    /// Launch an already computed plan. Without any terminal this fails
    /// before anything is spawned, even when the plan has no jobs.
    pub fn execute(&self, plan: InstallPlan) -> Result<DispatchReport, LaunchError> {
        for app in &plan.dropped {
            emit(
                Level::Warn,
                "dispatch.dropped",
                &format!(
                    "{} No install source found for {}",
                    char::from(NerdFont::Warning),
                    app
                ),
                Some(json!({ "app": app })),
            );
        }

        if !self.launcher.terminal_available() {
            return Err(LaunchError::NoTerminalAvailable);
        }

        let mut report = DispatchReport {
            launched: Vec::with_capacity(plan.jobs.len()),
            dropped: plan.dropped,
        };

        for job in plan.jobs {
            let Some(command) = job.command(&self.elevation) else {
                continue;
            };
            emit(
                Level::Debug,
                "dispatch.command",
                &format!("{}", command),
                Some(json!({ "backend": job.backend, "mode": job.mode })),
            );

            let handle = self.launcher.launch(&command)?;
            emit(
                Level::Info,
                "dispatch.launched",
                &format!(
                    "{} Started {} of {} via {} in {}",
                    char::from(NerdFont::Terminal),
                    job.mode.verb(),
                    job.app_names.join(", "),
                    job.backend,
                    handle.terminal()
                ),
                Some(json!({
                    "apps": job.app_names,
                    "backend": job.backend,
                    "mode": job.mode,
                    "terminal": handle.terminal(),
                })),
            );
            report.launched.push(LaunchedJob {
                job,
                command,
                handle,
            });
        }

        Ok(report)
    }
}


#[cfg(test)]
mod tests {
    use super::fake::RecordingLauncher;
    use super::*;
    use crate::common::package::manager::BackendKind;
    use crate::common::package::probe::fake::FakeProbe;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn elevation() -> Vec<String> {
        names(&["pkexec"])
    }

    fn scenario_probe() -> FakeProbe {
        FakeProbe::new()
            .with_tool("paru")
            .with_available("pacman", "firefox")
            .with_available("paru", "some-aur-only-pkg")
    }

    fn argv(cmd: &LaunchCommand) -> Vec<String> {
        match cmd {
            LaunchCommand::Argv(argv) => argv.clone(),
            LaunchCommand::Shell(_) => panic!("expected argv command"),
        }
    }

    #[test]
    fn test_scenario_two_commands_fake_dropped() {
        let probe = scenario_probe();
        let launcher = RecordingLauncher::default();
        let dispatcher = Dispatcher::new(&probe, &launcher, elevation());

        let report = dispatcher
            .dispatch(
                &names(&["firefox", "some-aur-only-pkg", "totally-fake-pkg-xyz"]),
                Mode::Install,
            )
            .unwrap();

        let commands = launcher.commands();
        assert_eq!(commands.len(), 2);
        assert_eq!(
            argv(&commands[0]),
            names(&[
                "pkexec", "pacman", "-S", "--noconfirm", "--needed", "--quiet", "--color",
                "always", "--", "firefox"
            ])
        );
        let aur = argv(&commands[1]);
        assert_eq!(aur[0], "paru");
        assert_eq!(aur.last().unwrap(), "some-aur-only-pkg");
        assert!(!aur.contains(&"pkexec".to_string()));

        assert_eq!(report.dropped, names(&["totally-fake-pkg-xyz"]));
        let launched: Vec<_> = report.launched_apps().collect();
        assert_eq!(launched, vec!["firefox", "some-aur-only-pkg"]);
    }

    #[test]
    fn test_same_backend_batch_is_one_command() {
        let probe = FakeProbe::new()
            .with_available("pacman", "vlc")
            .with_available("pacman", "gimp")
            .with_available("pacman", "htop");
        let launcher = RecordingLauncher::default();
        let dispatcher = Dispatcher::new(&probe, &launcher, elevation());

        dispatcher
            .dispatch(&names(&["vlc", "gimp", "htop"]), Mode::Install)
            .unwrap();

        let commands = launcher.commands();
        assert_eq!(commands.len(), 1);
        assert!(argv(&commands[0]).ends_with(&names(&["vlc", "gimp", "htop"])));
    }

    #[test]
    fn test_single_app_path() {
        let probe = scenario_probe();
        let launcher = RecordingLauncher::default();
        let dispatcher = Dispatcher::new(&probe, &launcher, elevation());

        let report = dispatcher
            .dispatch(&names(&["some-aur-only-pkg"]), Mode::Install)
            .unwrap();

        assert_eq!(launcher.commands().len(), 1);
        assert_eq!(report.launched.len(), 1);
        assert_eq!(report.launched[0].job.backend, BackendKind::AurHelper);
        assert_eq!(
            report.launched[0].job.app_names,
            names(&["some-aur-only-pkg"])
        );
    }

    #[test]
    fn test_no_terminal_fails_and_spawns_nothing() {
        let probe = scenario_probe();
        let launcher = RecordingLauncher::without_terminal();
        let dispatcher = Dispatcher::new(&probe, &launcher, elevation());

        let result = dispatcher.dispatch(&names(&["firefox", "some-aur-only-pkg"]), Mode::Install);

        assert!(matches!(result, Err(LaunchError::NoTerminalAvailable)));
        assert!(launcher.commands().is_empty());
    }

    #[test]
    fn test_remove_batch_uses_rns() {
        let probe = FakeProbe::new()
            .with_installed("pacman", "vlc")
            .with_installed("pacman", "gimp");
        let launcher = RecordingLauncher::default();
        let dispatcher = Dispatcher::new(&probe, &launcher, elevation());

        dispatcher
            .dispatch(&names(&["vlc", "gimp", "not-installed"]), Mode::Remove)
            .unwrap();

        let commands = launcher.commands();
        assert_eq!(commands.len(), 1);
        assert_eq!(
            argv(&commands[0]),
            names(&["pkexec", "pacman", "-Rns", "--noconfirm", "--", "vlc", "gimp"])
        );
    }

    #[test]
    fn test_empty_input_launches_nothing() {
        let probe = FakeProbe::new();
        let launcher = RecordingLauncher::default();
        let dispatcher = Dispatcher::new(&probe, &launcher, elevation());

        let report = dispatcher.dispatch(&[], Mode::Install).unwrap();
        assert!(report.launched.is_empty());
        assert!(report.dropped.is_empty());
    }

    #[test]
    fn test_no_terminal_fails_even_when_everything_is_dropped() {
        let probe = FakeProbe::new();
        let launcher = RecordingLauncher::without_terminal();
        let dispatcher = Dispatcher::new(&probe, &launcher, elevation());

        let result = dispatcher.dispatch(&names(&["totally-fake-pkg-xyz"]), Mode::Install);
        assert!(matches!(result, Err(LaunchError::NoTerminalAvailable)));
    }
}
