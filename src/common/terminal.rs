/// Terminal emulator discovery and launching
use std::io;
use std::process::{Child, Command};
use std::thread;
use std::time::Duration;
use thiserror::Error;

use crate::common::shell::join_command;
use crate::ui::prelude::*;

/// A command to run inside a terminal window
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchCommand {
    /// Program followed by its arguments
    Argv(Vec<String>),
    /// A shell snippet, run through `bash -c` where needed
    Shell(String),
}

impl LaunchCommand {
    pub fn argv<S: Into<String>>(args: impl IntoIterator<Item = S>) -> Self {
        Self::Argv(args.into_iter().map(Into::into).collect())
    }

    /// The command as an argument vector
    pub fn to_argv(&self) -> Vec<String> {
        match self {
            Self::Argv(argv) => argv.clone(),
            Self::Shell(script) => vec!["bash".to_string(), "-c".to_string(), script.clone()],
        }
    }

    /// The command as one shell string
    pub fn to_shell_string(&self) -> String {
        match self {
            Self::Argv(argv) => join_command(argv),
            Self::Shell(script) => script.clone(),
        }
    }
}

impl std::fmt::Display for LaunchCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_shell_string())
    }
}

/// How an emulator expects its inline command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgStyle {
    /// Everything after the flag is the program and its arguments
    Argv,
    /// The flag takes exactly one string which the emulator parses itself
    ShellString,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalEmulator {
    pub program: &'static str,
    pub exec_flag: &'static str,
    pub style: ArgStyle,
}

impl TerminalEmulator {
    const fn new(program: &'static str, exec_flag: &'static str, style: ArgStyle) -> Self {
        Self {
            program,
            exec_flag,
            style,
        }
    }

    /// Arguments passed to the emulator binary to run `command`
    pub fn build_args(&self, command: &LaunchCommand) -> Vec<String> {
        let mut args = vec![self.exec_flag.to_string()];
        match self.style {
            ArgStyle::Argv => args.extend(command.to_argv()),
            ArgStyle::ShellString => args.push(command.to_shell_string()),
        }
        args
    }
}

/// Terminal emulators in order of preference
pub const TERMINALS: &[TerminalEmulator] = &[
    TerminalEmulator::new("kgx", "--", ArgStyle::Argv),
    TerminalEmulator::new("konsole", "-e", ArgStyle::Argv),
    TerminalEmulator::new("xfce4-terminal", "-e", ArgStyle::ShellString),
    TerminalEmulator::new("xterm", "-e", ArgStyle::Argv),
    TerminalEmulator::new("alacritty", "-e", ArgStyle::Argv),
    TerminalEmulator::new("deepin-terminal", "--run-script", ArgStyle::ShellString),
    TerminalEmulator::new("hyper", "--", ArgStyle::Argv),
    TerminalEmulator::new("putty", "-e", ArgStyle::Argv),
    TerminalEmulator::new("mate-terminal", "--", ArgStyle::Argv),
];

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("No supported terminal emulator found")]
    NoTerminalAvailable,
    #[error("Failed to start {terminal}: {source}")]
    Spawn {
        terminal: String,
        #[source]
        source: io::Error,
    },
}

/// Exit information for a supervised process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessExit {
    /// `None` when the process was killed by a signal
    pub code: Option<i32>,
}

impl ProcessExit {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

#[derive(Debug)]
enum HandleState {
    Running(Child),
    Exited(ProcessExit),
}

/// Handle to a process started in a terminal window
#[derive(Debug)]
pub struct ProcessHandle {
    terminal: String,
    state: HandleState,
}

impl ProcessHandle {
    pub fn from_child(terminal: impl Into<String>, child: Child) -> Self {
        Self {
            terminal: terminal.into(),
            state: HandleState::Running(child),
        }
    }

    /// A handle for a process that has already finished
    pub fn exited(terminal: impl Into<String>, code: Option<i32>) -> Self {
        Self {
            terminal: terminal.into(),
            state: HandleState::Exited(ProcessExit { code }),
        }
    }

    pub fn terminal(&self) -> &str {
        &self.terminal
    }

    pub fn pid(&self) -> Option<u32> {
        match &self.state {
            HandleState::Running(child) => Some(child.id()),
            HandleState::Exited(_) => None,
        }
    }

    /// Check for exit without blocking
    pub fn try_wait(&mut self) -> io::Result<Option<ProcessExit>> {
        match &mut self.state {
            HandleState::Exited(exit) => Ok(Some(*exit)),
            HandleState::Running(child) => {
                let Some(status) = child.try_wait()? else {
                    return Ok(None);
                };
                let exit = ProcessExit {
                    code: status.code(),
                };
                self.state = HandleState::Exited(exit);
                Ok(Some(exit))
            }
        }
    }

    /// Block in a sleep-poll loop until the process exits. There is no
    /// overall timeout; the child is expected to terminate on its own.
    pub fn poll_until_exit(&mut self, interval: Duration) -> io::Result<ProcessExit> {
        loop {
            if let Some(exit) = self.try_wait()? {
                return Ok(exit);
            }
            emit(
                Level::Debug,
                "terminal.poll",
                &format!("{} command is still running...", self.terminal),
                None,
            );
            thread::sleep(interval);
        }
    }
}

/// Seam between the dispatcher and real terminal windows
pub trait TerminalLauncher: Send + Sync {
    /// Whether any terminal could be used at all
    fn terminal_available(&self) -> bool;

    fn launch(&self, command: &LaunchCommand) -> Result<ProcessHandle, LaunchError>;
}

/// Launches commands in the first installed terminal emulator
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTerminal;

impl TerminalLauncher for SystemTerminal {
    fn terminal_available(&self) -> bool {
        detect_terminal().is_some()
    }

    fn launch(&self, command: &LaunchCommand) -> Result<ProcessHandle, LaunchError> {
        launch_in_terminal(command)
    }
}

/// Check if a terminal emulator is available
fn is_available(terminal: &str) -> bool {
    which::which(terminal).is_ok()
}

/// Terminals from the preference list that pass `available`, in order
pub fn available_terminals(available: impl Fn(&str) -> bool) -> Vec<&'static TerminalEmulator> {
    TERMINALS.iter().filter(|t| available(t.program)).collect()
}

/// Detect the preferred installed terminal emulator
pub fn detect_terminal() -> Option<&'static TerminalEmulator> {
    available_terminals(is_available).into_iter().next()
}

/// Run `command` in the first present terminal emulator without waiting for it.
///
/// If a present emulator fails to spawn, the next one is tried. The error of
/// the last attempt is returned when none could be started.
pub fn launch_in_terminal(command: &LaunchCommand) -> Result<ProcessHandle, LaunchError> {
    let mut last_error = None;

    for terminal in available_terminals(is_available) {
        let args = terminal.build_args(command);
        emit(
            Level::Debug,
            "terminal.spawn",
            &format!("{} {}", terminal.program, join_command(&args)),
            None,
        );

        match Command::new(terminal.program).args(&args).spawn() {
            Ok(child) => return Ok(ProcessHandle::from_child(terminal.program, child)),
            Err(source) => {
                emit(
                    Level::Warn,
                    "terminal.spawn_failed",
                    &format!(
                        "{} Failed to start {}: {}",
                        char::from(NerdFont::Warning),
                        terminal.program,
                        source
                    ),
                    None,
                );
                last_error = Some(LaunchError::Spawn {
                    terminal: terminal.program.to_string(),
                    source,
                });
            }
        }
    }

    Err(last_error.unwrap_or(LaunchError::NoTerminalAvailable))
}
