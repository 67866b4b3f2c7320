//! Package backends and their command-line templates.

use serde::{Deserialize, Serialize};

/// Where an app comes from. Recomputed per query, never trusted from disk
/// for dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BackendKind {
    /// Official signed repositories via pacman (requires elevation)
    #[serde(rename = "pacman", alias = "OfficialRepo")]
    OfficialRepo,
    /// AUR via paru, run as the invoking user
    #[serde(rename = "paru", alias = "AurHelper", alias = "AUR")]
    AurHelper,
    /// Available from neither backend
    #[serde(other)]
    Unknown,
}

/// Whether a job installs or removes packages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Mode {
    Install,
    Remove,
}

impl Mode {
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Remove => "remove",
        }
    }
}

/// Everything needed to talk to one package backend
#[derive(Debug, PartialEq, Eq)]
pub struct CommandTemplate {
    pub program: &'static str,
    /// Sync database lookup, e.g. `-Si`
    pub info_args: &'static [&'static str],
    /// Local database lookup, e.g. `-Q`
    pub query_args: &'static [&'static str],
    /// Explicitly installed packages, names only
    pub explicit_args: &'static [&'static str],
    pub install_args: &'static [&'static str],
    pub remove_args: &'static [&'static str],
    /// Whether the elevation prefix is required
    pub elevated: bool,
}

impl CommandTemplate {
    pub fn mode_args(&self, mode: Mode) -> &'static [&'static str] {
        match mode {
            Mode::Install => self.install_args,
            Mode::Remove => self.remove_args,
        }
    }

    /// Build the full argument vector for a batch operation
    pub fn command_line(&self, mode: Mode, elevation: &[String], packages: &[String]) -> Vec<String> {
        let mut argv: Vec<String> = Vec::new();
        if self.elevated {
            argv.extend(elevation.iter().cloned());
        }
        argv.push(self.program.to_string());
        argv.extend(self.mode_args(mode).iter().map(|s| s.to_string()));
        argv.push("--".to_string());
        argv.extend(packages.iter().cloned());
        argv
    }
}

/// Whether `name` is usable as a package name: letters, digits and `@._+-`,
/// not starting with `-` or `.`. Anything else is never passed to a backend.
pub fn is_valid_package_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with(['-', '.'])
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '_' | '+' | '-'))
}

static PACMAN: CommandTemplate = CommandTemplate {
    program: "pacman",
    info_args: &["-Si"],
    query_args: &["-Q"],
    explicit_args: &["-Qenq"],
    install_args: &["-S", "--noconfirm", "--needed", "--quiet", "--color", "always"],
    remove_args: &["-Rns", "--noconfirm"],
    elevated: true,
};

static PARU: CommandTemplate = CommandTemplate {
    program: "paru",
    info_args: &["-Si"],
    query_args: &["-Q"],
    explicit_args: &["-Qemq"],
    install_args: &[
        "-S",
        "--noconfirm",
        "--skipreview",
        "--needed",
        "--quiet",
        "--color",
        "always",
    ],
    remove_args: &["-Rns", "--noconfirm"],
    elevated: false,
};

impl BackendKind {
    /// Backends in resolution priority order. The official repo always wins.
    pub const PRIORITY: [BackendKind; 2] = [BackendKind::OfficialRepo, BackendKind::AurHelper];

    pub fn template(&self) -> Option<&'static CommandTemplate> {
        match self {
            Self::OfficialRepo => Some(&PACMAN),
            Self::AurHelper => Some(&PARU),
            Self::Unknown => None,
        }
    }

    pub fn program(&self) -> Option<&'static str> {
        self.template().map(|t| t.program)
    }

    /// The official repo tool is assumed present on Arch; the helper may not be.
    pub fn needs_presence_check(&self) -> bool {
        matches!(self, Self::AurHelper)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::OfficialRepo => "pacman",
            Self::AurHelper => "AUR (paru)",
            Self::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_priority_puts_official_repo_first() {
        assert_eq!(BackendKind::PRIORITY[0], BackendKind::OfficialRepo);
        assert_eq!(BackendKind::PRIORITY[1], BackendKind::AurHelper);
    }

    #[test]
    fn test_unknown_has_no_template() {
        assert!(BackendKind::Unknown.template().is_none());
        assert!(BackendKind::Unknown.program().is_none());
    }

    #[test]
    fn test_official_install_is_elevated() {
        let argv = BackendKind::OfficialRepo.template().unwrap().command_line(
            Mode::Install,
            &names(&["pkexec"]),
            &names(&["firefox", "vlc"]),
        );
        assert_eq!(
            argv,
            names(&[
                "pkexec", "pacman", "-S", "--noconfirm", "--needed", "--quiet", "--color",
                "always", "--", "firefox", "vlc"
            ])
        );
    }

    #[test]
    fn test_aur_helper_runs_unprivileged() {
        let argv = BackendKind::AurHelper.template().unwrap().command_line(
            Mode::Install,
            &names(&["pkexec"]),
            &names(&["yay-bin"]),
        );
        assert_eq!(argv[0], "paru");
        assert!(argv.contains(&"--skipreview".to_string()));
        assert_eq!(argv.last().unwrap(), "yay-bin");
    }

    #[test]
    fn test_remove_uses_rns() {
        let argv = BackendKind::OfficialRepo.template().unwrap().command_line(
            Mode::Remove,
            &names(&["sudo"]),
            &names(&["gimp"]),
        );
        assert_eq!(argv, names(&["sudo", "pacman", "-Rns", "--noconfirm", "--", "gimp"]));
    }

    #[test]
    fn test_source_serializes_as_tool_name() {
        let yaml = serde_yaml::to_string(&vec![BackendKind::OfficialRepo, BackendKind::AurHelper]).unwrap();
        assert_eq!(yaml, "- pacman\n- paru\n");
    }

    #[test]
    fn test_source_aliases_from_yaml() {
        let kinds: Vec<BackendKind> =
            serde_yaml::from_str("[pacman, paru, AUR, OfficialRepo, Unknown, flatpak]").unwrap();
        assert_eq!(
            kinds,
            vec![
                BackendKind::OfficialRepo,
                BackendKind::AurHelper,
                BackendKind::AurHelper,
                BackendKind::OfficialRepo,
                BackendKind::Unknown,
                BackendKind::Unknown,
            ]
        );
    }

    #[test]
    fn test_dash_names_stay_operands() {
        let argv = BackendKind::OfficialRepo.template().unwrap().command_line(
            Mode::Remove,
            &names(&["pkexec"]),
            &names(&["-dd", "glibc"]),
        );
        let separator = argv.iter().position(|a| a == "--").unwrap();
        let flag = argv.iter().position(|a| a == "-dd").unwrap();
        assert!(separator < flag);
    }

    #[test]
    fn test_package_name_rules() {
        for name in ["firefox", "lib32-mesa", "gtk+", "python3.12", "r@x_y"] {
            assert!(is_valid_package_name(name), "{name}");
        }
        for name in ["", "-dd", "--help", ".hidden", "two words", "a/b", "x;rm"] {
            assert!(!is_valid_package_name(name), "{name}");
        }
    }
}
