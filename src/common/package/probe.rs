//! Probing the host for package tools.
//!
//! Every probe absorbs failure: a missing binary, a spawn error and a
//! non-zero exit all read as "no". Network trouble during a `-Si` lookup is
//! therefore indistinguishable from "package does not exist".

use duct::cmd;

/// Seam over the host system so resolution logic can be tested without pacman
pub trait SystemProbe: Send + Sync {
    /// Whether `program` resolves on `PATH`
    fn backend_present(&self, program: &str) -> bool;

    /// Run `program args...` with output discarded and report a zero exit
    fn query_succeeds(&self, program: &str, args: &[&str]) -> bool;

    /// Run `program args...` and return stdout lines, empty on any failure
    fn query_lines(&self, program: &str, args: &[&str]) -> Vec<String>;
}

/// Probes the real system through `which` and subprocesses
#[derive(Debug, Default, Clone, Copy)]
pub struct HostProbe;

impl SystemProbe for HostProbe {
    fn backend_present(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }

    fn query_succeeds(&self, program: &str, args: &[&str]) -> bool {
        cmd(program, args)
            .stdout_null()
            .stderr_null()
            .unchecked()
            .run()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    fn query_lines(&self, program: &str, args: &[&str]) -> Vec<String> {
        cmd(program, args)
            .stderr_null()
            .read()
            .map(|output| {
                output
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_binary_is_false_not_error() {
        let probe = HostProbe;
        assert!(!probe.backend_present("definitely-not-a-real-binary-xyz"));
        assert!(!probe.query_succeeds("definitely-not-a-real-binary-xyz", &["-Q", "foo"]));
        assert!(probe
            .query_lines("definitely-not-a-real-binary-xyz", &["-Qenq"])
            .is_empty());
    }

    #[test]
    fn test_exit_status_maps_to_bool() {
        let probe = HostProbe;
        assert!(probe.query_succeeds("sh", &["-c", "exit 0"]));
        assert!(!probe.query_succeeds("sh", &["-c", "exit 1"]));
    }

    #[test]
    fn test_query_lines_trims_and_skips_blank() {
        let probe = HostProbe;
        let lines = probe.query_lines("sh", &["-c", "printf 'firefox\\n\\n  vlc \\n'"]);
        assert_eq!(lines, vec!["firefox", "vlc"]);
    }
}
