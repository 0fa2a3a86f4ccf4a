//! Attribute source backed by the `smartctl` executable.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, warn};

use super::{AttributeSource, AttributeTable};

/// Runs `smartctl --all <device> --device=auto` and parses its report.
///
/// Exit status and stderr are ignored: `smartctl` sets status bits for
/// perfectly readable reports, and a device it cannot open simply yields an
/// empty table.
#[derive(Debug, Clone)]
pub struct Smartctl {
    executable: PathBuf,
    description: String,
}

impl Smartctl {
    /// Create a source for the given executable.
    pub fn new<P: AsRef<Path>>(executable: P) -> Self {
        let executable = executable.as_ref().to_path_buf();
        let description = format!("smartctl: {}", executable.display());
        Self {
            executable,
            description,
        }
    }

    /// Whether the current user can execute the file at the configured path.
    ///
    /// Only the filesystem is consulted (a regular file plus an `access(2)`
    /// execute check); the tool is not run. A bare name is looked up in the
    /// working directory, not on `PATH`.
    pub fn is_available(&self) -> bool {
        let path = if self.executable.components().count() == 1 {
            Path::new(".").join(&self.executable)
        } else {
            self.executable.clone()
        };
        let is_file = fs::metadata(&path).is_ok_and(|metadata| metadata.is_file());
        is_file && which::which(&path).is_ok()
    }

    /// Capture stdout of one invocation, or `None` if it could not be spawned.
    fn run(&self, device: &Path) -> Option<String> {
        let output = Command::new(&self.executable)
            .arg("--all")
            .arg(device)
            .arg("--device=auto")
            .stdin(Stdio::null())
            .output();

        match output {
            Ok(output) => {
                debug!(
                    device = %device.display(),
                    status = %output.status,
                    "smartctl finished"
                );
                Some(String::from_utf8_lossy(&output.stdout).into_owned())
            }
            Err(e) => {
                warn!(
                    executable = %self.executable.display(),
                    device = %device.display(),
                    error = %e,
                    "failed to run smartctl"
                );
                None
            }
        }
    }
}

impl AttributeSource for Smartctl {
    fn scan(&self, device: &Path) -> AttributeTable {
        self.run(device)
            .map(|output| AttributeTable::parse(&output))
            .unwrap_or_default()
    }

    fn description(&self) -> &str {
        &self.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_smartctl_new() {
        let source = Smartctl::new("/usr/sbin/smartctl");
        assert_eq!(source.description(), "smartctl: /usr/sbin/smartctl");
    }

    #[test]
    fn test_missing_executable_is_unavailable() {
        let source = Smartctl::new("/nonexistent/path/smartctl");
        assert!(!source.is_available());
    }

    #[test]
    fn test_directory_is_unavailable() {
        let dir = TempDir::new().unwrap();
        assert!(!Smartctl::new(dir.path()).is_available());
    }

    #[cfg(unix)]
    #[test]
    fn test_execute_bit_required() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("smartctl");
        fs::write(&path, b"#!/bin/sh\n").unwrap();

        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();
        assert!(!Smartctl::new(&path).is_available());

        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        assert!(Smartctl::new(&path).is_available());
    }

    #[cfg(unix)]
    #[test]
    fn test_execute_bit_for_other_users_is_not_enough() {
        use std::os::unix::fs::{MetadataExt, PermissionsExt};

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("smartctl");
        fs::write(&path, b"#!/bin/sh\n").unwrap();

        // Only group and others may execute; the owner (this process) may not.
        // root bypasses this, so only check as an unprivileged user.
        fs::set_permissions(&path, fs::Permissions::from_mode(0o611)).unwrap();
        let is_root = fs::metadata(&path).unwrap().uid() == 0;
        if !is_root {
            assert!(!Smartctl::new(&path).is_available());
        }
    }

    #[test]
    fn test_spawn_failure_yields_empty_table() {
        let source = Smartctl::new("/nonexistent/path/smartctl");
        assert!(source.scan(Path::new("/dev/sda")).is_empty());
    }
}
