//! Plugin settings resolved from the environment.
//!
//! munin-node passes plugin configuration as environment variables. Two
//! groups are read, each through its own [`config::Environment`] source:
//!
//! ```text
//! MUNIN_STATEFILE      -> statefile   (set by munin-node, required)
//! smart_raw_drives     -> drives      ("sda sdb", default: /dev/sd?)
//! smart_raw_params     -> params      ("5 187 188 197 198")
//! smart_raw_smartctl   -> smartctl    (default: smartctl on PATH)
//! ```
//!
//! Variable names are matched case-insensitively.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use config::{Config, ConfigError, Environment, Map};
use regex::Regex;
use tracing::debug;

use crate::error::{PluginError, Result};

/// Environment variable holding the state file path.
pub const ENV_STATEFILE: &str = "MUNIN_STATEFILE";

/// Directory that device short names are resolved against.
pub const DEVICE_DIR: &str = "/dev";

/// Attribute ids monitored when `smart_raw_params` is unset.
///
/// These are the counters Backblaze found to correlate with drive failure.
pub const DEFAULT_PARAMS: &[&str] = &["5", "187", "188", "197", "198"];

const SMARTCTL: &str = "smartctl";

/// Search path used when `PATH` is unset.
const DEFAULT_SEARCH_PATH: &str = "/bin:/usr/bin";

/// Device names picked up when `smart_raw_drives` is unset (`sd?`).
static DEFAULT_DEVICE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^sd.$").expect("device pattern is valid"));

/// Immutable plugin configuration, built once per process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Path of the `smartctl` executable.
    pub executable: PathBuf,
    /// Attribute ids to report, in output order.
    pub params: Vec<String>,
    /// Device paths to query, in output order.
    pub drives: Vec<PathBuf>,
    /// JSON file remembering attribute names between runs.
    pub statefile: PathBuf,
}

impl Settings {
    /// Resolve settings from the process environment.
    ///
    /// Variables that are not valid Unicode are ignored.
    pub fn from_env() -> Result<Self> {
        let vars = std::env::vars_os()
            .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
            .collect();
        Self::resolve(vars, Path::new(DEVICE_DIR))
    }

    /// Resolve settings from an explicit set of environment variables.
    ///
    /// `device_dir` is where short device names live and where the default
    /// device pattern is matched.
    pub fn resolve(vars: Map<String, String>, device_dir: &Path) -> Result<Self> {
        let munin = environment("munin", &vars)?;
        let plugin = environment("smart_raw", &vars)?;

        let statefile = optional(&munin, "statefile")?
            .filter(|path| !path.is_empty())
            .map(PathBuf::from)
            .ok_or(PluginError::MissingStateFile(ENV_STATEFILE))?;

        let executable = match optional(&plugin, "smartctl")? {
            Some(path) if path.is_empty() => return Err(PluginError::SmartctlNotFound),
            Some(path) => PathBuf::from(path),
            None => which::which_in(SMARTCTL, Some(search_path(&vars)), ".")
                .map_err(|_| PluginError::SmartctlNotFound)?,
        };

        let drives = match optional(&plugin, "drives")? {
            Some(names) => names.split_whitespace().map(|name| device_dir.join(name)).collect(),
            None => default_drives(device_dir),
        };

        let params: Vec<String> = match optional(&plugin, "params")? {
            Some(ids) => ids.split_whitespace().map(str::to_owned).collect(),
            None => DEFAULT_PARAMS.iter().map(|id| id.to_string()).collect(),
        };

        debug!(
            executable = %executable.display(),
            drives = drives.len(),
            params = params.len(),
            "resolved settings"
        );

        Ok(Self {
            executable,
            params,
            drives,
            statefile,
        })
    }
}

/// Build a config view over the variables carrying `prefix`.
fn environment(prefix: &str, vars: &Map<String, String>) -> Result<Config> {
    let config = Config::builder()
        .add_source(
            Environment::with_prefix(prefix)
                .prefix_separator("_")
                .source(Some(vars.clone())),
        )
        .build()?;
    Ok(config)
}

/// `PATH` from `vars`, or the system default when it is unset.
fn search_path(vars: &Map<String, String>) -> &str {
    vars.get("PATH")
        .map(String::as_str)
        .unwrap_or(DEFAULT_SEARCH_PATH)
}

fn optional(config: &Config, key: &str) -> Result<Option<String>> {
    match config.get_string(key) {
        Ok(value) => Ok(Some(value)),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Every `sd?` entry of `device_dir`, sorted by path.
///
/// A missing or unreadable directory yields no devices.
fn default_drives(device_dir: &Path) -> Vec<PathBuf> {
    let entries = match fs::read_dir(device_dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(dir = %device_dir.display(), error = %e, "cannot list device directory");
            return Vec::new();
        }
    };

    let mut drives: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(|name| DEFAULT_DEVICE.is_match(name))
        })
        .map(|entry| entry.path())
        .collect();
    drives.sort();
    drives
}
