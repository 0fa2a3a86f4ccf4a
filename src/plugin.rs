//! The munin plugin cycles.
//!
//! munin-node runs the plugin without arguments to collect values, with
//! `config` to learn how to graph them and with `autoconf` to decide whether
//! the plugin applies to this host. Each cycle returns the exact text to
//! print; field names are `smart_raw_{id}_{device}` in both fetch and config
//! output so the node can pair labels with values.

use std::fmt;
use std::path::Path;

use tracing::debug;

use crate::error::Result;
use crate::settings::Settings;
use crate::source::{AttributeSource, Smartctl};
use crate::state::StateFile;

/// Graph header printed first in config output.
pub const HEADER_CONFIG: &str = "\
graph_title S.M.A.R.T. Raw Values
graph_category disk
graph_args --lower-limit 0 --base 1000
";

/// Label used for attribute ids with no recorded name.
pub const UNKNOWN_NAME: &str = "Unknown";

/// Field name shared by the `.label`, `.min` and `.value` lines.
pub fn field_name(id: &str, device: &str) -> String {
    format!("smart_raw_{id}_{device}")
}

/// Last path component of a device, e.g. `sda` for `/dev/sda`.
fn device_name(device: &Path) -> String {
    device
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| device.display().to_string())
}

/// Collect raw values for every configured device and attribute.
///
/// Attributes a device does not report are left out. Every name a device
/// reports, monitored or not, is merged into the state file so that later
/// config runs can label it.
pub fn fetch(
    settings: &Settings,
    source: &dyn AttributeSource,
    state: &StateFile,
) -> Result<String> {
    let mut response = String::new();

    for drive in &settings.drives {
        let table = source.scan(drive);
        let device = device_name(drive);
        debug!(
            source = source.description(),
            device = %device,
            attributes = table.len(),
            "scanned device"
        );

        for param in &settings.params {
            match table.get(param) {
                Some(attribute) => {
                    response.push_str(&format!(
                        "{}.value {}\n",
                        field_name(&attribute.id, &device),
                        attribute.raw
                    ));
                }
                None => debug!(device = %device, id = %param, "attribute not reported"),
            }
        }

        state.merge(table.names())?;
    }

    Ok(response)
}

/// Graph configuration, labelled with the names stored by earlier fetches.
pub fn config(settings: &Settings, state: &StateFile) -> String {
    let known_names = state.read();
    let mut response = String::from(HEADER_CONFIG);

    for drive in &settings.drives {
        let device = device_name(drive);
        for param in &settings.params {
            let field = field_name(param, &device);
            let name = known_names.get(param).unwrap_or(UNKNOWN_NAME);
            response.push_str(&format!("{field}.label {device}: {name}\n"));
            response.push_str(&format!("{field}.min 0\n"));
        }
    }

    response
}

/// Answer to `autoconf`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Autoconf {
    Yes,
    No(&'static str),
}

impl Autoconf {
    pub fn is_yes(&self) -> bool {
        matches!(self, Autoconf::Yes)
    }
}

impl fmt::Display for Autoconf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Autoconf::Yes => f.write_str("yes"),
            Autoconf::No(reason) => write!(f, "no ({reason})"),
        }
    }
}

/// Check that `smartctl` exists and is executable, without running it.
pub fn autoconf(smartctl: &Smartctl) -> Autoconf {
    if smartctl.is_available() {
        Autoconf::Yes
    } else {
        Autoconf::No("smartctl not found or not executable")
    }
}
