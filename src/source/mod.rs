//! Attribute sources.
//!
//! The plugin asks an [`AttributeSource`] for the attribute table of each
//! configured device. In production that is [`Smartctl`]; tests substitute
//! canned reports.

mod smartctl;
mod table;

pub use smartctl::Smartctl;
pub use table::{AttributeTable, SmartAttribute};

use std::fmt::Debug;
use std::path::Path;

/// Provides S.M.A.R.T. attribute tables for devices.
pub trait AttributeSource: Debug {
    /// Read the attribute table of one device.
    ///
    /// Failures are not reported: a device that cannot be queried returns an
    /// empty table, the same as a device without attributes.
    fn scan(&self, device: &Path) -> AttributeTable;

    /// Returns a human-readable description of the source.
    fn description(&self) -> &str;
}
