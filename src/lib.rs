//! # smart-raw
//!
//! A munin plugin reporting raw S.M.A.R.T. attribute values.
//!
//! Each run queries `smartctl` for every configured device, picks the
//! configured attributes out of the vendor attribute table and prints them in
//! munin's plugin protocol. Attribute names are remembered in munin's state
//! file so graph labels stay readable even when a run does not see an
//! attribute.
//!
//! ## Architecture
//!
//! ```text
//!  environment ──▶ settings ──▶ plugin::{fetch, config, autoconf} ──▶ stdout
//!                                   │                   │
//!                                   ▼                   ▼
//!                          source (smartctl)     state (JSON file)
//! ```
//!
//! - **[`settings`]**: [`Settings`] resolved once from the environment
//! - **[`source`]**: the [`AttributeSource`] trait, the [`Smartctl`] runner and
//!   the attribute table parser
//! - **[`state`]**: the [`StateFile`] of known attribute names
//! - **[`plugin`]**: the three munin cycles, returning the text to print
//!
//! ## Usage
//!
//! ```bash
//! # /etc/munin/plugin-conf.d/smart_raw
//! [smart_raw]
//! user root
//! env.smart_raw_drives sda sdb
//! env.smart_raw_params 5 187 188 197 198
//! ```
//!
//! ### As a library
//!
//! ```no_run
//! use smart_raw::{plugin, Settings, Smartctl, StateFile};
//!
//! # fn main() -> Result<(), smart_raw::PluginError> {
//! let settings = Settings::from_env()?;
//! let smartctl = Smartctl::new(&settings.executable);
//! let state = StateFile::new(&settings.statefile);
//!
//! print!("{}", plugin::fetch(&settings, &smartctl, &state)?);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod plugin;
pub mod settings;
pub mod source;
pub mod state;

pub use error::PluginError;
pub use plugin::Autoconf;
pub use settings::Settings;
pub use source::{AttributeSource, AttributeTable, SmartAttribute, Smartctl};
pub use state::{KnownNames, StateFile, StateLoad};
