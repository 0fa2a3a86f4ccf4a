use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use smart_raw::{plugin, Settings, Smartctl, StateFile};

/// Environment variable selecting the log filter (logs go to stderr).
const LOG_ENV: &str = "SMART_RAW_LOG";

#[derive(Parser, Debug)]
#[command(name = "smart_raw", version)]
#[command(about = "Munin plugin reporting raw S.M.A.R.T. attribute values")]
struct Args {
    /// Plugin cycle requested by munin-node; omit to fetch values
    #[arg(value_enum)]
    mode: Option<Mode>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    /// Print graph and label configuration
    Config,
    /// Report whether smartctl is usable on this host
    Autoconf,
}

fn main() -> Result<ExitCode> {
    init_logging();

    let args = Args::parse();
    let settings = Settings::from_env()?;
    let smartctl = Smartctl::new(&settings.executable);
    let state = StateFile::new(&settings.statefile);

    match args.mode {
        None => {
            let response = plugin::fetch(&settings, &smartctl, &state)?;
            emit(&response)?;
        }
        Some(Mode::Config) => emit(&plugin::config(&settings, &state))?,
        Some(Mode::Autoconf) => {
            let answer = plugin::autoconf(&smartctl);
            emit(&format!("{answer}\n"))?;
            if !answer.is_yes() {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Log to stderr; stdout carries the munin protocol.
fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn emit(response: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(response.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
