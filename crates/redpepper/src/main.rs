mod app;
mod config;
mod events;
mod jj;
mod keymap;
mod script;
mod sequence;
mod test_utils;
mod ui;

use std::fs::{self, File};
use std::io;
use std::path::PathBuf;

use clap::Parser;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

#[derive(Parser)]
#[command(name = "redpepper", about = "Terminal UI for the jj version control system")]
struct Args {
    /// Initial revset (overrides the configured default)
    #[arg(long)]
    revset: Option<String>,
    /// Auto refresh period in seconds (0 disables)
    #[arg(long)]
    period: Option<u64>,
    /// Alternative config file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Script to run at startup
    #[arg(long)]
    script: Option<PathBuf>,
}

fn log_path() -> Option<PathBuf> {
    let state = dirs::state_dir().or_else(dirs::cache_dir)?;
    let dir = state.join("redpepper");
    fs::create_dir_all(&dir).ok()?;
    Some(dir.join("redpepper.log"))
}

fn main() -> io::Result<()> {
    let args = Args::parse();

    // File logger; a TUI must never log to stdout.
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    if let Some(path) = log_path() {
        if let Ok(log_file) = File::create(path) {
            let _ = WriteLogger::init(LevelFilter::Info, log_config, log_file);
        }
    }

    let cwd = std::env::current_dir()?;
    let Some(root) = jj::resolve_repo_root(&cwd) else {
        eprintln!("redpepper: not inside a jj repository");
        std::process::exit(2);
    };

    let mut config = config::load_config(Some(&root), args.config.as_deref());
    if let Some(revset) = args.revset {
        config.revisions.revset = revset;
    }
    if let Some(period) = args.period {
        config.ui.auto_refresh_interval = period;
    }
    let script = match args.script {
        Some(path) => Some(fs::read_to_string(path)?),
        None => None,
    };

    log::info!("redpepper starting in {}", root.display());
    let location = root.display().to_string();
    app::run(app::CliContext {
        config,
        cwd: root,
        location,
        script,
    })
}
