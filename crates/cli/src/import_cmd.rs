//! `recent-import-bash-history`: one-time import of an existing bash history file.

use std::fs::OpenOptions;
use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::Parser;
use recent_core::backfill::{self, SyntheticSession};
use recent_local_db::LocalDb;
use tracing::info;

#[derive(Debug, Parser)]
#[command(
    name = "recent-import-bash-history",
    about = "recent-import-bash-history imports bash_history into the recent database. \
             Run `recent -h` for info about recent command."
)]
pub struct ImportArgs {
    /// Force import bash history ignoring previous imports
    #[arg(short = 'f')]
    pub force: bool,
}

pub fn run(args: ImportArgs) -> Result<()> {
    let config = crate::load_config()?;
    let home = recent_paths::home_dir()?;
    let marker = config.import_marker(&home);
    let db_path = config.db_path(&home);

    if !args.force && marker.exists() {
        bail!(
            "bash history already imported into {} (marker {}). \
             Run the command with -f option if you are absolutely sure.",
            db_path.display(),
            marker.display()
        );
    }

    let histfile = config.histfile(&home);
    let imported = if histfile.exists() {
        let raw = std::fs::read(&histfile)
            .with_context(|| format!("read history file {}", histfile.display()))?;
        let entries = backfill::reconstruct(&String::from_utf8_lossy(&raw));
        let synthetic = SyntheticSession::random().context("pick import session id")?;
        let mut db = LocalDb::open_path(&db_path)?;
        db.import_history(&entries, synthetic, &crate::session_context(), Utc::now())?
    } else {
        info!(path = %histfile.display(), "no history file, nothing to import");
        0
    };

    touch(&marker)?;
    println!("Imported {imported} commands from {}", histfile.display());
    Ok(())
}

fn touch(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create dir for {}", path.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("write import marker {}", path.display()))?;
    Ok(())
}
