//! `log-recent`: record one executed command. Runs from `PROMPT_COMMAND`.

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use clap::Parser;
use recent_core::{EnvCapture, LiveEvent};
use recent_local_db::LocalDb;
use tracing::debug;

use crate::prompt;

#[derive(Debug, Parser)]
#[command(name = "log-recent", about = "Log the last shell command into the recent database")]
pub struct LogArgs {
    /// Command return value. Set to $?
    #[arg(
        short = 'r',
        long = "return-value",
        alias = "return_value",
        default_value_t = 0,
        allow_negative_numbers = true
    )]
    pub return_value: i64,

    /// Set to $(HISTTIMEFORMAT= history 1)
    #[arg(short = 'c', long, default_value = "")]
    pub command: String,

    /// Shell pid. Set to $$
    #[arg(short = 'p', long, default_value_t = 0)]
    pub pid: i64,
}

pub fn run(args: LogArgs) -> Result<()> {
    let event = LiveEvent::from_history_line(
        &args.command,
        args.pid,
        args.return_value,
        current_pwd()?,
        Utc::now(),
    )
    .map_err(|e| {
        anyhow!(
            "cannot parse command output ({e}), please check your bash trigger looks like this:\n{}",
            prompt::hook_line()
        )
    })?;

    let config = crate::load_config()?;
    let capture = EnvCapture::new(&config.capture.env_vars);
    let event = event.with_env(capture.capture_os(std::env::vars_os()));

    let home = recent_paths::home_dir()?;
    let mut db = LocalDb::open_path(&config.db_path(&home))?;
    let resolution = db.record_command(&event, &crate::session_context())?;
    debug!(
        session = %resolution.session_id,
        outcome = ?resolution.outcome,
        "logged command"
    );
    Ok(())
}

// `PWD` as the shell sees it (symlinks intact), else the process cwd.
fn current_pwd() -> Result<String> {
    match std::env::var("PWD") {
        Ok(pwd) if !pwd.is_empty() => Ok(pwd),
        _ => Ok(std::env::current_dir()
            .context("read current directory")?
            .to_string_lossy()
            .into_owned()),
    }
}
