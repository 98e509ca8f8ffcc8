//! `recent`: query the command history.

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use recent_core::{FilterContext, QueryRequest};
use recent_local_db::LocalDb;
use tracing::debug;

use crate::output::{self, Column, Style, TimeDisplay};
use crate::prompt::{self, PromptCheck};

const DEFAULT_COLUMNS: &str = "command_dt,command,json_data";

#[derive(Debug, Parser)]
#[command(
    name = "recent",
    about = "recent is a convenient way to query bash history",
    after_help = "To import bash history into recent db run recent-import-bash-history"
)]
pub struct QueryArgs {
    /// Optional pattern to search (SQL LIKE wildcards `%` and `_` apply)
    #[arg(default_value = "")]
    pub pattern: String,

    /// Max results to return
    #[arg(short = 'n', value_name = "20")]
    pub limit: Option<u32>,

    /// Exit status of the commands to return
    #[arg(long, visible_alias = "stn", alias = "status_num", allow_negative_numbers = true)]
    pub status_num: Option<i64>,

    /// Only return commands that exited with success
    #[arg(long, visible_alias = "so", alias = "successes_only")]
    pub successes_only: bool,

    /// Only return commands that exited with failure
    #[arg(long, visible_alias = "fo", alias = "failures_only")]
    pub failures_only: bool,

    /// Working directory
    #[arg(short = 'w', value_name = "/folder")]
    pub workdir: Option<String>,

    /// Date in YYYY-MM-DD, YYYY-MM, or YYYY format
    #[arg(short = 'd', value_name = "2016-10-01")]
    pub date: Option<String>,

    /// Return `recent` commands also in the output
    #[arg(long, alias = "return_self")]
    pub return_self: bool,

    /// Ignore commands longer than this
    #[arg(long, visible_alias = "cl", alias = "char_limit", value_name = "400")]
    pub char_limit: Option<usize>,

    /// Filter by captured env vars (repeatable). Vars listed in RECENT_ENV_VARS
    /// and all RECENT_* vars are captured.
    #[arg(short = 'e', long = "env", value_name = "key[:val]")]
    pub env: Vec<String>,

    /// Treat the pattern as a regular expression
    #[arg(long = "re")]
    pub regex: bool,

    /// Treat the pattern as an sqlite boolean expression
    #[arg(long = "sql")]
    pub sql: bool,

    /// Ignore case when searching for patterns
    #[arg(long, visible_alias = "nc")]
    pub nocase: bool,

    /// Keep only the latest occurrence of each command
    #[arg(long)]
    pub dedup: bool,

    /// Only return commands from the current shell session
    #[arg(long, alias = "cur_session_only")]
    pub cur_session_only: bool,

    /// Don't display time in command output
    #[arg(long, visible_alias = "ht", alias = "hide_time")]
    pub hide_time: bool,

    /// Display time before the command
    #[arg(long, alias = "time_first")]
    pub time_first: bool,

    /// Return detailed output
    #[arg(long)]
    pub detail: bool,

    /// Comma separated columns to print with --detail. Valid columns are
    /// command_dt,command,pid,return_val,pwd,session,json_data
    #[arg(long, default_value = DEFAULT_COLUMNS)]
    pub columns: String,

    /// Print the table schema and the SQL that reproduces the output
    #[arg(long)]
    pub debug: bool,
}

impl QueryArgs {
    fn time_display(&self) -> TimeDisplay {
        if self.hide_time {
            TimeDisplay::Hidden
        } else if self.time_first {
            TimeDisplay::Prefix
        } else {
            TimeDisplay::Suffix
        }
    }
}

pub fn run(args: QueryArgs) -> Result<()> {
    let config = crate::load_config()?;

    match prompt::check(
        config.capture.custom_prompt,
        std::env::var("PROMPT_COMMAND").ok().as_deref(),
    ) {
        PromptCheck::Installed => {}
        PromptCheck::Skipped => {
            if args.debug {
                println!("RECENT_CUSTOM_PROMPT is set. Not checking prompt");
            }
        }
        PromptCheck::Missing => {
            return Err(anyhow!(
                "PROMPT_COMMAND does not run log-recent. \
                 Add the following line to .bashrc or .bash_profile:\n{}",
                prompt::hook_line()
            ));
        }
    }

    let columns = Column::parse_list(&args.columns)?;
    let home = recent_paths::home_dir()?;
    let cwd = std::env::current_dir().context("read current directory")?;

    let session = args
        .cur_session_only
        .then(|| crate::session_context().session_id(i64::from(parent_pid())));

    let request = QueryRequest {
        pattern: args.pattern.clone(),
        regex: args.regex,
        raw_predicate: args.sql,
        successes_only: args.successes_only,
        failures_only: args.failures_only,
        status: args.status_num,
        workdir: args.workdir.clone(),
        date: args.date.clone(),
        env: args.env.clone(),
        session,
        return_self: args.return_self,
        limit: args.limit.unwrap_or(config.query.limit),
        char_limit: args.char_limit.unwrap_or(config.query.char_limit),
        case_insensitive: args.nocase,
        dedup: args.dedup,
    };
    let compiled = request.compile(&FilterContext {
        cwd,
        home: Some(home.clone()),
    })?;
    debug!(?compiled, "compiled query");

    let db_path = config.db_path(&home);
    let db = LocalDb::open_path(&db_path)?;
    let records = db.query(&compiled)?;

    let style = Style::from_env();
    if args.detail {
        if columns.contains(&Column::JsonData) {
            print!("{}", output::render_blocks(&records, &columns, style));
        } else {
            println!("{}", output::render_table(&records, &columns));
        }
    } else {
        let time = args.time_display();
        for record in &records {
            println!("{}", output::render_line(record, time, style));
        }
    }

    if args.debug {
        println!("=========DEBUG=========");
        println!("---SCHEMA---");
        println!("{}", db.commands_table_schema()?.unwrap_or_default());
        println!("---QUERIES---");
        println!("To replicate(ish) this output run the following sqlite command");
        println!(
            "sqlite3 {} \"PRAGMA case_sensitive_like = {}; {}\"",
            db_path.display(),
            compiled.case_sensitive,
            LocalDb::debug_sql(&compiled)
        );
    }
    Ok(())
}

// The shell that invoked `recent`.
#[cfg(unix)]
fn parent_pid() -> u32 {
    std::os::unix::process::parent_id()
}

#[cfg(not(unix))]
fn parent_pid() -> u32 {
    0
}
