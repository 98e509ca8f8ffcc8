//! Rendering of query results.

use anyhow::{Result, bail};
use recent_core::CommandRecord;
use recent_core::history::RENDERED_TIME_MARKER;

const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[91m";
const BOLD_BLUE: &str = "\x1b[1m\x1b[94m";
const RESET: &str = "\x1b[0m";

const RECORD_SEPARATOR: &str = "---------------------------------";

/// Where the timestamp goes on a plain result line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeDisplay {
    /// `<command> # rtime@ <timestamp>`
    Suffix,
    /// `<timestamp> <command>`
    Prefix,
    Hidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Style {
    pub color: bool,
}

impl Style {
    /// Colors on unless `NO_COLOR` is set.
    pub fn from_env() -> Self {
        Self {
            color: std::env::var_os("NO_COLOR").is_none(),
        }
    }

    fn code(self, code: &'static str) -> &'static str {
        if self.color { code } else { "" }
    }
}

pub fn render_line(record: &CommandRecord, time: TimeDisplay, style: Style) -> String {
    let command = if record.is_failure() && style.color {
        format!("{RED}{}{RESET}", record.command)
    } else {
        record.command.clone()
    };
    let ts = record.command_dt_text();
    let (yellow, reset) = (style.code(YELLOW), style.code(RESET));
    match time {
        TimeDisplay::Hidden => command,
        TimeDisplay::Suffix => format!("{command} {RENDERED_TIME_MARKER} {yellow}{ts}{reset}"),
        TimeDisplay::Prefix => format!("{yellow}{ts} {reset}{command}"),
    }
}

/// Columns selectable with `--detail --columns`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    CommandDt,
    Command,
    Pid,
    ReturnVal,
    Pwd,
    Session,
    JsonData,
}

impl Column {
    pub const ALL: [Column; 7] = [
        Column::CommandDt,
        Column::Command,
        Column::Pid,
        Column::ReturnVal,
        Column::Pwd,
        Column::Session,
        Column::JsonData,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Column::CommandDt => "command_dt",
            Column::Command => "command",
            Column::Pid => "pid",
            Column::ReturnVal => "return_val",
            Column::Pwd => "pwd",
            Column::Session => "session",
            Column::JsonData => "json_data",
        }
    }

    fn value(self, record: &CommandRecord) -> String {
        match self {
            Column::CommandDt => record.command_dt_text(),
            Column::Command => record.command.clone(),
            Column::Pid => record.pid.to_string(),
            Column::ReturnVal => record.return_val.to_string(),
            Column::Pwd => record.pwd.clone(),
            Column::Session => record.session.clone(),
            Column::JsonData => record.json_data().unwrap_or_default(),
        }
    }

    /// Parse a comma separated selection. `command_dt` and `command` are
    /// always included; the result is in table order.
    pub fn parse_list(raw: &str) -> Result<Vec<Column>> {
        let mut selected = vec![Column::CommandDt, Column::Command];
        for name in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let Some(column) = Column::ALL.into_iter().find(|c| c.name() == name) else {
                let valid: Vec<&str> = Column::ALL.iter().map(|c| c.name()).collect();
                bail!("unknown column {name:?}, valid columns are {}", valid.join(","));
            };
            if !selected.contains(&column) {
                selected.push(column);
            }
        }
        Ok(Column::ALL
            .into_iter()
            .filter(|c| selected.contains(c))
            .collect())
    }
}

/// Column-aligned table with a header and a dashed rule.
pub fn render_table(records: &[CommandRecord], columns: &[Column]) -> String {
    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|r| columns.iter().map(|c| c.value(r)).collect())
        .collect();
    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            rows.iter()
                .map(|row| row[i].chars().count())
                .fold(c.name().len(), usize::max)
        })
        .collect();

    let line = |cells: Vec<String>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| format!("{cell:<w$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = Vec::with_capacity(rows.len() + 2);
    out.push(line(columns.iter().map(|c| c.name().to_string()).collect()));
    out.push(line(widths.iter().map(|w| "-".repeat(*w)).collect()));
    out.extend(rows.into_iter().map(line));
    out.join("\n")
}

/// One `key: value` block per record, used when `json_data` is selected.
pub fn render_blocks(records: &[CommandRecord], columns: &[Column], style: Style) -> String {
    let (key_style, reset) = (style.code(BOLD_BLUE), style.code(RESET));
    let mut out = String::new();
    for record in records {
        for column in columns {
            out.push_str(&format!(
                "{key_style}{}{reset}: {}\n",
                column.name(),
                column.value(record)
            ));
        }
        out.push_str(RECORD_SEPARATOR);
        out.push('\n');
    }
    out
}
