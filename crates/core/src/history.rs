//! Parsing of the `history 1` line handed over by the prompt hook.

use std::sync::LazyLock;

use regex::Regex;

/// Hook line users are told to install when parsing fails.
pub const EXPECTED_PROMPT: &str = r#"log-recent -r $? -c "$(HISTTIMEFORMAT= history 1)" -p $$"#;

/// Marker the query renderer puts in front of each displayed timestamp.
pub const RENDERED_TIME_MARKER: &str = "# rtime@";

// `  123  some command` (the command may span lines).
static HISTORY_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\A\s*(\d+)\s+(.*)\z").unwrap());

// ` # rtime@ 2020-07-20 21:52:33` at the very end, optionally still wrapped in
// the color escape the renderer emits. Exactly one space before `#`.
static RENDERED_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?s)\A(.*\S) # rtime@ (?:\x1b\[[0-9;]*m)?\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}(?:\x1b\[[0-9;]*m)?\z",
    )
    .unwrap()
});

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum HistoryParseError {
    #[error("history line has no leading sequence number: {0:?}")]
    MissingSequence(String),
    #[error("history line has a sequence number but no command")]
    MissingCommand,
    #[error("sequence number out of range: {0}")]
    SequenceOutOfRange(String),
}

/// One parsed `history 1` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryLine {
    pub sequence: i64,
    pub command: String,
}

pub fn parse_history_line(raw: &str) -> Result<HistoryLine, HistoryParseError> {
    let caps = HISTORY_LINE_RE
        .captures(raw)
        .ok_or_else(|| HistoryParseError::MissingSequence(raw.to_string()))?;
    let digits = &caps[1];
    let sequence = digits
        .parse::<i64>()
        .map_err(|_| HistoryParseError::SequenceOutOfRange(digits.to_string()))?;
    let command = &caps[2];
    if command.is_empty() {
        return Err(HistoryParseError::MissingCommand);
    }
    Ok(HistoryLine {
        sequence,
        command: command.to_string(),
    })
}

/// Drop a trailing ` # rtime@ <timestamp>` that came from pasting a line of
/// `recent` output back into the shell.
///
/// Only an exact suffix is removed: extra whitespace before the marker or
/// after the timestamp leaves the command untouched.
pub fn strip_rendered_suffix(command: &str) -> &str {
    match RENDERED_SUFFIX_RE.captures(command) {
        Some(caps) => caps.get(1).map_or(command, |m| m.as_str()),
        None => command,
    }
}
