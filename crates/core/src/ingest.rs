//! Live events produced by the prompt hook.

use chrono::{DateTime, Utc};

use crate::history::{self, HistoryParseError};
use crate::record::EnvSnapshot;

/// One already-executed command, ready to be logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveEvent {
    pub command: String,
    pub pid: i64,
    pub sequence: i64,
    pub return_val: i64,
    pub pwd: String,
    pub timestamp: DateTime<Utc>,
    pub env: EnvSnapshot,
}

impl LiveEvent {
    /// Build an event from the raw `history 1` output.
    ///
    /// A trailing rendered timestamp (see [`history::strip_rendered_suffix`])
    /// is removed from the command.
    pub fn from_history_line(
        raw_history: &str,
        pid: i64,
        return_val: i64,
        pwd: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, HistoryParseError> {
        let line = history::parse_history_line(raw_history)?;
        let command = history::strip_rendered_suffix(&line.command).to_string();
        Ok(Self {
            command,
            pid,
            sequence: line.sequence,
            return_val,
            pwd: pwd.into(),
            timestamp,
            env: EnvSnapshot::new(),
        })
    }

    pub fn with_env(mut self, env: EnvSnapshot) -> Self {
        self.env = env;
        self
    }
}
