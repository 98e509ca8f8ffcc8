//! The command record and its stored text forms.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Storage format for `command_dt` (UTC, second precision).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Captured environment, keyed by variable name.
pub type EnvSnapshot = BTreeMap<String, String>;

/// One executed shell command as read back from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRecord {
    pub command_dt: DateTime<Utc>,
    pub command: String,
    pub pid: i64,
    pub return_val: i64,
    pub pwd: String,
    pub session: String,
    pub env: Option<EnvSnapshot>,
}

impl CommandRecord {
    pub fn is_failure(&self) -> bool {
        self.return_val != 0
    }

    pub fn command_dt_text(&self) -> String {
        format_timestamp(&self.command_dt)
    }

    /// Raw `json_data` text, the form stored in the commands table.
    pub fn json_data(&self) -> Option<String> {
        self.env.as_ref().map(env_to_json)
    }
}

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Unix seconds to a UTC timestamp. Out-of-range values clamp to the epoch.
pub fn timestamp_from_unix(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

#[derive(Serialize, Deserialize)]
struct JsonData {
    env: EnvSnapshot,
}

pub fn env_to_json(env: &EnvSnapshot) -> String {
    serde_json::json!({ "env": env }).to_string()
}

/// Parse stored `json_data`. Unknown shapes read as no snapshot.
pub fn env_from_json(raw: &str) -> Option<EnvSnapshot> {
    serde_json::from_str::<JsonData>(raw).ok().map(|d| d.env)
}
