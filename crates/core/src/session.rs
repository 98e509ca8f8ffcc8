//! Session identity for a running shell.
//!
//! A session id is a hash over terminal and multiplexer signals plus the
//! shell pid. Shells that share every signal collapse into one session; a
//! nested shell usually differs through `SHLVL`.

use sha2::{Digest, Sha256};
use std::fmt;

/// Environment signals that distinguish one shell from another.
///
/// Built explicitly from a variable lookup so callers decide where the
/// values come from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    /// `TERM_SESSION_ID` (macOS Terminal).
    pub term_session_id: String,
    /// `WINDOWID` (xterm and friends).
    pub window_id: String,
    /// `SHLVL`
    pub shell_level: String,
    /// `TMUX`
    pub tmux: String,
    /// `TMUX_PANE`
    pub tmux_pane: String,
    /// `STY` (GNU screen).
    pub screen_session: String,
    pub term: String,
    pub user: String,
    pub hostname: String,
}

impl SessionContext {
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).unwrap_or_default();
        Self {
            term_session_id: get("TERM_SESSION_ID"),
            window_id: get("WINDOWID"),
            shell_level: get("SHLVL"),
            tmux: get("TMUX"),
            tmux_pane: get("TMUX_PANE"),
            screen_session: get("STY"),
            term: get("TERM"),
            user: get("USER"),
            hostname: get("HOSTNAME"),
        }
    }

    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    /// Derive the session id for the shell with the given pid.
    ///
    /// `term`, `user` and `hostname` are descriptive only and do not take
    /// part in the hash.
    pub fn session_id(&self, pid: i64) -> SessionId {
        let seed = format!(
            "{}-{}-{}-{}-{}-{}-{}",
            self.term_session_id,
            self.window_id,
            self.shell_level,
            self.tmux,
            self.tmux_pane,
            self.screen_session,
            pid,
        );
        SessionId(hex::encode(Sha256::digest(seed.as_bytes())))
    }
}

/// Opaque, fixed-length session identifier (64 hex chars).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// What happened to the session row for one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// First event from this shell; the row was inserted.
    Created,
    /// Existing row, new sequence number.
    Advanced,
    /// Existing row already at this sequence number. The prompt hook fired
    /// again for a command that was already logged.
    Duplicate,
}

impl SessionOutcome {
    /// Decide the outcome once the insert has hit an existing row.
    pub fn for_existing(stored_sequence: Option<i64>, sequence: i64) -> Self {
        if stored_sequence == Some(sequence) {
            Self::Duplicate
        } else {
            Self::Advanced
        }
    }

    pub fn is_duplicate(self) -> bool {
        self == Self::Duplicate
    }
}

/// Result of resolving one event against the session table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionResolution {
    pub session_id: SessionId,
    pub outcome: SessionOutcome,
}

impl SessionResolution {
    pub fn is_duplicate(&self) -> bool {
        self.outcome.is_duplicate()
    }
}
