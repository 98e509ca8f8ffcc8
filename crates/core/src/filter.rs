//! Query filters: from the request collected by the front-end to a typed
//! predicate list the store turns into SQL.
//!
//! Nothing here touches the store. Conflicting options are rejected before
//! any predicate is produced.

use std::path::{Component, Path, PathBuf};

use regex::Regex;

use crate::session::SessionId;

/// Commands starting with this are the tool's own queries.
pub const SELF_INVOCATION: &str = "recent";

pub const DEFAULT_LIMIT: u32 = 20;

/// Longest command (in characters) returned unless overridden.
pub const DEFAULT_CHAR_LIMIT: usize = 400;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum FilterError {
    #[error("only one of --re and --sql should be set")]
    ConflictingPatternModes,
    #[error("only one of {} can be set", .0.join(", "))]
    ConflictingStatusFilters(Vec<&'static str>),
    #[error("invalid regular expression {pattern:?}: {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("invalid env filter {0:?}: expected key or key:value")]
    InvalidEnvFilter(String),
}

/// Filter criteria as collected from the command line.
#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub pattern: String,
    /// Treat `pattern` as a regular expression.
    pub regex: bool,
    /// Treat `pattern` as a SQL boolean expression, used verbatim.
    pub raw_predicate: bool,
    pub successes_only: bool,
    pub failures_only: bool,
    pub status: Option<i64>,
    pub workdir: Option<String>,
    pub date: Option<String>,
    /// `key` or `key:value`, all must hold.
    pub env: Vec<String>,
    pub session: Option<SessionId>,
    pub return_self: bool,
    pub limit: u32,
    pub char_limit: usize,
    pub case_insensitive: bool,
    pub dedup: bool,
}

impl Default for QueryRequest {
    fn default() -> Self {
        Self {
            pattern: String::new(),
            regex: false,
            raw_predicate: false,
            successes_only: false,
            failures_only: false,
            status: None,
            workdir: None,
            date: None,
            env: Vec::new(),
            session: None,
            return_self: false,
            limit: DEFAULT_LIMIT,
            char_limit: DEFAULT_CHAR_LIMIT,
            case_insensitive: false,
            dedup: false,
        }
    }
}

/// Where relative and `~` paths in a request are resolved from.
#[derive(Debug, Clone)]
pub struct FilterContext {
    pub cwd: PathBuf,
    pub home: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternMode {
    Substring,
    Regex,
    Raw,
}

/// Date filter at the precision the user typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateFilter {
    /// `YYYY`
    Year(String),
    /// `YYYY-MM`
    Month(String),
    /// `YYYY-MM-DD`
    Day(String),
    /// Anything else, compared to the full stored timestamp.
    Exact(String),
}

impl DateFilter {
    pub fn parse(raw: &str) -> Self {
        let shape: String = raw
            .chars()
            .map(|c| if c.is_ascii_digit() { 'd' } else { c })
            .collect();
        match shape.as_str() {
            "dddd" => Self::Year(raw.to_string()),
            "dddd-dd" => Self::Month(raw.to_string()),
            "dddd-dd-dd" => Self::Day(raw.to_string()),
            _ => Self::Exact(raw.to_string()),
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Self::Year(v) | Self::Month(v) | Self::Day(v) | Self::Exact(v) => v,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvFilter {
    Present(String),
    Equals(String, String),
}

impl EnvFilter {
    pub fn parse(raw: &str) -> Result<Self, FilterError> {
        let filter = match raw.split_once(':') {
            Some((key, value)) => Self::Equals(key.to_string(), value.to_string()),
            None => Self::Present(raw.to_string()),
        };
        if filter.key().is_empty() {
            return Err(FilterError::InvalidEnvFilter(raw.to_string()));
        }
        Ok(filter)
    }

    pub fn key(&self) -> &str {
        match self {
            Self::Present(k) | Self::Equals(k, _) => k,
        }
    }

    /// JSON path of the variable inside `json_data`.
    pub fn json_path(&self) -> String {
        let escaped = self.key().replace('\\', "\\\\").replace('"', "\\\"");
        format!("$.env.\"{escaped}\"")
    }
}

/// One condition on the commands table. All predicates are ANDed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    StatusEquals(i64),
    StatusNotEquals(i64),
    /// Command does not start with the literal prefix.
    NotPrefixed(String),
    /// SQL LIKE pattern, `%` and `_` are live wildcards.
    CommandLike(String),
    CommandRegex(String),
    /// Caller-supplied SQL expression.
    Raw(String),
    WorkingDirectory(String),
    Date(DateFilter),
    Env(EnvFilter),
    Session(String),
    /// `length(command) <= n`
    MaxLength(usize),
}

/// A validated query, ready for the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledQuery {
    pub predicates: Vec<Predicate>,
    /// Number of most recent matches to fetch.
    pub limit: u32,
    pub case_sensitive: bool,
    pub dedup: bool,
}

impl QueryRequest {
    pub fn pattern_mode(&self) -> Result<PatternMode, FilterError> {
        match (self.regex, self.raw_predicate) {
            (true, true) => Err(FilterError::ConflictingPatternModes),
            (true, false) => Ok(PatternMode::Regex),
            (false, true) => Ok(PatternMode::Raw),
            (false, false) => Ok(PatternMode::Substring),
        }
    }

    fn status_predicate(&self) -> Result<Option<Predicate>, FilterError> {
        let active: Vec<(&'static str, Predicate)> = [
            (self.successes_only, "--successes-only", Predicate::StatusEquals(0)),
            (self.failures_only, "--failures-only", Predicate::StatusNotEquals(0)),
            (
                self.status.is_some(),
                "--status-num",
                Predicate::StatusEquals(self.status.unwrap_or_default()),
            ),
        ]
        .into_iter()
        .filter(|(on, _, _)| *on)
        .map(|(_, name, pred)| (name, pred))
        .collect();

        if active.len() > 1 {
            return Err(FilterError::ConflictingStatusFilters(
                active.iter().map(|(name, _)| *name).collect(),
            ));
        }
        Ok(active.into_iter().next().map(|(_, pred)| pred))
    }

    /// Validate the request and produce its predicates.
    pub fn compile(&self, ctx: &FilterContext) -> Result<CompiledQuery, FilterError> {
        let mode = self.pattern_mode()?;
        let mut predicates = Vec::new();

        if let Some(status) = self.status_predicate()? {
            predicates.push(status);
        }

        if !self.return_self {
            predicates.push(Predicate::NotPrefixed(SELF_INVOCATION.to_string()));
        }

        if !self.pattern.is_empty() {
            predicates.push(match mode {
                PatternMode::Substring => Predicate::CommandLike(format!("%{}%", self.pattern)),
                PatternMode::Regex => {
                    let pattern = if self.case_insensitive {
                        format!("(?i){}", self.pattern)
                    } else {
                        self.pattern.clone()
                    };
                    Regex::new(&pattern).map_err(|source| FilterError::InvalidRegex {
                        pattern: self.pattern.clone(),
                        source,
                    })?;
                    Predicate::CommandRegex(pattern)
                }
                PatternMode::Raw => Predicate::Raw(self.pattern.clone()),
            });
        }

        if let Some(dir) = self.workdir.as_deref().filter(|d| !d.is_empty()) {
            predicates.push(Predicate::WorkingDirectory(normalize_workdir(dir, ctx)));
        }

        if let Some(date) = self.date.as_deref().filter(|d| !d.is_empty()) {
            predicates.push(Predicate::Date(DateFilter::parse(date)));
        }

        for raw in &self.env {
            predicates.push(Predicate::Env(EnvFilter::parse(raw)?));
        }

        if let Some(session) = &self.session {
            predicates.push(Predicate::Session(session.to_string()));
        }

        predicates.push(Predicate::MaxLength(self.char_limit));

        Ok(CompiledQuery {
            predicates,
            limit: self.limit,
            case_sensitive: !self.case_insensitive,
            dedup: self.dedup,
        })
    }
}

/// Absolute, lexically normalized form of a user-supplied directory.
///
/// `~` expands against `ctx.home`, relative paths resolve against `ctx.cwd`,
/// and `.`/`..` segments are folded without touching the filesystem.
pub fn normalize_workdir(raw: &str, ctx: &FilterContext) -> String {
    let expanded = shellexpand::tilde_with_context(raw, || {
        ctx.home
            .as_ref()
            .map(|home| home.to_string_lossy().into_owned())
    });
    let path = Path::new(expanded.as_ref());
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        ctx.cwd.join(path)
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized.to_string_lossy().into_owned()
}
