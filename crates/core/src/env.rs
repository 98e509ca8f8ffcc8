//! Selection of environment variables captured with each live record.

use std::ffi::OsString;

use glob::{MatchOptions, Pattern};
use tracing::warn;

use crate::record::EnvSnapshot;

/// Variables with this prefix are always captured.
pub const CAPTURE_PREFIX: &str = "RECENT_";

const CASE_SENSITIVE: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Allow-list of glob patterns (e.g. `CONDA_*`) on top of [`CAPTURE_PREFIX`].
#[derive(Debug, Clone, Default)]
pub struct EnvCapture {
    patterns: Vec<Pattern>,
}

impl EnvCapture {
    pub fn new<I, S>(globs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = globs
            .into_iter()
            .filter_map(|raw| {
                let raw = raw.as_ref().trim();
                if raw.is_empty() {
                    return None;
                }
                match Pattern::new(raw) {
                    Ok(p) => Some(p),
                    Err(e) => {
                        warn!(pattern = raw, error = %e, "invalid env var glob, matching literally");
                        Pattern::new(&Pattern::escape(raw)).ok()
                    }
                }
            })
            .collect();
        Self { patterns }
    }

    /// Parse a comma separated allow-list such as `RECENT_ENV_VARS`.
    pub fn from_list(list: &str) -> Self {
        Self::new(list.split(','))
    }

    pub fn is_captured(&self, name: &str) -> bool {
        name.starts_with(CAPTURE_PREFIX)
            || self
                .patterns
                .iter()
                .any(|p| p.matches_with(name, CASE_SENSITIVE))
    }

    pub fn capture<I, K, V>(&self, vars: I) -> EnvSnapshot
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        vars.into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(k, _)| self.is_captured(k))
            .collect()
    }

    /// [`Self::capture`] over `std::env::vars_os()`. Names that are not UTF-8
    /// are skipped and values are converted lossily.
    pub fn capture_os<I>(&self, vars: I) -> EnvSnapshot
    where
        I: IntoIterator<Item = (OsString, OsString)>,
    {
        vars.into_iter()
            .filter_map(|(k, v)| {
                let k = k.into_string().ok()?;
                self.is_captured(&k)
                    .then(|| (k, v.to_string_lossy().into_owned()))
            })
            .collect()
    }
}
