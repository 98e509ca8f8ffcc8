//! Shared plumbing for the `recent`, `log-recent` and
//! `recent-import-bash-history` binaries.

pub mod import_cmd;
pub mod log_cmd;
pub mod logging;
pub mod output;
pub mod prompt;
pub mod query_cmd;

use anyhow::Result;
use recent_core::SessionContext;
use recent_runtime_config::RecentConfig;

pub fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// `recent.toml` (when present) overlaid with the process environment.
pub fn load_config() -> Result<RecentConfig> {
    let path = recent_paths::config_path().ok();
    Ok(RecentConfig::load(path.as_deref(), env_lookup)?)
}

/// Session signals of the calling shell, read from the process environment.
pub fn session_context() -> SessionContext {
    let ctx = SessionContext::from_lookup(env_lookup);
    if !ctx.hostname.is_empty() {
        return ctx;
    }
    match hostname() {
        Some(host) => ctx.with_hostname(host),
        None => ctx,
    }
}

#[cfg(unix)]
fn hostname() -> Option<String> {
    let mut buf = [0u8; 256];
    // SAFETY: the buffer is valid for `buf.len()` bytes and gethostname never
    // writes past the length it is given.
    let rc = unsafe { libc::gethostname(buf.as_mut_ptr().cast(), buf.len()) };
    if rc != 0 {
        return None;
    }
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    Some(String::from_utf8_lossy(&buf[..end]).into_owned())
}

#[cfg(not(unix))]
fn hostname() -> Option<String> {
    std::env::var("COMPUTERNAME").ok()
}
