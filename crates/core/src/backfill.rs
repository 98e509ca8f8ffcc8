//! Timestamp reconstruction for an existing bash history file.
//!
//! With `HISTTIMEFORMAT` set, bash writes `#<unix seconds>` marker lines in
//! front of commands. Older files have no markers at all, or only from some
//! point onward:
//!
//! ```text
//! ls /
//! #1571012545
//! echo foo
//! #1571012560
//! #useless comment that should be ignored.
//! cat bar
//! ```
//!
//! Phase one walks forward and tags each command with the last marker seen
//! (`UNKNOWN_TIMESTAMP` before the first one). Phase two walks backward and
//! hands untagged commands the next known timestamp after them.

/// Placeholder for "no marker seen yet".
pub const UNKNOWN_TIMESTAMP: i64 = -1;

/// Working directory stored for imported commands.
pub const IMPORT_PWD: &str = "/unknown";

/// Exit status stored for imported commands.
pub const IMPORT_RETURN_VAL: i64 = -1;

const SYNTHETIC_RANGE: u64 = 10_000_000;

/// One imported command with its (possibly still unknown) unix timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackfillEntry {
    pub timestamp: i64,
    pub command: String,
}

impl BackfillEntry {
    fn new(timestamp: i64, command: impl Into<String>) -> Self {
        Self {
            timestamp,
            command: command.into(),
        }
    }
}

/// A classified history file line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryFileLine<'a> {
    Marker(i64),
    Command(&'a str),
    /// Empty line or a `#` line without an integer payload.
    Ignored,
}

pub fn classify_line(line: &str) -> HistoryFileLine<'_> {
    if line.trim().is_empty() {
        return HistoryFileLine::Ignored;
    }
    if let Some(payload) = line.strip_prefix('#') {
        return match payload.trim().parse::<i64>() {
            Ok(ts) => HistoryFileLine::Marker(ts),
            Err(_) => HistoryFileLine::Ignored,
        };
    }
    HistoryFileLine::Command(line.trim())
}

/// Phase one: forward scan carrying the current marker.
pub fn forward_scan<'a, I>(lines: I) -> Vec<BackfillEntry>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut current = UNKNOWN_TIMESTAMP;
    let mut entries = Vec::new();
    for line in lines {
        match classify_line(line) {
            HistoryFileLine::Marker(ts) => current = ts,
            HistoryFileLine::Command(cmd) => entries.push(BackfillEntry::new(current, cmd)),
            HistoryFileLine::Ignored => {}
        }
    }
    entries
}

/// Phase two: backward fill of unknown timestamps from the next known one.
pub fn backward_fill(entries: &mut [BackfillEntry]) {
    let mut next_known = UNKNOWN_TIMESTAMP;
    for entry in entries.iter_mut().rev() {
        if entry.timestamp == UNKNOWN_TIMESTAMP {
            if next_known != UNKNOWN_TIMESTAMP {
                entry.timestamp = next_known;
            }
        } else {
            next_known = entry.timestamp;
        }
    }
}

/// Both phases over the full text of a history file.
pub fn reconstruct(history: &str) -> Vec<BackfillEntry> {
    let mut entries = forward_scan(history.lines());
    backward_fill(&mut entries);
    entries
}

/// Identity for the session that owns imported records.
///
/// pid and sequence are negative so they can never collide with a real shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntheticSession {
    pub pid: i64,
    pub sequence: i64,
}

impl SyntheticSession {
    pub fn random() -> Result<Self, getrandom::Error> {
        Ok(Self {
            pid: -random_in_range()?,
            sequence: -random_in_range()?,
        })
    }
}

// Uniform enough for collision avoidance in 1..=SYNTHETIC_RANGE.
fn random_in_range() -> Result<i64, getrandom::Error> {
    let mut buf = [0u8; 8];
    getrandom::getrandom(&mut buf)?;
    Ok((u64::from_le_bytes(buf) % SYNTHETIC_RANGE) as i64 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(entries: &[BackfillEntry]) -> Vec<(i64, &str)> {
        entries
            .iter()
            .map(|e| (e.timestamp, e.command.as_str()))
            .collect()
    }

    #[test]
    fn test_markers_apply_to_following_commands() {
        let entries = reconstruct("#100\na\nb\n#200\nc\n");
        assert_eq!(pairs(&entries), [(100, "a"), (100, "b"), (200, "c")]);
    }

    #[test]
    fn test_commands_before_first_marker_take_next_marker() {
        let entries = reconstruct("ls /\n#1571012545\necho foo\n#1571012560\n#useless comment\ncat bar");
        assert_eq!(
            pairs(&entries),
            [
                (1571012545, "ls /"),
                (1571012545, "echo foo"),
                (1571012560, "cat bar"),
            ]
        );
    }

    #[test]
    fn test_forward_scan_leaves_leading_commands_unknown() {
        let entries = forward_scan(["a", "#5", "b"]);
        assert_eq!(pairs(&entries), [(UNKNOWN_TIMESTAMP, "a"), (5, "b")]);
    }

    #[test]
    fn test_no_markers_stay_unknown() {
        let entries = reconstruct("a\n\n   \nb\n");
        assert_eq!(pairs(&entries), [(UNKNOWN_TIMESTAMP, "a"), (UNKNOWN_TIMESTAMP, "b")]);
    }

    #[test]
    fn test_backward_fill_uses_nearest_later_timestamp() {
        let mut entries = vec![
            BackfillEntry::new(UNKNOWN_TIMESTAMP, "a"),
            BackfillEntry::new(10, "b"),
            BackfillEntry::new(UNKNOWN_TIMESTAMP, "c"),
            BackfillEntry::new(20, "d"),
        ];
        backward_fill(&mut entries);
        assert_eq!(pairs(&entries), [(10, "a"), (10, "b"), (20, "c"), (20, "d")]);
    }

    #[test]
    fn test_malformed_marker_is_ignored() {
        assert_eq!(classify_line("#not-a-number"), HistoryFileLine::Ignored);
        assert_eq!(classify_line("# 42 "), HistoryFileLine::Marker(42));
        assert_eq!(classify_line("  git status  "), HistoryFileLine::Command("git status"));
        let entries = reconstruct("#1\nx\n#garbage\ny");
        assert_eq!(pairs(&entries), [(1, "x"), (1, "y")]);
    }

    #[test]
    fn test_synthetic_session_is_negative() {
        let s = SyntheticSession::random().unwrap();
        assert!((-(SYNTHETIC_RANGE as i64)..0).contains(&s.pid));
        assert!((-(SYNTHETIC_RANGE as i64)..0).contains(&s.sequence));
    }
}
