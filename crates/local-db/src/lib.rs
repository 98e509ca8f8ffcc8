pub mod migrations;
pub mod query;
pub mod tables;

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use recent_core::backfill::{BackfillEntry, IMPORT_PWD, IMPORT_RETURN_VAL, SyntheticSession};
use recent_core::record::{env_from_json, env_to_json, format_timestamp, parse_timestamp, timestamp_from_unix};
use recent_core::{
    CommandRecord, CompiledQuery, LiveEvent, SessionContext, SessionOutcome, SessionResolution,
    dedup_latest,
};
use rusqlite::functions::FunctionFlags;
use rusqlite::{Connection, ErrorCode, OptionalExtension, Transaction, TransactionBehavior};
use sea_query::SqliteQueryBuilder;
use tracing::debug;

pub use migrations::{SCHEMA_VERSION, SchemaError};
use query::{Built, CommandRow, SessionRow, values_to_sql};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The command history store. One connection per process invocation.
pub struct LocalDb {
    conn: Connection,
}

impl LocalDb {
    /// Open (or create) the store at `path` and bring its schema up to date.
    pub fn open_path(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir for {}", path.display()))?;
        }
        let conn =
            Connection::open(path).with_context(|| format!("open db {}", path.display()))?;
        Self::init(conn)
    }

    fn init(mut conn: Connection) -> Result<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        register_regexp(&conn).context("register REGEXP")?;
        migrations::migrate(&mut conn)?;
        Ok(Self { conn })
    }

    // ── Ingestion ──────────────────────────────────────────────────────

    /// Resolve the session of `pid` at `sequence` and advance its counter.
    pub fn resolve_session(
        &mut self,
        pid: i64,
        sequence: i64,
        ctx: &SessionContext,
        now: DateTime<Utc>,
    ) -> Result<SessionResolution> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let resolution = resolve_in(&tx, pid, sequence, ctx, now)?;
        tx.commit()?;
        Ok(resolution)
    }

    /// Log one live event. Nothing is written to `commands` for a duplicate.
    pub fn record_command(
        &mut self,
        event: &LiveEvent,
        ctx: &SessionContext,
    ) -> Result<SessionResolution> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let resolution = resolve_in(&tx, event.pid, event.sequence, ctx, event.timestamp)?;
        if resolution.is_duplicate() {
            debug!(sequence = event.sequence, "duplicate prompt event, skipping");
        } else {
            let command_dt = format_timestamp(&event.timestamp);
            // Live rows always carry a snapshot, even `{"env":{}}`.
            let json_data = Some(env_to_json(&event.env));
            execute(
                &tx,
                query::insert_command(CommandRow {
                    command_dt: &command_dt,
                    command: &event.command,
                    pid: event.pid,
                    return_val: event.return_val,
                    pwd: &event.pwd,
                    session: resolution.session_id.as_str(),
                    json_data,
                }),
            )?;
        }
        tx.commit()?;
        Ok(resolution)
    }

    /// Insert reconstructed history entries under one synthetic session.
    ///
    /// Returns the number of rows written. Running it twice writes twice.
    pub fn import_history(
        &mut self,
        entries: &[BackfillEntry],
        synthetic: SyntheticSession,
        ctx: &SessionContext,
        now: DateTime<Utc>,
    ) -> Result<usize> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let resolution = resolve_in(&tx, synthetic.pid, synthetic.sequence, ctx, now)?;
        for entry in entries {
            let command_dt = format_timestamp(&timestamp_from_unix(entry.timestamp));
            execute(
                &tx,
                query::insert_command(CommandRow {
                    command_dt: &command_dt,
                    command: &entry.command,
                    pid: synthetic.pid,
                    return_val: IMPORT_RETURN_VAL,
                    pwd: IMPORT_PWD,
                    session: resolution.session_id.as_str(),
                    json_data: None,
                }),
            )?;
        }
        tx.commit()?;
        Ok(entries.len())
    }

    // ── Queries ────────────────────────────────────────────────────────

    pub fn query(&self, query: &CompiledQuery) -> Result<Vec<CommandRecord>> {
        self.conn
            .pragma_update(None, "case_sensitive_like", query.case_sensitive)?;

        let (sql, values) = query::tail(query).build(SqliteQueryBuilder);
        debug!(%sql, "running query");
        let mut stmt = self
            .conn
            .prepare(&sql)
            .with_context(|| format!("prepare query: {sql}"))?;
        let params = values_to_sql(&values);
        let rows = stmt.query_map(rusqlite::params_from_iter(params.iter()), row_to_record)?;
        let records = rows.collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(if query.dedup {
            dedup_latest(records)
        } else {
            records
        })
    }

    /// The query as one statement with values inlined, for `--debug`.
    pub fn debug_sql(query: &CompiledQuery) -> String {
        query::tail(query).to_string(SqliteQueryBuilder)
    }

    pub fn commands_table_schema(&self) -> Result<Option<String>> {
        let (sql, values) = query::commands_table_schema();
        let params = values_to_sql(&values);
        Ok(self
            .conn
            .query_row(&sql, rusqlite::params_from_iter(params.iter()), |row| row.get(0))
            .optional()?)
    }

    pub fn session_sequence(&self, session: &str) -> Result<Option<i64>> {
        sequence_of(&self.conn, session)
    }

    pub fn command_count(&self) -> Result<i64> {
        let (sql, values) = query::command_count();
        let params = values_to_sql(&values);
        Ok(self
            .conn
            .query_row(&sql, rusqlite::params_from_iter(params.iter()), |row| row.get(0))?)
    }
}

// Insert the session row, or advance it when the id is already taken.
fn resolve_in(
    tx: &Transaction<'_>,
    pid: i64,
    sequence: i64,
    ctx: &SessionContext,
    now: DateTime<Utc>,
) -> Result<SessionResolution> {
    let session_id = ctx.session_id(pid);
    let now = format_timestamp(&now);

    let inserted = execute(
        tx,
        query::insert_session(SessionRow {
            session: session_id.as_str(),
            now: &now,
            term: &ctx.term,
            hostname: &ctx.hostname,
            user: &ctx.user,
            sequence,
        }),
    );

    let outcome = match inserted {
        Ok(_) => SessionOutcome::Created,
        Err(e) if is_constraint_violation(&e) => {
            let stored = sequence_of(tx, session_id.as_str())?;
            execute(tx, query::update_session(session_id.as_str(), sequence, &now))?;
            SessionOutcome::for_existing(stored, sequence)
        }
        Err(e) => return Err(e).context("insert session"),
    };
    debug!(session = %session_id, sequence, ?outcome, "resolved session");

    Ok(SessionResolution {
        session_id,
        outcome,
    })
}

fn execute(conn: &Connection, (sql, values): Built) -> rusqlite::Result<usize> {
    let params = values_to_sql(&values);
    conn.execute(&sql, rusqlite::params_from_iter(params.iter()))
}

fn sequence_of(conn: &Connection, session: &str) -> Result<Option<i64>> {
    let (sql, values) = query::session_sequence(session);
    let params = values_to_sql(&values);
    let sequence = conn
        .query_row(&sql, rusqlite::params_from_iter(params.iter()), |row| {
            row.get::<_, Option<i64>>(0)
        })
        .optional()?;
    Ok(sequence.flatten())
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    err.sqlite_error_code() == Some(ErrorCode::ConstraintViolation)
}

fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<CommandRecord> {
    let raw_dt: String = row.get(0)?;
    let command_dt = parse_timestamp(&raw_dt).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            format!("invalid command_dt {raw_dt:?}").into(),
        )
    })?;
    let json_data: Option<String> = row.get(6)?;
    Ok(CommandRecord {
        command_dt,
        command: row.get(1)?,
        pid: row.get(2)?,
        return_val: row.get(3)?,
        pwd: row.get(4)?,
        session: row.get(5)?,
        env: json_data.as_deref().and_then(env_from_json),
    })
}

// `x REGEXP y` calls `regexp(y, x)`; the compiled pattern is cached per statement.
fn register_regexp(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "regexp",
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let re = ctx.get_or_create_aux(0, |pattern| -> Result<_, BoxError> {
                Ok(regex::Regex::new(pattern.as_str()?)?)
            })?;
            let text = ctx.get::<String>(1).unwrap_or_default();
            Ok(re.is_match(&text))
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use recent_core::filter::DEFAULT_CHAR_LIMIT;
    use recent_core::{EnvSnapshot, FilterContext, QueryRequest};
    use std::path::PathBuf;

    fn test_db() -> LocalDb {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.keep().join("test.db");
        LocalDb::open_path(&path).unwrap()
    }

    fn ctx() -> SessionContext {
        SessionContext {
            shell_level: "1".into(),
            term: "xterm".into(),
            user: "me".into(),
            ..Default::default()
        }
    }

    fn filter_ctx() -> FilterContext {
        FilterContext {
            cwd: PathBuf::from("/"),
            home: Some(PathBuf::from("/home/me")),
        }
    }

    struct Logger {
        db: LocalDb,
        sequence: i64,
    }

    impl Logger {
        fn new() -> Self {
            Self {
                db: test_db(),
                sequence: 0,
            }
        }

        fn log_at(&mut self, command: &str, secs: i64, return_val: i64, pwd: &str) {
            self.log_env(command, secs, return_val, pwd, EnvSnapshot::new());
        }

        fn log_env(
            &mut self,
            command: &str,
            secs: i64,
            return_val: i64,
            pwd: &str,
            env: EnvSnapshot,
        ) {
            self.sequence += 1;
            let event = LiveEvent {
                command: command.to_string(),
                pid: 100,
                sequence: self.sequence,
                return_val,
                pwd: pwd.to_string(),
                timestamp: timestamp_from_unix(secs),
                env,
            };
            self.db.record_command(&event, &ctx()).unwrap();
        }

        fn query(&self, req: QueryRequest) -> Vec<CommandRecord> {
            let compiled = req.compile(&filter_ctx()).unwrap();
            self.db.query(&compiled).unwrap()
        }

        fn commands(&self, req: QueryRequest) -> Vec<String> {
            self.query(req).into_iter().map(|r| r.command).collect()
        }
    }

    fn pattern(p: &str) -> QueryRequest {
        QueryRequest {
            pattern: p.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_open_and_schema() {
        let db = test_db();
        let schema = db.commands_table_schema().unwrap().unwrap();
        assert!(schema.contains("json_data"));
        assert_eq!(migrations::user_version(&db.conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_reopen_keeps_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("h.db");
        {
            let mut db = LocalDb::open_path(&path).unwrap();
            let event = LiveEvent::from_history_line("1 ls", 7, 0, "/", Utc::now()).unwrap();
            db.record_command(&event, &ctx()).unwrap();
        }
        let db = LocalDb::open_path(&path).unwrap();
        assert_eq!(db.command_count().unwrap(), 1);
    }

    #[test]
    fn test_duplicate_sequence_is_not_recorded() {
        let mut db = test_db();
        let ts = timestamp_from_unix(1_000);
        let first = LiveEvent::from_history_line("5 make", 42, 0, "/src", ts).unwrap();
        let r1 = db.record_command(&first, &ctx()).unwrap();
        assert_eq!(r1.outcome, SessionOutcome::Created);

        let r2 = db.record_command(&first, &ctx()).unwrap();
        assert!(r2.is_duplicate());
        assert_eq!(db.command_count().unwrap(), 1);
        assert_eq!(db.session_sequence(r1.session_id.as_str()).unwrap(), Some(5));

        let next = LiveEvent::from_history_line("6 make test", 42, 2, "/src", ts).unwrap();
        let r3 = db.record_command(&next, &ctx()).unwrap();
        assert_eq!(r3.outcome, SessionOutcome::Advanced);
        assert_eq!(r3.session_id, r1.session_id);
        assert_eq!(db.command_count().unwrap(), 2);
        assert_eq!(db.session_sequence(r1.session_id.as_str()).unwrap(), Some(6));
    }

    #[test]
    fn test_resolve_session_distinguishes_shells() {
        let mut db = test_db();
        let now = Utc::now();
        let a = db.resolve_session(1, 1, &ctx(), now).unwrap();
        let b = db.resolve_session(2, 1, &ctx(), now).unwrap();
        assert_ne!(a.session_id, b.session_id);
        assert_eq!(b.outcome, SessionOutcome::Created);
        let again = db.resolve_session(1, 1, &ctx(), now).unwrap();
        assert!(again.is_duplicate());
    }

    #[test]
    fn test_filters_are_conjunctive() {
        let mut log = Logger::new();
        log.log_at("cmd1", 10, 0, "/a");
        log.log_at("cmd1", 20, 1, "/b");
        let rows = log.query(QueryRequest {
            pattern: "cmd1".into(),
            workdir: Some("/a".into()),
            successes_only: true,
            ..Default::default()
        });
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].pwd, "/a");
        assert_eq!(rows[0].return_val, 0);
    }

    #[test]
    fn test_dedup_runs_after_filters() {
        let mut log = Logger::new();
        log.log_at("cmd1", 1, 0, "/dir1");
        log.log_at("cmd2", 2, 0, "/dir1");
        log.log_at("cmd1", 3, 1, "/dir2");
        log.log_at("cmd2", 4, 1, "/dir2");

        let rows = log.query(QueryRequest {
            dedup: true,
            ..pattern("cmd")
        });
        let got: Vec<(&str, i64)> = rows
            .iter()
            .map(|r| (r.command.as_str(), r.command_dt.timestamp()))
            .collect();
        assert_eq!(got, [("cmd1", 3), ("cmd2", 4)]);

        let rows = log.query(QueryRequest {
            dedup: true,
            successes_only: true,
            ..pattern("cmd")
        });
        let got: Vec<(&str, i64)> = rows
            .iter()
            .map(|r| (r.command.as_str(), r.command_dt.timestamp()))
            .collect();
        assert_eq!(got, [("cmd1", 1), ("cmd2", 2)]);
    }

    #[test]
    fn test_length_limit_is_inclusive() {
        let mut log = Logger::new();
        let exact = "x".repeat(DEFAULT_CHAR_LIMIT);
        let over = "y".repeat(DEFAULT_CHAR_LIMIT + 1);
        log.log_at(&exact, 1, 0, "/");
        log.log_at(&over, 2, 0, "/");
        assert_eq!(log.commands(QueryRequest::default()), [exact]);

        let rows = log.commands(QueryRequest {
            char_limit: 5,
            ..Default::default()
        });
        assert!(rows.is_empty());
    }

    #[test]
    fn test_case_sensitivity() {
        let mut log = Logger::new();
        log.log_at("abc", 1, 0, "/");
        log.log_at("aBc", 2, 0, "/");
        assert_eq!(log.commands(pattern("abc")), ["abc"]);
        assert_eq!(
            log.commands(QueryRequest {
                case_insensitive: true,
                ..pattern("abc")
            }),
            ["abc", "aBc"]
        );
        assert_eq!(
            log.commands(QueryRequest {
                regex: true,
                case_insensitive: true,
                ..pattern("^ab")
            }),
            ["abc", "aBc"]
        );
    }

    #[test]
    fn test_substring_wildcards_pass_through() {
        let mut log = Logger::new();
        log.log_at("git status", 1, 0, "/");
        log.log_at("git stash", 2, 0, "/");
        log.log_at("ls", 3, 0, "/");
        assert_eq!(log.commands(pattern("git st_t")), ["git status"]);
        assert_eq!(log.commands(pattern("git%sh")), ["git stash"]);
    }

    #[test]
    fn test_tail_limit_returns_newest_oldest_first() {
        let mut log = Logger::new();
        for i in 0..5 {
            log.log_at(&format!("c{i}"), 100 + i, 0, "/");
        }
        log.log_at("same-second-a", 200, 0, "/");
        log.log_at("same-second-b", 200, 0, "/");
        let got = log.commands(QueryRequest {
            limit: 3,
            ..Default::default()
        });
        assert_eq!(got, ["c4", "same-second-a", "same-second-b"]);
    }

    #[test]
    fn test_default_limit_keeps_latest_rows() {
        let mut log = Logger::new();
        for i in 0..25 {
            log.log_at(&format!("c{i:02}"), 1_000 + i, 0, "/");
        }
        let got = log.commands(QueryRequest::default());
        let want: Vec<String> = (5..25).map(|i| format!("c{i:02}")).collect();
        assert_eq!(got, want);
    }

    #[test]
    fn test_live_rows_keep_empty_snapshot() {
        let mut log = Logger::new();
        log.log_at("live", 1, 0, "/");
        let synthetic = SyntheticSession {
            pid: -5,
            sequence: -5,
        };
        let entries = recent_core::backfill::reconstruct("#2\nimported\n");
        log.db
            .import_history(&entries, synthetic, &ctx(), timestamp_from_unix(3))
            .unwrap();

        let rows = log.query(QueryRequest::default());
        assert_eq!(rows[0].command, "live");
        assert_eq!(rows[0].env, Some(EnvSnapshot::new()));
        assert_eq!(rows[0].json_data().as_deref(), Some(r#"{"env":{}}"#));
        assert_eq!(rows[1].command, "imported");
        assert_eq!(rows[1].env, None);
    }

    #[test]
    fn test_self_invocations_hidden_unless_requested() {
        let mut log = Logger::new();
        log.log_at("recent -n 5", 1, 0, "/");
        log.log_at("ls", 2, 0, "/");
        assert_eq!(log.commands(QueryRequest::default()), ["ls"]);
        assert_eq!(
            log.commands(QueryRequest {
                return_self: true,
                ..Default::default()
            }),
            ["recent -n 5", "ls"]
        );
    }

    #[test]
    fn test_regex_and_raw_predicates() {
        let mut log = Logger::new();
        log.log_at("cargo build", 1, 0, "/");
        log.log_at("cargo test", 2, 3, "/");
        log.log_at("make", 3, 0, "/");
        assert_eq!(
            log.commands(QueryRequest {
                regex: true,
                ..pattern("^cargo (b|t)e")
            }),
            ["cargo test"]
        );
        assert_eq!(
            log.commands(QueryRequest {
                raw_predicate: true,
                ..pattern("return_val = 3 or command = 'make'")
            }),
            ["cargo test", "make"]
        );
    }

    #[test]
    fn test_status_filters() {
        let mut log = Logger::new();
        log.log_at("ok", 1, 0, "/");
        log.log_at("bad", 2, 1, "/");
        log.log_at("worse", 3, 2, "/");
        assert_eq!(
            log.commands(QueryRequest {
                failures_only: true,
                ..Default::default()
            }),
            ["bad", "worse"]
        );
        assert_eq!(
            log.commands(QueryRequest {
                status: Some(2),
                ..Default::default()
            }),
            ["worse"]
        );
    }

    #[test]
    fn test_date_filters() {
        let mut log = Logger::new();
        log.log_at("old", 1_577_836_800, 0, "/"); // 2020-01-01 00:00:00
        log.log_at("july", 1_595_281_953, 0, "/"); // 2020-07-20 21:52:33
        log.log_at("new", 1_609_459_200, 0, "/"); // 2021-01-01 00:00:00
        let by_date = |d: &str| {
            log.commands(QueryRequest {
                date: Some(d.into()),
                ..Default::default()
            })
        };
        assert_eq!(by_date("2020"), ["old", "july"]);
        assert_eq!(by_date("2020-07"), ["july"]);
        assert_eq!(by_date("2020-07-20"), ["july"]);
        assert_eq!(by_date("2020-07-20 21:52:33"), ["july"]);
        assert!(by_date("2019").is_empty());
    }

    #[test]
    fn test_env_filters() {
        let mut log = Logger::new();
        let env = |pairs: &[(&str, &str)]| -> EnvSnapshot {
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        };
        log.log_env("a", 1, 0, "/", env(&[("RECENT_PROJ", "x"), ("CONDA_ENV", "base")]));
        log.log_env("b", 2, 0, "/", env(&[("RECENT_PROJ", "y")]));
        log.log_at("c", 3, 0, "/");

        let by_env = |filters: &[&str]| {
            log.commands(QueryRequest {
                env: filters.iter().map(|f| f.to_string()).collect(),
                ..Default::default()
            })
        };
        assert_eq!(by_env(&["RECENT_PROJ"]), ["a", "b"]);
        assert_eq!(by_env(&["RECENT_PROJ:y"]), ["b"]);
        assert_eq!(by_env(&["RECENT_PROJ", "CONDA_ENV:base"]), ["a"]);
        assert!(by_env(&["MISSING"]).is_empty());

        let rows = log.query(QueryRequest::default());
        assert_eq!(rows[0].env.as_ref().unwrap()["CONDA_ENV"], "base");
        assert_eq!(rows[2].env, Some(EnvSnapshot::new()));
    }

    #[test]
    fn test_workdir_filter_normalizes() {
        let mut log = Logger::new();
        log.log_at("here", 1, 0, "/home/me/src");
        log.log_at("there", 2, 0, "/tmp");
        assert_eq!(
            log.commands(QueryRequest {
                workdir: Some("~/src/../src/.".into()),
                ..Default::default()
            }),
            ["here"]
        );
    }

    #[test]
    fn test_session_filter() {
        let mut db = test_db();
        let ts = timestamp_from_unix(10);
        let mine = LiveEvent::from_history_line("1 mine", 1, 0, "/", ts).unwrap();
        let theirs = LiveEvent::from_history_line("1 theirs", 2, 0, "/", ts).unwrap();
        let session = db.record_command(&mine, &ctx()).unwrap().session_id;
        db.record_command(&theirs, &ctx()).unwrap();

        let compiled = QueryRequest {
            session: Some(session),
            ..Default::default()
        }
        .compile(&filter_ctx())
        .unwrap();
        let rows = db.query(&compiled).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].command, "mine");
    }

    #[test]
    fn test_import_history_uses_synthetic_session() {
        let mut db = test_db();
        let entries = recent_core::backfill::reconstruct("ls /\n#100\na\nb\n#200\nc\n");
        let synthetic = SyntheticSession {
            pid: -17,
            sequence: -23,
        };
        let written = db
            .import_history(&entries, synthetic, &ctx(), timestamp_from_unix(1_000))
            .unwrap();
        assert_eq!(written, 4);

        let compiled = QueryRequest::default().compile(&filter_ctx()).unwrap();
        let rows = db.query(&compiled).unwrap();
        let got: Vec<(&str, i64)> = rows
            .iter()
            .map(|r| (r.command.as_str(), r.command_dt.timestamp()))
            .collect();
        assert_eq!(got, [("ls /", 100), ("a", 100), ("b", 100), ("c", 200)]);
        assert!(rows.iter().all(|r| r.pid == -17
            && r.return_val == IMPORT_RETURN_VAL
            && r.pwd == IMPORT_PWD
            && r.env.is_none()));
        let session = ctx().session_id(-17);
        assert_eq!(db.session_sequence(session.as_str()).unwrap(), Some(-23));

        db.import_history(&entries, synthetic, &ctx(), timestamp_from_unix(2_000))
            .unwrap();
        assert_eq!(db.command_count().unwrap(), 8);
    }

    #[test]
    fn test_migrates_v1_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("v1.db");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch(
                "CREATE TABLE commands (command_dt timestamp, command text, pid int, \
                 return_val int, pwd text, session text);
                 CREATE TABLE sessions (session text primary key not null, created_dt timestamp, \
                 updated_dt timestamp, term text, hostname text, user text, sequence int);
                 INSERT INTO commands VALUES ('2020-01-01 00:00:00', 'old cmd', 1, 0, '/', 's');
                 PRAGMA user_version = 1;",
            )
            .unwrap();
        }
        let db = LocalDb::open_path(&path).unwrap();
        let schema = db.commands_table_schema().unwrap().unwrap();
        assert!(schema.contains("json_data"));
        let rows = db
            .query(&QueryRequest::default().compile(&filter_ctx()).unwrap())
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].command, "old cmd");
        assert_eq!(rows[0].env, None);
    }

    #[test]
    fn test_newer_schema_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("v9.db");
        Connection::open(&path)
            .unwrap()
            .execute_batch("PRAGMA user_version = 9;")
            .unwrap();
        let err = LocalDb::open_path(&path).err().unwrap();
        let schema_err = err.downcast_ref::<SchemaError>().unwrap();
        assert!(matches!(
            schema_err,
            SchemaError::Unsupported { found: 9, expected: 2 }
        ));
        assert!(err.to_string().contains("please update"));
    }

    #[test]
    fn test_debug_sql_inlines_values() {
        let compiled = QueryRequest {
            pattern: "needle".into(),
            ..Default::default()
        }
        .compile(&filter_ctx())
        .unwrap();
        let sql = LocalDb::debug_sql(&compiled);
        assert!(sql.contains("'%needle%'"));
        assert!(sql.contains("LIMIT 20"));
    }
}
