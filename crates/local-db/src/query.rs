//! Statement builders for the history tables.

use recent_core::filter::{DateFilter, EnvFilter};
use recent_core::{CompiledQuery, Predicate};
use sea_query::{
    Alias, Asterisk, Cond, Expr, Func, Order, Query, SelectStatement, SimpleExpr,
    SqliteQueryBuilder, Value,
};

use crate::tables::{COMMAND_COLUMNS, Commands, Sessions};

pub type Built = (String, sea_query::Values);

const TAIL_ALIAS: &str = "tail";
const ROW_ID: &str = "row_id";

/// Convert bound values into rusqlite parameters.
pub fn values_to_sql(values: &sea_query::Values) -> Vec<rusqlite::types::Value> {
    use rusqlite::types::Value as Sql;
    values
        .0
        .iter()
        .map(|v| match v {
            Value::String(Some(s)) => Sql::Text(s.as_str().to_string()),
            Value::BigInt(Some(i)) => Sql::Integer(*i),
            Value::Int(Some(i)) => Sql::Integer(i64::from(*i)),
            Value::SmallInt(Some(i)) => Sql::Integer(i64::from(*i)),
            Value::TinyInt(Some(i)) => Sql::Integer(i64::from(*i)),
            Value::BigUnsigned(Some(u)) => Sql::Integer(i64::try_from(*u).unwrap_or(i64::MAX)),
            Value::Unsigned(Some(u)) => Sql::Integer(i64::from(*u)),
            Value::SmallUnsigned(Some(u)) => Sql::Integer(i64::from(*u)),
            Value::TinyUnsigned(Some(u)) => Sql::Integer(i64::from(*u)),
            Value::Bool(Some(b)) => Sql::Integer(i64::from(*b)),
            _ => Sql::Null,
        })
        .collect()
}

// ── Writes ─────────────────────────────────────────────────────────────────

/// Parameters for inserting one command row.
pub struct CommandRow<'a> {
    pub command_dt: &'a str,
    pub command: &'a str,
    pub pid: i64,
    pub return_val: i64,
    pub pwd: &'a str,
    pub session: &'a str,
    pub json_data: Option<String>,
}

pub fn insert_command(row: CommandRow<'_>) -> Built {
    Query::insert()
        .into_table(Commands::Table)
        .columns(COMMAND_COLUMNS)
        .values_panic([
            row.command_dt.into(),
            row.command.into(),
            row.pid.into(),
            row.return_val.into(),
            row.pwd.into(),
            row.session.into(),
            row.json_data.into(),
        ])
        .build(SqliteQueryBuilder)
}

/// Parameters for inserting a session row.
pub struct SessionRow<'a> {
    pub session: &'a str,
    pub now: &'a str,
    pub term: &'a str,
    pub hostname: &'a str,
    pub user: &'a str,
    pub sequence: i64,
}

pub fn insert_session(row: SessionRow<'_>) -> Built {
    Query::insert()
        .into_table(Sessions::Table)
        .columns([
            Sessions::Session,
            Sessions::CreatedDt,
            Sessions::UpdatedDt,
            Sessions::Term,
            Sessions::Hostname,
            Sessions::User,
            Sessions::Sequence,
        ])
        .values_panic([
            row.session.into(),
            row.now.into(),
            row.now.into(),
            row.term.into(),
            row.hostname.into(),
            row.user.into(),
            row.sequence.into(),
        ])
        .build(SqliteQueryBuilder)
}

pub fn update_session(session: &str, sequence: i64, now: &str) -> Built {
    Query::update()
        .table(Sessions::Table)
        .values([
            (Sessions::Sequence, sequence.into()),
            (Sessions::UpdatedDt, now.into()),
        ])
        .and_where(Expr::col(Sessions::Session).eq(session))
        .build(SqliteQueryBuilder)
}

// ── Reads ──────────────────────────────────────────────────────────────────

pub fn session_sequence(session: &str) -> Built {
    Query::select()
        .column(Sessions::Sequence)
        .from(Sessions::Table)
        .and_where(Expr::col(Sessions::Session).eq(session))
        .build(SqliteQueryBuilder)
}

pub fn commands_table_schema() -> Built {
    Query::select()
        .column(Alias::new("sql"))
        .from(Alias::new("sqlite_master"))
        .and_where(Expr::col(Alias::new("type")).eq("table"))
        .and_where(Expr::col(Alias::new("name")).eq("commands"))
        .build(SqliteQueryBuilder)
}

pub fn command_count() -> Built {
    Query::select()
        .expr(Func::count(Expr::col(Asterisk)))
        .from(Commands::Table)
        .build(SqliteQueryBuilder)
}

fn predicate_expr(predicate: &Predicate) -> SimpleExpr {
    match predicate {
        Predicate::StatusEquals(n) => Expr::col(Commands::ReturnVal).eq(*n),
        Predicate::StatusNotEquals(n) => Expr::col(Commands::ReturnVal).ne(*n),
        Predicate::NotPrefixed(prefix) => Expr::col(Commands::Command).not_like(format!("{prefix}%")),
        Predicate::CommandLike(pattern) => Expr::col(Commands::Command).like(pattern.as_str()),
        Predicate::CommandRegex(pattern) => {
            Expr::cust_with_values("\"command\" REGEXP ?", [pattern.as_str()])
        }
        Predicate::Raw(sql) => Expr::cust(format!("({sql})")),
        Predicate::WorkingDirectory(dir) => Expr::col(Commands::Pwd).eq(dir.as_str()),
        Predicate::Date(date) => {
            let template = match date {
                DateFilter::Year(_) => "strftime('%Y', \"command_dt\") = ?",
                DateFilter::Month(_) => "strftime('%Y-%m', \"command_dt\") = ?",
                DateFilter::Day(_) => "date(\"command_dt\") = ?",
                DateFilter::Exact(_) => "\"command_dt\" = ?",
            };
            Expr::cust_with_values(template, [date.value()])
        }
        Predicate::Env(filter) => match filter {
            EnvFilter::Present(_) => Expr::cust_with_values(
                "json_extract(\"json_data\", ?) IS NOT NULL",
                [filter.json_path()],
            ),
            EnvFilter::Equals(_, value) => Expr::cust_with_values::<_, Value, _>(
                "json_extract(\"json_data\", ?) = ?",
                [filter.json_path().into(), value.as_str().into()],
            ),
        },
        Predicate::Session(session) => Expr::col(Commands::Session).eq(session.as_str()),
        Predicate::MaxLength(limit) => {
            let limit = i64::try_from(*limit).unwrap_or(i64::MAX);
            Expr::cust_with_values("length(\"command\") <= ?", [limit])
        }
    }
}

/// The `limit` newest matching rows, re-ordered oldest first.
///
/// Rows sharing a timestamp keep insertion order via `rowid`.
pub fn tail(query: &CompiledQuery) -> SelectStatement {
    let cond = query
        .predicates
        .iter()
        .fold(Cond::all(), |cond, p| cond.add(predicate_expr(p)));

    let newest = Query::select()
        .columns(COMMAND_COLUMNS)
        .expr_as(Expr::cust("rowid"), Alias::new(ROW_ID))
        .from(Commands::Table)
        .cond_where(cond)
        .order_by(Commands::CommandDt, Order::Desc)
        .order_by_expr(Expr::cust("rowid"), Order::Desc)
        .limit(u64::from(query.limit))
        .to_owned();

    Query::select()
        .columns(COMMAND_COLUMNS)
        .from_subquery(newest, Alias::new(TAIL_ALIAS))
        .order_by(Commands::CommandDt, Order::Asc)
        .order_by(Alias::new(ROW_ID), Order::Asc)
        .to_owned()
}
