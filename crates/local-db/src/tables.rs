//! Column identifiers for the history tables.

use sea_query::Iden;

#[derive(Iden, Clone, Copy)]
pub enum Commands {
    Table,
    CommandDt,
    Command,
    Pid,
    ReturnVal,
    Pwd,
    Session,
    JsonData,
}

#[derive(Iden, Clone, Copy)]
pub enum Sessions {
    Table,
    Session,
    CreatedDt,
    UpdatedDt,
    Term,
    Hostname,
    User,
    Sequence,
}

/// Columns of a command row, in the order `row_to_record` reads them.
pub const COMMAND_COLUMNS: [Commands; 7] = [
    Commands::CommandDt,
    Commands::Command,
    Commands::Pid,
    Commands::ReturnVal,
    Commands::Pwd,
    Commands::Session,
    Commands::JsonData,
];
