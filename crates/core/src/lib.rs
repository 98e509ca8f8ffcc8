//! Shell history logging core: records, session identity, history import
//! and query compilation. Storage lives in `recent-local-db`.

pub mod backfill;
pub mod dedup;
pub mod env;
pub mod filter;
pub mod history;
pub mod ingest;
pub mod record;
pub mod session;

pub use dedup::dedup_latest;
pub use env::EnvCapture;
pub use filter::{CompiledQuery, FilterContext, FilterError, Predicate, QueryRequest};
pub use ingest::LiveEvent;
pub use record::{CommandRecord, EnvSnapshot};
pub use session::{SessionContext, SessionId, SessionOutcome, SessionResolution};
