//! Forge Common - persistence, configuration and the learner progress store
//!
//! v0.4.0: Progress store over a pluggable adapter (memory or SQLite).

pub mod clock;
pub mod db;
pub mod error;
pub mod forge_config;
pub mod memory_db;
pub mod progress_store;
pub mod sqlite_db;

pub use clock::{Clock, FixedClock, SystemClock};
pub use db::{DbResult, ProgressDb};
pub use error::{CompletionStep, PersistenceError, StoreError};
pub use forge_config::{ForgeConfig, StorageBackend};
pub use memory_db::MemoryProgressDb;
pub use progress_store::{
    ActivityReport, CompletionReport, ProgressStore, QuizReport, SharedProgressStore,
};
pub use sqlite_db::SqliteProgressDb;
