//! Durable state for chat digestion: insight snapshots, run history and
//! chat-folder path resolution

mod io;
mod paths;
mod state;
mod types;

pub use io::{append_jsonl, atomic_write, read_jsonl};
pub use paths::ChatPaths;
pub use state::{InsightStore, StoreState};
pub use types::{Cursor, Insight, RunOutcome, RunRecord, NO_NEW_INSIGHTS};
