//! Activity log: one JSON line per habit or entry mutation.
//!
//! Every change made through the CLI or the web API is appended to
//! `~/.streaks/activity.jsonl` (configurable via `[logging]`). The log is
//! write-mostly and best-effort: a failure to record an event never fails
//! the mutation that produced it. `streaks activity` reads it back.

pub mod logger;

pub use logger::{Action, ActivityEvent, ActivityLog};
