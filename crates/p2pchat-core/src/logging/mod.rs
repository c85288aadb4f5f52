//! JSONL event logs, one file per instance per day.
//!
//! ```text
//! <log-dir>/
//! └── raw/
//!     ├── 2026-10-16_directory.jsonl
//!     ├── 2026-10-16_alice.jsonl
//!     └── 2026-10-16_bob.jsonl
//! ```
//!
//! Composed next to the console layer:
//!
//! ```ignore
//! use p2pchat_core::logging::JsonlLayer;
//! use tracing_subscriber::prelude::*;
//!
//! tracing_subscriber::registry()
//!     .with(tracing_subscriber::fmt::layer())
//!     .with(JsonlLayer::new("./logs", "alice")?)
//!     .init();
//! ```
//!
//! Query with jq:
//!
//! ```bash
//! cat logs/raw/*.jsonl | jq -s 'sort_by(.ts) | .[] | select(.level == "warn")'
//! ```

mod entry;
mod layer;
mod writer;

pub use entry::LogRecord;
pub use layer::JsonlLayer;
pub use writer::{read_records, LogFile};
