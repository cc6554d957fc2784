//! Persistence: NDJSON records in a partitioned directory tree.

pub mod jsonl;
pub mod layout;

pub use jsonl::{append_lines, read_lines, read_lines_or_empty, write_lines};
pub use layout::{orders_for_lang, timestamp, DataRoot, FileKey};
