//! NDJSON files: one JSON object per line.

use std::io::Write;
use std::path::Path;

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

/// Read every well-formed line. A malformed line is logged and skipped, it
/// never aborts the read.
pub fn read_lines<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let mut out = Vec::new();
    for (lineno, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str(line) {
            Ok(item) => out.push(item),
            Err(e) => {
                warn!(
                    file = %path.display(),
                    line = lineno + 1,
                    error = %e,
                    "malformed record, skipping"
                );
            }
        }
    }
    Ok(out)
}

/// Like [`read_lines`], but a missing file is an empty collection.
pub fn read_lines_or_empty<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
    if !path.is_file() {
        return Ok(Vec::new());
    }
    read_lines(path)
}

/// Truncate and write. Parent directories are created as needed.
pub fn write_lines<T: Serialize>(path: &Path, items: &[T]) -> anyhow::Result<()> {
    ensure_parent(path)?;
    let mut f = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    for item in items {
        writeln!(f, "{}", serde_json::to_string(item)?)?;
    }
    Ok(())
}

/// Append, keeping existing lines.
pub fn append_lines<T: Serialize>(path: &Path, items: &[T]) -> anyhow::Result<()> {
    ensure_parent(path)?;
    let mut f = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    for item in items {
        writeln!(f, "{}", serde_json::to_string(item)?)?;
    }
    Ok(())
}

fn ensure_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use tempfile::tempdir;

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a/b/records.jsonl");
        let items = vec![json!({"n": 1}), json!({"n": 2})];

        write_lines(&path, &items).unwrap();
        let back: Vec<Value> = read_lines(&path).unwrap();
        assert_eq!(back, items);
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("records.jsonl");
        std::fs::write(&path, "{\"n\": 1}\nnot json\n\n{\"n\": 3}\n").unwrap();

        let back: Vec<Value> = read_lines(&path).unwrap();
        assert_eq!(back, vec![json!({"n": 1}), json!({"n": 3})]);
    }

    #[test]
    fn missing_file_reads_empty() {
        let dir = tempdir().unwrap();
        let back: Vec<Value> = read_lines_or_empty(&dir.path().join("absent.jsonl")).unwrap();
        assert!(back.is_empty());
    }

    #[test]
    fn append_keeps_existing_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("records.jsonl");
        write_lines(&path, &[json!({"n": 1})]).unwrap();
        append_lines(&path, &[json!({"n": 2})]).unwrap();

        let back: Vec<Value> = read_lines(&path).unwrap();
        assert_eq!(back.len(), 2);
    }

    #[test]
    fn write_truncates_previous_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("records.jsonl");
        write_lines(&path, &[json!({"n": 1}), json!({"n": 2})]).unwrap();
        write_lines(&path, &[json!({"n": 9})]).unwrap();

        let back: Vec<Value> = read_lines(&path).unwrap();
        assert_eq!(back, vec![json!({"n": 9})]);
    }
}
