//! JSON result files on disk.
//!
//! One file per benchmark record, named `{query_name}_{timestamp}.json`
//! with a second-resolution timestamp so a lexicographic sort on the
//! suffix gives recency. A companion `execution_time.json` holds the
//! flat before-only summary of a detection sweep. Records are an
//! append-only history: nothing here ever deletes them.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;

use planbench_common::{BenchError, Result};

use crate::record::{BenchmarkRecord, SummaryEntry};

/// File name of the detection sweep's execution-time summary.
pub const SUMMARY_FILE: &str = "execution_time.json";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Reads and writes benchmark results in a directory.
#[derive(Debug, Clone)]
pub struct ResultStore {
    dir: PathBuf,
}

impl ResultStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write a fresh record under a new timestamped identifier and
    /// return the identifier.
    ///
    /// Two records created within the same second get distinct
    /// identifiers via a zero-padded numeric suffix, keeping the
    /// `{query_name}_` prefix intact and the suffix recency-sortable
    /// past the tenth collision.
    pub fn create_record(&self, record: &BenchmarkRecord) -> Result<String> {
        self.ensure_dir()?;

        let base = format!(
            "{}_{}",
            record.query_name,
            Local::now().format(TIMESTAMP_FORMAT)
        );
        let mut id = base.clone();
        let mut attempt = 1;
        while self.record_path(&id).exists() {
            attempt += 1;
            id = format!("{base}-{attempt:02}");
        }

        let path = self.record_path(&id);
        self.write_json(&path, record)?;
        tracing::info!(path = %path.display(), "saved benchmark record");
        Ok(id)
    }

    /// Rewrite an existing record with its "after" half filled in.
    ///
    /// The on-disk copy is re-read first so the persisted "before"
    /// baseline is the one that survives. If it is missing or
    /// unreadable the in-memory copy is written instead, logged
    /// loudly because the on-disk baseline was lost.
    pub fn update_after(&self, id: &str, record: &BenchmarkRecord) -> Result<()> {
        let path = self.record_path(id);

        let merged = match self.load_record_at(&path) {
            Ok(mut on_disk) => {
                on_disk.results.after = record.results.after.clone();
                on_disk
            }
            Err(e) => {
                tracing::error!(
                    id,
                    error = %e,
                    "benchmark record lost between phases, rewriting from memory"
                );
                record.clone()
            }
        };

        self.write_json(&path, &merged)?;
        tracing::info!(path = %path.display(), "updated benchmark record");
        Ok(())
    }

    pub fn load_record(&self, id: &str) -> Result<BenchmarkRecord> {
        self.load_record_at(&self.record_path(id))
    }

    /// The most recent record for a query name, by lexicographic
    /// ordering of the timestamp suffix. Returns the identifier and
    /// the record itself.
    pub fn latest_record(&self, query_name: &str) -> Result<Option<(String, BenchmarkRecord)>> {
        let prefix = format!("{query_name}_");

        let entries = fs::read_dir(&self.dir)
            .map_err(|e| BenchError::Store(format!("cannot read {}: {e}", self.dir.display())))?;

        let mut latest: Option<String> = None;
        for entry in entries {
            let entry = entry.map_err(|e| BenchError::Store(e.to_string()))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let Some(id) = name.strip_suffix(".json") else {
                continue;
            };
            if !id.starts_with(&prefix) {
                continue;
            }
            if latest.as_deref().is_none_or(|current| id > current) {
                latest = Some(id.to_string());
            }
        }

        match latest {
            Some(id) => {
                let record = self.load_record(&id)?;
                Ok(Some((id, record)))
            }
            None => Ok(None),
        }
    }

    /// Write the detection sweep summary, replacing any previous one.
    pub fn write_summary(&self, entries: &[SummaryEntry]) -> Result<PathBuf> {
        self.ensure_dir()?;
        let path = self.dir.join(SUMMARY_FILE);
        self.write_json(&path, &entries)?;
        tracing::info!(path = %path.display(), entries = entries.len(), "saved execution-time summary");
        Ok(path)
    }

    pub fn load_summary(&self) -> Result<Vec<SummaryEntry>> {
        let path = self.dir.join(SUMMARY_FILE);
        let text = fs::read_to_string(&path)
            .map_err(|e| BenchError::Store(format!("cannot read {}: {e}", path.display())))?;
        serde_json::from_str(&text)
            .map_err(|e| BenchError::Store(format!("malformed summary {}: {e}", path.display())))
    }

    pub fn record_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    fn load_record_at(&self, path: &Path) -> Result<BenchmarkRecord> {
        let text = fs::read_to_string(path)
            .map_err(|e| BenchError::Store(format!("cannot read {}: {e}", path.display())))?;
        serde_json::from_str(&text)
            .map_err(|e| BenchError::Store(format!("malformed record {}: {e}", path.display())))
    }

    fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| BenchError::Store(format!("cannot create {}: {e}", self.dir.display())))
    }

    fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        let text = serde_json::to_string_pretty(value)
            .map_err(|e| BenchError::Store(format!("serialize failed: {e}")))?;
        fs::write(path, text)
            .map_err(|e| BenchError::Store(format!("cannot write {}: {e}", path.display())))
    }
}
