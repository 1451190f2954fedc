//! Durable record of which steps have completed.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::core::types::StepRecord;

/// Store of completed steps, keyed by order.
///
/// Only the runner writes, and only after every item of a step succeeded.
pub trait SeedRepository {
    fn list_steps(&self) -> Result<Vec<StepRecord>>;

    /// Insert or replace the record for `record.order`.
    fn save_step(&mut self, record: StepRecord) -> Result<()>;
}

/// In-memory repository, listed in ascending order.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    records: BTreeMap<i64, StepRecord>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing records, e.g. to simulate earlier runs.
    pub fn with_records(records: impl IntoIterator<Item = StepRecord>) -> Self {
        Self {
            records: records
                .into_iter()
                .map(|record| (record.order, record))
                .collect(),
        }
    }

    pub fn get(&self, order: i64) -> Option<&StepRecord> {
        self.records.get(&order)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl SeedRepository for MemoryRepository {
    fn list_steps(&self) -> Result<Vec<StepRecord>> {
        Ok(self.records.values().cloned().collect())
    }

    fn save_step(&mut self, record: StepRecord) -> Result<()> {
        self.records.insert(record.order, record);
        Ok(())
    }
}

/// Records persisted as a pretty-printed JSON array.
///
/// A missing file means nothing has run yet. Every save rewrites the whole
/// file atomically (temp file + rename).
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SeedRepository for JsonFileRepository {
    fn list_steps(&self) -> Result<Vec<StepRecord>> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no step state yet");
            return Ok(Vec::new());
        }
        debug!(path = %self.path.display(), "loading step state");
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("read step state {}", self.path.display()))?;
        let mut records: Vec<StepRecord> = serde_json::from_str(&contents)
            .with_context(|| format!("parse step state {}", self.path.display()))?;
        records.sort_by_key(|record| record.order);
        debug!(records = records.len(), "step state loaded");
        Ok(records)
    }

    fn save_step(&mut self, record: StepRecord) -> Result<()> {
        let mut records = self.list_steps()?;
        debug!(path = %self.path.display(), order = record.order, "writing step state");
        match records.iter_mut().find(|existing| existing.order == record.order) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
        records.sort_by_key(|record| record.order);
        let mut buf = serde_json::to_string_pretty(&records)?;
        buf.push('\n');
        write_atomic(&self.path, &buf)
    }
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("step state path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp step state {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path)
        .with_context(|| format!("replace step state {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::complete_record;

    #[test]
    fn memory_repository_upserts_by_order() {
        let mut repo = MemoryRepository::new();
        repo.save_step(complete_record(2, "a")).expect("save");
        repo.save_step(complete_record(1, "b")).expect("save");
        repo.save_step(complete_record(2, "c")).expect("save");

        let records = repo.list_steps().expect("list");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].order, 1);
        assert_eq!(records[1].validation_hash, "c");
    }

    #[test]
    fn missing_state_file_lists_nothing() {
        let temp = tempfile::tempdir().expect("tempdir");
        let repo = JsonFileRepository::new(temp.path().join("state").join("steps.json"));
        assert!(repo.list_steps().expect("list").is_empty());
    }

    #[test]
    fn json_file_repository_persists_across_instances() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("state").join("steps.json");

        let mut repo = JsonFileRepository::new(&path);
        repo.save_step(complete_record(2, "h2")).expect("save");
        repo.save_step(complete_record(1, "h1")).expect("save");
        repo.save_step(complete_record(2, "h2b")).expect("save");

        let reopened = JsonFileRepository::new(&path);
        let records = reopened.list_steps().expect("list");
        assert_eq!(records, vec![complete_record(1, "h1"), complete_record(2, "h2b")]);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn state_file_format_is_stable() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("steps.json");
        let mut repo = JsonFileRepository::new(&path);
        repo.save_step(complete_record(1, "AB")).expect("save");

        let contents = fs::read_to_string(&path).expect("read");
        let expected = "[\n  {\n    \"order\": 1,\n    \"name\": \"step 1\",\n    \"status\": \"complete\",\n    \"validationHash\": \"AB\"\n  }\n]\n";
        assert_eq!(contents, expected);
    }

    #[test]
    fn corrupt_state_file_is_an_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("steps.json");
        fs::write(&path, "not json").expect("write");
        let err = JsonFileRepository::new(&path)
            .list_steps()
            .expect_err("corrupt");
        assert!(err.to_string().contains("parse step state"));
    }
}
