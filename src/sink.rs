//src/sink.rs

use ahash::AHashSet;
use thiserror::Error;

use crate::config::ErrorPolicy;
use crate::error::{GeneratorError, Result};
use crate::types::ClassifiedSequence;

/// Failure reported by a sink for a single record or a commit.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct SinkError(pub String);

/// Row-by-row destination for classified records, e.g. a database table.
///
/// Implementations own the connection and transaction; the generator only
/// hands over records and decides what to do when one is refused.
pub trait RecordSink {
    fn insert(&mut self, record: &ClassifiedSequence) -> std::result::Result<(), SinkError>;

    fn commit(&mut self) -> std::result::Result<(), SinkError> {
        Ok(())
    }
}

/// Outcome of [`load_records`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    pub inserted: usize,
    pub failed: usize,
}

/// Push `records` into `sink` under `policy`, then commit.
///
/// With [`ErrorPolicy::FailFast`] the first refused record aborts the load
/// before commit. With [`ErrorPolicy::SkipAndContinue`] failures are
/// logged and counted.
pub fn load_records<'a, S, I>(sink: &mut S, records: I, policy: ErrorPolicy) -> Result<LoadReport>
where
    S: RecordSink + ?Sized,
    I: IntoIterator<Item = &'a ClassifiedSequence>,
{
    let mut report = LoadReport::default();

    for (index, record) in records.into_iter().enumerate() {
        match sink.insert(record) {
            Ok(()) => report.inserted += 1,
            Err(e) => match policy {
                ErrorPolicy::FailFast => {
                    return Err(GeneratorError::Sink {
                        index,
                        detail: e.to_string(),
                    });
                }
                ErrorPolicy::SkipAndContinue => {
                    log::warn!("Skipping record #{index} ({}): {e}", record.sequence);
                    report.failed += 1;
                }
            },
        }
    }

    sink.commit().map_err(|e| GeneratorError::Sink {
        index: report.inserted + report.failed,
        detail: format!("commit failed: {e}"),
    })?;

    log::info!(
        "Loaded {} records ({} failed)",
        report.inserted,
        report.failed
    );
    Ok(report)
}

/// In-memory sink. With `unique_keys`, a repeated sequence is refused the
/// way a primary-key column would refuse it.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub rows: Vec<ClassifiedSequence>,
    pub committed: bool,
    unique_keys: bool,
    keys: AHashSet<String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_unique_keys() -> Self {
        MemorySink {
            unique_keys: true,
            ..Self::default()
        }
    }
}

impl RecordSink for MemorySink {
    fn insert(&mut self, record: &ClassifiedSequence) -> std::result::Result<(), SinkError> {
        if self.unique_keys && !self.keys.insert(record.sequence.clone()) {
            return Err(SinkError(format!(
                "duplicate key value \"{}\"",
                record.sequence
            )));
        }
        self.rows.push(record.clone());
        Ok(())
    }

    fn commit(&mut self) -> std::result::Result<(), SinkError> {
        self.committed = true;
        Ok(())
    }
}
