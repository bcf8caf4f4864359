use crate::error::ResultsError;
use memspan_core::TrialRecord;
use rand::Rng;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Append-only trial log that writes itself out exactly once.
///
/// Dropping an unflushed log flushes it, so results reach disk on normal
/// exit, on cancellation and while unwinding from a panic.
#[derive(Debug)]
pub struct ResultLog {
    records: Vec<TrialRecord>,
    path: PathBuf,
    flushed: bool,
}

impl ResultLog {
    /// File name is `{participant_id}_beh_{NNN}.csv` with a random three digit suffix.
    pub fn new<R: Rng + ?Sized>(dir: impl AsRef<Path>, participant_id: &str, rng: &mut R) -> Self {
        let suffix: u16 = rng.random_range(100..=999);
        Self::with_path(dir.as_ref().join(format!("{participant_id}_beh_{suffix}.csv")))
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self {
            records: Vec::new(),
            path,
            flushed: false,
        }
    }

    pub fn push(&mut self, record: TrialRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[TrialRecord] {
        &self.records
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes all records. Returns the file written, or `None` when there was
    /// nothing to write or the log was already flushed. A failed write
    /// leaves the log unflushed so a later call (or `Drop`) retries.
    pub fn flush(&mut self) -> Result<Option<PathBuf>, ResultsError> {
        if self.flushed {
            return Ok(None);
        }

        if self.records.is_empty() {
            self.flushed = true;
            warn!("no trials were run, skipping result file");
            return Ok(None);
        }

        let io_err = |source| ResultsError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(io_err)?;
        }
        let file = File::create(&self.path).map_err(io_err)?;
        write_csv(file, &self.records)?;
        self.flushed = true;

        info!(path = %self.path.display(), trials = self.records.len(), "results saved");
        Ok(Some(self.path.clone()))
    }
}

impl Drop for ResultLog {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            error!("failed to save results: {e}");
        }
    }
}

/// `;`-delimited table: header row, then one row per record in order
pub fn write_csv<W: Write>(writer: W, records: &[TrialRecord]) -> Result<(), ResultsError> {
    let mut out = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_writer(writer);
    out.write_record(TrialRecord::HEADER)?;
    for record in records {
        out.write_record(record.fields()?)?;
    }
    out.flush().map_err(csv::Error::from)?;
    Ok(())
}
