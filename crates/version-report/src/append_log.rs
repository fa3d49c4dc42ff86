//! Newline-delimited JSON append logs.
//!
//! Each append opens the file in create+append mode, writes one record and
//! its trailing newline with a single `write_all`, and closes the file.
//! In-process writers are serialized per log by a static mutex. Across
//! processes we rely on `O_APPEND` writes of small records being atomic on a
//! local filesystem; nothing here coordinates between processes.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use serde::Serialize;

use crate::error::{ReportError, Result};
use crate::location::ReportContext;
use crate::model::{TargetReport, VersionReport};
use crate::obs;

static PRIMARY_LOCK: Mutex<()> = Mutex::new(());
static SECONDARY_LOCK: Mutex<()> = Mutex::new(());

fn encode_line<T: Serialize>(record: &T) -> Result<Vec<u8>> {
    let mut line = serde_json::to_vec(record)?;
    line.push(b'\n');
    Ok(line)
}

/// Append pre-encoded bytes under `lock`. The guard covers exactly
/// open-write-close and is released on every return path.
fn append_line(lock: &Mutex<()>, path: &Path, line: &[u8]) -> Result<()> {
    // The mutex guards no data, so a poisoned lock is still usable.
    let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| ReportError::io(path, e))?;
    file.write_all(line).map_err(|e| ReportError::io(path, e))?;
    Ok(())
}

impl ReportContext {
    /// Append one record to the primary log.
    ///
    /// Fails with [`ReportError::NotConfigured`] when no location is set.
    pub fn append_report(&self, report: &VersionReport) -> Result<()> {
        let path = self.require_location()?;
        let line = encode_line(report)?;
        append_line(&PRIMARY_LOCK, path, &line)?;
        obs::emit_report_appended(path, &report.key, report.priority);
        Ok(())
    }

    /// Append one target record to the secondary log.
    ///
    /// Does nothing when no location is configured, so callers that predate
    /// the secondary log keep working unchanged.
    pub fn append_target(&self, target: &TargetReport) -> Result<()> {
        let Some(path) = self.secondary_location() else {
            return Ok(());
        };
        let line = encode_line(target)?;
        append_line(&SECONDARY_LOCK, &path, &line)?;
        obs::emit_target_appended(&path, &target.target_name, target.operations.len());
        Ok(())
    }
}
