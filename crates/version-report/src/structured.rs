//! Reader for the secondary (structured) log.
//!
//! Unlike the primary log this one is never reduced: every appended target
//! record comes back in file order, duplicates included.

use serde::{Deserialize, Serialize};

use crate::error::{ReportError, Result};
use crate::location::ReportContext;
use crate::model::TargetReport;
use crate::reduce::decode_stream;

/// All target records from one run, in append order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredReport {
    pub targets: Vec<TargetReport>,
}

impl StructuredReport {
    /// Every record appended for `target_name`, oldest first.
    pub fn targets_named<'a>(
        &'a self,
        target_name: &'a str,
    ) -> impl Iterator<Item = &'a TargetReport> + 'a {
        self.targets
            .iter()
            .filter(move |t| t.target_name == target_name)
    }

    pub fn is_breaking(&self) -> bool {
        self.targets.iter().any(TargetReport::is_breaking)
    }
}

impl ReportContext {
    /// Read every record from the secondary log.
    ///
    /// Returns `Ok(None)` when no location is configured, when the file was
    /// never created, or when it holds no records.
    pub fn read_targets(&self) -> Result<Option<StructuredReport>> {
        let Some(path) = self.secondary_location() else {
            return Ok(None);
        };

        let contents = match std::fs::read(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ReportError::io(&path, e)),
        };

        let targets: Vec<TargetReport> = decode_stream(&path, &contents)?;
        if targets.is_empty() {
            return Ok(None);
        }
        Ok(Some(StructuredReport { targets }))
    }
}
