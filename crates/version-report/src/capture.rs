//! Capture scope: run a unit of work and collect everything it reported.
//!
//! When the given context has no location, the scope provisions a temporary
//! primary file, exports it through [`LOCATION_ENV_VAR`] so spawned processes
//! inherit it, and removes both the primary and the derived secondary file
//! when the scope ends, whatever the outcome.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::TempPath;

use crate::error::{ReportError, Result};
use crate::location::{secondary_location, ReportContext, LOCATION_ENV_VAR};
use crate::obs::{self, CaptureSpan};
use crate::reduce::MergedVersionReport;
use crate::structured::StructuredReport;

/// Everything reported during one capture scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionReportCapture {
    pub primary: MergedVersionReport,
    pub structured: Option<StructuredReport>,
}

impl VersionReportCapture {
    pub fn must_generate(&self) -> bool {
        self.primary.must_generate()
    }

    pub fn pr_markdown(&self) -> String {
        self.primary.pr_markdown()
    }

    pub fn commit_markdown(&self) -> String {
        self.primary.commit_markdown()
    }
}

/// Temporary location owned by one scope. Dropping it restores the previous
/// environment value and deletes both log files.
struct ProvisionedLocation {
    primary: Option<TempPath>,
    secondary: PathBuf,
    previous_env: Option<OsString>,
}

impl ProvisionedLocation {
    fn provision() -> Result<Self> {
        let primary = tempfile::Builder::new()
            .prefix("version-report-")
            .suffix(".json")
            .tempfile()
            .map_err(|e| ReportError::io(std::env::temp_dir(), e))?
            .into_temp_path();
        let secondary = secondary_location(&primary);

        let previous_env = std::env::var_os(LOCATION_ENV_VAR);
        std::env::set_var(LOCATION_ENV_VAR, &*primary);
        obs::emit_location_provisioned(&primary);

        Ok(Self {
            primary: Some(primary),
            secondary,
            previous_env,
        })
    }

    fn context(&self) -> ReportContext {
        match &self.primary {
            Some(path) => ReportContext::new(path.to_path_buf()),
            None => ReportContext::unconfigured(),
        }
    }
}

impl Drop for ProvisionedLocation {
    fn drop(&mut self) {
        match self.previous_env.take() {
            Some(value) => std::env::set_var(LOCATION_ENV_VAR, value),
            None => std::env::remove_var(LOCATION_ENV_VAR),
        }

        if let Err(e) = std::fs::remove_file(&self.secondary) {
            if e.kind() != std::io::ErrorKind::NotFound {
                obs::emit_cleanup_error(&self.secondary, &e);
            }
        }

        if let Some(primary) = self.primary.take() {
            let path = primary.to_path_buf();
            match primary.close() {
                Ok(()) => obs::emit_location_released(&path),
                Err(e) => obs::emit_cleanup_error(&path, &e),
            }
        }
    }
}

/// Run `work` inside a capture scope and return what it reported alongside
/// its own result.
///
/// `work` receives the effective context: `ctx` itself when configured,
/// otherwise the provisioned temporary location. Errors surface in this
/// order, only the first one being returned:
///
/// 1. the error returned by `work` (no reduction is attempted),
/// 2. a primary log reduction error,
/// 3. a secondary log read error.
///
/// Provisioned files are removed before the result reaches the caller.
pub fn with_capture<T, E, F>(
    ctx: &ReportContext,
    work: F,
) -> std::result::Result<(VersionReportCapture, T), E>
where
    F: FnOnce(&ReportContext) -> std::result::Result<T, E>,
    E: From<ReportError>,
{
    let provisioned = if ctx.is_configured() {
        None
    } else {
        Some(ProvisionedLocation::provision()?)
    };
    let effective = provisioned
        .as_ref()
        .map_or_else(|| ctx.clone(), ProvisionedLocation::context);

    let _span = CaptureSpan::enter(
        effective.location().unwrap_or_else(|| Path::new("")),
        provisioned.is_some(),
    );

    let value = work(&effective)?;
    let primary = effective.reduce()?;
    let structured = effective.read_targets()?;

    Ok((
        VersionReportCapture {
            primary,
            structured,
        },
        value,
    ))
}
