//! Structured tracing hooks for report log activity.
//!
//! Appends are emitted at `debug!` (they can be frequent), scope lifecycle
//! events at `info!`, and cleanup failures at `warn!`.

use std::path::Path;

use tracing::{debug, info, warn};

/// RAII guard that enters a capture-scoped span for the duration of a scope.
///
/// ```ignore
/// let _span = CaptureSpan::enter(Path::new("/tmp/version.json"), true);
/// // appends and reductions below are tagged with location + provisioned
/// ```
pub struct CaptureSpan {
    _span: tracing::span::EnteredSpan,
}

impl CaptureSpan {
    /// Create and enter a span tagged with the log location.
    pub fn enter(location: &Path, provisioned: bool) -> Self {
        let span = tracing::info_span!(
            "version_report.capture",
            location = %location.display(),
            provisioned = provisioned,
        );
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: one report appended to the primary log.
pub fn emit_report_appended(location: &Path, key: &str, priority: i64) {
    debug!(
        event = "report.appended",
        location = %location.display(),
        key = %key,
        priority = priority,
    );
}

/// Emit event: one target record appended to the secondary log.
pub fn emit_target_appended(location: &Path, target_name: &str, operations: usize) {
    debug!(
        event = "target.appended",
        location = %location.display(),
        target_name = %target_name,
        operations = operations,
    );
}

/// Emit event: primary log reduced from `records` lines into `keys` results.
pub fn emit_reduced(location: &Path, records: usize, keys: usize) {
    info!(
        event = "report.reduced",
        location = %location.display(),
        records = records,
        keys = keys,
    );
}

/// Emit event: a capture scope created a temporary location.
pub fn emit_location_provisioned(location: &Path) {
    info!(event = "location.provisioned", location = %location.display());
}

/// Emit event: a provisioned location was deleted.
pub fn emit_location_released(location: &Path) {
    info!(event = "location.released", location = %location.display());
}

/// Emit event: a provisioned file could not be removed (warning level).
pub fn emit_cleanup_error(location: &Path, error: &dyn std::fmt::Display) {
    warn!(event = "location.cleanup_error", location = %location.display(), error = %error);
}
