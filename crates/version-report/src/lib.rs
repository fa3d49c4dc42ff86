//! Version report log.
//!
//! Independent units of work (threads, or processes spawned by them) append
//! version-change facts to a shared newline-delimited JSON file. Once the
//! overall run finishes, the log is reduced to one report per key, ordered by
//! priority and recency. A secondary structured log next to it collects
//! per-target change details and is read back without merging.
//!
//! ```no_run
//! use version_report::{with_capture, ReportContext, ReportError, VersionReport};
//!
//! let (capture, ()) = with_capture::<_, ReportError, _>(&ReportContext::from_env(), |ctx| {
//!     ctx.append_report(&VersionReport::new("sdk", 1).with_pr_report("Bump SDK"))
//! })?;
//! assert!(capture.pr_markdown().contains("Bump SDK"));
//! # Ok::<(), ReportError>(())
//! ```

pub mod append_log;
pub mod capture;
pub mod error;
pub mod location;
pub mod model;
pub mod obs;
pub mod reduce;
pub mod structured;
pub mod telemetry;

pub use capture::{with_capture, VersionReportCapture};
pub use error::{ReportError, Result};
pub use location::{secondary_location, ReportContext, LOCATION_ENV_VAR};
pub use model::{
    BumpType, FieldChange, FieldChangeKind, OperationChange, OperationChangeKind, TargetReport,
    VersionReport,
};
pub use reduce::MergedVersionReport;
pub use structured::StructuredReport;
pub use telemetry::init_tracing;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
