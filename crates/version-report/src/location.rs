//! Report log locations.
//!
//! A [`ReportContext`] names the primary log file. The secondary (structured)
//! log lives next to it at a derived path:
//!
//! ```text
//! /path/to/version.json  ->  /path/to/version.v2.json
//! /path/to/version.buf   ->  /path/to/version.buf.v2
//! ```
//!
//! The context is passed explicitly to every operation. The
//! [`LOCATION_ENV_VAR`] environment variable is only the hand-off point for
//! child processes that cannot receive the context any other way.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{ReportError, Result};

/// Environment variable carrying the primary log path across processes.
pub const LOCATION_ENV_VAR: &str = "VERSION_REPORT_LOCATION";

const JSON_SUFFIX: &str = ".json";

/// Derive the secondary log path from the primary one.
pub fn secondary_location(primary: &Path) -> PathBuf {
    match primary.to_str().and_then(|raw| raw.strip_suffix(JSON_SUFFIX)) {
        Some(stem) if !stem.is_empty() => PathBuf::from(format!("{stem}.v2.json")),
        _ => {
            let mut with_suffix = OsString::from(primary.as_os_str());
            with_suffix.push(".v2");
            PathBuf::from(with_suffix)
        }
    }
}

/// Where the report logs for the current run live, if anywhere.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportContext {
    location: Option<PathBuf>,
}

impl ReportContext {
    /// Context writing to `path` (the primary log).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            location: Some(path.into()),
        }
    }

    /// Context with no location; primary appends fail, secondary appends no-op.
    pub fn unconfigured() -> Self {
        Self { location: None }
    }

    /// Read the location from [`LOCATION_ENV_VAR`].
    pub fn from_env() -> Self {
        Self::from_value(std::env::var_os(LOCATION_ENV_VAR))
    }

    /// Build from a raw configuration value; empty values count as unset.
    pub fn from_value(value: Option<impl AsRef<OsStr>>) -> Self {
        match value {
            Some(v) if !v.as_ref().is_empty() => Self::new(PathBuf::from(v.as_ref())),
            _ => Self::unconfigured(),
        }
    }

    /// True when a primary log path is set.
    pub fn is_configured(&self) -> bool {
        self.location.is_some()
    }

    /// Primary log path, if configured.
    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    /// Secondary log path, or `None` when secondary logging is disabled.
    pub fn secondary_location(&self) -> Option<PathBuf> {
        self.location.as_deref().map(secondary_location)
    }

    /// Primary log path, or [`ReportError::NotConfigured`].
    pub(crate) fn require_location(&self) -> Result<&Path> {
        self.location().ok_or(ReportError::NotConfigured {
            var: LOCATION_ENV_VAR,
        })
    }

    /// Pass this location to a child process explicitly.
    ///
    /// An unconfigured context removes the variable from the child's
    /// environment so it cannot pick up a stale value.
    pub fn apply_to<'c>(&self, command: &'c mut Command) -> &'c mut Command {
        match &self.location {
            Some(path) => command.env(LOCATION_ENV_VAR, path),
            None => command.env_remove(LOCATION_ENV_VAR),
        }
    }
}
