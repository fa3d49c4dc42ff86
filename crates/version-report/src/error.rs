//! Error taxonomy for the version report logs.

use std::path::PathBuf;

/// Errors produced while appending to or reading the report logs.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("{var} is not set")]
    NotConfigured { var: &'static str },

    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt record #{index} in {}: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ReportError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ReportError::Io {
            path: path.into(),
            source,
        }
    }

    /// True when the underlying failure is a missing file.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ReportError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

/// Result type for report log operations.
pub type Result<T> = std::result::Result<T, ReportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_configured_names_the_variable() {
        let err = ReportError::NotConfigured {
            var: "VERSION_REPORT_LOCATION",
        };
        assert_eq!(err.to_string(), "VERSION_REPORT_LOCATION is not set");
    }

    #[test]
    fn test_io_error_carries_path() {
        let err = ReportError::io(
            "/tmp/missing.json",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.to_string().contains("/tmp/missing.json"));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_corrupt_error_reports_index() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ReportError::Corrupt {
            path: PathBuf::from("version.json"),
            index: 3,
            source,
        };
        let msg = err.to_string();
        assert!(msg.contains("#3"));
        assert!(msg.contains("version.json"));
        assert!(!err.is_not_found());
    }
}
