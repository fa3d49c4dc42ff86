//! Record types stored in the primary and secondary logs.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// ── primary log ───────────────────────────────────────────────────────────

/// Semantic-versioning change category attached to a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BumpType {
    #[default]
    None,
    Patch,
    Minor,
    Major,
    Graduate,
    Prerelease,
    Custom,
}

impl BumpType {
    /// Wire name of the bump type.
    pub fn as_str(&self) -> &'static str {
        match self {
            BumpType::None => "none",
            BumpType::Patch => "patch",
            BumpType::Minor => "minor",
            BumpType::Major => "major",
            BumpType::Graduate => "graduate",
            BumpType::Prerelease => "prerelease",
            BumpType::Custom => "custom",
        }
    }
}

impl fmt::Display for BumpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of the primary log.
///
/// `key` is the dedup identity: when the log is reduced, the last record
/// appended for a key replaces every earlier one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionReport {
    pub key: String,
    pub priority: i64,
    #[serde(default)]
    pub bump_type: BumpType,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "empty_as_none"
    )]
    pub new_version: Option<String>,
    #[serde(default)]
    pub must_generate: bool,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "empty_as_none"
    )]
    pub pr_report: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "empty_as_none"
    )]
    pub commit_report: Option<String>,
}

impl VersionReport {
    /// Report for `key` with no bump, fragments or regeneration flag.
    pub fn new(key: impl Into<String>, priority: i64) -> Self {
        Self {
            key: key.into(),
            priority,
            bump_type: BumpType::None,
            new_version: None,
            must_generate: false,
            pr_report: None,
            commit_report: None,
        }
    }

    /// Set the bump classification.
    pub fn with_bump(mut self, bump_type: BumpType) -> Self {
        self.bump_type = bump_type;
        self
    }

    /// Set the target version.
    pub fn with_new_version(mut self, version: impl Into<String>) -> Self {
        self.new_version = Some(version.into());
        self
    }

    /// Set whether this report demands regeneration.
    pub fn with_must_generate(mut self, must_generate: bool) -> Self {
        self.must_generate = must_generate;
        self
    }

    /// Set the pull request summary fragment.
    pub fn with_pr_report(mut self, fragment: impl Into<String>) -> Self {
        self.pr_report = Some(fragment.into());
        self
    }

    /// Set the commit message fragment.
    pub fn with_commit_report(mut self, fragment: impl Into<String>) -> Self {
        self.commit_report = Some(fragment.into());
        self
    }
}

// ── secondary log ─────────────────────────────────────────────────────────

/// What happened to an SDK operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationChangeKind {
    Added,
    Removed,
    Modified,
    Deprecated,
}

/// What happened to a single field within an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldChangeKind {
    Added,
    Removed,
    Changed,
}

/// A field-level change, e.g. `request.email` removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: FieldChangeKind,
    pub is_breaking: bool,
}

impl FieldChange {
    /// Change of `kind` at field `path`.
    pub fn new(path: impl Into<String>, kind: FieldChangeKind, is_breaking: bool) -> Self {
        Self {
            path: path.into(),
            kind,
            is_breaking,
        }
    }
}

/// Changes to one operation (SDK method) of a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationChange {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: OperationChangeKind,
    pub is_breaking: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub changes: Vec<FieldChange>,
}

impl OperationChange {
    fn without_fields(name: impl Into<String>, kind: OperationChangeKind, is_breaking: bool) -> Self {
        Self {
            name: name.into(),
            kind,
            is_breaking,
            changes: Vec::new(),
        }
    }

    /// A newly added operation.
    pub fn added(name: impl Into<String>) -> Self {
        Self::without_fields(name, OperationChangeKind::Added, false)
    }

    /// Removing an operation always breaks callers.
    pub fn removed(name: impl Into<String>) -> Self {
        Self::without_fields(name, OperationChangeKind::Removed, true)
    }

    /// An operation marked deprecated.
    pub fn deprecated(name: impl Into<String>) -> Self {
        Self::without_fields(name, OperationChangeKind::Deprecated, false)
    }

    /// A modified operation is breaking iff any of its field changes is.
    pub fn modified(name: impl Into<String>, changes: Vec<FieldChange>) -> Self {
        let is_breaking = changes.iter().any(|c| c.is_breaking);
        Self {
            name: name.into(),
            kind: OperationChangeKind::Modified,
            is_breaking,
            changes,
        }
    }
}

/// One line of the secondary log: everything that changed for one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetReport {
    pub target_name: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "empty_as_none"
    )]
    pub package_name: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "empty_as_none"
    )]
    pub previous_version: Option<String>,
    pub new_version: String,
    /// ISO 8601 timestamp, kept exactly as written.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "empty_as_none"
    )]
    pub generated_at: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub operations: Vec<OperationChange>,
}

impl TargetReport {
    /// Target record with no operations.
    pub fn new(target_name: impl Into<String>, new_version: impl Into<String>) -> Self {
        Self {
            target_name: target_name.into(),
            package_name: None,
            previous_version: None,
            new_version: new_version.into(),
            generated_at: None,
            operations: Vec::new(),
        }
    }

    /// Set the package identifier.
    pub fn with_package_name(mut self, package_name: impl Into<String>) -> Self {
        self.package_name = Some(package_name.into());
        self
    }

    /// Set the version before this run.
    pub fn with_previous_version(mut self, version: impl Into<String>) -> Self {
        self.previous_version = Some(version.into());
        self
    }

    /// Stamp the record with `at` in RFC 3339 form.
    pub fn with_generated_at(mut self, at: DateTime<Utc>) -> Self {
        self.generated_at = Some(at.to_rfc3339());
        self
    }

    /// Append one operation change.
    pub fn with_operation(mut self, operation: OperationChange) -> Self {
        self.operations.push(operation);
        self
    }

    /// True if any operation of this target is breaking.
    pub fn is_breaking(&self) -> bool {
        self.operations.iter().any(|op| op.is_breaking)
    }
}

// Some writers emit `""` for unset strings and `null` for empty lists.

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
