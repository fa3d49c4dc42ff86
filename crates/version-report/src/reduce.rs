//! Reduction of the primary log into one report per key.
//!
//! Identity is last-write-wins: a later record for a key replaces the earlier
//! one wholesale. Ordering is priority descending; among equal priorities the
//! record read later comes first. The arrival index used for that tie-break is
//! the record's position in the decoded stream and is never persisted.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ReportError, Result};
use crate::location::ReportContext;
use crate::model::VersionReport;
use crate::obs;

/// The reduced primary log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedVersionReport {
    pub reports: Vec<VersionReport>,
}

impl MergedVersionReport {
    /// Reduce records given in arrival order.
    pub fn from_records(records: impl IntoIterator<Item = VersionReport>) -> Self {
        let mut latest: HashMap<String, (usize, VersionReport)> = HashMap::new();
        for (arrival, report) in records.into_iter().enumerate() {
            latest.insert(report.key.clone(), (arrival, report));
        }

        let mut ordered: Vec<(usize, VersionReport)> = latest.into_values().collect();
        ordered.sort_by(|(arrival_a, a), (arrival_b, b)| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| arrival_b.cmp(arrival_a))
        });

        Self {
            reports: ordered.into_iter().map(|(_, report)| report).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn get(&self, key: &str) -> Option<&VersionReport> {
        self.reports.iter().find(|r| r.key == key)
    }

    /// True iff any merged report demands regeneration.
    pub fn must_generate(&self) -> bool {
        self.reports.iter().any(|r| r.must_generate)
    }

    /// Non-empty pull-request fragments, one per line, in merged order.
    pub fn pr_markdown(&self) -> String {
        join_fragments(self.reports.iter().map(|r| r.pr_report.as_deref()))
    }

    /// Non-empty commit-message fragments, one per line, in merged order.
    pub fn commit_markdown(&self) -> String {
        join_fragments(self.reports.iter().map(|r| r.commit_report.as_deref()))
    }
}

fn join_fragments<'a>(fragments: impl Iterator<Item = Option<&'a str>>) -> String {
    let mut out = String::new();
    for fragment in fragments.flatten().filter(|f| !f.is_empty()) {
        out.push_str(fragment);
        out.push('\n');
    }
    out
}

/// Decode a stream of JSON records. Whitespace between records is ignored.
pub(crate) fn decode_stream<T>(path: &Path, contents: &[u8]) -> Result<Vec<T>>
where
    T: for<'de> Deserialize<'de>,
{
    serde_json::Deserializer::from_slice(contents)
        .into_iter::<T>()
        .enumerate()
        .map(|(index, record)| {
            record.map_err(|source| ReportError::Corrupt {
                path: path.to_path_buf(),
                index,
                source,
            })
        })
        .collect()
}

impl ReportContext {
    /// Read and reduce the whole primary log.
    ///
    /// A missing file is an error: reducing before anything was appended
    /// means the run never set up its log.
    pub fn reduce(&self) -> Result<MergedVersionReport> {
        let path = self.require_location()?;
        let contents = std::fs::read(path).map_err(|e| ReportError::io(path, e))?;
        let records: Vec<VersionReport> = decode_stream(path, &contents)?;
        let record_count = records.len();

        let merged = MergedVersionReport::from_records(records);
        obs::emit_reduced(path, record_count, merged.len());
        Ok(merged)
    }

    /// Whether the reduced log demands regeneration; `false` on any failure.
    pub fn must_generate(&self) -> bool {
        self.reduce().map(|m| m.must_generate()).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(merged: &MergedVersionReport) -> Vec<&str> {
        merged.reports.iter().map(|r| r.key.as_str()).collect()
    }

    #[test]
    fn test_priority_orders_before_recency() {
        let merged = MergedVersionReport::from_records(vec![
            VersionReport::new("test1", 2)
                .with_must_generate(true)
                .with_pr_report("Test report 1"),
            VersionReport::new("test2", 1).with_pr_report("Test report 2"),
        ]);
        assert_eq!(keys(&merged), vec!["test1", "test2"]);
        assert_eq!(merged.pr_markdown(), "Test report 1\nTest report 2\n");
        assert!(merged.must_generate());
    }

    #[test]
    fn test_equal_priority_prefers_later_arrival() {
        let merged = MergedVersionReport::from_records(vec![
            VersionReport::new("a", 1),
            VersionReport::new("b", 1),
            VersionReport::new("c", 1),
        ]);
        assert_eq!(keys(&merged), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_later_record_replaces_earlier_wholesale() {
        let merged = MergedVersionReport::from_records(vec![
            VersionReport::new("a", 5)
                .with_must_generate(true)
                .with_commit_report("old commit")
                .with_pr_report("old"),
            VersionReport::new("a", 1).with_pr_report("new"),
        ]);
        assert_eq!(merged.len(), 1);
        let a = merged.get("a").unwrap();
        assert_eq!(a.priority, 1);
        assert_eq!(a.pr_report.as_deref(), Some("new"));
        assert!(a.commit_report.is_none());
        assert!(!merged.must_generate());
    }

    #[test]
    fn test_overriding_a_key_moves_it_to_its_new_arrival() {
        let merged = MergedVersionReport::from_records(vec![
            VersionReport::new("subprocess1", 2).with_pr_report("original"),
            VersionReport::new("subprocess2", 2).with_pr_report("original"),
            VersionReport::new("subprocess1", 2).with_pr_report("overridden"),
        ]);
        assert_eq!(keys(&merged), vec!["subprocess1", "subprocess2"]);
        assert_eq!(merged.reports[0].pr_report.as_deref(), Some("overridden"));
    }

    #[test]
    fn test_output_is_non_increasing_in_priority() {
        let priorities = [3, -1, 7, 3, 0, 7, 2, -1, 5];
        let records = priorities
            .iter()
            .enumerate()
            .map(|(i, p)| VersionReport::new(format!("k{i}"), *p));
        let merged = MergedVersionReport::from_records(records);

        assert_eq!(merged.len(), priorities.len());
        for pair in merged.reports.windows(2) {
            assert!(pair[0].priority >= pair[1].priority);
        }
        assert_eq!(keys(&merged)[..2].to_vec(), vec!["k5", "k2"]);
    }

    #[test]
    fn test_markdown_skips_empty_fragments() {
        let merged = MergedVersionReport::from_records(vec![
            VersionReport::new("test1", 2)
                .with_pr_report("Test report 1")
                .with_commit_report("Test commit report 1"),
            VersionReport::new("test2", 1)
                .with_pr_report("Test report 2")
                .with_commit_report(""),
        ]);
        assert_eq!(merged.pr_markdown(), "Test report 1\nTest report 2\n");
        assert_eq!(merged.commit_markdown(), "Test commit report 1\n");
    }

    #[test]
    fn test_empty_merge_has_no_output() {
        let merged = MergedVersionReport::default();
        assert!(!merged.must_generate());
        assert_eq!(merged.pr_markdown(), "");
        assert_eq!(merged.commit_markdown(), "");
    }

    #[test]
    fn test_decode_tolerates_whitespace_between_records() {
        let raw = b"{\"key\":\"a\",\"priority\":1}\n\n  {\"key\":\"b\",\"priority\":2}{\"key\":\"c\",\"priority\":0}\n";
        let records: Vec<VersionReport> = decode_stream(Path::new("v.json"), raw).unwrap();
        assert_eq!(records.len(), 3);
    }

    #[test]
    fn test_decode_reports_corrupt_index() {
        let raw = b"{\"key\":\"a\",\"priority\":1}\n{\"key\":\"b\",\"prio\n";
        let err = decode_stream::<VersionReport>(Path::new("v.json"), raw).unwrap_err();
        match err {
            ReportError::Corrupt { index, .. } => assert_eq!(index, 1),
            other => panic!("expected Corrupt, got {other:?}"),
        }
    }

    #[test]
    fn test_reduce_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ReportContext::new(dir.path().join("never-written.json"));
        let err = ctx.reduce().unwrap_err();
        assert!(err.is_not_found());
        assert!(!ctx.must_generate());
    }

    #[test]
    fn test_reduce_requires_location() {
        let err = ReportContext::unconfigured().reduce().unwrap_err();
        assert!(matches!(err, ReportError::NotConfigured { .. }));
    }

    #[test]
    fn test_reduce_empty_file_is_empty_result() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("version.json");
        std::fs::write(&path, "").unwrap();
        let merged = ReportContext::new(&path).reduce().unwrap();
        assert!(merged.is_empty());
    }
}
