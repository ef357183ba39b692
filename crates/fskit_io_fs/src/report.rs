//! Copy outcome models and mutable report builder.

use std::collections::BTreeMap;
use std::fmt;

use crate::spec::FsError;

/// Outcome of one copy call: transferred bytes plus collected diagnostics.
///
/// `cnt_bytes` only counts bytes that were written successfully, so it stays
/// meaningful after a partial failure. `errors` keeps every failure in the
/// order it happened; the last one is the surfaced error.
#[derive(Debug, Default)]
pub struct ReportCopy {
    /// Bytes successfully written.
    pub cnt_bytes: u64,
    /// Number of entries (files, links) copied.
    pub cnt_copied: u64,
    /// Number of entries left alone by the cover policy.
    pub cnt_skipped: u64,
    /// Non-fatal warnings collected during traversal.
    pub warnings: Vec<String>,
    /// Per-entry failures.
    pub errors: Vec<FsError>,
}

impl ReportCopy {
    /// Number of collected hard errors.
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Number of collected warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Most recent error, if any.
    pub fn last_error(&self) -> Option<&FsError> {
        self.errors.last()
    }

    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Collapse into `Ok(bytes)` or the last error.
    pub fn into_result(mut self) -> Result<u64, FsError> {
        match self.errors.pop() {
            Some(err) => Err(err),
            None => Ok(self.cnt_bytes),
        }
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_bytes".to_string(), self.cnt_bytes);
        dict_counts.insert("cnt_copied".to_string(), self.cnt_copied);
        dict_counts.insert("cnt_skipped".to_string(), self.cnt_skipped);
        dict_counts.insert("cnt_errors".to_string(), self.error_count() as u64);
        dict_counts.insert("cnt_warnings".to_string(), self.warning_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        let dict_counts = self.to_dict();
        format!(
            "{prefix} bytes={} copied={} skipped={} errors={} warnings={}",
            dict_counts["cnt_bytes"],
            dict_counts["cnt_copied"],
            dict_counts["cnt_skipped"],
            dict_counts["cnt_errors"],
            dict_counts["cnt_warnings"]
        )
    }
}

impl fmt::Display for ReportCopy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[COPY]"))
    }
}

/// Mutable accumulator for copy statistics.
#[derive(Debug, Default)]
pub struct ReportCopyBuilder {
    /// See [`ReportCopy::cnt_bytes`].
    pub cnt_bytes: u64,
    /// See [`ReportCopy::cnt_copied`].
    pub cnt_copied: u64,
    /// See [`ReportCopy::cnt_skipped`].
    pub cnt_skipped: u64,
    /// See [`ReportCopy::warnings`].
    pub warnings: Vec<String>,
    /// See [`ReportCopy::errors`].
    pub errors: Vec<FsError>,
}

impl ReportCopyBuilder {
    /// Add transferred bytes.
    pub fn add_bytes(&mut self, n_bytes: u64) {
        self.cnt_bytes += n_bytes;
    }

    /// Increment copied count by one.
    pub fn add_copied(&mut self) {
        self.cnt_copied += 1;
    }

    /// Increment skipped count by one.
    pub fn add_skipped(&mut self) {
        self.cnt_skipped += 1;
    }

    /// Add warning message.
    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    /// Add one error.
    pub fn add_error(&mut self, error: FsError) {
        self.errors.push(error);
    }

    /// Fold a single-file report into this one.
    ///
    /// Bytes of a failed copy are dropped so the total only covers files that
    /// completed.
    pub fn merge(&mut self, report_child: ReportCopy) {
        if report_child.errors.is_empty() {
            self.cnt_bytes += report_child.cnt_bytes;
        }
        self.cnt_copied += report_child.cnt_copied;
        self.cnt_skipped += report_child.cnt_skipped;
        self.warnings.extend(report_child.warnings);
        self.errors.extend(report_child.errors);
    }

    /// Finalize builder into immutable report.
    pub fn build(self) -> ReportCopy {
        ReportCopy {
            cnt_bytes: self.cnt_bytes,
            cnt_copied: self.cnt_copied,
            cnt_skipped: self.cnt_skipped,
            warnings: self.warnings,
            errors: self.errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{ReportCopy, ReportCopyBuilder};
    use crate::spec::FsError;

    #[test]
    fn report_copy_to_dict_and_format() {
        let report = ReportCopy {
            cnt_bytes: 4096,
            cnt_copied: 3,
            cnt_skipped: 2,
            warnings: vec!["w".to_string()],
            errors: vec![],
        };

        let dict_counts = report.to_dict();
        assert_eq!(dict_counts["cnt_bytes"], 4096);
        assert_eq!(dict_counts["cnt_copied"], 3);
        assert_eq!(dict_counts["cnt_skipped"], 2);
        assert_eq!(dict_counts["cnt_errors"], 0);
        assert_eq!(dict_counts["cnt_warnings"], 1);

        let txt = report.format("[COPY]");
        assert_eq!(
            txt,
            "[COPY] bytes=4096 copied=3 skipped=2 errors=0 warnings=1"
        );
        assert_eq!(report.to_string(), txt);
    }

    #[test]
    fn merge_drops_bytes_of_failed_file() {
        let mut builder = ReportCopyBuilder::default();
        builder.merge(ReportCopy {
            cnt_bytes: 10,
            errors: vec![FsError::NotRegularFile(PathBuf::from("a"))],
            ..ReportCopy::default()
        });
        builder.merge(ReportCopy {
            cnt_bytes: 7,
            cnt_copied: 1,
            ..ReportCopy::default()
        });
        builder.merge(ReportCopy {
            cnt_bytes: 3,
            errors: vec![FsError::AlreadyExists(PathBuf::from("b"))],
            ..ReportCopy::default()
        });

        let report = builder.build();
        assert_eq!(report.cnt_bytes, 7);
        assert_eq!(report.cnt_copied, 1);
        assert_eq!(report.error_count(), 2);
        assert!(matches!(report.last_error(), Some(FsError::AlreadyExists(_))));
        assert!(matches!(report.into_result(), Err(FsError::AlreadyExists(_))));
    }

    #[test]
    fn into_result_returns_bytes_on_success() {
        let report = ReportCopy {
            cnt_bytes: 12,
            ..ReportCopy::default()
        };
        assert!(report.is_success());
        assert_eq!(report.into_result().expect("no error"), 12);
    }
}
