//! Concatenates reviewable patches and measures the result.

use prreview_core::{AggregatedDiff, ChangedFile, SkippedFile};
use tracing::debug;

use crate::filter::DiffFilter;

/// Count diff line-start markers in `patch`.
///
/// This is a literal substring count of `"\n+"` plus `"\n-"`, not a semantic
/// line count: a marker on the very first line is not counted, and the
/// `+++`/`---` headers count when present.
///
/// # Examples
///
/// ```
/// use prreview_difflens::count_change_markers;
///
/// assert_eq!(count_change_markers("@@ -1,2 +1,2 @@\n-old\n+new\n context"), 2);
/// assert_eq!(count_change_markers("+first line is not preceded by a newline"), 0);
/// ```
pub fn count_change_markers(patch: &str) -> usize {
    patch.matches("\n+").count() + patch.matches("\n-").count()
}

/// Build the aggregate diff from the files of one pull request.
///
/// Files are visited in input order. Each kept file contributes
/// `\n### File: <name>\n<patch>\n` to the text and its marker count to the
/// size metric; skipped files are recorded with their reason.
///
/// # Examples
///
/// ```
/// use prreview_core::ChangedFile;
/// use prreview_difflens::{aggregate, DiffFilter};
///
/// let files = vec![
///     ChangedFile::new("app.css", Some("@@\n+body {}")),
///     ChangedFile::new("src/main.rs", Some("@@ -1 +1 @@\n-a\n+b")),
/// ];
/// let diff = aggregate(&files, &DiffFilter::default_filter());
/// assert_eq!(diff.text, "\n### File: src/main.rs\n@@ -1 +1 @@\n-a\n+b\n");
/// assert_eq!(diff.size_metric, 2);
/// assert_eq!(diff.skipped.len(), 1);
/// ```
pub fn aggregate(files: &[ChangedFile], filter: &DiffFilter) -> AggregatedDiff {
    let mut diff = AggregatedDiff::default();

    for file in files {
        if let Some(reason) = filter.check(file) {
            debug!(file = %file.filename, %reason, "skipping file");
            diff.skipped.push(SkippedFile {
                filename: file.filename.clone(),
                reason,
            });
            continue;
        }

        // `check` returned None, so the patch is present and non-empty.
        let patch = file.patch.as_deref().unwrap_or_default();
        diff.text.push_str(&format!("\n### File: {}\n{}\n", file.filename, patch));
        debug!(
            file = %file.filename,
            status = file.status.as_deref().unwrap_or("unknown"),
            additions = file.additions,
            deletions = file.deletions,
            "including file"
        );
        diff.size_metric += count_change_markers(patch);
        diff.included.push(file.filename.clone());
    }

    debug!(
        included = diff.included.len(),
        skipped = diff.skipped.len(),
        size = diff.size_metric,
        "aggregated diff"
    );
    diff
}

#[cfg(test)]
mod tests {
    use super::*;
    use prreview_core::SkipReason;

    fn patch_with_markers(added: usize, removed: usize) -> String {
        let mut patch = String::from("@@ -1,3 +1,80 @@");
        for i in 0..added {
            patch.push_str(&format!("\n+added line {i}"));
        }
        for i in 0..removed {
            patch.push_str(&format!("\n-removed line {i}"));
        }
        patch.push('\n');
        patch
    }

    #[test]
    fn all_filtered_files_give_empty_aggregate() {
        let files = vec![
            ChangedFile::new("app.css", Some("@@\n+a\n+b")),
            ChangedFile::new("logo.png", None),
            ChangedFile::new("src/lib.rs", Some("")),
            ChangedFile::new("pnpm-lock.yaml", Some("@@\n-x")),
        ];
        let diff = aggregate(&files, &DiffFilter::default_filter());
        assert!(diff.text.is_empty());
        assert_eq!(diff.size_metric, 0);
        assert!(diff.included.is_empty());
        assert_eq!(diff.skipped.len(), 4);
        assert_eq!(diff.skipped[1].reason, SkipReason::NoPatch);
    }

    #[test]
    fn empty_file_list_gives_empty_aggregate() {
        let diff = aggregate(&[], &DiffFilter::default_filter());
        assert_eq!(diff, AggregatedDiff::default());
    }

    #[test]
    fn metric_sums_markers_over_included_patches() {
        let a = patch_with_markers(40, 5);
        let b = patch_with_markers(30, 0);
        let files = vec![
            ChangedFile::new("src/a.rs", Some(&a)),
            ChangedFile::new("README.md", Some(&patch_with_markers(100, 100))),
            ChangedFile::new("src/b.ts", Some(&b)),
        ];
        let diff = aggregate(&files, &DiffFilter::default_filter());
        assert_eq!(diff.size_metric, 75);
        assert!(diff.meets_threshold(75));
        assert_eq!(diff.included, vec!["src/a.rs", "src/b.ts"]);
    }

    #[test]
    fn blocks_keep_input_order_and_headers() {
        let files = vec![
            ChangedFile::new("b.rs", Some("@@\n+b")),
            ChangedFile::new("a.rs", Some("@@\n+a")),
        ];
        let diff = aggregate(&files, &DiffFilter::default_filter());
        assert_eq!(
            diff.text,
            "\n### File: b.rs\n@@\n+b\n\n### File: a.rs\n@@\n+a\n"
        );
    }

    #[test]
    fn metric_counts_literal_sequences_inside_context() {
        // File headers count too; only the two-character sequence matters.
        assert_eq!(count_change_markers(" a\n b\n c"), 0);
        assert_eq!(count_change_markers("\n+++ b/file\n--- a/file"), 2);
        assert_eq!(count_change_markers("\n+\n+\n-"), 3);
        assert_eq!(count_change_markers("line\r\n+added"), 1);
    }

    #[test]
    fn host_line_counts_do_not_affect_metric() {
        let file = ChangedFile {
            status: Some("modified".into()),
            additions: 500,
            deletions: 200,
            ..ChangedFile::new("src/lib.rs", Some("@@\n-a\n+b"))
        };
        let diff = aggregate(&[file], &DiffFilter::default_filter());
        assert_eq!(diff.size_metric, 2);
        assert_eq!(diff.included, vec!["src/lib.rs"]);
    }
}
