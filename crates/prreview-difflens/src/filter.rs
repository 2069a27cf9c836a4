//! Decides which changed files are reviewable.
//!
//! Matching is a case-insensitive suffix test against the configured
//! extension list, followed by optional glob patterns over the full path.

use prreview_core::{ChangedFile, ReviewConfig, SkipReason, DEFAULT_IGNORE_EXTENSIONS};
use tracing::warn;

/// Files and patterns to skip before sending to the assistant.
///
/// # Examples
///
/// ```
/// use prreview_difflens::filter::DiffFilter;
///
/// let filter = DiffFilter::default_filter();
/// assert!(filter.should_skip("Cargo.lock"));
/// assert!(filter.should_skip("assets/LOGO.PNG"));
/// assert!(!filter.should_skip("src/main.rs"));
/// ```
#[derive(Debug, Clone)]
pub struct DiffFilter {
    ignore_extensions: Vec<String>,
    skip_patterns: Vec<glob::Pattern>,
}

impl DiffFilter {
    /// Create a filter with the built-in extension list and no patterns.
    pub fn default_filter() -> Self {
        Self {
            ignore_extensions: DEFAULT_IGNORE_EXTENSIONS
                .iter()
                .map(|ext| ext.to_ascii_lowercase())
                .collect(),
            skip_patterns: Vec::new(),
        }
    }

    /// Create a filter from review configuration.
    ///
    /// Invalid glob patterns are dropped with a warning.
    ///
    /// # Examples
    ///
    /// ```
    /// use prreview_core::ReviewConfig;
    /// use prreview_difflens::filter::DiffFilter;
    ///
    /// let config = ReviewConfig {
    ///     skip_patterns: vec!["dist/**".into()],
    ///     extra_ignore_extensions: vec![".snap".into()],
    ///     ..ReviewConfig::default()
    /// };
    /// let filter = DiffFilter::from_config(&config);
    /// assert!(filter.should_skip("dist/bundle.js"));
    /// assert!(filter.should_skip("tests/__snapshots__/app.test.tsx.snap"));
    /// ```
    pub fn from_config(config: &ReviewConfig) -> Self {
        let mut skip_patterns = Vec::new();
        for pat in &config.skip_patterns {
            match glob::Pattern::new(pat) {
                Ok(p) => skip_patterns.push(p),
                Err(e) => warn!(pattern = %pat, error = %e, "ignoring invalid skip pattern"),
            }
        }

        Self {
            ignore_extensions: config
                .all_ignore_extensions()
                .map(str::to_ascii_lowercase)
                .collect(),
            skip_patterns,
        }
    }

    /// Check if a single path should be skipped on name alone.
    pub fn should_skip(&self, filename: &str) -> bool {
        self.check_name(filename).is_some()
    }

    /// Return why `file` is left out of the aggregate, or `None` to keep it.
    ///
    /// An absent or empty patch wins over every name rule.
    ///
    /// # Examples
    ///
    /// ```
    /// use prreview_core::{ChangedFile, SkipReason};
    /// use prreview_difflens::filter::DiffFilter;
    ///
    /// let filter = DiffFilter::default_filter();
    /// let file = ChangedFile::new("src/lib.rs", None);
    /// assert_eq!(filter.check(&file), Some(SkipReason::NoPatch));
    /// ```
    pub fn check(&self, file: &ChangedFile) -> Option<SkipReason> {
        match file.patch.as_deref() {
            None | Some("") => Some(SkipReason::NoPatch),
            Some(_) => self.check_name(&file.filename),
        }
    }

    fn check_name(&self, filename: &str) -> Option<SkipReason> {
        let lowered = filename.to_ascii_lowercase();
        if let Some(ext) = self
            .ignore_extensions
            .iter()
            .find(|ext| lowered.ends_with(ext.as_str()))
        {
            return Some(SkipReason::IgnoredExtension(ext.clone()));
        }

        self.skip_patterns
            .iter()
            .find(|pat| pat.matches(filename))
            .map(|pat| SkipReason::PatternMatch(pat.to_string()))
    }
}

impl Default for DiffFilter {
    fn default() -> Self {
        Self::default_filter()
    }
}
