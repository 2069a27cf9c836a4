/// Build the single user message sent to the assistant.
///
/// # Examples
///
/// ```
/// use prreview_review::prompt::build_review_message;
///
/// let message = build_review_message("Review this.", "\n### File: a.rs\n+x\n");
/// assert_eq!(message, "Review this.\n\n\n### File: a.rs\n+x\n");
/// ```
pub fn build_review_message(prompt: &str, diff_text: &str) -> String {
    format!("{prompt}\n\n{diff_text}")
}

/// Comment posted when the diff is too small to be worth a review.
///
/// # Examples
///
/// ```
/// use prreview_review::prompt::skip_notice;
///
/// assert_eq!(
///     skip_notice(0),
///     "Skipping AI review: Diff size (0) is below threshold."
/// );
/// ```
pub fn skip_notice(size_metric: usize) -> String {
    format!("Skipping AI review: Diff size ({size_metric}) is below threshold.")
}
