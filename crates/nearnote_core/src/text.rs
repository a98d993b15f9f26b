//! Character-budget helpers shared by notification copy and log sanitizing.

/// Marker appended when text is cut to fit a character budget.
pub const ELLIPSIS: &str = "...";

/// Keeps the first `max_chars` Unicode scalar values of `value`, appending
/// [`ELLIPSIS`] only when something was actually cut.
pub fn truncate_with_ellipsis(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((cut, _)) => {
            let mut truncated = value[..cut].to_string();
            truncated.push_str(ELLIPSIS);
            truncated
        }
        None => value.to_string(),
    }
}
