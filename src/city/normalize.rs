//! Comparison form for city names and queries.
//!
//! Applied identically to catalog entries and to queries; the exact-match
//! index is keyed on this form.

/// Lowercase, turn anything but ASCII letters, digits and whitespace into a
/// space, then collapse whitespace runs and trim.
pub fn normalize(text: &str) -> String {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}
