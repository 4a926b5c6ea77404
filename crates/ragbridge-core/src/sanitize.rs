//! Removal of inline citation markers from assistant answers.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

/// File-search footnotes such as `【3:1†source】`.
#[expect(clippy::expect_used)]
static CITATION_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"【\d+:\d+†\w+】").expect("citation pattern is valid"));

/// Remove every citation marker, leaving surrounding text untouched.
///
/// Borrows the input when it contains no markers.
pub fn strip_citations(text: &str) -> Cow<'_, str> {
    CITATION_MARKER.replace_all(text, "")
}
