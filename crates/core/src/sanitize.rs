//! HTML sanitization for user-supplied text.

use std::collections::HashSet;
use std::sync::LazyLock;

static PLAIN_TEXT: LazyLock<ammonia::Builder<'static>> = LazyLock::new(|| {
    let mut builder = ammonia::Builder::empty();
    builder.clean_content_tags(HashSet::from(["script", "style"]));
    builder
});

/// Strip all markup, keeping text content. Script and style bodies are dropped.
///
/// The result is text, not HTML: entities are decoded so `&` stays `&` and
/// lengths are measured in characters the user typed.
#[must_use]
pub fn plain_text(input: &str) -> String {
    let serialized = PLAIN_TEXT.clean(input).to_string();
    html_escape::decode_html_entities(&serialized).trim().to_string()
}

/// Keep safe formatting markup and drop scripts, event handlers and unsafe URLs.
#[must_use]
pub fn rich_text(input: &str) -> String {
    ammonia::clean(input)
}
