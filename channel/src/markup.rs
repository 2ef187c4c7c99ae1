use std::sync::OnceLock;

use regex::Regex;

static BREAK_RE: OnceLock<Regex> = OnceLock::new();
static TAG_RE: OnceLock<Regex> = OnceLock::new();

/// Decodes presentation markup from fetched channel content.
///
/// Block breaks (`<br>`, `</p>`) become newlines, remaining tags are
/// stripped, and the entities fediverse servers commonly emit are
/// decoded. The parser only ever sees decoded text.
#[must_use]
pub fn decode_markup(content: &str) -> String {
    let breaks = BREAK_RE
        .get_or_init(|| Regex::new(r"(?i)<br\s*/?>|</p>").expect("static pattern"))
        .replace_all(content, "\n");
    let stripped = TAG_RE
        .get_or_init(|| Regex::new(r"<[^>]*>").expect("static pattern"))
        .replace_all(&breaks, "");
    decode_entities(&stripped)
}

fn decode_entities(text: &str) -> String {
    // &amp; decodes last so already-decoded ampersands are not re-expanded.
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}
