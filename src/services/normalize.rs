//! Cleanup of raw proposer output before it is written to disk.

const FENCE: &str = "```";

/// Strip enclosing markdown code fences and surrounding whitespace.
///
/// Handles an optional language tag on the opening fence (```` ```rust ````)
/// and repeated wrapping. The result never starts with a fence, so applying
/// this twice gives the same text as applying it once.
pub fn normalize_proposal(raw: &str) -> String {
    let mut text = raw.trim();

    while let Some(rest) = text.strip_prefix(FENCE) {
        let body = match rest.split_once('\n') {
            Some((tag, body)) if is_language_tag(tag) => body,
            _ => rest,
        };
        let body = body.trim_end();
        text = body.strip_suffix(FENCE).unwrap_or(body).trim();
    }

    text.to_string()
}

/// A fence info string: empty, or a single word like `js`, `c++`, `objective-c`.
fn is_language_tag(tag: &str) -> bool {
    let tag = tag.trim();
    tag.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '#' | '.' | '_'))
}
