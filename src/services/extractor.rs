// src/services/extractor.rs
//! Locate the JSON payload inside free-text model output.
//!
//! Each strategy is an independent probe returning `Some(payload)` on a hit.
//! Probes are tried in order and the first hit wins; when none match the
//! original text is handed back untouched so the decoder can report it.

type JsonProbe = fn(&str) -> Option<&str>;

/// Ordered extraction strategies.
const PROBES: &[(&str, JsonProbe)] = &[
    ("fenced block", fenced_block),
    ("bracket span", bracket_span),
];

pub fn extract_json(text: &str) -> &str {
    PROBES
        .iter()
        .find_map(|(_, probe)| probe(text))
        .unwrap_or(text)
}

/// Name of the probe that would match, for diagnostics.
pub fn matching_probe(text: &str) -> Option<&'static str> {
    PROBES
        .iter()
        .find(|(_, probe)| probe(text).is_some())
        .map(|(name, _)| *name)
}

/// First ```` ``` ```` fenced block, optionally tagged `json`.
fn fenced_block(text: &str) -> Option<&str> {
    const FENCE: &str = "```";

    let open = text.find(FENCE)?;
    let after_open = &text[open + FENCE.len()..];
    let body = after_open.strip_prefix("json").unwrap_or(after_open);
    let close = body.find(FENCE)?;

    Some(body[..close].trim())
}

/// Span from the leftmost opening bracket to the last closing bracket of the
/// same kind. An opener with no matching closer after it is skipped.
fn bracket_span(text: &str) -> Option<&str> {
    text.char_indices()
        .filter_map(|(start, c)| match c {
            '[' => Some((start, ']')),
            '{' => Some((start, '}')),
            _ => None,
        })
        .find_map(|(start, close)| {
            let end = text.rfind(close)?;
            (end > start).then(|| text[start..=end].trim())
        })
}
