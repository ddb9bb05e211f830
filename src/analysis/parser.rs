//! Scanner for the proxy's tag-delimited reply format.
//!
//! The wire format is deliberately minimal: a flat set of
//! `<tag>value</tag>` fields with no attributes, no nesting and no repeated
//! tags. A linear scan per field is all it takes; a real markup parser
//! would be the wrong tool here.

use crate::models::RawInsight;

const TAG_PATTERN_TYPE: &str = "pattern_type";
const TAG_HC_RELATED: &str = "hc_related";
const TAG_EXPLANATION: &str = "explanation";
const TAG_CHALLENGE: &str = "micro_challenge_prompt";
const TAG_HIGHLIGHT: &str = "highlight_suggestion_css_selector";
const TAG_ORIGINAL_SEGMENT: &str = "original_text_segment";

/// Parse the proxy reply into an insight.
///
/// Returns `None` when the input is empty or any required field's tag is
/// missing. A tag that is present but empty yields an empty string for the
/// required fields and `None` for the optional ones.
pub fn parse_response(raw: &str) -> Option<RawInsight> {
    if raw.trim().is_empty() {
        return None;
    }

    let pattern_type = extract_tag(raw, TAG_PATTERN_TYPE)?;
    let explanation = extract_tag(raw, TAG_EXPLANATION)?;
    let challenge_prompt = extract_tag(raw, TAG_CHALLENGE)?;

    Some(RawInsight {
        pattern_type,
        related_skill_id: extract_optional_tag(raw, TAG_HC_RELATED),
        explanation,
        challenge_prompt,
        highlight_selector: extract_optional_tag(raw, TAG_HIGHLIGHT),
        original_text_segment: extract_optional_tag(raw, TAG_ORIGINAL_SEGMENT),
    })
}

/// First `<name>..</name>` occurrence, trimmed. `None` when either
/// delimiter is absent.
fn extract_tag(raw: &str, name: &str) -> Option<String> {
    let open = format!("<{name}>");
    let close = format!("</{name}>");

    let start = raw.find(&open)? + open.len();
    let end = raw[start..].find(&close)? + start;
    Some(raw[start..end].trim().to_string())
}

/// Like `extract_tag`, but absent and empty both collapse to `None`.
fn extract_optional_tag(raw: &str, name: &str) -> Option<String> {
    extract_tag(raw, name).filter(|value| !value.is_empty())
}
