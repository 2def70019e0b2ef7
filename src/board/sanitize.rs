//! Cleaning of user-supplied text before it reaches storage.

use std::sync::LazyLock;

use regex::Regex;

use crate::errors::BoardError;

// Script and style blocks go with their contents; any other tag goes alone.
static SCRIPT_BLOCK_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</(script|style)\s*>").unwrap()
});

static TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());

/// Trim, strip markup tags, and escape any angle bracket left over.
///
/// Only `<` and `>` are escaped, so text read back from storage and saved
/// again comes out unchanged: `clean(clean(x)) == clean(x)`.
pub fn clean(value: &str) -> String {
    let without_blocks = SCRIPT_BLOCK_REGEX.replace_all(value.trim(), "");
    let without_tags = TAG_REGEX.replace_all(&without_blocks, "");
    without_tags.trim().replace('<', "&lt;").replace('>', "&gt;")
}

/// Clean a required field. Absent or blank-after-cleaning input is rejected
/// with `"{field} is required"`.
pub fn required_text(value: Option<&str>, field: &str) -> Result<String, BoardError> {
    let cleaned = value.map(clean).unwrap_or_default();
    if cleaned.is_empty() {
        return Err(BoardError::validation(format!("{} is required", field)));
    }
    Ok(cleaned)
}

/// Clean an optional field; blank input becomes `None`.
pub fn optional_text(value: Option<&str>) -> Option<String> {
    value.map(clean).filter(|s| !s.is_empty())
}

/// Clean each tag, dropping the ones that end up empty. Order is kept.
pub fn clean_tags(tags: &[String]) -> Vec<String> {
    tags.iter()
        .map(|t| clean(t))
        .filter(|t| !t.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_strips_script_blocks() {
        let cleaned = clean(r#"<script>alert("xss")</script>Test Card"#);
        assert!(!cleaned.contains("<script>"));
        assert!(!cleaned.contains("alert"));
        assert_eq!(cleaned, "Test Card");
    }

    #[test]
    fn test_clean_strips_event_handler_attributes() {
        let cleaned = clean("<img src=x onerror=alert(1)>Description");
        assert!(!cleaned.contains("onerror"));
        assert_eq!(cleaned, "Description");
    }

    #[test]
    fn test_clean_keeps_inner_text_of_ordinary_tags() {
        assert_eq!(clean("  <b>bold</b> move  "), "bold move");
    }

    #[test]
    fn test_clean_escapes_stray_brackets() {
        assert_eq!(clean("a > b"), "a &gt; b");
    }

    #[test]
    fn test_clean_keeps_ampersands_and_entities() {
        assert_eq!(clean("Q&A prep"), "Q&A prep");
        assert_eq!(clean("5 &gt; 3"), "5 &gt; 3");
    }

    #[test]
    fn test_clean_is_idempotent() {
        for input in [
            "Q&A prep",
            "a > b",
            "x < y",
            "<b>R&D</b> review",
            r#"<script>alert("xss")</script>ok"#,
            "tom &amp; jerry",
        ] {
            let once = clean(input);
            assert_eq!(clean(&once), once, "input: {:?}", input);
        }
    }

    #[test]
    fn test_clean_leaves_plain_text_alone() {
        assert_eq!(clean("#ff0000"), "#ff0000");
        assert_eq!(clean("🎯"), "🎯");
    }

    #[test]
    fn test_required_text_rejects_blank() {
        let err = required_text(Some("   "), "Title").unwrap_err();
        assert_eq!(err.to_string(), "Title is required");

        let err = required_text(None, "Name").unwrap_err();
        assert_eq!(err.to_string(), "Name is required");

        // Markup-only input is blank once stripped
        assert!(required_text(Some("<br/>"), "Title").is_err());
    }

    #[test]
    fn test_optional_text() {
        assert_eq!(optional_text(None), None);
        assert_eq!(optional_text(Some("  ")), None);
        assert_eq!(optional_text(Some(" notes ")), Some("notes".to_string()));
    }

    #[test]
    fn test_clean_tags_drops_empty() {
        let tags = vec![" urgent ".to_string(), "".to_string(), "<i>ui</i>".to_string()];
        assert_eq!(clean_tags(&tags), vec!["urgent", "ui"]);
    }
}
