//! Response sanitizer for AI replies.
//!
//! Models are asked for bare JSON but often wrap it in a Markdown code block.
//! A reply is accepted in the form
//!
//! ```text
//! reply  := ws* fence-open? body fence-close? ws*
//! fence-open  := "```" lang? ws* newline?
//! fence-close := "```"
//! lang   := [A-Za-z0-9]+
//! ```
//!
//! [`strip_fences`] returns `body`; [`parse_json`] then decodes it, and any
//! failure is reported as a [`SanitizeError`] for the caller to turn into
//! its fallback value.

use serde::de::DeserializeOwned;
use thiserror::Error;

const FENCE: &str = "```";

/// Why a reply could not be decoded.
#[derive(Error, Debug)]
pub enum SanitizeError {
    #[error("reply is empty")]
    Empty,
    #[error("reply is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Remove an optional surrounding code fence (and its language tag).
pub fn strip_fences(raw: &str) -> &str {
    let mut body = raw.trim();

    if let Some(rest) = body.strip_prefix(FENCE) {
        let tag_len = rest
            .find(|c: char| !c.is_ascii_alphanumeric())
            .unwrap_or(rest.len());
        let after_tag = &rest[tag_len..];
        // A tag must be followed by whitespace, or `{`/`[` for an inline body.
        body = if tag_len > 0
            && after_tag.starts_with(|c: char| c.is_whitespace() || c == '{' || c == '[')
        {
            after_tag
        } else {
            rest
        };
        body = body.trim_start();
    }

    if let Some(rest) = body.strip_suffix(FENCE) {
        body = rest;
    }

    body.trim()
}

/// Strip fences from `raw` and decode the remaining body as JSON.
pub fn parse_json<T: DeserializeOwned>(raw: &str) -> Result<T, SanitizeError> {
    let body = strip_fences(raw);
    if body.is_empty() {
        return Err(SanitizeError::Empty);
    }
    Ok(serde_json::from_str(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Named {
        name: String,
    }

    #[test]
    fn bare_json_passes_through() {
        assert_eq!(strip_fences(r#"  {"name":"fan"}  "#), r#"{"name":"fan"}"#);
    }

    #[test]
    fn json_tagged_fence_is_removed() {
        let raw = "```json\n{\"name\":\"fan\"}\n```";
        assert_eq!(strip_fences(raw), r#"{"name":"fan"}"#);
    }

    #[test]
    fn untagged_fence_is_removed() {
        let raw = "\n```\n[1, 2]\n```\n";
        assert_eq!(strip_fences(raw), "[1, 2]");
    }

    #[test]
    fn crlf_fence_is_removed() {
        let raw = "```JSON\r\n{\"name\":\"fan\"}\r\n```";
        assert_eq!(strip_fences(raw), r#"{"name":"fan"}"#);
    }

    #[test]
    fn tag_followed_by_spaces_is_removed() {
        let raw = "```json \n{\"name\":\"fan\"}\n```";
        assert_eq!(strip_fences(raw), r#"{"name":"fan"}"#);
        let named: Named = parse_json(raw).unwrap();
        assert_eq!(named.name, "fan");
    }

    #[test]
    fn tag_on_same_line_as_body_is_removed() {
        let raw = "```json {\"name\":\"fan\"}```";
        assert_eq!(strip_fences(raw), r#"{"name":"fan"}"#);
        let named: Named = parse_json(raw).unwrap();
        assert_eq!(named.name, "fan");
        assert_eq!(strip_fences("```json[1, 2]```"), "[1, 2]");
    }

    #[test]
    fn single_line_fence_is_removed() {
        assert_eq!(strip_fences(r#"```{"name":"fan"}```"#), r#"{"name":"fan"}"#);
    }

    #[test]
    fn only_opening_fence_is_tolerated() {
        let raw = "```json\n{\"name\":\"fan\"}";
        assert_eq!(strip_fences(raw), r#"{"name":"fan"}"#);
    }

    #[test]
    fn parse_json_decodes_fenced_reply() {
        let named: Named = parse_json("```json\n{\"name\":\"Kettle\"}\n```").unwrap();
        assert_eq!(named.name, "Kettle");
    }

    #[test]
    fn parse_json_reports_empty_reply() {
        let err = parse_json::<Named>("```json\n```").unwrap_err();
        assert!(matches!(err, SanitizeError::Empty));
        let err = parse_json::<Named>("   ").unwrap_err();
        assert!(matches!(err, SanitizeError::Empty));
    }

    #[test]
    fn parse_json_reports_prose() {
        let err = parse_json::<Named>("Sorry, I cannot see the image.").unwrap_err();
        assert!(matches!(err, SanitizeError::Json(_)));
    }
}
