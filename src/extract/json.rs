//! Recovery of JSON from free-text model output.
//!
//! Models wrap JSON in markdown fences, add commentary around it, and
//! produce small syntax slips. Recovery is: trim, unwrap a fenced block (or
//! strip stray backticks), slice to the outermost object/array span, parse,
//! and on failure run one mechanical repair pass before parsing again.

use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

/// Model output that could not be recovered as JSON.
#[derive(Debug, Clone, Error)]
#[error("Could not recover JSON from model response: {message}")]
pub struct ExtractionParseError {
    pub message: String,
    /// The unmodified model response, for diagnostics.
    pub raw: String,
}

impl ExtractionParseError {
    pub fn new(message: impl Into<String>, raw: &str) -> Self {
        Self {
            message: message.into(),
            raw: raw.to_string(),
        }
    }
}

static FENCED_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```[A-Za-z0-9_-]*[ \t]*\r?\n?(.*?)```").unwrap());

/// Parse model output into `T`, recovering JSON from surrounding noise.
pub fn parse_model_json<T: DeserializeOwned>(text: &str) -> Result<T, ExtractionParseError> {
    let value = recover_json_value(text)?;
    serde_json::from_value(value)
        .map_err(|e| ExtractionParseError::new(format!("unexpected shape: {}", e), text))
}

/// Recover a `serde_json::Value` from model output.
///
/// When the span starting at the first opener does not parse, later openers
/// are tried in turn so preambles like `Found [2] jobs:` are skipped.
pub fn recover_json_value(text: &str) -> Result<Value, ExtractionParseError> {
    let unwrapped = unwrap_fences(text.trim());
    let mut starts = unwrapped.match_indices(['{', '[']).map(|(i, _)| i);
    let first = starts
        .next()
        .ok_or_else(|| ExtractionParseError::new("no JSON object or array found", text))?;

    let message = match parse_span(&unwrapped, first) {
        Ok(value) => return Ok(value),
        Err(message) => message,
    };
    for start in starts {
        if let Ok(value) = parse_span(&unwrapped, start) {
            debug!("Recovered model JSON from offset {}", start);
            return Ok(value);
        }
    }
    Err(ExtractionParseError::new(message, text))
}

/// Parse the span opening at `start`, with one repair pass on failure.
fn parse_span(text: &str, start: usize) -> Result<Value, String> {
    let candidate = json_span(text, start).ok_or("no matching closing bracket")?;

    match serde_json::from_str::<Value>(candidate) {
        Ok(value) => Ok(value),
        Err(first) => {
            debug!("Direct JSON parse failed ({}), attempting repair", first);
            let repaired = repair_json(candidate);
            match serde_json::from_str::<Value>(&repaired) {
                Ok(value) => {
                    warn!("Recovered model JSON after repair");
                    Ok(value)
                }
                Err(second) => Err(format!("{} (after repair: {})", first, second)),
            }
        }
    }
}

/// Take the interior of the first fenced code block, or strip stray backticks.
fn unwrap_fences(text: &str) -> String {
    if let Some(inner) = FENCED_BLOCK.captures(text).and_then(|c| c.get(1)) {
        return inner.as_str().trim().to_string();
    }
    text.trim_matches('`').trim().to_string()
}

/// Slice from the opener at `start` to the last matching closer.
fn json_span(text: &str, start: usize) -> Option<&str> {
    let closer = if text[start..].starts_with('{') { '}' } else { ']' };
    let end = text.rfind(closer)?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Mechanical fixes: drop trailing commas before `}`/`]`, escape raw
/// newlines and tabs inside strings, and double invalid backslash escapes.
fn repair_json(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 16);
    let mut in_string = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if in_string {
            match c {
                '\\' => match chars.get(i + 1) {
                    Some(&next @ ('"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't' | 'u')) => {
                        out.push('\\');
                        out.push(next);
                        i += 1;
                    }
                    _ => out.push_str("\\\\"),
                },
                '"' => {
                    in_string = false;
                    out.push(c);
                }
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                _ => out.push(c),
            }
        } else {
            match c {
                '"' => {
                    in_string = true;
                    out.push(c);
                }
                ',' => {
                    let next = chars[i + 1..].iter().find(|ch| !ch.is_whitespace());
                    if !matches!(next, Some('}') | Some(']')) {
                        out.push(c);
                    }
                }
                _ => out.push(c),
            }
        }
        i += 1;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Job {
        title: String,
        remote: bool,
    }

    #[test]
    fn test_plain_json() {
        let job: Job = parse_model_json(r#"{"title": "Rust Dev", "remote": true}"#).unwrap();
        assert_eq!(
            job,
            Job {
                title: "Rust Dev".to_string(),
                remote: true
            }
        );
    }

    #[test]
    fn test_fenced_block() {
        let text = "Here you go:\n```json\n{\"title\": \"Rust Dev\", \"remote\": false}\n```\nGood luck!";
        let job: Job = parse_model_json(text).unwrap();
        assert_eq!(job.title, "Rust Dev");
        assert!(!job.remote);
    }

    #[test]
    fn test_fenced_block_without_language() {
        let text = "```\n[{\"title\": \"A\", \"remote\": true}]\n```";
        let jobs: Vec<Job> = parse_model_json(text).unwrap();
        assert_eq!(jobs.len(), 1);
    }

    #[test]
    fn test_stray_backticks() {
        let jobs: Vec<Job> = parse_model_json("`[{\"title\": \"A\", \"remote\": true}]`").unwrap();
        assert_eq!(jobs[0].title, "A");
    }

    #[test]
    fn test_preamble_and_postamble_discarded() {
        let text = "Sure! The listings are: [{\"title\": \"A\", \"remote\": true}] Let me know.";
        let jobs: Vec<Job> = parse_model_json(text).unwrap();
        assert_eq!(jobs.len(), 1);
    }

    #[test]
    fn test_trailing_comma_repaired() {
        let fenced = "```json\n{\"title\": \"Rust Dev\", \"remote\": true,}\n```";
        let job: Job = parse_model_json(fenced).unwrap();
        assert_eq!(job.title, "Rust Dev");

        let array = "[{\"title\": \"A\", \"remote\": true}, ]";
        let jobs: Vec<Job> = parse_model_json(array).unwrap();
        assert_eq!(jobs.len(), 1);
    }

    #[test]
    fn test_raw_newline_in_string_repaired() {
        let text = "{\"title\": \"Line one\nLine two\", \"remote\": false}";
        let job: Job = parse_model_json(text).unwrap();
        assert_eq!(job.title, "Line one\nLine two");
    }

    #[test]
    fn test_comma_inside_string_untouched() {
        let repaired = repair_json(r#"{"title": "a, ]", "x": 1,}"#);
        assert_eq!(repaired, r#"{"title": "a, ]", "x": 1}"#);
    }

    #[test]
    fn test_invalid_escape_doubled() {
        let value = recover_json_value(r#"{"path": "C:\Users\me"}"#).unwrap();
        assert_eq!(value["path"], "C:\\Users\\me");
    }

    #[test]
    fn test_bracketed_preamble_skipped() {
        let text = "Found [2] jobs: [{\"title\": \"A\", \"remote\": true}, {\"title\": \"B\", \"remote\": false}]";
        let jobs: Vec<Job> = parse_model_json(text).unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[1].title, "B");
    }

    #[test]
    fn test_prose_fails_with_raw_text() {
        let text = "I could not find any job listings on this page.";
        let err = recover_json_value(text).unwrap_err();
        assert_eq!(err.raw, text);
    }

    #[test]
    fn test_unrepairable_fails() {
        let err = recover_json_value("{\"title\": \"A\" \"remote\": }").unwrap_err();
        assert!(err.message.contains("after repair"));
    }

    #[test]
    fn test_wrong_shape_is_parse_error() {
        let result: Result<Job, _> = parse_model_json(r#"{"name": "x"}"#);
        assert!(result.is_err());
    }
}
