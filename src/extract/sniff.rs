//! Pattern-based sniffers that pull JSON fragments out of free text.
//!
//! Each sniffer is pure: `None` means its pattern did not occur at all,
//! `Some(Err(_))` means the pattern matched but the fragment was not valid
//! JSON. The caller decides what to log and which sniffer to try next.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

pub type Sniffed<T> = Option<Result<T, serde_json::Error>>;

/// An object that mentions a `"courses"` array somewhere inside it.
static COURSES_OBJECT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)(\{.*"courses"\s*:\s*\[.*\].*\})"#).unwrap());

/// Everything from the first `[` to the last `]`.
static ARRAY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)\[(.*)\]").unwrap());

/// A fenced ```json code block, as LLMs like to emit.
static FENCED_JSON_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```json\s*(.*?)\s*```").unwrap());

/// A bracketed list of `{...}` objects.
static OBJECT_ARRAY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\[\s*\{.*?\}\s*(?:,\s*\{.*?\}\s*)*\]").unwrap()
});

/// First object literal containing a `"courses"` array.
pub fn courses_object(text: &str) -> Sniffed<Value> {
    let captures = COURSES_OBJECT_RE.captures(text)?;
    Some(serde_json::from_str(&captures[1]))
}

/// The outermost bracket-delimited array literal.
pub fn array_literal(text: &str) -> Sniffed<Vec<Value>> {
    let found = ARRAY_RE.find(text)?;
    Some(serde_json::from_str(found.as_str()))
}

/// Contents of the first fenced JSON code block, whatever its shape.
pub fn fenced_json(text: &str) -> Sniffed<Value> {
    let captures = FENCED_JSON_RE.captures(text)?;
    Some(serde_json::from_str(&captures[1]))
}

/// A looser inline array-of-objects match, for responses without fences.
pub fn object_array(text: &str) -> Sniffed<Vec<Value>> {
    let found = OBJECT_ARRAY_RE.find(text)?;
    Some(serde_json::from_str(found.as_str()))
}
