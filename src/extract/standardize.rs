//! Maps loosely-named column keys onto canonical course field names.
//!
//! Rows recovered from unstructured agent output use whatever headers the
//! model felt like ("Professor", "Room #", "Start Time"). Keys are matched
//! case-insensitively by substring against an ordered rule list; the first
//! matching rule wins. Keys no rule recognizes are kept under their original
//! name rather than dropped.

use indexmap::IndexMap;
use serde_json::{Map, Value};

enum Needle {
    /// Key contains any of these substrings.
    Any(&'static [&'static str]),
    /// Key contains all of these substrings.
    All(&'static [&'static str]),
}

impl Needle {
    fn matches(&self, key: &str) -> bool {
        match self {
            Needle::Any(parts) => parts.iter().any(|p| key.contains(p)),
            Needle::All(parts) => parts.iter().all(|p| key.contains(p)),
        }
    }
}

/// Evaluated top to bottom. "instructor"/"professor" precedes "name" so that
/// headers like "Professor Name" resolve to the instructor column.
const RULES: &[(Needle, &str)] = &[
    (Needle::Any(&["code"]), "course_code"),
    (Needle::Any(&["instructor", "professor"]), "instructor"),
    (Needle::Any(&["name"]), "course_name"),
    (Needle::Any(&["credit"]), "credits"),
    (Needle::Any(&["room"]), "room"),
    (Needle::Any(&["day"]), "days"),
    (Needle::All(&["start", "time"]), "start_time"),
    (Needle::All(&["end", "time"]), "end_time"),
    (Needle::All(&["max", "enr"]), "max_enrollment"),
    (Needle::All(&["total", "enr"]), "total_enrollment"),
];

/// Canonical field for a source key, if any rule matches it.
pub fn canonical_field(key: &str) -> Option<&'static str> {
    let lower = key.to_lowercase();
    RULES
        .iter()
        .find(|(needle, _)| needle.matches(&lower))
        .map(|(_, field)| *field)
}

/// Rename the keys of one row. Values are flattened to text.
///
/// When several source keys map to the same field, the last one wins.
pub fn standardize(row: &Map<String, Value>) -> IndexMap<String, String> {
    let mut out = IndexMap::with_capacity(row.len());
    for (key, value) in row {
        let target = canonical_field(key).unwrap_or(key.as_str());
        out.insert(target.to_owned(), value_to_text(value));
    }
    out
}

/// Cell text for a JSON value: strings verbatim, null as empty, scalars via
/// their display form, anything nested as compact JSON.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}
