//! JSON decoding with error messages that point at the offending field.
//!
//! Agent output is written by an LLM, so schema mismatches are routine. These
//! helpers keep the serde path (`courses[3].credits`) and a snippet of the
//! source line in the error, which is what ends up in the warning logs.

use anyhow::Result;
use serde::de::DeserializeOwned;

/// Parse JSON text and, on failure, include the serde path, the type mismatch
/// and a snippet of the line where decoding stopped.
pub fn parse_json_with_context<T: DeserializeOwned>(body: &str) -> Result<T> {
    let jd = &mut serde_json::Deserializer::from_str(body);
    match serde_path_to_error::deserialize(jd) {
        Ok(value) => Ok(value),
        Err(err) => {
            let inner_err = err.inner();
            let (line, column) = (inner_err.line(), inner_err.column());
            let path = err.path().to_string();

            let msg = inner_err.to_string();
            let loc = format!(" at line {line} column {column}");
            let msg_without_loc = msg.strip_suffix(&loc).unwrap_or(&msg);

            let mut final_err = path_prefix(&path);
            final_err.push_str(&format!(
                "{} (line {} col {})\n{}",
                describe_mismatch(msg_without_loc),
                line,
                column,
                error_snippet(body, line, column, 20)
            ));

            Err(anyhow::anyhow!(final_err))
        }
    }
}

/// Decode an already-parsed JSON value, reporting the serde path on failure.
///
/// Used when a fragment was sniffed out of free text and parsed generically
/// before its shape was known.
pub fn from_value_with_context<T: DeserializeOwned>(value: serde_json::Value) -> Result<T> {
    match serde_path_to_error::deserialize(value) {
        Ok(value) => Ok(value),
        Err(err) => {
            let path = err.path().to_string();
            let mut final_err = path_prefix(&path);
            final_err.push_str(&describe_mismatch(&err.inner().to_string()));
            Err(anyhow::anyhow!(final_err))
        }
    }
}

fn path_prefix(path: &str) -> String {
    if !path.is_empty() && path != "." {
        format!("at path '{path}': ")
    } else {
        String::new()
    }
}

/// Rewrite serde's "invalid type: X, expected Y" into "expected Y, got X".
///
/// Other messages are returned with any trailing location removed.
fn describe_mismatch(error_msg: &str) -> String {
    if let Some(invalid_start) = error_msg.find("invalid type: ") {
        let after_prefix = &error_msg[invalid_start + "invalid type: ".len()..];

        if let Some(comma_pos) = after_prefix.find(", expected ") {
            let actual_type = &after_prefix[..comma_pos];
            let expected_part = &after_prefix[comma_pos + ", expected ".len()..];
            let expected_type = expected_part
                .split(" at line ")
                .next()
                .unwrap_or(expected_part)
                .trim();

            return format!("expected {expected_type}, got {actual_type}");
        }
    }

    error_msg
        .split(" at line ")
        .next()
        .unwrap_or(error_msg)
        .to_string()
}

fn error_snippet(body: &str, line: usize, column: usize, context_len: usize) -> String {
    let target_line = body.lines().nth(line.saturating_sub(1)).unwrap_or("");
    if target_line.is_empty() {
        return "(empty line)".to_string();
    }

    // Work in chars: agent text regularly contains non-ASCII names
    let chars: Vec<char> = target_line.chars().collect();
    let error_idx = column.saturating_sub(1).min(chars.len());

    let half_len = context_len / 2;
    let start = error_idx.saturating_sub(half_len);
    let end = (error_idx + half_len).min(chars.len());

    let slice: String = chars[start..end].iter().collect();
    let indicator = " ".repeat(error_idx - start) + "^";

    format!("...{slice}...\n   {indicator}")
}
