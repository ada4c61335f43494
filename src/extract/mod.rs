//! Turns an agent run result into course offerings.
//!
//! Agent output is free text that sometimes contains JSON, sometimes
//! fenced, sometimes wrapped in a `{"courses": [...]}` object, sometimes a
//! bare array with ad-hoc headers. Strategies are tried in order:
//!
//! 1. the run's final structured answer, validated as a whole collection;
//! 2. the text of a successful `done` action in any step;
//! 3. the controller response of each step.
//!
//! A `courses`-keyed object validated in any of these wins outright. Bare
//! arrays are staged and only used, after key standardization, when no such
//! object turns up. Every parse attempt is isolated; a bad fragment is
//! logged and skipped.

pub mod sniff;
pub mod standardize;

use crate::agent::{AgentRun, StepView};
use crate::json::{from_value_with_context, parse_json_with_context};
use crate::models::{Course, CourseOfferings};
use anyhow::Result;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

/// Where the returned offerings came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    FinalAnswer,
    DoneAction { step: usize },
    ControllerResponse { step: usize },
    /// Standardized rows from unstructured array fragments.
    Fragments { rows: usize },
}

/// Extract offerings from a run result. `None` means nothing usable was
/// found, which is not an error.
pub fn normalize<R: AgentRun + ?Sized>(result: &R) -> Option<CourseOfferings> {
    normalize_with_source(result).map(|(offerings, _)| offerings)
}

/// Like [`normalize`], also reporting which strategy produced the data.
pub fn normalize_with_source<R: AgentRun + ?Sized>(
    result: &R,
) -> Option<(CourseOfferings, Source)> {
    if let Some(answer) = result.final_answer().filter(|a| !a.trim().is_empty()) {
        match validate_text(&answer) {
            Ok(offerings) => {
                info!(courses = offerings.len(), "final answer validated");
                return Some((offerings, Source::FinalAnswer));
            }
            Err(e) => warn!(error = %e, "final answer is not a course collection, scanning steps"),
        }
    }

    let Some(steps) = result.steps() else {
        debug!("result exposes no steps");
        return None;
    };

    let mut staged: Vec<Map<String, Value>> = Vec::new();

    for (index, step) in steps.iter().enumerate() {
        let Some(text) = done_text(step) else {
            continue;
        };
        match sniff::courses_object(text) {
            Some(Ok(value)) => match validate_value(value) {
                Ok(offerings) => {
                    info!(step = index, courses = offerings.len(), "done action validated");
                    return Some((offerings, Source::DoneAction { step: index }));
                }
                Err(e) => warn!(step = index, error = %e, "done action courses did not validate"),
            },
            Some(Err(e)) => warn!(step = index, error = %e, "done action courses object is malformed"),
            None => match sniff::array_literal(text) {
                Some(Ok(items)) => {
                    let rows = stage(&mut staged, items);
                    debug!(step = index, rows, "staged array from done action");
                }
                Some(Err(e)) => warn!(step = index, error = %e, "done action brackets are not JSON"),
                None => {}
            },
        }
    }

    for (index, step) in steps.iter().enumerate() {
        let Some(response) = step
            .controller_response
            .as_deref()
            .filter(|r| !r.trim().is_empty())
        else {
            continue;
        };

        match sniff::fenced_json(response) {
            Some(Ok(Value::Object(map))) if map.contains_key("courses") => {
                match validate_value(Value::Object(map)) {
                    Ok(offerings) => {
                        info!(step = index, courses = offerings.len(), "fenced courses validated");
                        return Some((offerings, Source::ControllerResponse { step: index }));
                    }
                    Err(e) => warn!(step = index, error = %e, "fenced courses did not validate"),
                }
            }
            Some(Ok(Value::Array(items))) => {
                let rows = stage(&mut staged, items);
                debug!(step = index, rows, "staged fenced array");
            }
            Some(Ok(_)) => warn!(step = index, "fenced block is neither a collection nor an array"),
            Some(Err(e)) => warn!(step = index, error = %e, "could not decode fenced JSON"),
            None => {}
        }

        if staged.is_empty() {
            match sniff::object_array(response) {
                Some(Ok(items)) => {
                    let rows = stage(&mut staged, items);
                    debug!(step = index, rows, "staged inline array");
                }
                Some(Err(e)) => warn!(step = index, error = %e, "inline array is not JSON"),
                None => {}
            }
        }
    }

    if staged.is_empty() {
        debug!(steps = steps.len(), "no course data in any step");
        return None;
    }

    let offerings = assemble(staged);
    if offerings.is_empty() {
        return None;
    }
    let rows = offerings.len();
    info!(rows, "assembled courses from unstructured fragments");
    Some((offerings, Source::Fragments { rows }))
}

/// Text payload of a successful `done` action, if this step has one.
fn done_text(step: &StepView) -> Option<&str> {
    let done = step.action.as_ref()?.get("done")?;
    if done.get("success").and_then(Value::as_bool) != Some(true) {
        return None;
    }
    done.get("text").and_then(Value::as_str)
}

fn validate_text(text: &str) -> Result<CourseOfferings> {
    parse_json_with_context::<CourseOfferings>(text).and_then(usable)
}

fn validate_value(value: Value) -> Result<CourseOfferings> {
    from_value_with_context::<CourseOfferings>(value).and_then(usable)
}

/// Drops rows without a course code; a collection left empty is not usable.
fn usable(mut offerings: CourseOfferings) -> Result<CourseOfferings> {
    let before = offerings.len();
    offerings.courses.retain(Course::is_valid);
    let dropped = before - offerings.len();
    if dropped > 0 {
        warn!(dropped, "discarded courses without a course code");
    }
    if offerings.is_empty() {
        anyhow::bail!("collection contains no courses with a course code");
    }
    Ok(offerings)
}

/// Stage the object elements of a sniffed array; scalars and nested arrays
/// are not rows. Returns how many were staged.
fn stage(staged: &mut Vec<Map<String, Value>>, items: Vec<Value>) -> usize {
    let before = staged.len();
    staged.extend(items.into_iter().filter_map(|item| match item {
        Value::Object(row) => Some(row),
        _ => None,
    }));
    staged.len() - before
}

/// Standardize staged fragments into courses, keeping only valid rows.
fn assemble(staged: Vec<Map<String, Value>>) -> CourseOfferings {
    let mut courses = Vec::with_capacity(staged.len());
    for row in staged {
        let fields = standardize::standardize(&row);
        let keys: Vec<String> = fields.keys().cloned().collect();
        let mut course = Course::default();
        for (field, value) in fields {
            course.set(&field, value);
        }
        if course.is_valid() {
            courses.push(course);
        } else {
            warn!(?keys, "discarded fragment row without a course code");
        }
    }
    CourseOfferings::new(courses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentHistory;
    use serde_json::json;
    use std::cell::Cell;

    /// A run result assembled directly from capabilities.
    #[derive(Default)]
    struct FakeRun {
        answer: Option<String>,
        steps: Option<Vec<StepView>>,
        steps_calls: Cell<usize>,
    }

    impl AgentRun for FakeRun {
        fn final_answer(&self) -> Option<String> {
            self.answer.clone()
        }

        fn steps(&self) -> Option<Vec<StepView>> {
            self.steps_calls.set(self.steps_calls.get() + 1);
            self.steps.clone()
        }
    }

    fn course_json(code: &str) -> Value {
        json!({
            "course_code": code, "course_name": "Intro", "credits": "3",
            "instructor": "Dr. X", "room": "101", "days": "MW",
            "start_time": "09:00", "end_time": "10:15",
            "max_enrollment": "30", "total_enrollment": "28"
        })
    }

    fn response(text: &str) -> StepView {
        StepView {
            action: None,
            controller_response: Some(text.to_owned()),
        }
    }

    fn done(text: &str, success: bool) -> StepView {
        let mut action = Map::new();
        action.insert("done".into(), json!({"text": text, "success": success}));
        StepView {
            action: Some(action),
            controller_response: None,
        }
    }

    #[test]
    fn final_answer_short_circuits_steps() {
        let run = FakeRun {
            answer: Some(json!({"courses": [course_json("BCS101")]}).to_string()),
            steps: Some(vec![response("```json\n[{\"code\": \"OTHER\"}]\n```")]),
            ..Default::default()
        };

        let (offerings, source) = normalize_with_source(&run).unwrap();
        assert_eq!(source, Source::FinalAnswer);
        assert_eq!(offerings.len(), 1);
        assert_eq!(offerings.courses[0].course_code, "BCS101");
        assert_eq!(run.steps_calls.get(), 0);
    }

    #[test]
    fn invalid_final_answer_falls_through() {
        let run = FakeRun {
            answer: Some("I extracted the courses successfully.".into()),
            steps: Some(vec![response(&format!(
                "```json\n{}\n```",
                json!({"courses": [course_json("BCS102")]})
            ))]),
            ..Default::default()
        };

        let (offerings, source) = normalize_with_source(&run).unwrap();
        assert_eq!(source, Source::ControllerResponse { step: 0 });
        assert_eq!(offerings.courses[0].course_code, "BCS102");
    }

    #[test]
    fn fenced_courses_beat_loose_arrays() {
        let run = FakeRun {
            steps: Some(vec![
                response("```json\n[{\"Code\": \"LOOSE1\"}]\n```"),
                response(&format!(
                    "Here you go:\n```json\n{}\n```",
                    json!({"courses": [course_json("BCS101"), course_json("BCS102")]})
                )),
                response("[{\"Code\": \"LOOSE2\"}]"),
            ]),
            ..Default::default()
        };

        let offerings = normalize(&run).unwrap();
        let codes: Vec<&str> = offerings.courses.iter().map(|c| c.course_code.as_str()).collect();
        assert_eq!(codes, vec!["BCS101", "BCS102"]);
    }

    #[test]
    fn done_action_courses_object_wins() {
        let text = format!("Finished. {}", json!({"courses": [course_json("BCS201")]}));
        let run = FakeRun {
            steps: Some(vec![
                done("[{\"Code\": \"EARLY\"}]", true),
                done(&text, true),
            ]),
            ..Default::default()
        };

        let (offerings, source) = normalize_with_source(&run).unwrap();
        assert_eq!(source, Source::DoneAction { step: 1 });
        assert_eq!(offerings.courses[0].course_code, "BCS201");
    }

    #[test]
    fn unsuccessful_done_is_ignored() {
        let text = json!({"courses": [course_json("BCS201")]}).to_string();
        let run = FakeRun {
            steps: Some(vec![done(&text, false)]),
            ..Default::default()
        };
        assert!(normalize(&run).is_none());
    }

    #[test]
    fn bare_arrays_accumulate_in_step_order() {
        let run = FakeRun {
            steps: Some(vec![
                response("```json\n[{\"Course Code\": \"A1\", \"Professor\": \"Dr. A\"}]\n```"),
                response("Nothing here"),
                response(
                    "```json\n[{\"Course Code\": \"B1\", \"Room #\": \"204\"}, {\"Course Code\": \"B2\"}]\n```",
                ),
            ]),
            ..Default::default()
        };

        let (offerings, source) = normalize_with_source(&run).unwrap();
        assert_eq!(source, Source::Fragments { rows: 3 });
        let codes: Vec<&str> = offerings.courses.iter().map(|c| c.course_code.as_str()).collect();
        assert_eq!(codes, vec!["A1", "B1", "B2"]);
        assert_eq!(offerings.courses[0].instructor, "Dr. A");
        assert_eq!(offerings.courses[1].room, "204");
    }

    #[test]
    fn done_arrays_and_responses_combine() {
        let run = FakeRun {
            steps: Some(vec![
                done("Rows: [{\"code\": \"D1\"}]", true),
                response("```json\n[{\"code\": \"R1\"}]\n```"),
            ]),
            ..Default::default()
        };
        let codes: Vec<String> = normalize(&run)
            .unwrap()
            .courses
            .into_iter()
            .map(|c| c.course_code)
            .collect();
        assert_eq!(codes, vec!["D1", "R1"]);
    }

    #[test]
    fn inline_arrays_only_when_nothing_staged() {
        let run = FakeRun {
            steps: Some(vec![
                response("📄 Extracted: [{\"Course Code\": \"IN1\"}]"),
                response("📄 Extracted: [{\"Course Code\": \"IN2\"}]"),
            ]),
            ..Default::default()
        };
        let offerings = normalize(&run).unwrap();
        assert_eq!(offerings.len(), 1);
        assert_eq!(offerings.courses[0].course_code, "IN1");
    }

    #[test]
    fn scalar_arrays_do_not_block_inline_rows() {
        let run = FakeRun {
            steps: Some(vec![
                done("Visited result pages [1, 2, 3]", true),
                response("📄 Extracted: [{\"Course Code\": \"IN1\"}]"),
            ]),
            ..Default::default()
        };
        let (offerings, source) = normalize_with_source(&run).unwrap();
        assert_eq!(source, Source::Fragments { rows: 1 });
        assert_eq!(offerings.courses[0].course_code, "IN1");
    }

    #[test]
    fn unrecognized_columns_survive_fallback() {
        let run = FakeRun {
            steps: Some(vec![response(
                "```json\n[{\"Code\": \"X1\", \"Some Unrelated Field\": \"keep\"}]\n```",
            )]),
            ..Default::default()
        };
        let offerings = normalize(&run).unwrap();
        assert_eq!(offerings.courses[0].get("Some Unrelated Field"), Some("keep"));
    }

    #[test]
    fn rows_without_code_are_dropped() {
        let run = FakeRun {
            steps: Some(vec![response(
                "```json\n[{\"Instructor\": \"Dr. Nobody\"}, {\"Code\": \"K1\"}]\n```",
            )]),
            ..Default::default()
        };
        let offerings = normalize(&run).unwrap();
        assert_eq!(offerings.len(), 1);
        assert_eq!(offerings.courses[0].course_code, "K1");
    }

    #[test]
    fn malformed_fragments_are_skipped() {
        let run = FakeRun {
            answer: Some("{\"courses\": [".into()),
            steps: Some(vec![
                done("{\"courses\": [oops]}", true),
                done("see pages [next, last]", true),
                response("```json\n\"just a string\"\n```"),
                response("```json\n{not json}\n```"),
                response("```json\n[{\"code\": \"OK1\"}]\n```"),
            ]),
            ..Default::default()
        };
        let offerings = normalize(&run).unwrap();
        assert_eq!(offerings.courses[0].course_code, "OK1");
    }

    #[test]
    fn no_evidence_is_no_data() {
        let run = FakeRun {
            steps: Some(vec![response("Clicked the login button"), StepView::default()]),
            ..Default::default()
        };
        assert!(normalize(&run).is_none());
        assert!(normalize(&FakeRun::default()).is_none());
        assert!(normalize("plain text result").is_none());
    }

    #[test]
    fn empty_final_collection_is_not_usable() {
        let run = FakeRun {
            answer: Some("{\"courses\": []}".into()),
            steps: Some(Vec::new()),
            ..Default::default()
        };
        assert!(normalize(&run).is_none());
    }

    #[test]
    fn works_on_decoded_history() {
        let body = json!({
            "history": [
                {"model_output": {"action": [{"go_to_url": {"url": "https://portal"}}]},
                 "result": [{"extracted_content": "🔗 Navigated"}]},
                {"model_output": {"action": [{"extract_content": {"goal": "courses"}}]},
                 "result": [{"extracted_content": "```json\n[{\"Course Code\": \"H1\"}]\n```"}]},
                {"model_output": {"action": [{"done": {"text": "All done", "success": true}}]},
                 "result": [{"is_done": true, "extracted_content": "All done"}]}
            ]
        });
        let history = AgentHistory::from_json(&body.to_string(), "test").unwrap();
        let (offerings, source) = normalize_with_source(&history).unwrap();
        assert_eq!(source, Source::Fragments { rows: 1 });
        assert_eq!(offerings.courses[0].course_code, "H1");
    }
}
