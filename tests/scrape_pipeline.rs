//! End-to-end: task prompt -> agent -> extraction -> CSV/XLSX on disk.

use async_trait::async_trait;
use calamine::{Reader, Xlsx, open_workbook};
use offerings::agent::{Agent, AgentError, AgentHistory, AgentTask, ReplayAgent, Secrets};
use offerings::app::{App, RunSettings};
use offerings::extract::Source;
use offerings::models::{CourseFilters, FIELD_NAMES};
use offerings::persist::{self, SHEET_NAME};
use serde_json::json;
use std::path::Path;
use std::sync::Mutex;

/// Agent stand-in that records the task it was given and returns a canned history.
struct CannedAgent {
    history: serde_json::Value,
    seen: Mutex<Option<AgentTask>>,
}

impl CannedAgent {
    fn new(history: serde_json::Value) -> Self {
        Self {
            history,
            seen: Mutex::new(None),
        }
    }
}

#[async_trait]
impl Agent for CannedAgent {
    async fn run(&self, task: &AgentTask) -> Result<AgentHistory, AgentError> {
        *self.seen.lock().unwrap() = Some(task.clone());
        AgentHistory::from_json(&self.history.to_string(), "canned")
    }
}

fn settings() -> RunSettings {
    RunSettings {
        max_steps: 100,
        max_actions_per_step: 4,
        portal_url: "https://portal.example/student/login.asp".into(),
    }
}

const FINAL_ANSWER: &str = r#"{"courses":[{"course_code":"BCS101","course_name":"Intro","credits":"3","instructor":"Dr. X","room":"101","days":"MW","start_time":"09:00","end_time":"10:15","max_enrollment":"30","total_enrollment":"28"}]}"#;

fn final_answer_history() -> serde_json::Value {
    json!({
        "history": [
            {
                "model_output": {"action": [{"go_to_url": {"url": "https://portal.example"}}]},
                "result": [{"extracted_content": "```json\n[{\"Code\": \"DECOY\"}]\n```"}]
            },
            {
                "model_output": {"action": [{"done": {"text": FINAL_ANSWER, "success": true}}]},
                "result": [{"is_done": true, "success": true, "extracted_content": FINAL_ANSWER}]
            }
        ]
    })
}

fn read_xlsx(path: &Path) -> Vec<Vec<String>> {
    let mut workbook: Xlsx<_> = open_workbook(path).unwrap();
    let range = workbook.worksheet_range(SHEET_NAME).unwrap();
    range
        .rows()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect()
}

#[tokio::test]
async fn filtered_scrape_saves_one_course() {
    let agent = CannedAgent::new(final_answer_history());
    let app = App::new(agent, settings());

    let mut filters = CourseFilters::default();
    filters.set("course_code", "BCS101");
    let secrets = Secrets::new("student", "s3cret-pass");

    let outcome = app.scrape(&secrets, &filters).await.unwrap();
    assert_eq!(outcome.source, Some(Source::FinalAnswer));

    let offerings = outcome.offerings.unwrap();
    assert_eq!(offerings.len(), 1);
    let course = &offerings.courses[0];
    assert_eq!(course.course_code, "BCS101");
    assert_eq!(course.course_name, "Intro");
    assert_eq!(course.credits, "3");
    assert_eq!(course.instructor, "Dr. X");
    assert_eq!(course.room, "101");
    assert_eq!(course.days, "MW");
    assert_eq!(course.start_time, "09:00");
    assert_eq!(course.end_time, "10:15");
    assert_eq!(course.max_enrollment, "30");
    assert_eq!(course.total_enrollment, "28");

    let dir = tempfile::tempdir().unwrap();
    let files = persist::save(&offerings, dir.path()).unwrap();
    assert_eq!(files.csv, dir.path().join("results.csv"));

    let csv = std::fs::read_to_string(&files.csv).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], FIELD_NAMES.join(","));
    assert!(lines[1].starts_with("BCS101,Intro,3,Dr. X,101,MW,09:00,10:15,30,28"));
}

#[tokio::test]
async fn task_carries_filters_but_not_credentials() {
    let agent = CannedAgent::new(final_answer_history());
    let app = App::new(agent, settings());

    let mut filters = CourseFilters::default();
    filters.set("course_code", "BCS101");
    let secrets = Secrets::new("jdoe42", "s3cret-pass");
    app.scrape(&secrets, &filters).await.unwrap();

    let seen = app_agent_task(&app);
    assert!(seen.task.contains("course_code [BCS101]"));
    assert!(seen.task.contains("https://portal.example/student/login.asp"));
    assert!(!seen.task.contains("s3cret-pass"));
    assert!(!seen.task.contains("jdoe42"));
    assert_eq!(seen.secrets, secrets);
    assert_eq!(seen.max_steps, 100);
    assert!(seen.output_schema.is_some());
}

fn app_agent_task(app: &App<CannedAgent>) -> AgentTask {
    app.agent().seen.lock().unwrap().clone().unwrap()
}

#[tokio::test]
async fn instruct_requests_schema_only_for_extractions() {
    let app = App::new(CannedAgent::new(json!({"history": []})), settings());
    let secrets = Secrets::new("student", "pw");

    let outcome = app.instruct(&secrets, "Check my current GPA", true).await.unwrap();
    assert!(outcome.offerings.is_none());
    assert!(app_agent_task(&app).output_schema.is_none());

    app.instruct(&secrets, "Extract all courses with code BCS101", true)
        .await
        .unwrap();
    assert!(app_agent_task(&app).output_schema.is_some());

    app.instruct(&secrets, "Extract all courses with code BCS101", false)
        .await
        .unwrap();
    assert!(app_agent_task(&app).output_schema.is_none());
}

#[tokio::test]
async fn fragments_round_trip_through_both_files() {
    let history = json!({
        "history": [
            {"result": [{"extracted_content": "```json\n[{\"Course Code\": \"A1\", \"Professor Name\": \"Dr. Smith\", \"Section\": \"01\"}]\n```"}]},
            {"result": [{"extracted_content": "```json\n[{\"Course Code\": \"B1\", \"Room #\": \"204\"}]\n```"}]}
        ]
    });
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.json");
    std::fs::write(&path, history.to_string()).unwrap();

    let app = App::new(ReplayAgent::new(&path), settings());
    let outcome = app
        .scrape(&Secrets::new("u", "p"), &CourseFilters::default())
        .await
        .unwrap();
    assert_eq!(outcome.source, Some(Source::Fragments { rows: 2 }));

    let offerings = outcome.offerings.unwrap();
    assert_eq!(offerings.courses[0].instructor, "Dr. Smith");
    assert_eq!(offerings.courses[1].room, "204");

    let files = persist::save(&offerings, dir.path()).unwrap();

    let from_csv = persist::load_csv(&files.csv).unwrap();
    assert_eq!(from_csv.len(), offerings.len());
    assert_eq!(from_csv.columns(), offerings.columns());

    let rows = read_xlsx(&files.xlsx);
    assert_eq!(rows.len(), offerings.len() + 1);
    assert_eq!(rows[0], offerings.columns());
    assert_eq!(rows[1][0], "A1");
    assert_eq!(rows[2][4], "204");
}

#[tokio::test]
async fn nothing_recognizable_is_no_data() {
    let history = json!({
        "history": [
            {"model_output": {"action": [{"click_element": {"index": 1}}]},
             "result": [{"extracted_content": "🖱️ Clicked login"}]},
            {"result": [{"error": "Timeout waiting for page"}]}
        ]
    });
    let app = App::new(CannedAgent::new(history), settings());
    let outcome = app
        .scrape(&Secrets::new("u", "p"), &CourseFilters::default())
        .await
        .unwrap();
    assert!(outcome.offerings.is_none());
    assert_eq!(outcome.history.errors(), vec!["Timeout waiting for page"]);
}
