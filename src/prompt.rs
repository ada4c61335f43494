//! Natural-language task text handed to the browser agent.
//!
//! Credentials never appear here. The prompt refers to the secret
//! placeholders [`SECRET_USER`] and [`SECRET_PASSWORD`], which the agent
//! substitutes from the separate secret bag at execution time.

use crate::models::{CourseFilters, FIELD_NAMES};

/// Placeholder name for the portal username in the agent's secret bag.
pub const SECRET_USER: &str = "user";
/// Placeholder name for the portal password in the agent's secret bag.
pub const SECRET_PASSWORD: &str = "password";

/// Render the fixed login/navigate/extract instruction sequence.
///
/// Filter values are appended to their field in bracket notation, e.g.
/// `course_code [BCS101]`. Unset fields are listed bare so the agent still
/// extracts the column.
pub fn build_task(filters: &CourseFilters, portal_url: &str) -> String {
    let mut task = String::new();
    task.push_str("Follow these steps precisely:\n");
    task.push_str(&format!("1. Navigate to {portal_url}\n"));
    task.push_str(&format!(
        "2. Login with the username {SECRET_USER} and password {SECRET_PASSWORD} provided\n"
    ));
    task.push_str("3. Wait for the dashboard to load completely\n");
    task.push_str("4. Go to \"Course Registration\" > \"Course Offerings\"\n");
    task.push_str("5. Show filter, choose SEAST division, apply filter\n");
    task.push_str("6. Extract ALL course info from the table:\n");
    for field in FIELD_NAMES {
        match filters.get(field) {
            Some(value) => task.push_str(&format!("    - {field} [{value}]\n")),
            None => task.push_str(&format!("    - {field}\n")),
        }
    }
    task.push_str(
        "7. Repeat the extraction for every available results page and return a JSON object \
         of the form {\"courses\": [...]} containing all courses.\n",
    );
    task.push_str(
        "8. Never return an empty courses list once course data has been collected; \
         return everything gathered so far instead.\n",
    );
    task
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_every_field_once() {
        let task = build_task(&CourseFilters::default(), "https://portal.example/login.asp");
        for field in FIELD_NAMES {
            let line = format!("    - {field}\n");
            assert_eq!(task.matches(&line).count(), 1, "missing {field}");
        }
        assert!(!task.contains("course_code ["));
    }

    #[test]
    fn annotates_set_filters_in_brackets() {
        let mut filters = CourseFilters::default();
        filters.set("course_code", "BCS101");
        filters.set("days", "MW");

        let task = build_task(&filters, "https://portal.example/login.asp");
        assert!(task.contains("    - course_code [BCS101]\n"));
        assert!(task.contains("    - days [MW]\n"));
        assert!(task.contains("    - room\n"));
    }

    #[test]
    fn navigates_to_the_configured_portal() {
        let task = build_task(&CourseFilters::default(), "https://portal.example/login.asp");
        assert!(task.contains("1. Navigate to https://portal.example/login.asp\n"));
        assert!(task.contains("Course Offerings"));
        assert!(task.contains("every available results page"));
        assert!(task.contains("Never return an empty courses list"));
    }

    #[test]
    fn refers_to_secret_placeholders_only() {
        let task = build_task(&CourseFilters::default(), "https://portal.example/login.asp");
        assert!(task.contains("username user and password password"));
    }
}
