//! Course offering records as scraped from the registration portal.
//!
//! Every field is kept as opaque text: the portal's table cells are not
//! consistent enough to parse credits, times or enrollment counts reliably.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Canonical column names, in output order.
pub const FIELD_NAMES: [&str; 10] = [
    "course_code",
    "course_name",
    "credits",
    "instructor",
    "room",
    "days",
    "start_time",
    "end_time",
    "max_enrollment",
    "total_enrollment",
];

/// One row of the course offerings table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    /// Catalog identifier, e.g. `BCS101`.
    pub course_code: String,
    pub course_name: String,
    pub credits: String,
    pub instructor: String,
    pub room: String,
    /// Compact day letters, e.g. `MWF`.
    pub days: String,
    pub start_time: String,
    pub end_time: String,
    pub max_enrollment: String,
    pub total_enrollment: String,
    /// Columns that matched no canonical field, kept under their original names.
    #[serde(skip)]
    pub extra: IndexMap<String, String>,
}

impl Course {
    /// A course is usable only when it carries a catalog code.
    pub fn is_valid(&self) -> bool {
        !self.course_code.trim().is_empty()
    }

    /// Returns the value of a canonical field, or of a pass-through column.
    pub fn get(&self, field: &str) -> Option<&str> {
        let value = match field {
            "course_code" => &self.course_code,
            "course_name" => &self.course_name,
            "credits" => &self.credits,
            "instructor" => &self.instructor,
            "room" => &self.room,
            "days" => &self.days,
            "start_time" => &self.start_time,
            "end_time" => &self.end_time,
            "max_enrollment" => &self.max_enrollment,
            "total_enrollment" => &self.total_enrollment,
            other => return self.extra.get(other).map(String::as_str),
        };
        Some(value.as_str())
    }

    /// Sets a field by name. Unknown names land in [`Course::extra`].
    pub fn set(&mut self, field: &str, value: String) {
        let slot = match field {
            "course_code" => &mut self.course_code,
            "course_name" => &mut self.course_name,
            "credits" => &mut self.credits,
            "instructor" => &mut self.instructor,
            "room" => &mut self.room,
            "days" => &mut self.days,
            "start_time" => &mut self.start_time,
            "end_time" => &mut self.end_time,
            "max_enrollment" => &mut self.max_enrollment,
            "total_enrollment" => &mut self.total_enrollment,
            other => {
                self.extra.insert(other.to_owned(), value);
                return;
            }
        };
        *slot = value;
    }
}

/// All offerings from one scrape, in the order the agent reported them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseOfferings {
    pub courses: Vec<Course>,
}

impl CourseOfferings {
    pub fn new(courses: Vec<Course>) -> Self {
        Self { courses }
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    /// Output columns: the canonical fields followed by any pass-through
    /// columns in first-seen order.
    pub fn columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = FIELD_NAMES.iter().map(|f| (*f).to_owned()).collect();
        for course in &self.courses {
            for key in course.extra.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }
        columns
    }

    /// Distinct, sorted values of one column.
    pub fn distinct(&self, field: &str) -> Vec<String> {
        let mut values: Vec<String> = self
            .courses
            .iter()
            .filter_map(|c| c.get(field))
            .map(str::to_owned)
            .collect();
        values.sort();
        values.dedup();
        values
    }

    /// Keeps rows whose columns equal every given `(field, value)` pair.
    pub fn filter(&self, criteria: &[(&str, &str)]) -> CourseOfferings {
        let courses = self
            .courses
            .iter()
            .filter(|course| {
                criteria
                    .iter()
                    .all(|(field, wanted)| course.get(field) == Some(*wanted))
            })
            .cloned()
            .collect();
        CourseOfferings { courses }
    }
}

/// Optional user-supplied filter values, one per canonical field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseFilters {
    pub course_code: Option<String>,
    pub course_name: Option<String>,
    pub credits: Option<String>,
    pub instructor: Option<String>,
    pub room: Option<String>,
    pub days: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub max_enrollment: Option<String>,
    pub total_enrollment: Option<String>,
}

impl CourseFilters {
    /// Filter value for a canonical field. Blank values count as unset.
    pub fn get(&self, field: &str) -> Option<&str> {
        let value = match field {
            "course_code" => &self.course_code,
            "course_name" => &self.course_name,
            "credits" => &self.credits,
            "instructor" => &self.instructor,
            "room" => &self.room,
            "days" => &self.days,
            "start_time" => &self.start_time,
            "end_time" => &self.end_time,
            "max_enrollment" => &self.max_enrollment,
            "total_enrollment" => &self.total_enrollment,
            _ => return None,
        };
        value.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }

    /// Sets a filter by canonical field name; blank input clears it.
    pub fn set(&mut self, field: &str, value: &str) {
        let value = Some(value.trim().to_owned()).filter(|v| !v.is_empty());
        match field {
            "course_code" => self.course_code = value,
            "course_name" => self.course_name = value,
            "credits" => self.credits = value,
            "instructor" => self.instructor = value,
            "room" => self.room = value,
            "days" => self.days = value,
            "start_time" => self.start_time = value,
            "end_time" => self.end_time = value,
            "max_enrollment" => self.max_enrollment = value,
            "total_enrollment" => self.total_enrollment = value,
            _ => {}
        }
    }
}
