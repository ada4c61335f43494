//! Flat-file output: `results.csv` and `course_offerings.xlsx`.
//!
//! Both files are rewritten wholesale on every save. There is no
//! partial-write protection; re-running a scrape regenerates them.

use crate::models::{Course, CourseOfferings};
use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const CSV_FILE: &str = "results.csv";
pub const XLSX_FILE: &str = "course_offerings.xlsx";
pub const FILTERED_CSV_FILE: &str = "filtered_courses.csv";
pub const FILTERED_XLSX_FILE: &str = "filtered_courses.xlsx";
pub const SHEET_NAME: &str = "Courses";

/// Paths written by [`save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedFiles {
    pub csv: PathBuf,
    pub xlsx: PathBuf,
}

/// Write the offerings to `results.csv` and `course_offerings.xlsx` in `dir`.
pub fn save(offerings: &CourseOfferings, dir: &Path) -> Result<SavedFiles> {
    save_as(offerings, dir, CSV_FILE, XLSX_FILE)
}

/// Write the offerings under explicit file names in `dir`.
pub fn save_as(
    offerings: &CourseOfferings,
    dir: &Path,
    csv_name: &str,
    xlsx_name: &str,
) -> Result<SavedFiles> {
    let files = SavedFiles {
        csv: dir.join(csv_name),
        xlsx: dir.join(xlsx_name),
    };
    write_csv(offerings, &files.csv)?;
    write_xlsx(offerings, &files.xlsx)?;
    info!(
        rows = offerings.len(),
        csv = %files.csv.display(),
        xlsx = %files.xlsx.display(),
        "saved course offerings"
    );
    Ok(files)
}

/// One cell per column, empty where a row lacks a pass-through column.
fn row_cells<'a>(course: &'a Course, columns: &'a [String]) -> impl Iterator<Item = &'a str> {
    columns.iter().map(|column| course.get(column).unwrap_or(""))
}

pub fn write_csv(offerings: &CourseOfferings, path: &Path) -> Result<()> {
    let columns = offerings.columns();
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    writer.write_record(&columns)?;
    for course in &offerings.courses {
        writer.write_record(row_cells(course, &columns))?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;

    debug!(path = %path.display(), rows = offerings.len(), columns = columns.len(), "wrote csv");
    Ok(())
}

pub fn write_xlsx(offerings: &CourseOfferings, path: &Path) -> Result<()> {
    let columns = offerings.columns();
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    {
        let sheet = workbook.add_worksheet();
        sheet.set_name(SHEET_NAME)?;

        for (col, name) in columns.iter().enumerate() {
            sheet.write_string_with_format(0, col as u16, name, &header)?;
        }
        for (row, course) in offerings.courses.iter().enumerate() {
            for (col, cell) in row_cells(course, &columns).enumerate() {
                sheet.write_string(row as u32 + 1, col as u16, cell)?;
            }
        }
    }

    workbook
        .save(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    debug!(path = %path.display(), rows = offerings.len(), "wrote xlsx");
    Ok(())
}

/// Read a previously saved CSV. Columns outside the canonical set are kept
/// as pass-through fields.
pub fn load_csv(path: &Path) -> Result<CourseOfferings> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let headers = reader.headers()?.clone();

    let mut courses = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Bad CSV record {}", line + 1))?;
        let mut course = Course::default();
        for (column, value) in headers.iter().zip(record.iter()) {
            course.set(column, value.to_owned());
        }
        courses.push(course);
    }

    debug!(path = %path.display(), rows = courses.len(), "loaded csv");
    Ok(CourseOfferings::new(courses))
}
