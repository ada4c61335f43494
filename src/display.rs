//! Terminal rendering of offerings tables and agent steps.

use crate::agent::AgentHistory;
use crate::models::CourseOfferings;
use crate::utils::truncate;
use std::io::IsTerminal;
use yansi::Paint;

/// Cells wider than this are truncated.
const MAX_CELL: usize = 28;

fn ansi() -> bool {
    std::io::stdout().is_terminal()
}

/// Render offerings as an aligned text table, at most `limit` rows.
pub fn render_table(offerings: &CourseOfferings, limit: Option<usize>) -> String {
    let columns = offerings.columns();
    let shown = limit.unwrap_or(usize::MAX).min(offerings.len());

    let rows: Vec<Vec<String>> = offerings.courses[..shown]
        .iter()
        .map(|course| {
            columns
                .iter()
                .map(|column| truncate(course.get(column).unwrap_or(""), MAX_CELL))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            rows.iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(column.chars().count().min(MAX_CELL)))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    let header = pad_row(
        columns.iter().map(|c| truncate(c, MAX_CELL)),
        &widths,
    );
    out.push_str(&header);
    out.push('\n');
    out.push_str(&widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("  "));
    out.push('\n');
    for row in rows {
        out.push_str(&pad_row(row.into_iter(), &widths));
        out.push('\n');
    }
    if shown < offerings.len() {
        out.push_str(&format!("... {} more\n", offerings.len() - shown));
    }
    out
}

fn pad_row(cells: impl Iterator<Item = String>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.chars().count());
            format!("{cell}{}", " ".repeat(pad))
        })
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_owned()
}

pub fn print_table(offerings: &CourseOfferings, limit: Option<usize>) {
    print!("{}", render_table(offerings, limit));
}

pub fn print_heading(text: &str) {
    if ansi() {
        println!("\n{}", text.bold());
    } else {
        println!("\n{text}");
    }
}

/// Print every step of a run: action, thought, response and error.
pub fn print_steps(history: &AgentHistory) {
    print_heading("Execution Steps");
    for (index, item) in history.history.iter().enumerate() {
        println!("Step {}", index + 1);
        if let Some(actions) = item.actions() {
            println!("  Action: {}", serde_json::Value::Object(actions));
        }
        if let Some(thought) = item.thought() {
            println!("  Thought: {thought}");
        }
        if let Some(response) = item.response() {
            println!("  Response: {}", truncate(&response.replace('\n', " "), 400));
        }
        for error in item.result.iter().filter_map(|r| r.error.as_deref()) {
            if ansi() {
                println!("  Error: {}", error.red());
            } else {
                println!("  Error: {error}");
            }
        }
    }
}
