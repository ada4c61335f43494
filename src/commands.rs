//! Handlers behind each CLI subcommand.

use crate::agent::{AgentError, ReplayAgent, Secrets};
use crate::app::{App, ScrapeOutcome};
use crate::cli::Command;
use crate::config::Config;
use crate::display::{print_heading, print_steps, print_table};
use crate::extract;
use crate::models::{CourseFilters, CourseOfferings};
use crate::persist::{self, CSV_FILE, FILTERED_CSV_FILE, FILTERED_XLSX_FILE};
use crate::prompt::build_task;
use crate::session::Session;
use anyhow::{Context, Result};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Password, Select};
use std::path::PathBuf;
use tracing::{error, info, warn};

/// Prompt text for each filter, in canonical field order.
const FILTER_PROMPTS: [(&str, &str); 10] = [
    ("course_code", "Course code to search for"),
    ("course_name", "Course name to search for"),
    ("credits", "Number of credits to search for"),
    ("instructor", "Instructor name to search for"),
    ("room", "Room to search for"),
    ("days", "Days to search for, MTWR"),
    ("start_time", "Minimum start time to search for"),
    ("end_time", "Maximum end time to search for"),
    ("max_enrollment", "Maximum enrollment to search for"),
    ("total_enrollment", "Total enrollment to search for"),
];

pub async fn run(command: Command, config: &Config) -> Result<()> {
    match command {
        Command::Scrape => scrape(config).await,
        Command::Instruct {
            instruction,
            no_save,
            unstructured,
        } => instruct(config, &instruction, !no_save, !unstructured).await,
        Command::Normalize { history, no_save } => normalize(config, history, !no_save).await,
        Command::Search {
            code,
            instructor,
            days,
            export,
        } => search(config, code, instructor, days, export),
        Command::Shell => shell(config).await,
    }
}

fn theme() -> ColorfulTheme {
    ColorfulTheme::default()
}

fn prompt_credentials() -> Result<Secrets> {
    let username: String = Input::with_theme(&theme())
        .with_prompt("Portal username")
        .interact_text()?;
    let password = Password::with_theme(&theme())
        .with_prompt("Portal password")
        .interact()?;
    Ok(Secrets::new(username, password))
}

fn prompt_filters() -> Result<CourseFilters> {
    let mut filters = CourseFilters::default();
    for (field, prompt) in FILTER_PROMPTS {
        let value: String = Input::with_theme(&theme())
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()?;
        filters.set(field, &value);
    }
    Ok(filters)
}

/// Save extracted offerings, or report that nothing was extracted.
fn report(outcome: &ScrapeOutcome, config: &Config, save: bool) -> Result<()> {
    let Some(offerings) = &outcome.offerings else {
        warn!(
            steps = outcome.history.len(),
            "Could not extract structured data from the automation results"
        );
        return Ok(());
    };

    print_heading("Extracted Data Preview");
    print_table(offerings, Some(10));

    if save {
        let files = persist::save(offerings, &config.output_dir)?;
        info!(
            courses = offerings.len(),
            source = ?outcome.source,
            csv = %files.csv.display(),
            "Successfully saved courses to CSV and Excel files"
        );
    }
    Ok(())
}

async fn scrape(config: &Config) -> Result<()> {
    let api_key = config.require_api_key()?;
    let app = App::connect(config, api_key)?;

    let secrets = prompt_credentials()?;
    let filters = prompt_filters()?;

    info!("Running schedule extraction...");
    let outcome = app.scrape(&secrets, &filters).await?;
    report(&outcome, config, true)
}

async fn instruct(config: &Config, instruction: &str, save: bool, structured: bool) -> Result<()> {
    let api_key = config.require_api_key()?;
    let app = App::connect(config, api_key)?;
    let secrets = prompt_credentials()?;

    info!("Browser automation running... This may take a minute.");
    let outcome = app.instruct(&secrets, instruction, structured).await?;
    info!("Browser automation completed");

    if save {
        report(&outcome, config, true)?;
    }
    print_steps(&outcome.history);
    Ok(())
}

async fn normalize(config: &Config, path: PathBuf, save: bool) -> Result<()> {
    let history = ReplayAgent::new(path).load().await?;
    match extract::normalize_with_source(&history) {
        Some((offerings, source)) => {
            info!(courses = offerings.len(), ?source, "extracted courses from history");
            let outcome = ScrapeOutcome {
                offerings: Some(offerings),
                source: Some(source),
                history,
            };
            report(&outcome, config, save)
        }
        None => {
            warn!("No course data extracted.");
            Ok(())
        }
    }
}

fn load_saved(config: &Config) -> Result<CourseOfferings> {
    let path = config.output_dir.join(CSV_FILE);
    persist::load_csv(&path).context("No saved course data found")
}

fn search(
    config: &Config,
    code: Option<String>,
    instructor: Option<String>,
    days: Option<String>,
    export: bool,
) -> Result<()> {
    let offerings = load_saved(config)?;
    let mut criteria = Vec::new();
    if let Some(code) = code.as_deref() {
        criteria.push(("course_code", code));
    }
    if let Some(instructor) = instructor.as_deref() {
        criteria.push(("instructor", instructor));
    }
    if let Some(days) = days.as_deref() {
        criteria.push(("days", days));
    }

    show_results(&offerings.filter(&criteria), config, export)?;

    print_heading("Available filter values");
    for (field, label) in [("course_code", "Course Code"), ("instructor", "Instructor"), ("days", "Days")] {
        println!("{label}: {}", offerings.distinct(field).join(", "));
    }
    Ok(())
}

fn show_results(filtered: &CourseOfferings, config: &Config, export: bool) -> Result<()> {
    print_heading(&format!("Results ({} courses)", filtered.len()));
    print_table(filtered, None);

    if export {
        let files = persist::save_as(filtered, &config.output_dir, FILTERED_CSV_FILE, FILTERED_XLSX_FILE)?;
        info!(csv = %files.csv.display(), xlsx = %files.xlsx.display(), "exported filtered courses");
    }
    Ok(())
}

/// Pick a value for one filter column; `None` means "All".
fn select_filter(offerings: &CourseOfferings, field: &str, label: &str) -> Result<Option<String>> {
    let mut options = vec!["All".to_owned()];
    options.extend(offerings.distinct(field));
    let choice = Select::with_theme(&theme())
        .with_prompt(label)
        .items(&options)
        .default(0)
        .interact()?;
    Ok((choice > 0).then(|| options.swap_remove(choice)))
}

fn shell_search(offerings: &CourseOfferings, config: &Config) -> Result<()> {
    let code = select_filter(offerings, "course_code", "Filter by Course Code")?;
    let instructor = select_filter(offerings, "instructor", "Filter by Instructor")?;
    let days = select_filter(offerings, "days", "Filter by Days")?;

    let criteria: Vec<(&str, &str)> = [("course_code", &code), ("instructor", &instructor), ("days", &days)]
        .into_iter()
        .filter_map(|(field, value)| value.as_deref().map(|v| (field, v)))
        .collect();

    let export = Select::with_theme(&theme())
        .with_prompt("Export filtered rows?")
        .items(&["No", "Yes"])
        .default(0)
        .interact()?
        == 1;
    show_results(&offerings.filter(&criteria), config, export)
}

fn shell_login(session: &mut Session) -> Result<()> {
    let api_key = Password::with_theme(&theme())
        .with_prompt("API key (blank to use GEMINI_API_KEY)")
        .allow_empty_password(true)
        .interact()?;
    let api_key = if api_key.trim().is_empty() {
        session.api_key().to_owned()
    } else {
        api_key
    };
    let username: String = Input::with_theme(&theme())
        .with_prompt("Portal username")
        .allow_empty(true)
        .interact_text()?;
    let password = Password::with_theme(&theme())
        .with_prompt("Portal password")
        .allow_empty_password(true)
        .interact()?;

    match session.login(&api_key, &username, &password) {
        Ok(()) => info!(username = %username.trim(), "Authentication successful"),
        Err(e) => println!("{e}"),
    }
    Ok(())
}

/// Run an agent task for the shell, reusing a cached result for an
/// identical (credentials, prompt) pair.
async fn shell_run(session: &mut Session, config: &Config, prompt: String, structured: bool) -> Result<()> {
    if let Some(cached) = session.cached(&prompt) {
        info!("reusing result from an identical earlier run");
        let cached = cached.clone();
        if let Some(offerings) = &cached {
            print_table(offerings, Some(10));
        } else {
            warn!("Could not extract structured data from the automation results");
        }
        session.offerings = cached.or(session.offerings.take());
        return Ok(());
    }

    let secrets = session.credentials()?.clone();
    let app = App::connect(config, session.api_key())?;
    info!("Browser automation running... This may take a minute.");
    let outcome = app.instruct(&secrets, &prompt, structured).await?;

    report(&outcome, config, true)?;
    print_steps(&outcome.history);

    session.remember(&prompt, outcome.offerings.clone());
    if outcome.offerings.is_some() {
        session.offerings = outcome.offerings;
    }
    Ok(())
}

async fn shell(config: &Config) -> Result<()> {
    let mut session = Session::new(config.gemini_api_key.clone().unwrap_or_default());

    loop {
        if !session.is_authenticated() {
            print_heading("Please log in to access the application.");
            let choice = Select::with_theme(&theme())
                .items(&["Login", "Quit"])
                .default(0)
                .interact()?;
            if choice == 1 {
                return Ok(());
            }
            shell_login(&mut session)?;
            continue;
        }

        let heading = format!("Logged in as: {}", session.username().unwrap_or_default());
        let choice = Select::with_theme(&theme())
            .with_prompt(heading)
            .items(&[
                "Scrape course offerings",
                "Run browser instruction",
                "Load saved course data",
                "Search courses",
                "Logout",
                "Quit",
            ])
            .default(0)
            .interact()?;

        // Failures are reported and the session stays usable
        let result = match choice {
            0 => match prompt_filters() {
                Ok(filters) => {
                    let prompt = build_task(&filters, &config.portal_url);
                    shell_run(&mut session, config, prompt, true).await
                }
                Err(e) => Err(e),
            },
            1 => {
                let instruction: String = Input::with_theme(&theme())
                    .with_prompt("Enter browser automation instruction")
                    .interact_text()?;
                shell_run(&mut session, config, instruction, true).await
            }
            2 => load_saved(config).map(|offerings| {
                info!(courses = offerings.len(), "Course data loaded successfully");
                session.offerings = Some(offerings);
            }),
            3 => match &session.offerings {
                Some(offerings) => shell_search(offerings, config),
                None => {
                    println!("No course data available. Scrape or load saved data first.");
                    Ok(())
                }
            },
            4 => {
                session.logout();
                Ok(())
            }
            _ => return Ok(()),
        };

        if let Err(e) = result {
            log_failure(&e);
        }
    }
}

/// Log a top-level failure the way the user should see it.
pub fn log_failure(e: &anyhow::Error) {
    if let Some(AgentError::LoginFailed) = e.downcast_ref::<AgentError>() {
        error!("Login failed: Invalid username or password.");
    } else {
        error!(error = ?e, "{e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FIELD_NAMES;

    #[test]
    fn filter_prompts_cover_canonical_fields_in_order() {
        let fields: Vec<&str> = FILTER_PROMPTS.iter().map(|(field, _)| *field).collect();
        assert_eq!(fields, FIELD_NAMES);
    }

    #[test]
    fn login_failure_is_recognized_through_anyhow() {
        let e = anyhow::Error::from(AgentError::LoginFailed);
        assert!(matches!(e.downcast_ref::<AgentError>(), Some(AgentError::LoginFailed)));
    }
}
