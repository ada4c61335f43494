use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Scrape course offerings from the registration portal through a browser agent.
#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Args {
    /// Log output format
    #[arg(long, value_enum, default_value_t = TracingFormat::Pretty, global = true)]
    pub tracing: TracingFormat,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TracingFormat {
    /// Colourised single-line output for terminals
    Pretty,
    /// One JSON object per event
    Json,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Log in, pick filters interactively and save every matching offering (default)
    Scrape,
    /// Run a free-form instruction through the agent and show each step
    Instruct {
        /// What the agent should do, in plain language
        instruction: String,
        /// Do not extract or save course data from the run
        #[arg(long)]
        no_save: bool,
        /// Do not request a structured final answer from the agent
        #[arg(long)]
        unstructured: bool,
    },
    /// Extract courses from a saved agent history without running the agent
    Normalize {
        /// Agent history JSON file
        history: PathBuf,
        /// Print the extracted courses without writing output files
        #[arg(long)]
        no_save: bool,
    },
    /// Filter previously saved offerings
    Search {
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        instructor: Option<String>,
        #[arg(long)]
        days: Option<String>,
        /// Write the filtered rows to filtered_courses.csv and filtered_courses.xlsx
        #[arg(long)]
        export: bool,
    },
    /// Interactive session: log in once, then scrape, instruct and search
    Shell,
}
