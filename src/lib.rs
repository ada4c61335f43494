pub mod agent;
pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod display;
pub mod extract;
pub mod json;
pub mod logging;
pub mod models;
pub mod persist;
pub mod prompt;
pub mod session;
pub mod utils;
