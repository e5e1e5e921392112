pub mod clear;
pub mod config;
pub mod prompts;
pub mod scrape;
pub mod sync;
pub mod ui;
