// src/handlers/mod.rs
pub mod output;
pub mod scrape;
pub mod ui;
