pub mod app;
pub mod autocomplete;
pub mod cli;
pub mod client;
pub mod clipboard;
pub mod config;
pub mod error;
pub mod export;
pub mod filters;
pub mod output;
pub mod table;
pub mod utils;
pub mod widget;

#[cfg(test)]
mod tests;
