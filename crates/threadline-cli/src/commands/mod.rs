pub mod comment;
pub mod common;
pub mod completions;
pub mod config;
pub mod download;
pub mod open;
