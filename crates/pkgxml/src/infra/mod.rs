//! Infrastructure adapters for IO, config, prompts, and logging.

pub mod config;
pub mod discovery;
pub mod logging;
pub mod prompt;
