//! Collection of reusable TUI components.

pub mod listing;
pub mod preview;
