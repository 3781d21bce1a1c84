//! Pure domain types shared by every command.

pub mod errors;
pub mod model;
