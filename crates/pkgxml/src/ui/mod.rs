//! Terminal UI for building a manifest interactively.

pub mod app;
pub mod components;
