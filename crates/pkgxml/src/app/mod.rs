//! Application layer orchestrating domain logic and infrastructure.

pub mod combine;
pub mod export;
pub mod manifest;
pub mod render;
pub mod retrieve;
pub mod selection;
pub mod session;
pub mod universe;
