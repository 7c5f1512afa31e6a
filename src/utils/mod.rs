//! Small parsing and formatting helpers

pub mod filters;
pub mod links;
pub mod time;
