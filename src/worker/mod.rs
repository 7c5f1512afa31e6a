//! Digest orchestration: summarize, render and deliver

pub mod deliver;
pub mod handler;
pub mod summarize;

// Re-export the run entry point for convenience
pub use handler::{DigestOutcome, DigestRun};
