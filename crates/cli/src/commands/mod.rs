//! CLI command implementations

pub mod samples;
pub mod simulate;
