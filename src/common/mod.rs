//! Helpers shared across commands

pub mod debug;
pub mod fs;
