//! Command implementations for the bootstrap CLI

pub mod completions;
pub mod run;
pub mod status;
pub mod stop;
