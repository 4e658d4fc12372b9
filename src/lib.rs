//! Small command line utility for tracking time spent on things. Timers are grouped by label,
//! can be created, started, stopped, resumed and deleted, and are kept in a plain csv file
//! between runs.
//!

pub mod cli;
pub mod timers;
pub mod utils;
