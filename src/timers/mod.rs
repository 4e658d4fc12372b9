//! Timers are kept through [record_file::TimerFile] and changed by [engine::TimerEngine].
//! The basic idea is:
//!  - Every invocation loads the whole timers file into a [store::TimerStore].
//!  - Exactly one operation is applied to it.
//!  - The whole store is written back, replacing the previous file.

pub mod engine;
pub mod entities;
pub mod error;
pub mod input;
pub mod record_file;
pub mod report;
pub mod store;
pub mod view;
