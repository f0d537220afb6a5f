//! Batch command scripts in, reconciliation reports out.

pub mod command_reader;
pub mod report_writer;
pub mod runner;
