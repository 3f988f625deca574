//! Lesson understanding checks: learning goals, student responses, and the
//! aggregate results a teacher reviews after class.

pub mod aggregate;
pub mod config;
pub mod export;
pub mod models;
pub mod report;
pub mod store;
pub mod submission;
pub mod words;
