//! Background job execution.
//!
//! Jobs are synchronous units of work run on the blocking pool at a fixed
//! interval by a [`PeriodicJobRunner`].

mod context;
mod job;
pub mod jobs;
mod runner;

pub use context::JobContext;
pub use job::{BackgroundJob, JobError, ShutdownBehavior};
pub use runner::PeriodicJobRunner;
