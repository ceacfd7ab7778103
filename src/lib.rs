//! Audio Fetch Server Library
//!
//! Batch conversion of remote media into downloadable audio artifacts, backed
//! by an external fetch tool (yt-dlp) and transcoder (ffmpeg).

pub mod artifact_store;
pub mod background_jobs;
pub mod config;
pub mod converter;
pub mod metrics;
pub mod server;

// Re-export commonly used types for convenience
pub use artifact_store::{ArtifactStore, StoredArtifact, SweepReport};
pub use converter::{
    BatchSummary, ConversionAttempt, ConversionOutcome, Converter, FailureKind, InputKind,
    ToolAvailability, ToolConfig,
};
pub use server::{run_server, RequestsLoggingLevel};
