//! Concrete background job implementations.

mod artifact_reaper;

pub use artifact_reaper::ArtifactReaperJob;
