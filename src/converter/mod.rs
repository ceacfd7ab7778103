//! Media conversion through the external fetch tool.
//!
//! Classifies inputs, runs one tool invocation per item, recovers the produced
//! artifact from the tool output and aggregates per-item outcomes.

mod batch;
mod classifier;
#[allow(clippy::module_inception)]
mod converter;
mod models;
pub mod naming;
mod output_parser;
mod probe;
#[cfg(all(test, unix))]
pub(crate) mod test_support;
mod tool;

pub use batch::{convert_batch, BatchSummary};
pub use classifier::{classify, is_direct_reference, Classification};
pub use converter::{ConversionError, Converter};
pub use models::{
    ConversionAttempt, ConversionFailure, ConversionOutcome, ConvertedArtifact, FailureKind,
    InputKind,
};
pub use naming::ArtifactId;
pub use output_parser::{parse_tool_output, ParsedToolOutput};
pub use probe::{probe, ToolAvailability};
pub use tool::{run_tool, ToolConfig, ToolRunError};
