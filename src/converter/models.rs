use super::naming::ArtifactId;
use serde::Serialize;

/// The list an input was submitted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Direct,
    Search,
}

/// Category of a failed conversion attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The fetch tool exited with a non-zero status.
    ToolError,
    /// The fetch tool exceeded its wall-clock limit.
    Timeout,
    /// The tool reported success but no artifact could be located.
    NotFound,
    /// Anything else that went wrong during the attempt.
    Unexpected,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::ToolError => "tool_error",
            FailureKind::Timeout => "timeout",
            FailureKind::NotFound => "not_found",
            FailureKind::Unexpected => "unexpected",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An artifact produced by a successful attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedArtifact {
    /// Stored filename, including the id prefix.
    pub filename: String,
    pub title: String,
    pub size_bytes: Option<u64>,
    /// Duration as printed by the tool, if it could be recovered.
    pub duration: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionFailure {
    pub kind: FailureKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionOutcome {
    Success(ConvertedArtifact),
    Failure(ConversionFailure),
}

/// Result of converting a single input item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionAttempt {
    pub id: ArtifactId,
    pub original_input: String,
    pub requested_as: InputKind,
    pub was_search: bool,
    pub outcome: ConversionOutcome,
}

impl ConversionAttempt {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ConversionOutcome::Success(_))
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match &self.outcome {
            ConversionOutcome::Failure(failure) => Some(failure.kind),
            ConversionOutcome::Success(_) => None,
        }
    }
}
