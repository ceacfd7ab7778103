use super::classifier::classify;
use super::models::{
    ConversionAttempt, ConversionFailure, ConversionOutcome, ConvertedArtifact, FailureKind,
    InputKind,
};
use super::naming::{self, ArtifactId};
use super::output_parser::parse_tool_output;
use super::tool::{run_tool, ToolConfig, ToolRunError};
use crate::artifact_store;
use crate::metrics;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Search directive understood by the fetch tool, resolving to the top match.
const SEARCH_DIRECTIVE: &str = "ytsearch1:";

/// Number of stderr characters kept in a tool error message.
const STDERR_SNIPPET_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("fetch tool error: {0}")]
    Tool(String),

    #[error("exceeded wall-clock limit of {0:?}")]
    Timeout(Duration),

    #[error("artifact missing after tool reported success")]
    ArtifactMissing,

    #[error("failed to launch fetch tool: {0}")]
    Launch(#[source] std::io::Error),

    #[error("i/o error while locating artifact: {0}")]
    Io(#[from] std::io::Error),

    #[error("conversion task failed: {0}")]
    Task(String),
}

impl ConversionError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ConversionError::Tool(_) => FailureKind::ToolError,
            ConversionError::Timeout(_) => FailureKind::Timeout,
            ConversionError::ArtifactMissing => FailureKind::NotFound,
            ConversionError::Launch(_) | ConversionError::Io(_) | ConversionError::Task(_) => {
                FailureKind::Unexpected
            }
        }
    }
}

impl From<ToolRunError> for ConversionError {
    fn from(err: ToolRunError) -> Self {
        match err {
            ToolRunError::Launch { source, .. } => ConversionError::Launch(source),
            ToolRunError::Wait { source, .. } => ConversionError::Io(source),
            ToolRunError::TimedOut { limit, .. } => ConversionError::Timeout(limit),
        }
    }
}

/// Runs single conversions through the fetch tool, writing into one output
/// directory. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Converter {
    output_dir: PathBuf,
    tool: Arc<ToolConfig>,
}

impl Converter {
    pub fn new(output_dir: impl Into<PathBuf>, tool: ToolConfig) -> Self {
        Self {
            output_dir: output_dir.into(),
            tool: Arc::new(tool),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn tool_config(&self) -> &ToolConfig {
        &self.tool
    }

    /// Converts one input. Never fails: every problem ends up in the
    /// returned attempt's outcome.
    ///
    /// The work runs on its own task so that a panic is contained to this
    /// attempt.
    pub async fn convert(&self, input: &str, requested_as: InputKind) -> ConversionAttempt {
        let id = ArtifactId::generate();
        let classification = classify(input, requested_as == InputKind::Search);
        let target = if classification.was_search {
            format!("{}{}", SEARCH_DIRECTIVE, classification.target)
        } else {
            classification.target
        };

        debug!("Converting {:?} as {} (id {})", input, target, id);
        let started = Instant::now();

        let this = self.clone();
        let result = match tokio::spawn(async move { this.convert_with_id(id, &target).await })
            .await
        {
            Ok(result) => result,
            Err(join_error) => Err(ConversionError::Task(join_error.to_string())),
        };

        let kind_label = match requested_as {
            InputKind::Direct => "direct",
            InputKind::Search => "search",
        };
        let outcome = match result {
            Ok(artifact) => {
                info!(
                    "Converted {:?} into {} ({}) in {:?}",
                    input,
                    artifact.filename,
                    artifact
                        .size_bytes
                        .map(|size| format!("{:#}", byte_unit::Byte::from(size)))
                        .unwrap_or_else(|| "unknown size".to_string()),
                    started.elapsed()
                );
                metrics::record_conversion(kind_label, "success", started.elapsed());
                ConversionOutcome::Success(artifact)
            }
            Err(err) => {
                let kind = err.kind();
                if kind == FailureKind::Unexpected {
                    error!("Conversion of {:?} failed unexpectedly: {}", input, err);
                } else {
                    warn!("Conversion of {:?} failed ({}): {}", input, kind, err);
                }
                metrics::record_conversion(kind_label, kind.as_str(), started.elapsed());
                ConversionOutcome::Failure(ConversionFailure {
                    kind,
                    message: err.to_string(),
                })
            }
        };

        ConversionAttempt {
            id,
            original_input: input.to_string(),
            requested_as,
            was_search: classification.was_search,
            outcome,
        }
    }

    async fn convert_with_id(
        &self,
        id: ArtifactId,
        target: &str,
    ) -> Result<ConvertedArtifact, ConversionError> {
        let template = id.output_template(&self.output_dir);
        let command = self.tool.fetch_command(&template, target);
        let output = run_tool(command, self.tool.conversion_timeout).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let snippet: String = stderr.trim().chars().take(STDERR_SNIPPET_CHARS).collect();
            return Err(ConversionError::Tool(snippet));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let parsed = parse_tool_output(&stdout, &id, &self.tool.audio_format, |path: &Path| {
            path.is_file()
        });

        let path = match parsed.path {
            Some(path) => path,
            None => {
                debug!(
                    "No artifact path in tool output for {}, scanning {}",
                    id,
                    self.output_dir.display()
                );
                let output_dir = self.output_dir.clone();
                tokio::task::spawn_blocking(move || artifact_store::find_artifact(&output_dir, &id))
                    .await
                    .map_err(|e| ConversionError::Task(e.to_string()))??
                    .ok_or(ConversionError::ArtifactMissing)?
            }
        };

        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or(ConversionError::ArtifactMissing)?;
        let title = parsed
            .title
            .unwrap_or_else(|| naming::title_from_filename(&filename, &id));
        let size_bytes = tokio::fs::metadata(&path).await.ok().map(|m| m.len());

        Ok(ConvertedArtifact {
            filename,
            title,
            size_bytes,
            duration: parsed.duration,
        })
    }
}
