//! Recovery of artifact details from the fetch tool's standard output.
//!
//! The tool prints the final path, the title and the duration through
//! independent print directives whose relative order is not reliable. Fields
//! are therefore recovered by precedence rather than by position:
//!
//! 1. path: the first line ending in `.{ext}` that names an existing file;
//! 2. title: derived from the recovered filename, never from a printed line;
//! 3. duration: the first remaining line that is neither the path nor the
//!    title, preferring lines shaped like a duration.

use super::naming::{self, ArtifactId};
use lazy_static::lazy_static;
use regex::Regex;
use std::path::{Path, PathBuf};

lazy_static! {
    static ref DURATION_SHAPE: Regex =
        Regex::new(r"^\d+(:\d{1,2}){0,2}(\.\d+)?$").expect("duration pattern is valid");
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedToolOutput {
    pub path: Option<PathBuf>,
    pub title: Option<String>,
    pub duration: Option<String>,
}

/// Parses captured stdout of one fetch tool run.
///
/// `exists` decides whether a candidate path line names a real file.
pub fn parse_tool_output<F>(
    stdout: &str,
    id: &ArtifactId,
    extension: &str,
    exists: F,
) -> ParsedToolOutput
where
    F: Fn(&Path) -> bool,
{
    let suffix = format!(".{}", extension);
    let lines: Vec<&str> = stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let path = lines
        .iter()
        .find(|line| line.ends_with(&suffix) && exists(Path::new(line)))
        .map(PathBuf::from);

    let title = path
        .as_deref()
        .and_then(Path::file_name)
        .map(|name| naming::title_from_filename(&name.to_string_lossy(), id));

    let leftovers: Vec<&str> = lines
        .iter()
        .copied()
        .filter(|line| !line.ends_with(&suffix))
        .filter(|line| Some(*line) != title.as_deref())
        .collect();
    let duration = leftovers
        .iter()
        .find(|line| DURATION_SHAPE.is_match(line))
        .or_else(|| leftovers.first())
        .map(|line| line.to_string());

    ParsedToolOutput {
        path,
        title,
        duration,
    }
}
