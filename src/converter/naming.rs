//! Artifact identifiers and the on-disk naming convention.
//!
//! Every stored artifact is named `{id}_{title}.{ext}`. The id prefix is the
//! only link between a conversion attempt and its bytes.

use serde::Serialize;
use std::fmt;
use std::path::Path;
use uuid::Uuid;

/// Separator between the artifact id and the human readable part of a filename.
pub const ID_SEPARATOR: char = '_';

/// Unique identifier of a single conversion attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ArtifactId(Uuid);

impl ArtifactId {
    /// Generates a fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses a caller supplied id. Only the hyphenated UUID form is accepted,
    /// so the result always renders back to the same string.
    pub fn parse(s: &str) -> Option<Self> {
        if s.len() != uuid::fmt::Hyphenated::LENGTH {
            return None;
        }
        Uuid::parse_str(s).ok().map(Self)
    }

    /// Filename prefix shared by every artifact of this id.
    pub fn file_prefix(&self) -> String {
        format!("{}{}", self, ID_SEPARATOR)
    }

    /// Output template handed to the fetch tool. The tool substitutes the
    /// title and extension it detects.
    pub fn output_template(&self, output_dir: &Path) -> String {
        output_dir
            .join(format!("{}%(title)s.%(ext)s", self.file_prefix()))
            .to_string_lossy()
            .into_owned()
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Filename shown to downloaders: the stored name without the id prefix.
///
/// Names that do not carry the prefix are returned unchanged.
pub fn display_name<'a>(filename: &'a str, id: &ArtifactId) -> &'a str {
    filename
        .strip_prefix(id.file_prefix().as_str())
        .unwrap_or(filename)
}

/// Human readable title encoded in a stored filename.
///
/// Strips exactly `{id}_` and the extension. If the name was not produced for
/// `id`, everything up to the first separator is treated as the prefix.
pub fn title_from_filename(filename: &str, id: &ArtifactId) -> String {
    let without_prefix = match filename.strip_prefix(id.file_prefix().as_str()) {
        Some(rest) => rest,
        None => filename
            .split_once(ID_SEPARATOR)
            .map(|(_, rest)| rest)
            .unwrap_or(filename),
    };

    Path::new(without_prefix)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| without_prefix.to_string())
}
