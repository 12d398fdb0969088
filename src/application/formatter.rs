//! Output formatting for discovery results.
//!
//! Supports human-readable text and JSON.

use serde::Serialize;

use crate::domain::CandidatePath;

/// Output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Coloured, human-readable output.
    #[default]
    Text,
    /// JSON format for programmatic use.
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {s}. Use: text, json")),
        }
    }
}

#[derive(Serialize)]
struct CandidateReport<'a> {
    count: usize,
    candidates: &'a [CandidatePath],
}

/// Formats discovered databases as JSON.
///
/// # Errors
/// Returns error if serialization fails.
pub fn format_candidates_json(candidates: &[CandidatePath]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&CandidateReport {
        count: candidates.len(),
        candidates,
    })
}

/// Follow-up command for importing one of `count` discovered databases.
#[must_use]
pub fn pull_hint(program: &str, count: usize) -> String {
    if count > 1 {
        format!("Run `{program} pull --database-path <PATH_TO_DB> <OUTPUT_FILE>` to import one.")
    } else {
        format!("Run `{program} pull <OUTPUT_FILE>` to import it.")
    }
}
