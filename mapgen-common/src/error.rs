//! Error types and utilities for the mapgen toolkit
//!
//! Library code returns [`Error`]; binaries wrap it in `anyhow` at the boundary.

use strsim::{jaro_winkler, normalized_levenshtein};
use thiserror::Error;

/// Minimum combined similarity for a suggestion to be offered.
const MIN_SIMILARITY: f64 = 0.65;

/// Suggest the closest known name for a misspelled one (country, region, section).
///
/// Scores are 70% Jaro-Winkler plus 30% normalized Levenshtein, with a bonus for
/// a shared prefix of up to 7 characters. Exact matches (case-insensitive) return
/// `None` since there is nothing to correct.
pub fn suggest_correction<I, S>(input: &str, candidates: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let input_lower = input.to_lowercase();
    let mut best: Option<(f64, String)> = None;

    for candidate in candidates {
        let candidate = candidate.as_ref();
        let candidate_lower = candidate.to_lowercase();
        if candidate_lower == input_lower {
            return None;
        }

        let jw_score = jaro_winkler(&input_lower, &candidate_lower);
        let lev_score = normalized_levenshtein(&input_lower, &candidate_lower);
        let mut score = (jw_score * 0.7) + (lev_score * 0.3);

        let prefix_len = input_lower.chars().count().min(7);
        if prefix_len >= 4 {
            let input_prefix: String = input_lower.chars().take(prefix_len).collect();
            let candidate_prefix: String = candidate_lower.chars().take(prefix_len).collect();
            let prefix_similarity = normalized_levenshtein(&input_prefix, &candidate_prefix);
            if prefix_similarity > 0.7 {
                score += 0.1 * prefix_similarity;
            }
        }

        if score >= MIN_SIMILARITY && best.as_ref().map_or(true, |(s, _)| score > *s) {
            best = Some((score, candidate.to_string()));
        }
    }

    best.map(|(_, name)| name)
}

/// Main error type for mapgen operations
#[derive(Debug, Error)]
pub enum Error {
    /// No vehicle model is registered for the region's country
    #[error("no {vehicle} model for country '{country}'{}", suggestion_hint(.suggestion))]
    ModelUnavailable {
        country: String,
        vehicle: String,
        suggestion: Option<String>,
    },

    /// Writing a named section into a region container failed
    #[error("failed to write section '{name}': {message}")]
    Section { name: String, message: String },

    /// A named section is missing from a region container
    #[error("section '{0}' not found")]
    SectionNotFound(String),

    /// Stored data failed validation (magic, version, checksum, bounds)
    #[error("corrupt data: {0}")]
    Corrupt(String),

    /// Invalid configuration or input data
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn suggestion_hint(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(name) => format!(" (did you mean '{name}'?)"),
        None => String::new(),
    }
}

impl Error {
    pub fn corrupt(msg: impl Into<String>) -> Self {
        Error::Corrupt(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }
}

/// Convenience result type for mapgen operations
pub type Result<T> = std::result::Result<T, Error>;
