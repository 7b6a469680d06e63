// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Error types for NewsClassify

use thiserror::Error;

/// Result type alias for NewsClassify operations
pub type Result<T> = std::result::Result<T, NewsClassifyError>;

/// Local validation failures. Raised synchronously, before any request is sent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Unsupported file type: {file_name}")]
    UnsupportedType { file_name: String },

    #[error("No supported files selected")]
    EmptyBatch,

    #[error("Please select a rating")]
    MissingRating,

    #[error("Rating must be between 1 and 5, got {0}")]
    RatingOutOfRange(u8),

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Password must be at least 6 characters")]
    PasswordTooShort,

    #[error("Unsupported language code: {0}")]
    UnsupportedLanguage(String),
}

/// A remote call failed or returned a non-success status
#[derive(Error, Debug)]
pub enum CollaboratorError {
    #[error("Server returned {status}: {}", .detail.as_deref().unwrap_or("no detail"))]
    Rejected {
        status: u16,
        detail: Option<String>,
    },

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Cannot read {file}: {source}")]
    Upload {
        file: String,
        #[source]
        source: std::io::Error,
    },
}

impl CollaboratorError {
    /// Human-readable message for an error state.
    ///
    /// A `detail` string from the server is surfaced verbatim; a rejection
    /// without one falls back to `fallback`.
    pub fn message(&self, fallback: &str) -> String {
        match self {
            Self::Rejected { detail: Some(detail), .. } if !detail.trim().is_empty() => {
                detail.clone()
            }
            Self::Rejected { .. } => fallback.to_string(),
            other => other.to_string(),
        }
    }
}

/// NewsClassify error types
#[derive(Error, Debug)]
pub enum NewsClassifyError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Collaborator(#[from] CollaboratorError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("Invalid path pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("{0}")]
    Auth(String),

    #[error("Analysis failed: {0}")]
    Analysis(String),

    #[error("Review not submitted: {0}")]
    Review(String),

    #[error("Not logged in. Run `newsclassify login` first")]
    NotAuthenticated,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_surfaces_detail_verbatim() {
        let err = CollaboratorError::Rejected {
            status: 500,
            detail: Some("model unavailable".to_string()),
        };
        assert_eq!(err.message("Failed to process files"), "model unavailable");
    }

    #[test]
    fn test_rejection_without_detail_uses_fallback() {
        let err = CollaboratorError::Rejected { status: 502, detail: None };
        assert_eq!(err.message("Failed to process files"), "Failed to process files");

        let blank = CollaboratorError::Rejected { status: 400, detail: Some("  ".into()) };
        assert_eq!(blank.message("Login failed"), "Login failed");
    }

    #[test]
    fn test_malformed_message() {
        let err = CollaboratorError::Malformed("missing field `categories`".into());
        assert_eq!(err.message("x"), "Malformed response: missing field `categories`");
    }
}
