//! Unified error types for sbom-join.
//!
//! This module provides the error hierarchy for the library, with context
//! chaining for debugging and user-facing messages.

use crate::model::InvalidPackage;
use crate::parsers::ParseError;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for sbom-join operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SbomError {
    /// Errors while decoding a document
    #[error("Failed to parse SBOM: {context}")]
    Parse {
        context: String,
        #[source]
        source: ParseError,
    },

    /// Records skipped while resolving a document
    #[error("Resolution incomplete: {0}")]
    Resolve(#[from] ResolveError),

    /// Errors while querying a vulnerability database
    #[error("Vulnerability scan failed: {context}")]
    Scan {
        context: String,
        #[source]
        source: ScanErrorKind,
    },

    /// IO errors with context
    #[error("IO error at {path:?}: {message}")]
    Io {
        path: Option<PathBuf>,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration errors
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Validation errors
    #[error("Validation failed: {0}")]
    Validation(String),
}

/// A record that could not be normalized during resolution.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("record #{index} ('{name}'): {reason}")]
pub struct RecordError {
    /// Position of the record in the resolver input
    pub index: usize,
    /// Package name as reported
    pub name: String,
    /// What was wrong with it
    pub reason: InvalidPackage,
}

/// Batch of records skipped by one resolution call.
///
/// Resolution continues past invalid records, so this never means the graph
/// is unusable.
#[derive(Error, Debug, Clone, Default, PartialEq, Eq)]
#[error("{} package record(s) skipped: {}", .errors.len(), summarize(.errors))]
pub struct ResolveError {
    pub errors: Vec<RecordError>,
}

impl ResolveError {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }
}

fn summarize(errors: &[RecordError]) -> String {
    const SHOWN: usize = 3;
    let mut parts: Vec<String> = errors.iter().take(SHOWN).map(ToString::to_string).collect();
    if errors.len() > SHOWN {
        parts.push(format!("and {} more", errors.len() - SHOWN));
    }
    parts.join("; ")
}

/// Specific scan error kinds
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ScanErrorKind {
    #[error("API request failed: {0}")]
    ApiError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Scanner unavailable: {0}")]
    Unavailable(String),

    #[error("{source_name}: {} of {total} package queries failed: {}", .errors.len(), .errors.join("; "))]
    Aggregate {
        source_name: String,
        total: usize,
        errors: Vec<String>,
    },
}

// ============================================================================
// Result type alias
// ============================================================================

/// Convenient Result type for sbom-join operations
pub type Result<T> = std::result::Result<T, SbomError>;

// ============================================================================
// Error construction helpers
// ============================================================================

impl SbomError {
    /// Create a parse error with context
    pub fn parse(context: impl Into<String>, source: ParseError) -> Self {
        Self::Parse {
            context: context.into(),
            source,
        }
    }

    /// Create a parse error for unknown format
    pub fn unknown_format(path: impl Into<String>) -> Self {
        let path = path.into();
        Self::parse(
            format!("at {path}"),
            ParseError::UnknownFormat(format!("no decoder accepted {path}")),
        )
    }

    /// Create an IO error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        let message = format!("{source}");
        Self::Io {
            path: Some(path),
            message,
            source,
        }
    }

    /// Create a scan error
    pub fn scan(context: impl Into<String>, source: ScanErrorKind) -> Self {
        Self::Scan {
            context: context.into(),
            source,
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

// ============================================================================
// Conversions from existing error types
// ============================================================================

impl From<std::io::Error> for SbomError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            path: None,
            message: format!("{err}"),
            source: err,
        }
    }
}

impl From<ParseError> for SbomError {
    fn from(err: ParseError) -> Self {
        Self::parse("", err)
    }
}

impl From<serde_json::Error> for SbomError {
    fn from(err: serde_json::Error) -> Self {
        Self::parse("JSON deserialization", ParseError::from(err))
    }
}

// ============================================================================
// Error context extension trait
// ============================================================================

/// Extension trait for adding context to errors.
///
/// Context strings chain outward: `outer: inner: original`.
///
/// ```ignore
/// use sbom_join::error::ErrorContext;
///
/// let content = std::fs::read_to_string(path)
///     .with_context(|| format!("reading {}", path.display()))?;
/// ```
pub trait ErrorContext<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context from a closure, evaluated only on error.
    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T, E: Into<SbomError>> ErrorContext<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        let ctx: String = context.into();
        self.map_err(|e| add_context_to_error(e.into(), &ctx))
    }

    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.map_err(|e| {
            let ctx: String = f().into();
            add_context_to_error(e.into(), &ctx)
        })
    }
}

/// Add context to an error, chaining with any existing context.
fn add_context_to_error(err: SbomError, new_ctx: &str) -> SbomError {
    match err {
        SbomError::Parse {
            context: existing,
            source,
        } => SbomError::Parse {
            context: chain_context(new_ctx, &existing),
            source,
        },
        SbomError::Scan {
            context: existing,
            source,
        } => SbomError::Scan {
            context: chain_context(new_ctx, &existing),
            source,
        },
        SbomError::Io {
            path,
            message,
            source,
        } => SbomError::Io {
            path,
            message: chain_context(new_ctx, &message),
            source,
        },
        SbomError::Resolve(inner) => SbomError::Resolve(inner),
        SbomError::Config(msg) => SbomError::Config(chain_context(new_ctx, &msg)),
        SbomError::Validation(msg) => SbomError::Validation(chain_context(new_ctx, &msg)),
    }
}

/// Join two context strings as "`new`: `existing`", or just `new` when
/// nothing came before.
fn chain_context(new: &str, existing: &str) -> String {
    if existing.is_empty() {
        new.to_string()
    } else {
        format!("{new}: {existing}")
    }
}

/// Extension trait for Option types to convert to errors with context.
pub trait OptionContext<T> {
    /// Convert None to an error with the given context.
    fn context_none(self, context: impl Into<String>) -> Result<T>;

    /// Convert None to an error with context from a closure.
    fn with_context_none<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T> OptionContext<T> for Option<T> {
    fn context_none(self, context: impl Into<String>) -> Result<T> {
        self.ok_or_else(|| SbomError::Validation(context.into()))
    }

    fn with_context_none<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.ok_or_else(|| SbomError::Validation(f().into()))
    }
}
