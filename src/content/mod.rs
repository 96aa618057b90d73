//! Content subsystem
//!
//! Two content representations live here:
//! - `catalog`: a single JSON catalog of modules and sections, loaded once at
//!   startup and filtered per request by `filter`.
//! - `library`: a YAML manifest pointing at individual front-matter lesson
//!   documents, reloaded from disk on every API call.

pub mod catalog;
pub mod filter;
pub mod library;

use std::path::PathBuf;
use thiserror::Error;

use crate::types::ParseLevelError;

pub use catalog::{ContentCatalog, ContentModule, ContentSection, Question};
pub use library::{ContentDocument, ContentLibrary, ContentManifest};

/// Errors raised while loading or looking up content
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("unable to read content file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed content catalog {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed content metadata {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("content file missing front matter: {0}")]
    MissingFrontMatter(PathBuf),

    #[error("content file missing closing front matter: {0}")]
    UnterminatedFrontMatter(PathBuf),

    #[error("content id not found: {0}")]
    NotFound(String),

    #[error("invalid content catalog: {0}")]
    Invalid(String),

    #[error(transparent)]
    Level(#[from] ParseLevelError),
}

impl ContentError {
    /// Whether this error is a plain missing-id lookup rather than a
    /// malformed-content failure operators should hear about.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
