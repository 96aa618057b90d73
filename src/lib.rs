//! Scholar - Self-Paced Technical Learning Server
//!
//! A content-delivery web application:
//! - Curriculum catalog filtered by learner level, target OS, and focus tag
//! - Per-user progress tracking (completed, pinned, quiz scores)
//! - Manifest-driven lesson document library exposed as a JSON API
//! - JWT authentication with an in-config user table
//!
//! # Example
//!
//! ```ignore
//! use scholar::content::{filter, ContentCatalog};
//! use scholar::session::SessionContext;
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     let catalog = ContentCatalog::load(Path::new("content/study-content.json"))?;
//!     let visible = filter::filter_modules(&catalog, &SessionContext::default())?;
//!     println!("{} modules visible", visible.len());
//!     Ok(())
//! }
//! ```

pub mod types;
pub mod content;
pub mod session;
pub mod progress;
pub mod quiz;
pub mod config;
pub mod server;
pub mod cli;

// Re-export commonly used types for convenience
pub use content::{ContentCatalog, ContentDocument, ContentError, ContentLibrary, ContentModule};
pub use config::Config;
pub use progress::ProgressStore;
pub use session::{SessionContext, SessionStore};
pub use types::{LearningLevel, TargetOs};

pub use server::{build_router, start as start_server, ServerState};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get the library info
pub fn info() -> String {
    format!("{} v{} - Self-Paced Technical Learning Server", NAME, VERSION)
}
