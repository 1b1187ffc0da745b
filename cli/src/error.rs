#![deny(missing_docs)]

//! # CLI Errors
//!
//! Error types for the CLI crate.

use derive_more::{Display, Error, From};

/// Main error enum for CLI operations.
#[derive(Debug, Display, From, Error)]
pub enum CliError {
    /// IO Error wrapper.
    #[display("IO Error: {_0}")]
    Io(std::io::Error),

    /// Propagated from the core extraction pipeline (config parse
    /// failure, unknown preset name).
    #[display("{_0}")]
    Core(apispec_core::AppError),

    /// General failure message.
    #[from(ignore)]
    #[display("Operation failed: {_0}")]
    General(String),
}

/// Result type alias.
pub type CliResult<T> = Result<T, CliError>;
