//! # Error Handling
//!
//! Provides the unified `AppError` enum used across the workspace.

use derive_more::{Display, From};

/// The Global Error Enum.
///
/// We use `derive_more` for boilerplate.
/// Note: String errors default to `General`.
#[derive(Debug, Display, From)]
pub enum AppError {
    /// Wrapper for standard IO errors.
    #[display("IO Error: {_0}")]
    Io(std::io::Error),

    /// Malformed or structurally invalid configuration (YAML/JSON parse
    /// failure, missing required top-level input keys).
    /// We ignore this for `From<String>` to avoid conflict with General.
    #[from(ignore)]
    #[display("Configuration Error: {_0}")]
    Config(String),

    /// Generic errors.
    #[display("General Error: {_0}")]
    General(String),
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

/// Manual implementation of the standard Error trait.
impl std::error::Error for AppError {}

/// Helper type alias for Result using AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_io_conversion() {
        let io_err = Error::new(ErrorKind::Other, "test");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::Io(_)));
    }

    #[test]
    fn test_string_conversion() {
        // Test that String defaults to General, not Database
        let msg = String::from("something wrong");
        let app_err: AppError = msg.into();
        match app_err {
            AppError::General(s) => assert_eq!(s, "something wrong"),
            _ => panic!("String should convert to AppError::General"),
        }
    }

    #[test]
    fn test_config_manual_creation() {
        // Config errors must be created explicitly
        let app_err = AppError::Config("bad yaml".into());
        assert_eq!(format!("{}", app_err), "Configuration Error: bad yaml");
    }

    #[test]
    fn test_yaml_error_conversion() {
        let err = serde_yaml::from_str::<serde_yaml::Value>("a: [").unwrap_err();
        let app_err: AppError = err.into();
        assert!(matches!(app_err, AppError::Config(_)));
    }
}
