//! Error types for configuration loading and validation.

use blockhdl_diagnostics::{Diagnostic, DiagnosticCode};

/// Errors that can occur when loading or validating a `blockhdl.toml` configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An I/O error occurred while reading the configuration file.
    #[error("failed to read configuration: {0}")]
    IoError(#[from] std::io::Error),

    /// The TOML content could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// A required field is missing from the configuration.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// A configuration value failed validation.
    #[error("validation error: {0}")]
    ValidationError(String),
}

impl ConfigError {
    /// The stable diagnostic code for this error.
    pub fn code(&self) -> DiagnosticCode {
        let number = match self {
            ConfigError::IoError(_) => 401,
            ConfigError::ParseError(_) => 402,
            ConfigError::MissingField(_) => 403,
            ConfigError::ValidationError(_) => 404,
        };
        DiagnosticCode::error(number)
    }

    /// Converts this error into a renderable diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.code(), self.to_string());
        match self {
            ConfigError::IoError(_) => {
                diag.with_help("run `blockhdl init` to create a project, or pass --config")
            }
            _ => diag,
        }
    }
}
