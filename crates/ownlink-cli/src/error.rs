use std::path::PathBuf;

use miette::Diagnostic;
use ownlink::BindError;
use thiserror::Error;

/// CLI-specific error type that provides rich diagnostics
#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    #[error("No native library given")]
    #[diagnostic(
        code(ownlink::cli::no_library),
        help("pass --library <PATH>, --config <FILE>, or run from a directory containing ownlink.toml")
    )]
    NoLibrary {
        #[source]
        source: BindError,
    },

    #[error("Failed to load native library {path}")]
    #[diagnostic(code(ownlink::cli::load_error))]
    LoadError {
        path: PathBuf,
        #[source]
        source: BindError,
    },

    #[error("Native call failed: {message}")]
    #[diagnostic(code(ownlink::cli::call_error))]
    CallError {
        message: String,
        #[source]
        source: BindError,
    },
}

impl From<BindError> for CliError {
    fn from(error: BindError) -> Self {
        CliError::CallError { message: error.to_string(), source: error }
    }
}
