use std::path::PathBuf;

use thiserror::Error;

use crate::abi::Signature;

/// Errors raised by the binding layer.
#[derive(Error, Debug)]
pub enum BindError {
    /// An operation needing ownership or a borrow ran against an emptied handle.
    #[error("attempted to access a value after it was moved (see E0382)")]
    ValueMoved,

    #[error("failed to load native library {path}: {source}")]
    LibraryLoad {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    #[error("symbol `{name}` not found in native library")]
    SymbolNotFound { name: String },

    #[error("symbol `{name}` is not declared in the binding manifest")]
    UnknownSymbol { name: String },

    #[error("symbol `{name}` is declared as `{declared}` but was requested as `{requested}`")]
    SignatureMismatch {
        name: String,
        declared: Signature,
        requested: Signature,
    },

    /// Bytes returned by the native side are not valid UTF-8. The native value itself is untouched.
    #[error("returned bytes are not valid UTF-8: {0}")]
    Marshal(#[from] std::str::Utf8Error),

    #[error("native call `{symbol}` returned a null address")]
    NullAddress { symbol: String },

    #[error("Invalid operation: {message}")]
    InvalidOperation { message: String },

    #[error("configuration error in {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<std::string::FromUtf8Error> for BindError {
    fn from(error: std::string::FromUtf8Error) -> Self {
        BindError::Marshal(error.utf8_error())
    }
}

/// Result type for binding operations
pub type BindResult<T> = std::result::Result<T, BindError>;
