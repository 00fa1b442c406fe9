//! Error handling and error types for gbtune.
//!
//! Every fallible operation in the crate returns [`Result`], carrying a
//! [`GbtuneError`]. Search-termination signals (such as a converged
//! coordinate ascent) are not errors and live in their own types.

use std::io;
use thiserror::Error;

/// Main error type for the gbtune library.
#[derive(Error, Debug)]
pub enum GbtuneError {
    /// Configuration and validation errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Invalid hyperparameter value
    #[error("Invalid parameter: {parameter} = {value}, {reason}")]
    InvalidParameter {
        parameter: String,
        value: String,
        reason: String,
    },

    /// Dataset-related errors
    #[error("Dataset error: {message}")]
    Dataset { message: String },

    /// Dimension mismatch errors
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: String, actual: String },

    /// Not enough rows for the requested operation
    #[error("Insufficient data: need at least {required} samples, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// Training-related errors
    #[error("Training error: {message}")]
    Training { message: String },

    /// Numerical invariant violations (empty leaves, zero hessian sums)
    #[error("Numerical error: {message}")]
    Numerical { message: String },

    /// Cross-validation or search evaluation failures
    #[error("Evaluation error: {message}")]
    Evaluation { message: String },

    /// Model serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// File I/O errors
    #[error("I/O error: {source}")]
    IO {
        #[from]
        source: io::Error,
    },

    /// JSON serialization errors
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    /// TOML parsing errors
    #[error("TOML error: {source}")]
    Toml {
        #[from]
        source: toml::de::Error,
    },

    /// Internal library errors (should not occur in normal usage)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Type alias for Results using GbtuneError
pub type Result<T> = std::result::Result<T, GbtuneError>;

impl GbtuneError {
    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        GbtuneError::Config {
            message: message.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter<P, V, R>(parameter: P, value: V, reason: R) -> Self
    where
        P: Into<String>,
        V: Into<String>,
        R: Into<String>,
    {
        GbtuneError::InvalidParameter {
            parameter: parameter.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a dataset error
    pub fn dataset<S: Into<String>>(message: S) -> Self {
        GbtuneError::Dataset {
            message: message.into(),
        }
    }

    /// Create a dimension mismatch error
    pub fn dimension_mismatch<E, A>(expected: E, actual: A) -> Self
    where
        E: Into<String>,
        A: Into<String>,
    {
        GbtuneError::DimensionMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create an insufficient data error
    pub fn insufficient_data(required: usize, actual: usize) -> Self {
        GbtuneError::InsufficientData { required, actual }
    }

    /// Create a training error
    pub fn training<S: Into<String>>(message: S) -> Self {
        GbtuneError::Training {
            message: message.into(),
        }
    }

    /// Create a numerical error
    pub fn numerical<S: Into<String>>(message: S) -> Self {
        GbtuneError::Numerical {
            message: message.into(),
        }
    }

    /// Create an evaluation error
    pub fn evaluation<S: Into<String>>(message: S) -> Self {
        GbtuneError::Evaluation {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization<S: Into<String>>(message: S) -> Self {
        GbtuneError::Serialization {
            message: message.into(),
        }
    }

    /// Create an internal error (should be used sparingly)
    pub fn internal<S: Into<String>>(message: S) -> Self {
        GbtuneError::Internal {
            message: message.into(),
        }
    }

    /// Check if this error is recoverable.
    ///
    /// Recoverable errors depend on the particular data or hyperparameter
    /// point being evaluated; retrying with different inputs may succeed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            GbtuneError::Config { .. } => false,
            GbtuneError::InvalidParameter { .. } => false,
            GbtuneError::Dataset { .. } => false,
            GbtuneError::DimensionMismatch { .. } => false,
            GbtuneError::InsufficientData { .. } => true,
            GbtuneError::Training { .. } => true,
            GbtuneError::Numerical { .. } => true,
            GbtuneError::Evaluation { .. } => true,
            GbtuneError::Serialization { .. } => false,
            GbtuneError::IO { .. } => false,
            GbtuneError::Json { .. } => false,
            GbtuneError::Toml { .. } => false,
            GbtuneError::Internal { .. } => false,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            GbtuneError::Config { .. } => "config",
            GbtuneError::InvalidParameter { .. } => "invalid_parameter",
            GbtuneError::Dataset { .. } => "dataset",
            GbtuneError::DimensionMismatch { .. } => "dimension_mismatch",
            GbtuneError::InsufficientData { .. } => "insufficient_data",
            GbtuneError::Training { .. } => "training",
            GbtuneError::Numerical { .. } => "numerical",
            GbtuneError::Evaluation { .. } => "evaluation",
            GbtuneError::Serialization { .. } => "serialization",
            GbtuneError::IO { .. } => "io",
            GbtuneError::Json { .. } => "json",
            GbtuneError::Toml { .. } => "toml",
            GbtuneError::Internal { .. } => "internal",
        }
    }
}

/// Convenience macros for error creation
#[macro_export]
macro_rules! config_error {
    ($msg:expr) => {
        $crate::core::error::GbtuneError::config($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::core::error::GbtuneError::config(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! dataset_error {
    ($msg:expr) => {
        $crate::core::error::GbtuneError::dataset($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::core::error::GbtuneError::dataset(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! numerical_error {
    ($msg:expr) => {
        $crate::core::error::GbtuneError::numerical($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::core::error::GbtuneError::numerical(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !($cond) {
            return Err($err.into());
        }
    };
}
