use thiserror::Error;

use crate::config::ConfigError;
use crate::jobs::JobError;

/// Application-wide error type used by the binary and the HTTP layer.
///
/// Library callers of the job runner deal in [`JobError`]; everything that
/// crosses the process or HTTP boundary is converted into this type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Resource not found: {entity} with {field}={value}")]
    NotFound {
        entity: String,
        field: String,
        value: String,
    },

    #[error("Validation failed for {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Configuration error: {key}")]
    Configuration {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Job runner error")]
    Job {
        #[source]
        source: JobError,
    },

    #[error("Internal error")]
    Internal {
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::Internal { source: error }
    }
}

impl From<JobError> for AppError {
    fn from(error: JobError) -> Self {
        match error {
            JobError::NotFound(id) => AppError::NotFound {
                entity: "entry".to_string(),
                field: "id".to_string(),
                value: id.to_string(),
            },
            JobError::InvalidSchedule(reason) => AppError::Validation {
                field: "spec".to_string(),
                reason,
            },
            source => AppError::Job { source },
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(error: ConfigError) -> Self {
        let key = match &error {
            ConfigError::ValidationError { field, .. } => field.clone(),
            ConfigError::FileNotFound(_) => "file".to_string(),
            ConfigError::EnvVarError(_) | ConfigError::MutualExclusivityError(_) => {
                "environment".to_string()
            }
            ConfigError::ParseError(_) | ConfigError::Other(_) => "parse".to_string(),
        };
        AppError::Configuration {
            key,
            source: anyhow::Error::new(error),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
