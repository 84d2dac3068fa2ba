//! Error types and handling for the `escapadas` application

use chrono::NaiveDateTime;
use thiserror::Error;

/// Field-level validation failures raised while building a trip request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Malformed literal (date, time, integer)
    #[error("expected {expected}, got '{input}'")]
    Format { expected: String, input: String },

    /// Integer outside the accepted bounds
    #[error("{value} is out of range ({})", describe_bounds(.min, .max))]
    Range {
        value: i64,
        min: i64,
        max: Option<i64>,
    },

    /// Return instant not strictly after the start instant
    #[error("return ({end}) must be after the start ({start})")]
    Ordering {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    /// Required field left empty
    #[error("{field} is required")]
    Missing { field: &'static str },
}

fn describe_bounds(min: &i64, max: &Option<i64>) -> String {
    match max {
        Some(max) => format!("expected {min}-{max}"),
        None => format!("expected at least {min}"),
    }
}

impl ValidationError {
    pub fn format<E: Into<String>, S: Into<String>>(expected: E, input: S) -> Self {
        Self::Format {
            expected: expected.into(),
            input: input.into(),
        }
    }

    /// Message shown next to an interactive prompt before asking again
    #[must_use]
    pub fn hint(&self) -> String {
        match self {
            ValidationError::Format { expected, .. } => {
                format!("⚠️ Formato inválido. Se esperaba {expected}.")
            }
            ValidationError::Range {
                min, max: Some(max), ..
            } => format!("⚠️ Opción inválida. Elegí un número en {min}–{max}."),
            ValidationError::Range { min, max: None, .. } => {
                format!("⚠️ Ingresá un entero mayor o igual a {min}.")
            }
            ValidationError::Ordering { .. } => {
                "⚠️ La fecha/hora de regreso debe ser posterior a la de inicio. Intentá nuevamente."
                    .to_string()
            }
            ValidationError::Missing { .. } => "⚠️ Ingresá un texto no vacío.".to_string(),
        }
    }
}

/// Main error type for the `escapadas` application
#[derive(Error, Debug)]
pub enum EscapadasError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Trip parameters rejected by the validator
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// A text or image collaborator failed
    #[error("{service} error: {message}")]
    ExternalService { service: String, message: String },

    /// Collaborator answer could not be read as the expected JSON
    #[error("Parse error: {message}")]
    Parse { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// General application errors
    #[error("Application error: {message}")]
    General { message: String },
}

impl EscapadasError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new collaborator error
    pub fn external<S: Into<String>, M: Into<String>>(service: S, message: M) -> Self {
        Self::ExternalService {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Create a new parse error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create a new general error
    pub fn general<S: Into<String>>(message: S) -> Self {
        Self::General {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            EscapadasError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            EscapadasError::Validation(err) => format!("Invalid input: {err}"),
            EscapadasError::ExternalService { service, .. } => {
                format!("{service} is unavailable right now. Partial results were kept.")
            }
            EscapadasError::Parse { .. } => {
                "The model answered with unreadable JSON; an empty result was used.".to_string()
            }
            EscapadasError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
            EscapadasError::General { message } => message.clone(),
        }
    }
}
