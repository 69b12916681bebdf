/*!
 * Error handling for the stroke dataset store and query service
 *
 * Load failures carry file/line context and a suggestion for the operator,
 * query failures are split by kind so the HTTP layer can map each one to a
 * stable status code.
 */

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use serde::{Serialize, Deserialize};

/// Stroke query library result type
pub type Result<T> = std::result::Result<T, StrokeError>;

/// Errors raised while loading the dataset or answering a query
#[derive(Error, Debug)]
pub enum StrokeError {
    /// File I/O errors with context
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
        context: ErrorContext,
    },

    /// CSV parsing errors with location information
    #[error("CSV parsing error at line {line:?}: {message}")]
    CsvParse {
        message: String,
        line: Option<usize>,
        context: ErrorContext,
    },

    /// Parquet/Arrow decoding errors
    #[cfg(feature = "parquet")]
    #[error("Parquet error: {message}")]
    Parquet {
        message: String,
        context: ErrorContext,
    },

    /// A field value that does not fit the patient record model
    #[error("Data validation error: {message}")]
    DataValidation {
        message: String,
        field: Option<String>,
        value: Option<String>,
        context: ErrorContext,
    },

    /// Two rows share the same patient id
    #[error("Duplicate patient id {id} (first seen at row {first_row}, repeated at row {duplicate_row})")]
    DuplicateId {
        id: i64,
        first_row: usize,
        duplicate_row: usize,
    },

    /// File not found with suggestions
    #[error("File not found: {path}")]
    FileNotFound {
        path: PathBuf,
        suggestion: String,
    },

    /// Input file format that cannot be read
    #[error("Unsupported data format for '{path}'")]
    UnsupportedFormat {
        path: PathBuf,
        supported: Vec<String>,
    },

    /// Required columns missing from the source file
    #[error("Schema mismatch: {message}")]
    SchemaMismatch {
        message: String,
        missing_columns: Vec<String>,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        suggestion: Option<String>,
    },

    /// Identifier lookup miss
    #[error("Patient ID not found")]
    NotFound {
        id: i64,
    },

    /// Filter parameters that cannot be applied
    #[error("Filter error: {message}")]
    Filter {
        message: String,
    },

    /// Aggregation failure
    #[error("Statistics error: {message}")]
    Compute {
        message: String,
    },
}

/// Error context providing additional information
#[derive(Debug, Default, Clone)]
pub struct ErrorContext {
    pub file_path: Option<PathBuf>,
    pub line_number: Option<usize>,
    pub column_name: Option<String>,
}

/// Source file format, used for format selection and error context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DataFormat {
    #[default]
    Csv,
    Parquet,
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataFormat::Csv => write!(f, "CSV"),
            DataFormat::Parquet => write!(f, "Parquet"),
        }
    }
}

impl StrokeError {
    /// Create a file not found error with helpful suggestion
    pub fn file_not_found_with_suggestion(path: PathBuf) -> Self {
        let suggestion = if path.extension().is_some_and(|ext| ext == "parquet") {
            format!(
                "Check if the dataset exists at '{}'. The cleaned stroke dataset is usually shipped as \
                'data/clean_health.parquet'; a CSV export with the same columns works too.",
                path.display()
            )
        } else {
            format!(
                "Check if the file exists at '{}'. Make sure the path is correct and you have read permissions.",
                path.display()
            )
        };

        Self::FileNotFound { path, suggestion }
    }

    /// Create a schema mismatch error listing the missing columns
    pub fn missing_columns(missing_columns: Vec<String>) -> Self {
        Self::SchemaMismatch {
            message: format!("missing required column(s): {}", missing_columns.join(", ")),
            missing_columns,
        }
    }

    /// Create a validation error for a single field of a row
    pub fn invalid_field(field: &str, value: &str, reason: &str, line_number: Option<usize>) -> Self {
        Self::DataValidation {
            message: format!("{} '{}' is invalid: {}", field, value, reason),
            field: Some(field.to_string()),
            value: Some(value.to_string()),
            context: ErrorContext {
                line_number,
                column_name: Some(field.to_string()),
                ..Default::default()
            },
        }
    }

    /// Create a validation error for a required field left empty
    pub fn missing_field(field: &str, line_number: Option<usize>) -> Self {
        Self::DataValidation {
            message: format!("Missing required field: {}", field),
            field: Some(field.to_string()),
            value: None,
            context: ErrorContext {
                line_number,
                column_name: Some(field.to_string()),
                ..Default::default()
            },
        }
    }

    /// Attach the source file path to an error raised while reading it
    pub fn with_file(mut self, path: &std::path::Path) -> Self {
        match &mut self {
            Self::Io { context, .. }
            | Self::CsvParse { context, .. }
            | Self::DataValidation { context, .. } => {
                context.file_path = Some(path.to_path_buf());
            }
            #[cfg(feature = "parquet")]
            Self::Parquet { context, .. } => {
                context.file_path = Some(path.to_path_buf());
            }
            _ => {}
        }
        self
    }

    /// Whether this error belongs to the fatal startup (load) family
    pub fn is_load_error(&self) -> bool {
        !matches!(
            self,
            Self::NotFound { .. } | Self::Filter { .. } | Self::Compute { .. }
        )
    }

    /// Get a user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self {
            Self::FileNotFound { suggestion, .. } => {
                format!("{}\n\nSuggestion: {}", self, suggestion)
            }
            Self::UnsupportedFormat { supported, .. } => {
                format!("{}\n\nSupported formats: {}", self, supported.join(", "))
            }
            Self::SchemaMismatch { .. } => {
                format!(
                    "{}\n\nSuggestion: the dataset must provide the columns {}",
                    self,
                    crate::schema::PatientSchema::required_columns().join(", ")
                )
            }
            Self::DataValidation { context, .. } => match (&context.file_path, context.line_number) {
                (Some(path), Some(line)) => format!("{} ({}:{})", self, path.display(), line),
                (None, Some(line)) => format!("{} (row {})", self, line),
                _ => self.to_string(),
            },
            Self::Configuration { suggestion: Some(sug), .. } => {
                format!("{}\n\nSuggestion: {}", self, sug)
            }
            _ => self.to_string(),
        }
    }
}

// Convenience conversions
impl From<std::io::Error> for StrokeError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
            source: err,
            context: ErrorContext::default(),
        }
    }
}

impl From<csv::Error> for StrokeError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(|pos| pos.line() as usize);

        Self::CsvParse {
            message: err.to_string(),
            line,
            context: ErrorContext::default(),
        }
    }
}

#[cfg(feature = "parquet")]
impl From<parquet::errors::ParquetError> for StrokeError {
    fn from(err: parquet::errors::ParquetError) -> Self {
        Self::Parquet {
            message: err.to_string(),
            context: ErrorContext::default(),
        }
    }
}

#[cfg(feature = "parquet")]
impl From<arrow::error::ArrowError> for StrokeError {
    fn from(err: arrow::error::ArrowError) -> Self {
        Self::Parquet {
            message: err.to_string(),
            context: ErrorContext::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_errors_are_not_load_errors() {
        assert!(!StrokeError::NotFound { id: 7 }.is_load_error());
        assert!(!StrokeError::Filter { message: "x".into() }.is_load_error());
        assert!(!StrokeError::Compute { message: "x".into() }.is_load_error());
        assert!(StrokeError::missing_columns(vec!["bmi".into()]).is_load_error());
        assert!(StrokeError::DuplicateId { id: 1, first_row: 2, duplicate_row: 3 }.is_load_error());
    }

    #[test]
    fn test_not_found_message() {
        assert_eq!(StrokeError::NotFound { id: 99 }.to_string(), "Patient ID not found");
    }

    #[test]
    fn test_user_message_includes_location() {
        let err = StrokeError::invalid_field("age", "-3", "must not be negative", Some(12))
            .with_file(std::path::Path::new("data/stroke.csv"));
        let message = err.user_message();
        assert!(message.contains("age '-3' is invalid"));
        assert!(message.contains("data/stroke.csv:12"));
    }

    #[test]
    fn test_missing_columns_lists_names() {
        let err = StrokeError::missing_columns(vec!["bmi".into(), "stroke".into()]);
        assert_eq!(err.to_string(), "Schema mismatch: missing required column(s): bmi, stroke");
    }
}
