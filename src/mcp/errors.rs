use std::path::PathBuf;
use thiserror::Error;

pub const INVALID_REQUEST: &str = "invalid_request";
pub const INPUT_FILE_NOT_FOUND: &str = "input_file_not_found";
pub const REFERENCE_DOC_NOT_FOUND: &str = "reference_doc_not_found";
pub const DEFAULTS_FILE_NOT_FOUND: &str = "defaults_file_not_found";
pub const INVALID_DEFAULTS_FILE: &str = "invalid_defaults_file";
pub const FILTER_NOT_FOUND: &str = "filter_not_found";
pub const ENGINE_NOT_FOUND: &str = "engine_not_found";
pub const EMPTY_OUTPUT: &str = "empty_output";
pub const CONVERSION_FAILED: &str = "conversion_failed";

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{0}")]
    InvalidRequest(String),
    #[error("Input file not found: {}", .0.display())]
    InputFileNotFound(PathBuf),
    #[error("Reference document not found: {}", .0.display())]
    ReferenceDocNotFound(PathBuf),
    #[error("Defaults file not found: {}", .0.display())]
    DefaultsFileNotFound(PathBuf),
    #[error("Invalid defaults file {}: {reason}", .path.display())]
    InvalidDefaultsFile { path: PathBuf, reason: String },
    #[error("Filter not found in any of the searched locations: {0}")]
    FilterNotFound(String),
    #[error(
        "Pandoc executable not found ({program}). Please ensure Pandoc is installed and available in your PATH"
    )]
    EngineNotFound { program: String },
    #[error("Conversion resulted in empty output")]
    EmptyOutput,
    #[error("Error converting {origin} from {from} to {to}{context}: {details}")]
    ConversionFailed {
        origin: &'static str,
        from: String,
        to: String,
        context: String,
        details: String,
    },
}

impl ToolError {
    pub fn invalid(message: impl Into<String>) -> Self {
        ToolError::InvalidRequest(message.into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::InvalidRequest(_) => INVALID_REQUEST,
            ToolError::InputFileNotFound(_) => INPUT_FILE_NOT_FOUND,
            ToolError::ReferenceDocNotFound(_) => REFERENCE_DOC_NOT_FOUND,
            ToolError::DefaultsFileNotFound(_) => DEFAULTS_FILE_NOT_FOUND,
            ToolError::InvalidDefaultsFile { .. } => INVALID_DEFAULTS_FILE,
            ToolError::FilterNotFound(_) => FILTER_NOT_FOUND,
            ToolError::EngineNotFound { .. } => ENGINE_NOT_FOUND,
            ToolError::EmptyOutput => EMPTY_OUTPUT,
            ToolError::ConversionFailed { .. } => CONVERSION_FAILED,
        }
    }
}
