//! Structured error types for the docflow layout engine.
//!
//! Data problems in the style graph degrade to defaults and never surface
//! here. What does surface are internal-consistency failures (runaway style
//! chains), sequencing mistakes (reading output before layout) and input that
//! could not be decoded at all.

use thiserror::Error;

/// The unified error type returned by all public docflow API functions.
#[derive(Debug, Error)]
pub enum DocflowError {
    /// JSON input failed to parse as a valid document.
    #[error("Failed to parse document: {source}{}", format_hint(.hint))]
    Parse {
        #[source]
        source: serde_json::Error,
        hint: String,
    },

    /// A style lookup walked deeper than the configured bound.
    #[error("Style resolution of '{property}' exceeded depth {depth}")]
    ResolutionOverflow { property: &'static str, depth: usize },

    /// The based-on links of the named styles form a cycle.
    #[error("Style '{id}' is based on itself through its based-on chain")]
    StyleCycle { id: String },

    /// Positioned output was requested for something that was never laid out.
    #[error("{what} has not been laid out yet")]
    NotLaidOut { what: &'static str },

    /// A custom font could not be parsed.
    #[error("Font error: {0}")]
    Font(String),

    /// Picture data could not be decoded.
    #[error("Image error: {0}")]
    Image(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DocflowError>;

fn format_hint(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {hint}")
    }
}

impl From<serde_json::Error> for DocflowError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the document schema. Check field names and the \"type\" tags.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        DocflowError::Parse { source: e, hint }
    }
}
