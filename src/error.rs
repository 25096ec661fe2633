//! Crate-level error type.
//!
//! Every variant is fatal for a run. Per-file filesystem failures are not
//! errors; they are reported through [`crate::rename::RenameOutcome::Failed`].

use crate::extraction::ExtractionError;
use crate::patterns::ConfigError;
use crate::serialization::SerializationError;
use crate::template::TemplateError;
use crate::transform::TransformError;
use crate::walker::WalkError;
use std::fmt;

#[derive(Debug)]
pub enum Error {
    Config(ConfigError),
    Extraction(ExtractionError),
    Transform(TransformError),
    Template(TemplateError),
    Walk(WalkError),
    Serialization(SerializationError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Configuration error: {}", e),
            Error::Extraction(e) => write!(f, "Extraction error: {}", e),
            Error::Transform(e) => write!(f, "Transform error: {}", e),
            Error::Template(e) => write!(f, "{}", e),
            Error::Walk(e) => write!(f, "{}", e),
            Error::Serialization(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Config(e) => Some(e),
            Error::Extraction(e) => Some(e),
            Error::Transform(e) => Some(e),
            Error::Template(e) => Some(e),
            Error::Walk(e) => Some(e),
            Error::Serialization(e) => Some(e),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err)
    }
}

impl From<ExtractionError> for Error {
    fn from(err: ExtractionError) -> Self {
        Error::Extraction(err)
    }
}

impl From<TransformError> for Error {
    fn from(err: TransformError) -> Self {
        Error::Transform(err)
    }
}

impl From<TemplateError> for Error {
    fn from(err: TemplateError) -> Self {
        Error::Template(err)
    }
}

impl From<WalkError> for Error {
    fn from(err: WalkError) -> Self {
        Error::Walk(err)
    }
}

impl From<SerializationError> for Error {
    fn from(err: SerializationError) -> Self {
        Error::Serialization(err)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
