//! Error types for modroot

use thiserror::Error;

/// The main error type for modroot operations
#[derive(Debug, Error)]
pub enum ModrootError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("TOML serialization error: {0}")]
    TomlSer(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Missing reference: {0}")]
    MissingReference(String),

    #[error("Asset error: {0}")]
    Asset(String),

    #[error("Container error: {0}")]
    Container(String),

    #[error("Container '{requested}' cannot be opened for write while '{held}' is open")]
    ContainerBusy { requested: String, held: String },

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Result type alias for modroot operations
pub type Result<T> = std::result::Result<T, ModrootError>;

impl ModrootError {
    /// True for errors caused by the filesystem rather than document contents
    pub fn is_io(&self) -> bool {
        matches!(self, ModrootError::Io(_))
    }
}

impl From<toml::de::Error> for ModrootError {
    fn from(err: toml::de::Error) -> Self {
        ModrootError::TomlParse(err.to_string())
    }
}

impl From<toml::ser::Error> for ModrootError {
    fn from(err: toml::ser::Error) -> Self {
        ModrootError::TomlSer(err.to_string())
    }
}
