use thiserror::Error;

/// Errors raised by the item store, codecs and the holiday importer.
#[derive(Error, Debug)]
pub enum CalendarError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Preferences parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("Preferences write error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("ICS parse error: {0}")]
    Ics(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Holiday service returned HTTP {0}")]
    HttpStatus(u16),
}

pub type Result<T> = std::result::Result<T, CalendarError>;
