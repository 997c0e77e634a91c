use thiserror::Error;

#[derive(Debug, Error)]
pub enum CinesyncError {
    #[error("Invalid content document: {0}")]
    Content(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Vocabulary index {index} out of range (list has {len} entries)")]
    VocabIndex { index: usize, len: usize },

    #[error("Subtitle index {index} out of range (track has {len} lines)")]
    CueIndex { index: usize, len: usize },

    #[error("Subtitle text must not be empty")]
    EmptyText,

    #[error("Invalid time value: {0}")]
    InvalidTime(String),

    #[error(transparent)]
    Obfuscation(#[from] ObfuscationError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failure to reverse the `hiddenSub` scrambling.
#[derive(Debug, Error)]
pub enum ObfuscationError {
    #[error("Outer layer is not valid base64: {0}")]
    OuterBase64(#[source] base64::DecodeError),

    #[error("Outer layer did not decode to ASCII text")]
    NotAscii,

    #[error("Inner layer is not valid base64: {0}")]
    InnerBase64(#[source] base64::DecodeError),

    #[error("Decoded subtitle is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

pub type Result<T, E = CinesyncError> = std::result::Result<T, E>;
