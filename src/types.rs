use thiserror::Error;

/// Client-side ceiling on submitted files. Checked from metadata before
/// any bytes leave the machine; the backend enforces its own limit too.
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Error type shared across the client, executor and views.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    /// Per-attempt deadline exceeded on every attempt of an operation.
    #[error("request timed out after {attempts} attempts")]
    Timeout { attempts: u32 },

    /// HTTP 502 persisted through the retry budget.
    #[error("server unavailable (502 Bad Gateway): {message}")]
    Gateway { message: String },

    /// Any other non-2xx response; `message` is the server-supplied
    /// `detail` when one was parseable.
    #[error("API returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("file is {bytes} bytes; the limit is {MAX_UPLOAD_BYTES} bytes (10 MiB)")]
    FileTooLarge { bytes: u64 },

    #[error("search query is empty")]
    EmptyQuery,

    #[error("no text was extracted from the file")]
    NoExtractedText,
}

impl ClientError {
    /// True for the validation variants that are raised before any
    /// network attempt.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ClientError::FileTooLarge { .. } | ClientError::EmptyQuery | ClientError::NoExtractedText
        )
    }
}
