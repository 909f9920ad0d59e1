use thiserror::Error;

/// quotrack error types
#[derive(Error, Debug)]
pub enum QuotrackError {
    /// File I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),
}

/// Result type alias for quotrack
pub type Result<T> = std::result::Result<T, QuotrackError>;

/// Errors produced by a single remote stats call.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Endpoint base URL does not parse; a configuration error, never retried
    #[error("invalid endpoint URL: {0}")]
    InvalidUrl(String),

    /// Request exceeded the per-call timeout
    #[error("request timed out")]
    Timeout,

    /// Transport-level failure; OS error code kept for diagnostics when known
    #[error("network error: {detail}")]
    Network { code: Option<i32>, detail: String },

    /// Non-200 HTTP status; the raw body is shown verbatim when present
    #[error("{}", http_error_text(.status, .body))]
    HttpStatus { status: u16, body: Option<String> },

    /// Body could not be decoded as the expected JSON shape
    #[error("malformed response: {0}")]
    Decode(String),

    /// HTTP 200 with the success flag unset and no message to show
    #[error("invalid response from server")]
    InvalidResponse,

    /// Remote reported an explicit failure; message shown verbatim
    #[error("{0}")]
    Business(String),

    /// All retry attempts failed; wraps the last error seen
    #[error("request failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<ApiError>,
    },
}

impl ApiError {
    /// Whether another attempt could plausibly change the outcome.
    ///
    /// Configuration errors and explicit business rejections are final;
    /// transport and protocol failures are worth retrying.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ApiError::InvalidUrl(_) | ApiError::Business(_))
    }
}

fn http_error_text(status: &u16, body: &Option<String>) -> String {
    match body.as_deref() {
        Some(b) if !b.trim().is_empty() => b.to_string(),
        _ => format!("HTTP error: {status}"),
    }
}
