mod invalid_input;
mod network;
mod not_found;

pub use invalid_input::InvalidInputError;
pub use invalid_input::OrInvalid;
pub use network::NetworkError;
pub use network::NetworkErrorKind;
pub use not_found::NotFoundError;
pub use not_found::OrNotFound;
use snafu::Snafu;

pub type Result<T, E = StudyError> = std::result::Result<T, E>;

/// Generic text shown to end users when generation fails for a reason they
/// can only address by trying again.
pub const RETRY_MESSAGE: &str = "Generation failed. Please try again.";

#[derive(Debug, PartialEq, Eq, Snafu)]
pub enum StudyError {
    #[snafu(context(false), display("{source}"))]
    InvalidInput { source: InvalidInputError },
    #[snafu(display("configuration error: {info}"))]
    ConfigError { info: String },
    #[snafu(display("{info}"))]
    NetworkError { info: NetworkError },
    /// Every model candidate was tried and none produced a usable completion.
    #[snafu(display("all {attempts} model candidates failed; last error: {last_error}"))]
    DispatchFailed { attempts: usize, last_error: String },
    /// The completion succeeded, but its content could not be turned into
    /// structured data.
    #[snafu(display("model output did not contain a usable result"))]
    ExtractionFailed { raw: String },
    #[snafu(display("json error: {info}"))]
    JsonError { info: String },
    #[snafu(display("io error: {info}"))]
    IoError { info: String },
    #[snafu(display("storage error: {info}"))]
    StorageError { info: String },
    #[snafu(context(false), display("{source}"))]
    NotFound { source: NotFoundError },
}

impl StudyError {
    /// True when regenerating may succeed: the provider was unreachable, every
    /// candidate failed, or the model produced unusable output.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StudyError::NetworkError { .. }
                | StudyError::DispatchFailed { .. }
                | StudyError::ExtractionFailed { .. }
        )
    }

    /// Text suitable for display to an end user. Raw model output and provider
    /// diagnostics are never included.
    pub fn user_message(&self) -> String {
        match self {
            StudyError::InvalidInput { source } => source.message.clone(),
            StudyError::NotFound { source } => source.to_string(),
            _ => RETRY_MESSAGE.to_string(),
        }
    }

    pub(crate) fn config(info: impl Into<String>) -> Self {
        StudyError::ConfigError { info: info.into() }
    }
}

impl From<serde_json::Error> for StudyError {
    fn from(err: serde_json::Error) -> Self {
        StudyError::JsonError {
            info: err.to_string(),
        }
    }
}

impl From<std::io::Error> for StudyError {
    fn from(err: std::io::Error) -> Self {
        StudyError::IoError {
            info: err.to_string(),
        }
    }
}
