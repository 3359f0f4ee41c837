use snafu::Backtrace;
use snafu::FromString;
use snafu::Snafu;

use crate::error::Result;
use crate::error::StudyError;

/// General-purpose error for unexpected [StudyError::InvalidInput]s.
#[derive(Debug, Snafu)]
#[snafu(whatever, display("{message}"))]
pub struct InvalidInputError {
    pub message: String,
    #[snafu(source(from(Box<dyn std::error::Error + Send + Sync>, Some)))]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
    pub backtrace: Option<Backtrace>,
}

impl InvalidInputError {
    pub fn message(&self) -> String {
        self.message.clone()
    }
}

impl PartialEq for InvalidInputError {
    fn eq(&self, other: &Self) -> bool {
        self.message == other.message
    }
}

impl Eq for InvalidInputError {}

/// Allows generating [StudyError::InvalidInput] from [Option::None] and the
/// typical [core::result::Result::Err].
pub trait OrInvalid {
    type Value;
    fn or_invalid(self, message: impl Into<String>) -> Result<Self::Value>;
}

impl<T> OrInvalid for Option<T> {
    type Value = T;

    fn or_invalid(self, message: impl Into<String>) -> Result<T> {
        self.ok_or_else(|| StudyError::InvalidInput {
            source: InvalidInputError::without_source(message.into()),
        })
    }
}

impl<T, E: std::error::Error + Send + Sync + 'static> OrInvalid for Result<T, E> {
    type Value = T;

    fn or_invalid(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|err| StudyError::InvalidInput {
            source: InvalidInputError::with_source(Box::new(err), message.into()),
        })
    }
}

/// Returns an [StudyError::InvalidInput] with the provided format string and
/// an optional underlying error.
#[macro_export]
macro_rules! invalid_input {
    ($fmt:literal$(, $($arg:expr),* $(,)?)?) => {
        return core::result::Result::Err({ $crate::error::StudyError::InvalidInput {
            source: snafu::FromString::without_source(
                format!($fmt$(, $($arg),*)*),
            )
        }})
    };
    ($source:expr, $fmt:literal$(, $($arg:expr),* $(,)?)?) => {
        return core::result::Result::Err({ $crate::error::StudyError::InvalidInput {
            source: snafu::FromString::with_source(
                core::convert::Into::into($source),
                format!($fmt$(, $($arg),*)*),
            )
        }})
    };
}
