use std::any;
use std::fmt;

use snafu::Backtrace;
use snafu::GenerateImplicitData;
use snafu::Snafu;

use crate::error::Result;
use crate::error::StudyError;

#[derive(Debug, Snafu)]
#[snafu(display("{type_name} not found: {identifier}"))]
pub struct NotFoundError {
    pub type_name: String,
    pub identifier: String,
    pub backtrace: Option<Backtrace>,
}

impl PartialEq for NotFoundError {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name && self.identifier == other.identifier
    }
}

impl Eq for NotFoundError {}

/// Allows generating [StudyError::NotFound] from [Option::None].
pub trait OrNotFound {
    type Value;
    fn or_not_found(self, identifier: impl fmt::Display) -> Result<Self::Value>;
}

impl<T> OrNotFound for Option<T> {
    type Value = T;

    fn or_not_found(self, identifier: impl fmt::Display) -> Result<Self::Value> {
        self.ok_or_else(|| StudyError::NotFound {
            source: NotFoundError {
                type_name: unqualified_lowercase_type_name::<Self::Value>(),
                identifier: format!("{identifier}"),
                backtrace: GenerateImplicitData::generate(),
            },
        })
    }
}

fn unqualified_lowercase_type_name<T: ?Sized>() -> String {
    any::type_name::<T>()
        .split("::")
        .last()
        .unwrap_or_default()
        .to_ascii_lowercase()
}
