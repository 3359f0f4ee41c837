use std::fmt;

use crate::error::StudyError;

#[derive(Debug, PartialEq, Eq)]
pub struct NetworkError {
    pub info: String,
    pub kind: NetworkErrorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkErrorKind {
    Timeout,
    Connection,
    /// The provider answered with a non-success HTTP status.
    Status(u16),
    Other,
}

impl NetworkError {
    pub fn status(code: u16, body: &str) -> Self {
        let body = body.trim();
        let info = if body.is_empty() {
            format!("status {code}")
        } else {
            format!("status {code}: {body}")
        };
        NetworkError {
            info,
            kind: NetworkErrorKind::Status(code),
        }
    }
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            NetworkErrorKind::Timeout => write!(f, "request timed out: {}", self.info),
            NetworkErrorKind::Connection => write!(f, "connection failed: {}", self.info),
            NetworkErrorKind::Status(_) | NetworkErrorKind::Other => f.write_str(&self.info),
        }
    }
}

impl From<NetworkError> for StudyError {
    fn from(info: NetworkError) -> Self {
        StudyError::NetworkError { info }
    }
}

impl From<reqwest::Error> for StudyError {
    fn from(err: reqwest::Error) -> Self {
        let url = err.url().map(|url| url.as_str()).unwrap_or("");
        // strip the url, as it may reveal the endpoint configuration
        let info = format!("{err}").replace(url, "");

        let kind = if err.is_timeout() {
            NetworkErrorKind::Timeout
        } else if err.is_connect() {
            NetworkErrorKind::Connection
        } else if let Some(status) = err.status() {
            NetworkErrorKind::Status(status.as_u16())
        } else {
            NetworkErrorKind::Other
        };

        NetworkError { info, kind }.into()
    }
}
