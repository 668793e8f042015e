use error_stack::{Context, Report};
use std::borrow::Cow;
use thiserror::Error as ThisError;
use tracing_error::SpanTrace;

use crate::types;

mod impls;

pub type Result<T> = std::result::Result<T, Error>;

/// Error returned by every service and controller. It pairs the kind of
/// failure the client sees with the full report that only the logs see.
pub struct Error {
    error_type: types::Error,
    message: Option<Cow<'static, str>>,
    report: Report<RequestFailed>,
    trace: SpanTrace,
}

#[derive(Debug, ThisError)]
#[error("Failed to perform request")]
pub struct RequestFailed;

impl Error {
    #[must_use]
    pub fn new(error_type: types::Error) -> Self {
        Self {
            error_type,
            message: None,
            report: Report::new(RequestFailed),
            trace: SpanTrace::capture(),
        }
    }

    #[must_use]
    pub fn from_context(error_type: types::Error, context: impl Context) -> Self {
        Self::from_report(error_type, Report::new(context))
    }

    #[must_use]
    pub fn from_report(error_type: types::Error, report: Report<impl Context>) -> Self {
        Self {
            error_type,
            message: None,
            report: report.change_context(RequestFailed),
            trace: SpanTrace::capture(),
        }
    }
}

impl Error {
    /// Overrides the default message of the error type shown to the client.
    #[must_use]
    pub fn message(mut self, message: impl Into<Cow<'static, str>>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[must_use]
    pub fn as_type(&self) -> &types::Error {
        &self.error_type
    }

    #[must_use]
    pub fn client_message(&self) -> Cow<'_, str> {
        match self.message.as_deref() {
            Some(message) => Cow::Borrowed(message),
            None => Cow::Owned(self.error_type.to_string()),
        }
    }
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Error")
            .field("type", &self.error_type)
            .field("message", &self.message)
            .field("report", &self.report)
            .field("trace", &self.trace)
            .finish()
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: ", self.client_message())?;
        writeln!(f, "{:?}", self.report)?;
        std::fmt::Display::fmt(&self.trace, f)
    }
}

impl From<types::Error> for Error {
    fn from(value: types::Error) -> Self {
        Self::new(value)
    }
}
