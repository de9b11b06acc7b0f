//! Context helpers for attaching a message to an underlying error.

use super::{JiraMetricsError, Result};

/// Attach a context message to any error result.
pub trait ResultExt<T> {
    /// Wrap the error with a static context message.
    ///
    /// # Errors
    ///
    /// Returns the wrapped error when `self` is `Err`.
    fn context(self, context: &str) -> Result<T>;

    /// Wrap the error with a lazily built context message.
    ///
    /// # Errors
    ///
    /// Returns the wrapped error when `self` is `Err`.
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, context: &str) -> Result<T> {
        self.map_err(|source| JiraMetricsError::WithContext {
            context: context.to_string(),
            source: Box::new(source),
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|source| JiraMetricsError::WithContext {
            context: f(),
            source: Box::new(source),
        })
    }
}
