use thiserror::Error;

use crate::metadata::token::Token;

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Recoverable problems during an import are reported through the diagnostic stream instead;
/// this enum covers the conditions that end an import (or a lookup) outright.
#[derive(Error, Debug)]
pub enum Error {
    /// The import was aborted after a fatal diagnostic.
    ///
    /// This is a sentinel: the diagnostic describing the failure has already been recorded
    /// on the importer before this error is raised. The public `import` entry catches it
    /// and converts it into a failed result carrying the accumulated diagnostics.
    #[error("Import aborted")]
    Aborted,

    /// A token did not resolve to a row in the module it was used against.
    ///
    /// The associated [`Token`] identifies the missing row.
    #[error("Token does not resolve to a metadata row - {0}")]
    TokenNotFound(Token),

    /// Reached the maximum recursion level allowed.
    ///
    /// Emitted when a resolution-scope chain exceeds the configured depth cap, to prevent
    /// stack overflow on cyclic or degenerate metadata.
    #[error("Reached the maximum recursion level allowed - {0}")]
    RecursionLimit(usize),

    /// Internal invariant violation.
    ///
    /// Never expected at runtime with well-formed inputs; callers treat it as fatal.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Shorthand for an [`Error::Internal`] with a formatted message.
    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Error::Internal(message.into())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats() {
        assert_eq!(format!("{}", Error::Aborted), "Import aborted");
        assert_eq!(
            format!("{}", Error::RecursionLimit(500)),
            "Reached the maximum recursion level allowed - 500"
        );
        assert_eq!(
            format!("{}", Error::TokenNotFound(Token::new(0x0200_0001))),
            "Token does not resolve to a metadata row - 0x02000001"
        );
    }
}
