//! Error types
// (c) 2024 Ross Younger

use std::{path::PathBuf, sync::Arc};

use crate::lexer::Position;

/// Result type used throughout this crate
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while decoding or querying an ssh configuration.
///
/// Parse-time errors abort the whole decode. [`Error::DepthExceeded`] is never wrapped,
/// so callers can always detect a recursive `Include` loop by matching on it directly.
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Malformed input
    #[error("{position}: {message}")]
    Parse {
        /// Where the problem was found
        position: Position,
        /// What went wrong
        message: String,
    },

    /// A directive form we recognise but do not implement
    #[error("{position}: '{directive}' is not supported")]
    UnsupportedDirective {
        /// Where the directive was found
        position: Position,
        /// The offending directive
        directive: String,
    },

    /// A Host or Match pattern could not be used
    #[error("{position}: invalid pattern: {reason}")]
    InvalidPattern {
        /// Where the pattern was found
        position: Position,
        /// What went wrong
        reason: String,
    },

    /// Pattern strings may not be empty
    #[error("empty pattern")]
    EmptyPattern,

    /// Include directives were nested too deeply
    #[error("max include depth of {} exceeded", crate::config::INCLUDE_DEPTH_LIMIT)]
    DepthExceeded,

    /// Something went wrong within a file pulled in by an Include directive
    #[error("{position}: in included file {}: {source}", path.display())]
    Include {
        /// Position of the Include directive
        position: Position,
        /// The file that failed
        path: PathBuf,
        /// The underlying problem
        source: Box<Error>,
    },

    /// A resolved value was not acceptable for its key
    #[error("value for key {key:?} is invalid: {reason} (got {value:?})")]
    Validation {
        /// The key that was looked up
        key: String,
        /// The value that was found
        value: String,
        /// What was wrong with it
        reason: String,
    },

    /// A file could not be read
    #[error("{}: {source}", path.display())]
    Io {
        /// The file we tried to read
        path: PathBuf,
        /// The underlying problem
        source: Arc<std::io::Error>,
    },
}

impl Error {
    pub(crate) fn parse<S: Into<String>>(position: Position, message: S) -> Self {
        Self::Parse {
            position,
            message: message.into(),
        }
    }

    pub(crate) fn io<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source: Arc::new(source),
        }
    }

    /// Is this a missing-file error?
    ///
    /// Optional configuration sources that do not exist are skipped, not reported.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

#[cfg(test)]
mod test {
    use super::Error;
    use crate::lexer::Position;
    use assertables::assert_contains;

    #[test]
    fn positions_are_reported() {
        let e = Error::parse(Position { line: 3, col: 7 }, "oops");
        assert_eq!(e.to_string(), "3:7: oops");
    }

    #[test]
    fn nested_include_errors_name_the_file() {
        let inner = Error::parse(Position { line: 1, col: 1 }, "bad");
        let e = Error::Include {
            position: Position { line: 4, col: 1 },
            path: "/tmp/other".into(),
            source: Box::new(inner),
        };
        assert_contains!(e.to_string(), "/tmp/other");
        assert_contains!(e.to_string(), "1:1: bad");
    }

    #[test]
    fn not_found() {
        let e = Error::io(
            "/nonexistent",
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        assert!(e.is_not_found());
        let e = Error::io(
            "/nonexistent",
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        assert!(!e.is_not_found());
        assert!(!Error::EmptyPattern.is_not_found());
    }
}
