//! Error taxonomy for file-selection setup.
//!
//! Selection setup can fail in exactly three ways: a glob pattern that
//! doesn't start with the root it's meant to select under (`FilePrefixError`),
//! a glob pattern that can't be translated into a matcher at all
//! (`GlobbingError`), or a filelist (or the backup root itself) that can't
//! be read or parsed (`FilelistIo`/`FilelistParse`). Everything else — a
//! path that can't be `stat`'d during the walk, say — is recovered at the
//! point of discovery and logged, not propagated as one of these.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::exit_code::{ExitCode, HasExitCode};

/// Errors that can prevent file-selection setup from completing.
#[derive(Debug, Error)]
pub enum SelectionError {
    /// A glob or literal selection argument did not begin with the backup
    /// root it was specified against.
    #[error("file specification {argument:?} does not start with root {root:?}")]
    FilePrefixError {
        /// The offending CLI argument, verbatim.
        argument: String,
        /// The backup root it was checked against.
        root: PathBuf,
    },

    /// A glob pattern could not be translated into a matcher, e.g. an
    /// unterminated character class or a directive string with no glob
    /// payload.
    #[error("cannot parse glob pattern {pattern:?}: {reason}")]
    GlobbingError {
        /// The offending pattern, verbatim.
        pattern: String,
        /// Why compilation failed.
        reason: String,
    },

    /// A filelist named on the command line could not be opened or read,
    /// or the backup root itself could not be `stat`'d before setup.
    #[error("cannot read {path:?}")]
    FilelistIo {
        /// The path that could not be read.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// A filelist entry was malformed (e.g. an unterminated quote).
    #[error("malformed entry in filelist {path:?} at line {line}: {reason}")]
    FilelistParse {
        /// The filelist's path.
        path: PathBuf,
        /// The 1-based line number of the offending entry.
        line: usize,
        /// What was wrong with it.
        reason: String,
    },
}

impl HasExitCode for SelectionError {
    fn exit_code(&self) -> ExitCode {
        ExitCode::SelectionSetup
    }
}

/// A `Result` whose error type is [`SelectionError`].
pub type SelectionResult<T> = Result<T, SelectionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_prefix_error_message() {
        let error = SelectionError::FilePrefixError {
            argument: "/etc/passwd".to_owned(),
            root: PathBuf::from("/home/user"),
        };
        let message = error.to_string();
        assert!(message.contains("/etc/passwd"));
        assert!(message.contains("/home/user"));
    }

    #[test]
    fn filelist_io_preserves_source() {
        let source = io::Error::new(io::ErrorKind::NotFound, "no such file");
        let error = SelectionError::FilelistIo {
            path: PathBuf::from("filelist.txt"),
            source,
        };
        assert!(std::error::Error::source(&error).is_some());
    }

    #[test]
    fn every_variant_maps_to_selection_setup_exit_code() {
        let errors = vec![
            SelectionError::FilePrefixError {
                argument: "x".to_owned(),
                root: PathBuf::from("/"),
            },
            SelectionError::GlobbingError {
                pattern: "x".to_owned(),
                reason: "bad".to_owned(),
            },
            SelectionError::FilelistIo {
                path: PathBuf::from("x"),
                source: io::Error::other("bad"),
            },
            SelectionError::FilelistParse {
                path: PathBuf::from("x"),
                line: 1,
                reason: "bad".to_owned(),
            },
        ];
        for error in errors {
            assert_eq!(error.exit_code(), ExitCode::SelectionSetup);
        }
    }
}
