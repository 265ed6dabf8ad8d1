//! Process exit codes for the selection binary.
//!
//! spec.md §6 only distinguishes two outcomes for selection setup: success,
//! or a single fatal configuration error. This mirrors the *shape* of the
//! teacher workspace's upstream-compatible `ExitCode` enum (a `#[repr(i32)]`
//! enum with a `description()` and a `HasExitCode` trait) without carrying
//! over the transfer-protocol-specific codes (`RERR_PROTOCOL`,
//! `RERR_SOCKETIO`, …) that have no counterpart once storage/transport are
//! out of scope.

use std::fmt;

/// Exit codes returned by the selection binary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ExitCode {
    /// Successful completion.
    Ok = 0,
    /// A `FilePrefixError`, `GlobbingError`, or filelist I/O failure
    /// prevented selection setup from completing.
    SelectionSetup = 1,
    /// A per-path error occurred during the walk. The walk itself still
    /// completed (per-path errors are recovered, not fatal), but the
    /// caller should know not every path could be considered.
    PartialWalk = 23,
}

impl ExitCode {
    /// Returns the numeric exit code value.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// Returns a human-readable description of this exit code.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Ok => "success",
            Self::SelectionSetup => "error setting up file selection",
            Self::PartialWalk => "some paths could not be read during the walk",
        }
    }

    /// `true` if this represents a successful exit.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.as_i32()
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        let value = code.as_i32().clamp(0, 255) as u8;
        Self::from(value)
    }
}

/// Types that have an associated exit code, implemented by the crate-local
/// error enums so the binary can map any setup failure to a process exit
/// status without matching on error variants itself.
pub trait HasExitCode {
    /// Returns the exit code associated with this value.
    fn exit_code(&self) -> ExitCode;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_have_expected_values() {
        assert_eq!(ExitCode::Ok.as_i32(), 0);
        assert_eq!(ExitCode::SelectionSetup.as_i32(), 1);
        assert_eq!(ExitCode::PartialWalk.as_i32(), 23);
    }

    #[test]
    fn is_success_only_for_ok() {
        assert!(ExitCode::Ok.is_success());
        assert!(!ExitCode::SelectionSetup.is_success());
    }

    #[test]
    fn display_shows_description() {
        assert_eq!(format!("{}", ExitCode::Ok), "success");
        assert_eq!(
            format!("{}", ExitCode::SelectionSetup),
            "error setting up file selection"
        );
    }

    #[test]
    fn into_process_exit_code_compiles() {
        let code: std::process::ExitCode = ExitCode::SelectionSetup.into();
        let _ = code;
    }
}
