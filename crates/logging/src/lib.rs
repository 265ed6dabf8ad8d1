#![deny(unsafe_code)]
#![deny(missing_docs)]

//! Verbosity-driven `tracing-subscriber` initialization.
//!
//! Selection setup and walking are ambient concerns outside spec.md's
//! feature scope, but not outside its engineering scope: walk-time
//! per-path errors are "recorded in a warning channel" (spec.md §7), and
//! this crate is that channel's initializer. The CLI's `-v`/`--verbose`
//! flag raises the filter level by calling [`init`] once at startup;
//! everything else uses `tracing`'s ordinary macros.

use tracing_subscriber::EnvFilter;

/// Selects a baseline log level independent of the `RUST_LOG`
/// environment variable, which still takes precedence when set.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Verbosity {
    /// Only warnings and errors (the default).
    Quiet,
    /// Informational messages too: directory descent, rule compilation.
    Verbose,
    /// Debug-level detail: every rule evaluation.
    Debug,
}

impl Verbosity {
    /// Maps a `-v` repeat count to a verbosity level. Zero is
    /// [`Verbosity::Quiet`], one is [`Verbosity::Verbose`], two or more is
    /// [`Verbosity::Debug`].
    #[must_use]
    pub const fn from_count(count: u8) -> Self {
        match count {
            0 => Self::Quiet,
            1 => Self::Verbose,
            _ => Self::Debug,
        }
    }

    const fn default_directive(self) -> &'static str {
        match self {
            Self::Quiet => "warn",
            Self::Verbose => "info",
            Self::Debug => "debug",
        }
    }
}

/// Installs a global `tracing` subscriber honoring `RUST_LOG` if set, or
/// `verbosity`'s default directive otherwise.
///
/// Safe to call more than once; later calls are no-ops (mirrors
/// `tracing_subscriber`'s own `set_global_default` semantics, which
/// return an error that this function discards since a second init
/// attempt is not a failure worth surfacing to the caller).
pub fn init(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.default_directive()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_count_maps_repeats_to_levels() {
        assert_eq!(Verbosity::from_count(0), Verbosity::Quiet);
        assert_eq!(Verbosity::from_count(1), Verbosity::Verbose);
        assert_eq!(Verbosity::from_count(2), Verbosity::Debug);
        assert_eq!(Verbosity::from_count(9), Verbosity::Debug);
    }

    #[test]
    fn default_directives_are_valid_env_filter_strings() {
        for verbosity in [Verbosity::Quiet, Verbosity::Verbose, Verbosity::Debug] {
            assert!(EnvFilter::try_new(verbosity.default_directive()).is_ok());
        }
    }

    #[test]
    fn init_does_not_panic_on_repeated_calls() {
        init(Verbosity::Quiet);
        init(Verbosity::Debug);
    }
}
