//! Explicit configuration threaded into compilation instead of process
//! globals.

/// Configuration shared by [`crate::chain::RuleChainBuilder`],
/// [`glob::compile`], and [`crate::filelist`] parsing.
///
/// Replaces the process-wide mutable globals (`globals.short_filenames`,
/// `globals.null_separator`, …) that the source this workspace is grown
/// from relies on: every crate that needs one of these settings receives
/// it explicitly through a `SelectionConfig` value built once by the CLI.
#[derive(Clone, Debug)]
pub struct SelectionConfig {
    /// The backup root's literal path segments.
    pub root: Vec<String>,
    /// Default case sensitivity for glob and regex matching.
    pub ignorecase: bool,
    /// Whether filelists use NUL separators instead of newlines.
    pub null_separator: bool,
}

impl SelectionConfig {
    /// Builds the [`glob::GlobConfig`] this configuration implies.
    #[must_use]
    pub fn glob_config(&self) -> glob::GlobConfig {
        glob::GlobConfig {
            root: self.root.clone(),
            ignorecase: self.ignorecase,
        }
    }
}
