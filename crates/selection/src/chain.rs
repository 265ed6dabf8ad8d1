//! The ordered rule list a [`crate::gates`]/[`glob`]-compiled selection
//! function list is assembled into, plus the builder that walks CLI
//! directives in order to build one.

use std::path::PathBuf;

use core::error::SelectionError;
use path::{Outcome, Path, Polarity, SelectionFunction};
use tracing::debug;

use crate::config::SelectionConfig;
use crate::{filelist, gates};

/// One CLI-ordered selection directive. Produced by the CLI crate from
/// parsed arguments, in the order the user gave them (spec.md §4.4:
/// "processed in the order given").
#[derive(Clone, Debug)]
pub enum Directive {
    /// `--include GLOB`
    Include(String),
    /// `--exclude GLOB`
    Exclude(String),
    /// `--include-regexp RE`
    IncludeRegexp(String),
    /// `--exclude-regexp RE`
    ExcludeRegexp(String),
    /// `--include-filelist PATH`
    IncludeFilelist(PathBuf),
    /// `--exclude-filelist PATH`
    ExcludeFilelist(PathBuf),
    /// `--exclude-other-filesystems`
    ExcludeOtherFilesystems,
    /// `--exclude-device-files`
    ExcludeDeviceFiles,
    /// `--exclude-if-present NAME`
    ExcludeIfPresent(String),
}

/// The ordered, immutable list of selection functions built from CLI
/// directives and filelists, plus the implicit terminal rule.
pub struct RuleChain {
    rules: Vec<Box<dyn SelectionFunction>>,
}

impl RuleChain {
    /// Wraps an already-assembled rule list. Prefer [`RuleChainBuilder`]
    /// unless you are constructing a chain directly in a test.
    #[must_use]
    pub fn new(rules: Vec<Box<dyn SelectionFunction>>) -> Self {
        Self { rules }
    }

    /// Evaluates the chain against `path`, first-match-wins (spec.md
    /// §4.5 step 1). An exhausted chain is treated as `Include` (step 2);
    /// assembly always appends a terminal rule so this only matters for
    /// an explicitly empty chain.
    #[must_use]
    pub fn evaluate(&self, path: &Path) -> Outcome {
        for rule in &self.rules {
            match rule.apply(path) {
                Outcome::DontCare => continue,
                outcome => return outcome,
            }
        }
        Outcome::Include
    }

    /// The number of rules in the chain, including the implicit terminal
    /// rule if one was appended.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// `true` if the chain has no rules at all (not even a terminal one).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// A [`RuleChain`] plus the `--exclude-if-present` sentinel names, which
/// are not pure selection functions (spec.md §9's open question: the
/// check needs a directory listing, so it is applied by the walker, not
/// by a `SelectionFunction::apply`).
pub struct CompiledSelection {
    /// The assembled rule chain.
    pub chain: RuleChain,
    /// Sentinel file names from every `--exclude-if-present` directive.
    pub exclude_if_present: Vec<String>,
}

/// Builds a [`CompiledSelection`] from an ordered sequence of
/// [`Directive`]s.
pub struct RuleChainBuilder {
    config: SelectionConfig,
    root_device: Option<u64>,
    rules: Vec<Box<dyn SelectionFunction>>,
    sentinel_names: Vec<String>,
    last_polarity: Option<Polarity>,
}

impl RuleChainBuilder {
    /// Starts a new builder for `config`.
    #[must_use]
    pub fn new(config: SelectionConfig) -> Self {
        Self {
            config,
            root_device: None,
            rules: Vec::new(),
            sentinel_names: Vec::new(),
            last_polarity: None,
        }
    }

    /// Records the backup root's device number, required before pushing
    /// an [`Directive::ExcludeOtherFilesystems`] directive.
    #[must_use]
    pub fn with_root_device(mut self, device: u64) -> Self {
        self.root_device = Some(device);
        self
    }

    /// Applies one directive, appending whatever selection function(s) it
    /// produces.
    ///
    /// # Errors
    ///
    /// Returns a [`SelectionError`] if a glob is malformed, a regex
    /// fails to compile, or a filelist cannot be read.
    pub fn push(&mut self, directive: Directive) -> Result<(), SelectionError> {
        debug!(?directive, "pushing selection directive");
        let glob_config = self.config.glob_config();
        match directive {
            Directive::Include(pattern) => {
                self.rules
                    .push(glob::compile(&pattern, Polarity::Include, &glob_config)?);
                self.last_polarity = Some(Polarity::Include);
            }
            Directive::Exclude(pattern) => {
                self.rules
                    .push(glob::compile(&pattern, Polarity::Exclude, &glob_config)?);
                self.last_polarity = Some(Polarity::Exclude);
            }
            Directive::IncludeRegexp(pattern) => {
                self.rules.push(gates::regexp(&pattern, Polarity::Include)?);
                self.last_polarity = Some(Polarity::Include);
            }
            Directive::ExcludeRegexp(pattern) => {
                self.rules.push(gates::regexp(&pattern, Polarity::Exclude)?);
                self.last_polarity = Some(Polarity::Exclude);
            }
            Directive::IncludeFilelist(path) => {
                self.push_filelist(&path, Polarity::Include)?;
            }
            Directive::ExcludeFilelist(path) => {
                self.push_filelist(&path, Polarity::Exclude)?;
            }
            Directive::ExcludeOtherFilesystems => {
                let device = self.root_device.expect(
                    "with_root_device must be called before pushing ExcludeOtherFilesystems",
                );
                self.rules.push(gates::other_filesystems(device));
                self.last_polarity = Some(Polarity::Exclude);
            }
            Directive::ExcludeDeviceFiles => {
                self.rules.push(gates::device_files());
                self.last_polarity = Some(Polarity::Exclude);
            }
            Directive::ExcludeIfPresent(name) => {
                self.sentinel_names.push(name);
                self.last_polarity = Some(Polarity::Exclude);
            }
        }
        Ok(())
    }

    fn push_filelist(&mut self, path: &std::path::Path, default: Polarity) -> Result<(), SelectionError> {
        let glob_config = self.config.glob_config();
        let entries = filelist::read_filelist(path, default, self.config.null_separator)?;
        for (pattern, polarity) in entries {
            self.rules.push(glob::compile(&pattern, polarity, &glob_config)?);
            self.last_polarity = Some(polarity);
        }
        Ok(())
    }

    /// Finishes assembly, appending the implicit terminal rule (spec.md
    /// §4.4): a universal exclude if the last explicit rule was an
    /// include, a universal include if it was an exclude. No terminal
    /// rule is appended if no directive was ever pushed.
    ///
    /// # Panics
    ///
    /// Never panics in practice: the universal glob `**` always compiles
    /// against any root.
    #[must_use]
    pub fn build(mut self) -> CompiledSelection {
        if let Some(last) = self.last_polarity {
            let terminal_polarity = match last {
                Polarity::Include => Polarity::Exclude,
                Polarity::Exclude => Polarity::Include,
            };
            let glob_config = self.config.glob_config();
            let terminal = glob::compile("**", terminal_polarity, &glob_config)
                .expect("the universal glob ** always compiles");
            self.rules.push(terminal);
        }

        CompiledSelection {
            chain: RuleChain::new(self.rules),
            exclude_if_present: self.sentinel_names,
        }
    }
}
