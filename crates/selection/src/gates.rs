//! Auxiliary selection-function producers (spec.md §4.2) that aren't
//! derived from a glob: filesystem-boundary, device/fifo/socket kind
//! checks, and raw-regex matching.

use core::error::SelectionError;
use path::{Outcome, Path, PathKind, Polarity, SelectionFunction};
use regex::Regex;

struct OtherFilesystems {
    root_device: u64,
}

impl SelectionFunction for OtherFilesystems {
    fn apply(&self, path: &Path) -> Outcome {
        if path.is_root() {
            return Outcome::DontCare;
        }
        match path.device_inode() {
            Some((device, _)) if device != self.root_device => Outcome::Exclude,
            _ => Outcome::DontCare,
        }
    }
}

/// Excludes any path whose device differs from the backup root's device,
/// i.e. prunes mount points other than the root itself.
#[must_use]
pub fn other_filesystems(root_device: u64) -> Box<dyn SelectionFunction> {
    Box::new(OtherFilesystems { root_device })
}

struct KindGate {
    kinds: &'static [PathKind],
}

impl SelectionFunction for KindGate {
    fn apply(&self, path: &Path) -> Outcome {
        if self.kinds.contains(&path.kind()) {
            Outcome::Exclude
        } else {
            Outcome::DontCare
        }
    }
}

/// Excludes block and character device nodes.
#[must_use]
pub fn device_files() -> Box<dyn SelectionFunction> {
    Box::new(KindGate {
        kinds: &[PathKind::BlockDevice, PathKind::CharDevice],
    })
}

/// Excludes named pipes (FIFOs). A library primitive beyond the minimal
/// CLI surface in spec.md §6; not wired to a CLI flag of its own, the way
/// `device_files` is, but available for a caller assembling a
/// [`crate::chain::RuleChain`] directly.
#[must_use]
pub fn fifos() -> Box<dyn SelectionFunction> {
    Box::new(KindGate {
        kinds: &[PathKind::Fifo],
    })
}

/// Excludes Unix domain sockets. See [`fifos`] for why this has no CLI
/// flag of its own.
#[must_use]
pub fn sockets() -> Box<dyn SelectionFunction> {
    Box::new(KindGate {
        kinds: &[PathKind::Socket],
    })
}

struct RegexpSf {
    regex: Regex,
    polarity: Polarity,
}

impl SelectionFunction for RegexpSf {
    fn apply(&self, path: &Path) -> Outcome {
        if self.regex.is_match(&path.to_absolute_string()) {
            self.polarity.matched_outcome()
        } else {
            Outcome::DontCare
        }
    }
}

/// Compiles a raw regex rule (spec.md §4.2: "match the absolute path
/// against a raw regex"). Unlike glob-derived rules, a regexp rule never
/// produces `PartialInclude` — it has no notion of ancestor prefixes.
///
/// # Errors
///
/// Returns [`SelectionError::GlobbingError`] if `pattern` is not a valid
/// regular expression.
pub fn regexp(pattern: &str, polarity: Polarity) -> Result<Box<dyn SelectionFunction>, SelectionError> {
    let regex = Regex::new(pattern).map_err(|error| SelectionError::GlobbingError {
        pattern: pattern.to_owned(),
        reason: error.to_string(),
    })?;
    Ok(Box::new(RegexpSf { regex, polarity }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(index: &[&str], kind: PathKind) -> Path {
        Path::with_index(
            "testfiles/select",
            index.iter().map(|s| s.as_bytes().to_vec()).collect(),
            kind,
        )
    }

    #[test]
    fn device_files_excludes_block_and_char_devices() {
        let gate = device_files();
        assert_eq!(gate.apply(&at(&["disk0"], PathKind::BlockDevice)), Outcome::Exclude);
        assert_eq!(gate.apply(&at(&["tty0"], PathKind::CharDevice)), Outcome::Exclude);
        assert_eq!(gate.apply(&at(&["file"], PathKind::Regular)), Outcome::DontCare);
    }

    #[test]
    fn fifos_and_sockets_are_distinct_gates() {
        assert_eq!(fifos().apply(&at(&["p"], PathKind::Fifo)), Outcome::Exclude);
        assert_eq!(fifos().apply(&at(&["p"], PathKind::Socket)), Outcome::DontCare);
        assert_eq!(sockets().apply(&at(&["s"], PathKind::Socket)), Outcome::Exclude);
    }

    #[test]
    fn other_filesystems_spares_root_and_unstatted_paths() {
        // device_inode() is None until Path::stat runs.
        let gate = other_filesystems(1);
        assert_eq!(gate.apply(&at(&[], PathKind::Directory)), Outcome::DontCare);
        assert_eq!(gate.apply(&at(&["a"], PathKind::Directory)), Outcome::DontCare);
    }

    #[test]
    fn other_filesystems_excludes_a_real_path_on_a_different_device() {
        let dir = tempfile::TempDir::new().unwrap();
        let child = dir.path().join("child");
        std::fs::write(&child, b"x").unwrap();

        let mut stated = Path::with_index(dir.path(), vec![b"child".to_vec()], PathKind::Regular);
        stated.stat(false).unwrap();
        let real_device = stated.device_inode().unwrap().0;

        let same_device_gate = other_filesystems(real_device);
        assert_eq!(same_device_gate.apply(&stated), Outcome::DontCare);

        let other_device_gate = other_filesystems(real_device + 1);
        assert_eq!(other_device_gate.apply(&stated), Outcome::Exclude);
    }

    #[test]
    fn regexp_gate_has_no_partial_include() {
        let sf = regexp(r"1/1$", Polarity::Include).unwrap();
        assert_eq!(sf.apply(&at(&["1"], PathKind::Directory)), Outcome::DontCare);
        assert_eq!(sf.apply(&at(&["1", "1"], PathKind::Directory)), Outcome::Include);
    }

    #[test]
    fn malformed_regex_is_globbing_error() {
        let error = regexp("(unterminated", Polarity::Include).unwrap_err();
        assert!(matches!(error, SelectionError::GlobbingError { .. }));
    }
}
