#![deny(unsafe_code)]
#![deny(missing_docs)]

//! Structural path model for the file-selection core.
//!
//! A [`Path`] is an ordered sequence of byte-string name components (the
//! "index") relative to a backup root, plus the bits every selection
//! function and the walker need: a [`PathKind`] tag and, once the
//! filesystem has actually been consulted, a (device, inode) pair used
//! for filesystem-boundary checks and cycle detection.
//!
//! Equality and hashing are defined over the index alone, matching the
//! invariant that two paths pointing at the same index are the same path
//! regardless of which root or device they happened to be resolved
//! against.
//!
//! This crate also defines [`Outcome`] and the [`SelectionFunction`] trait.
//! They live here, rather than in `selection`, because both `glob` (which
//! compiles rules into selection functions) and `selection` (which
//! assembles and evaluates them) need the contract, and `selection` in
//! turn depends on `glob` to compile `--include`/`--exclude` directives —
//! putting the contract in the common leaf crate keeps that dependency
//! graph acyclic.

use std::fmt;
use std::path::{Path as StdPath, PathBuf};

#[cfg(unix)]
use std::os::unix::ffi::OsStrExt;

/// The kind of filesystem entry a [`Path`] refers to.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum PathKind {
    /// A regular file.
    Regular,
    /// A directory.
    Directory,
    /// A symbolic link.
    Symlink,
    /// A named pipe (FIFO).
    Fifo,
    /// A Unix domain socket.
    Socket,
    /// A block device node.
    BlockDevice,
    /// A character device node.
    CharDevice,
    /// The path does not currently exist on disk.
    Missing,
}

impl PathKind {
    /// Returns `true` if this kind implies a directory should be descended.
    #[must_use]
    pub const fn is_directory(self) -> bool {
        matches!(self, Self::Directory)
    }

    #[cfg(unix)]
    fn from_file_type(file_type: std::fs::FileType) -> Self {
        use std::os::unix::fs::FileTypeExt;

        if file_type.is_dir() {
            Self::Directory
        } else if file_type.is_symlink() {
            Self::Symlink
        } else if file_type.is_fifo() {
            Self::Fifo
        } else if file_type.is_socket() {
            Self::Socket
        } else if file_type.is_block_device() {
            Self::BlockDevice
        } else if file_type.is_char_device() {
            Self::CharDevice
        } else {
            Self::Regular
        }
    }

    #[cfg(not(unix))]
    fn from_file_type(file_type: std::fs::FileType) -> Self {
        if file_type.is_dir() {
            Self::Directory
        } else if file_type.is_symlink() {
            Self::Symlink
        } else {
            Self::Regular
        }
    }
}

/// A root-relative path: an index of byte-string components plus the
/// metadata the selection core needs to make a decision about it.
///
/// Paths are immutable after construction. New paths are produced by
/// [`Path::append`] (extend the index by one component) or
/// [`Path::new_index`] (rebase onto an entirely new index, used when a
/// glob's own index is compared against a candidate's).
#[derive(Clone)]
pub struct Path {
    index: Vec<Vec<u8>>,
    kind: PathKind,
    base: PathBuf,
    device: Option<u64>,
    inode: Option<u64>,
}

impl Path {
    /// Constructs the root path (empty index) for `base`.
    #[must_use]
    pub fn root(base: impl Into<PathBuf>) -> Self {
        Self {
            index: Vec::new(),
            kind: PathKind::Directory,
            base: base.into(),
            device: None,
            inode: None,
        }
    }

    /// Constructs a path from an explicit index, without touching the
    /// filesystem. Used by tests and by rule compilation, where the
    /// "path" is really a pattern target rather than something on disk.
    #[must_use]
    pub fn with_index(base: impl Into<PathBuf>, index: Vec<Vec<u8>>, kind: PathKind) -> Self {
        Self {
            index,
            kind,
            base: base.into(),
            device: None,
            inode: None,
        }
    }

    /// Returns a new path extending this one's index by one component.
    #[must_use]
    pub fn append(&self, component: impl Into<Vec<u8>>, kind: PathKind) -> Self {
        let mut index = self.index.clone();
        index.push(component.into());
        Self {
            index,
            kind,
            base: self.base.clone(),
            device: None,
            inode: None,
        }
    }

    /// Returns a new path with the same base but a different index.
    #[must_use]
    pub fn new_index(&self, index: Vec<Vec<u8>>) -> Self {
        Self {
            index,
            kind: self.kind,
            base: self.base.clone(),
            device: None,
            inode: None,
        }
    }

    /// Populates `device`/`inode`/`kind` from filesystem metadata.
    ///
    /// `follow_symlinks` selects `std::fs::metadata` (follow) vs.
    /// `std::fs::symlink_metadata` (don't) per the Non-goal in spec.md:
    /// "no symlink-resolution policy beyond follow vs. don't".
    pub fn stat(&mut self, follow_symlinks: bool) -> std::io::Result<()> {
        let absolute = self.absolute_std_path();
        let metadata = if follow_symlinks {
            std::fs::metadata(&absolute)
        } else {
            std::fs::symlink_metadata(&absolute)
        };

        match metadata {
            Ok(metadata) => {
                self.kind = PathKind::from_file_type(metadata.file_type());
                #[cfg(unix)]
                {
                    use std::os::unix::fs::MetadataExt;
                    self.device = Some(metadata.dev());
                    self.inode = Some(metadata.ino());
                }
                Ok(())
            }
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                self.kind = PathKind::Missing;
                self.device = None;
                self.inode = None;
                Ok(())
            }
            Err(error) => Err(error),
        }
    }

    /// The sequence of name components relative to the backup root.
    #[must_use]
    pub fn index(&self) -> &[Vec<u8>] {
        &self.index
    }

    /// The backup root this path's index is relative to.
    #[must_use]
    pub fn base(&self) -> &StdPath {
        &self.base
    }

    /// The kind of filesystem entry this path refers to.
    #[must_use]
    pub const fn kind(&self) -> PathKind {
        self.kind
    }

    /// `true` if this is the root itself (an empty index).
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.index.is_empty()
    }

    /// The (device, inode) pair, if this path has been `stat`'d and
    /// exists.
    #[must_use]
    pub const fn device_inode(&self) -> Option<(u64, u64)> {
        match (self.device, self.inode) {
            (Some(device), Some(inode)) => Some((device, inode)),
            _ => None,
        }
    }

    /// Renders `base + index` joined by `/`, the form the glob/regex
    /// matchers anchor against.
    #[must_use]
    pub fn to_absolute_string(&self) -> String {
        let mut out = path_to_bytes(&self.base);
        for component in &self.index {
            if !out.is_empty() && out.last() != Some(&b'/') {
                out.push(b'/');
            }
            out.extend_from_slice(component);
        }
        String::from_utf8_lossy(&out).into_owned()
    }

    /// Renders this path as a real filesystem path (base joined with the
    /// index components), for use in `std::fs` calls.
    #[must_use]
    pub fn absolute_std_path(&self) -> PathBuf {
        let mut out = self.base.clone();
        for component in &self.index {
            out.push(bytes_to_os_string(component));
        }
        out
    }

    /// The last component of the index, or `None` at the root.
    #[must_use]
    pub fn leaf_name(&self) -> Option<&[u8]> {
        self.index.last().map(Vec::as_slice)
    }

    /// `true` if `self`'s index is a proper prefix of `other`'s, i.e.
    /// `self` is a strict ancestor of `other`.
    #[must_use]
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        self.index.len() < other.index.len() && other.index.starts_with(&self.index)
    }
}

impl PartialEq for Path {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl Eq for Path {}

impl std::hash::Hash for Path {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Path")
            .field("index", &self.to_absolute_string())
            .field("kind", &self.kind)
            .finish()
    }
}

#[cfg(unix)]
fn path_to_bytes(path: &StdPath) -> Vec<u8> {
    path.as_os_str().as_bytes().to_vec()
}

#[cfg(not(unix))]
fn path_to_bytes(path: &StdPath) -> Vec<u8> {
    path.to_string_lossy().into_owned().into_bytes()
}

#[cfg(unix)]
fn bytes_to_os_string(bytes: &[u8]) -> std::ffi::OsString {
    use std::os::unix::ffi::OsStringExt;
    std::ffi::OsString::from_vec(bytes.to_vec())
}

#[cfg(not(unix))]
fn bytes_to_os_string(bytes: &[u8]) -> std::ffi::OsString {
    std::ffi::OsString::from(String::from_utf8_lossy(bytes).into_owned())
}

/// The result of evaluating one selection function against one [`Path`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Outcome {
    /// This path is selected.
    Include,
    /// This path is rejected. If it is a directory, its subtree is pruned
    /// unless a later, more specific rule produces a
    /// [`PartialInclude`](Outcome::PartialInclude) for it.
    Exclude,
    /// This directory is not itself a match but may contain matches: the
    /// walker must descend and ask again per child.
    PartialInclude,
    /// This rule has no opinion; the walker consults the next rule.
    DontCare,
}

/// A pure, idempotent function from a [`Path`] to an [`Outcome`].
///
/// Every compiled rule — a glob, a raw regex, an auxiliary gate like
/// `--exclude-device-files` — is exposed through this one contract so an
/// ordered rule-chain assembly can treat them uniformly regardless of what
/// produced them.
pub trait SelectionFunction: Send + Sync {
    /// Evaluates this rule against `path`.
    fn apply(&self, path: &Path) -> Outcome;
}

/// The direction a user-supplied rule pushes a matching path: toward
/// inclusion or toward exclusion. Distinct from [`Outcome`], which is the
/// result of evaluating a rule against one specific path; `Polarity` is a
/// property of the rule itself, fixed at compile time.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Polarity {
    /// A matching path is included.
    Include,
    /// A matching path is excluded.
    Exclude,
}

impl Polarity {
    /// The [`Outcome`] a full match produces under this polarity.
    #[must_use]
    pub const fn matched_outcome(self) -> Outcome {
        match self {
            Self::Include => Outcome::Include,
            Self::Exclude => Outcome::Exclude,
        }
    }
}

/// Splits a `/`-joined string (as used on the CLI for glob literals and
/// filelist entries) into index components, dropping empty leading
/// components from a leading `/`.
#[must_use]
pub fn split_index(text: &str) -> Vec<Vec<u8>> {
    text.trim_matches('/')
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| segment.as_bytes().to_vec())
        .collect()
}
