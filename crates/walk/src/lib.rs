#![deny(unsafe_code)]
#![deny(missing_docs)]

//! The depth-first directory walker (spec.md §4.5, the "Selector").
//!
//! [`Selector`] is an ordinary [`Iterator`] over [`WalkEntry`] — the
//! redesign spec.md §9 calls for in place of the lazy-iterator-with-side-
//! effects protocol the source this workspace is grown from uses. It
//! drives a [`selection::RuleChain`], prunes aggressively on `Exclude`,
//! and emits ancestor directories before their descendants even when the
//! ancestor's own outcome is only `PartialInclude`.

use std::collections::VecDeque;
use std::fs;

use path::{Outcome, Path, PathKind};
use selection::chain::RuleChain;
use tracing::warn;

/// One path emitted by the [`Selector`].
#[derive(Debug)]
pub struct WalkEntry {
    /// The emitted path.
    pub path: Path,
    /// The outcome that caused it to be emitted (`Include` or
    /// `PartialInclude` — `Exclude` and `DontCare` never reach here).
    pub outcome: Outcome,
}

struct Frame {
    path: Path,
    children: VecDeque<(Vec<u8>, fs::DirEntry)>,
}

/// Depth-first walker rooted at a backup root.
///
/// Construct with [`Selector::new`], then consume it like any other
/// iterator. Directory handles are only held open while their frame is on
/// the stack; dropping the `Selector` mid-walk (cancellation, spec.md §5)
/// releases every open handle.
pub struct Selector<'a> {
    chain: &'a RuleChain,
    exclude_if_present: &'a [String],
    follow_symlinks: bool,
    stack: Vec<Frame>,
    visited_devices: Vec<(u64, u64)>,
    pending: VecDeque<WalkEntry>,
    started: bool,
}

impl<'a> Selector<'a> {
    /// Builds a walker rooted at `root`, consulting `chain` for every
    /// path and `exclude_if_present` for the sentinel-file check (spec.md
    /// §9's open question: the check applies only to directories that
    /// would otherwise be descended).
    #[must_use]
    pub fn new(
        root: Path,
        chain: &'a RuleChain,
        exclude_if_present: &'a [String],
        follow_symlinks: bool,
    ) -> Self {
        let mut pending = VecDeque::new();
        pending.push_back(WalkEntry {
            path: root,
            outcome: Outcome::Include,
        });
        Self {
            chain,
            exclude_if_present,
            follow_symlinks,
            stack: Vec::new(),
            visited_devices: Vec::new(),
            pending,
            started: false,
        }
    }

    fn has_sentinel(&self, path: &Path) -> bool {
        self.exclude_if_present.iter().any(|name| {
            let mut candidate = path.absolute_std_path();
            candidate.push(name);
            candidate.is_file()
        })
    }

    fn descend(&mut self, mut dir_path: Path) {
        if let Err(error) = dir_path.stat(self.follow_symlinks) {
            warn!(path = %dir_path.to_absolute_string(), error = %error, "cannot stat directory");
            return;
        }

        if let Some(device_inode) = dir_path.device_inode() {
            if self.visited_devices.contains(&device_inode) {
                warn!(path = %dir_path.to_absolute_string(), "cycle detected, skipping re-entry");
                return;
            }
        }

        let read_dir = match fs::read_dir(dir_path.absolute_std_path()) {
            Ok(read_dir) => read_dir,
            Err(error) => {
                warn!(path = %dir_path.to_absolute_string(), error = %error, "cannot read directory");
                return;
            }
        };

        let mut children = Vec::new();
        for entry in read_dir {
            match entry {
                Ok(entry) => {
                    let name = entry.file_name();
                    #[cfg(unix)]
                    let name_bytes = {
                        use std::os::unix::ffi::OsStrExt;
                        name.as_bytes().to_vec()
                    };
                    #[cfg(not(unix))]
                    let name_bytes = name.to_string_lossy().into_owned().into_bytes();
                    children.push((name_bytes, entry));
                }
                Err(error) => {
                    warn!(path = %dir_path.to_absolute_string(), error = %error, "cannot read directory entry");
                }
            }
        }
        children.sort_by(|a, b| a.0.cmp(&b.0));

        if let Some(device_inode) = dir_path.device_inode() {
            self.visited_devices.push(device_inode);
        }

        self.stack.push(Frame {
            path: dir_path,
            children: children.into_iter().collect(),
        });
    }

    fn advance(&mut self) -> Option<WalkEntry> {
        if let Some(entry) = self.pending.pop_front() {
            return Some(entry);
        }

        loop {
            let Some(frame) = self.stack.last_mut() else {
                return None;
            };

            let Some((name, entry)) = frame.children.pop_front() else {
                let finished = self.stack.pop().expect("checked above");
                if let Some(device_inode) = finished.path.device_inode() {
                    self.visited_devices.retain(|&di| di != device_inode);
                }
                continue;
            };

            let mut child = frame.path.append(name, PathKind::Regular);
            if let Err(error) = child.stat(self.follow_symlinks) {
                warn!(path = %child.to_absolute_string(), error = %error, "cannot stat path");
                continue;
            }
            let _ = entry;

            let outcome = self.chain.evaluate(&child);
            match outcome {
                Outcome::Exclude => {}
                Outcome::DontCare => {
                    // Assembly always terminates the chain, so DontCare
                    // should not reach here; treat it as Include per
                    // spec.md §4.5 step 4 for safety.
                    if child.kind().is_directory() {
                        self.descend(child.clone());
                    }
                    return Some(WalkEntry { path: child, outcome: Outcome::Include });
                }
                Outcome::Include | Outcome::PartialInclude => {
                    if child.kind().is_directory() && !self.has_sentinel(&child) {
                        self.descend(child.clone());
                    }
                    return Some(WalkEntry { path: child, outcome });
                }
            }
        }
    }
}

impl Iterator for Selector<'_> {
    type Item = WalkEntry;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.started {
            self.started = true;
            if let Some(root_entry) = self.pending.pop_front() {
                let root_outcome = self.chain.evaluate(&root_entry.path);
                match root_outcome {
                    Outcome::Exclude => return self.advance(),
                    _ => {
                        let mut root_path = root_entry.path;
                        if root_path.stat(self.follow_symlinks).is_ok()
                            && root_path.kind().is_directory()
                            && !self.has_sentinel(&root_path)
                        {
                            self.descend(root_path.clone());
                        }
                        return Some(WalkEntry { path: root_path, outcome: root_outcome });
                    }
                }
            }
        }
        self.advance()
    }
}
