#![deny(unsafe_code)]
#![deny(missing_docs)]

//! Shared test fixtures for the file-selection workspace.
//!
//! [`select_tree`] builds the `testfiles/select/` layout spec.md's §8
//! scenarios are written against: three top-level directories, each with
//! three subdirectories, each with three leaf files, named `1`..`3` at
//! every level.

use std::fs;
use tempfile::TempDir;

/// Builds a fresh `1/{1,2,3}/{1,2,3}`, `2/{1,2,3}/{1,2,3}`,
/// `3/{1,2,3}/{1,2,3}` tree under a new temporary directory and returns
/// its handle. The tree is removed when the handle is dropped.
#[must_use]
pub fn select_tree() -> TempDir {
    let dir = TempDir::new().expect("failed to create temporary directory");
    for top in ["1", "2", "3"] {
        for mid in ["1", "2", "3"] {
            let leaf_dir = dir.path().join(top).join(mid);
            fs::create_dir_all(&leaf_dir).expect("failed to create fixture directory");
            for leaf in ["1", "2", "3"] {
                fs::write(leaf_dir.join(leaf), b"").expect("failed to write fixture file");
            }
        }
    }
    dir
}
