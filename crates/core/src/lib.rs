#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `core` holds the error taxonomy and exit codes shared by every crate in
//! the file-selection workspace. Nothing here touches paths, globs, or the
//! filesystem directly; those live in their own crates so that `core` stays
//! a leaf dependency everything else can build on.
//!
//! # Design
//!
//! [`error::SelectionError`] enumerates the ways selection setup can fail
//! (bad root prefix, unparseable glob, unreadable or malformed filelist).
//! [`exit_code::ExitCode`] maps any outcome — success, a setup failure, or a
//! walk that hit recoverable per-path errors — onto the process exit status
//! the binary returns.
//!
//! # Invariants
//!
//! - Every [`error::SelectionError`] variant implements
//!   [`exit_code::HasExitCode`], so the binary never needs to match on
//!   error variants to decide how to exit.
//! - [`exit_code::ExitCode::Ok`] is always `0`; nonzero codes are reserved
//!   for failure.
//!
//! # Errors
//!
//! See [`error::SelectionError`] for the complete set of setup failures.

/// Error types for file-selection setup.
pub mod error;
/// Process exit codes.
pub mod exit_code;
