#![deny(unsafe_code)]
#![deny(missing_docs)]

//! Rule-chain assembly, filelist parsing, and the auxiliary selection
//! gates (spec.md §4.2–§4.4).
//!
//! [`glob`] compiles individual patterns into [`path::SelectionFunction`]s;
//! this crate assembles them — plus the gate producers in [`gates`] and
//! the filelist entries parsed by [`filelist`] — into an ordered
//! [`chain::RuleChain`] via [`chain::RuleChainBuilder`], following the
//! CLI's directive order (spec.md §4.4).

/// The ordered rule list and its builder.
pub mod chain;
/// Explicit, non-global selection configuration.
pub mod config;
/// Filelist parsing (spec.md §4.3).
pub mod filelist;
/// Auxiliary selection-function producers (spec.md §4.2).
pub mod gates;

pub use chain::{CompiledSelection, Directive, RuleChain, RuleChainBuilder};
pub use config::SelectionConfig;
