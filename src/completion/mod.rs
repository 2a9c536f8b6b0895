//! Completion provider.
//!
//! Grounded on `nushell`'s split between engine state and completer: the
//! line editor (`crate::editor`) can't hold a live `&ShellState` borrow for
//! its whole lifetime (reedline's `Completer` trait objects are `'static`),
//! so completion works off a cheap point-in-time `Snapshot` the REPL loop
//! refreshes before each `read_line` call.

pub mod provider;
pub mod snapshot;

pub use provider::{complete, Group};
pub use snapshot::Snapshot;
