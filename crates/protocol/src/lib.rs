//! Wire types for the castway remote-streaming plumbing.
//!
//! This crate contains the serde-serializable types exchanged with the
//! paired host PC and its companion service ("buddy"), plus the
//! launch-marker codec used to smuggle machine-readable context through
//! a shortcut's launch-options string.
//!
//! Types in this crate are pure data: no behavior beyond
//! (de)serialization and the marker encoding rules. Higher-level
//! orchestration lives in `castway-core`.

pub mod host;
pub mod markers;
pub mod status;

pub use host::*;
pub use status::*;
