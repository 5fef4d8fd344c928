//! castway-core: launches and babysits remote game-streaming sessions.
//!
//! The handheld device surfaces a streamed game as if it were a local
//! application: a shadow shortcut impersonates the real catalog entry,
//! the [`mirror`] keeps their attributes in sync non-destructively, and
//! the [`session`] orchestrator drives one session end-to-end (prepare,
//! launch, monitor, suspend/resume, teardown). [`connectivity`] keeps
//! cached host/companion reachability fresh via refcounted polling.
//!
//! Everything device- or host-specific sits behind the traits in
//! [`host`], [`catalog`] and [`connectivity`]; the [`fakes`] module
//! implements them in memory.

pub mod catalog;
pub mod config;
pub mod connectivity;
pub mod error;
pub mod fakes;
pub mod host;
pub mod mirror;
pub mod notify;
pub mod session;
pub mod sync;

pub use error::{Error, Result};
