//! Concurrency primitives shared by the status and session layers.
//!
//! Mutual exclusion itself comes from `tokio::sync::Mutex`; this module
//! adds the pieces tokio does not ship: a refcounted polling loop and a
//! coalescing refresh gate.

pub mod gate;
pub mod interval;
pub mod wait;

pub use gate::RefreshGate;
pub use interval::RefcountedLoop;
pub use wait::wait_for;
