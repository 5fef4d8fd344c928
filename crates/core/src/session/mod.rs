//! Session layer: the shortcut registry, the session singleton, and
//! the orchestrator driving launch, monitoring, suspend/resume and
//! teardown.

mod orchestrator;
mod registry;
mod resolution;
mod state;

pub use orchestrator::{OrchestratorParts, SessionOrchestrator};
pub use registry::ShortcutRegistry;
pub use resolution::{ResolutionPlan, plan_resolution};
pub use state::{SessionOptions, SessionState, SessionTracker};
