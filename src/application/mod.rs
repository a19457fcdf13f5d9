//! Application layer - turn orchestration over the ports.

mod orchestrator;
mod resolver;

pub use orchestrator::{ChatOrchestrator, OrchestratorConfig};
pub use resolver::ProblemResolver;
