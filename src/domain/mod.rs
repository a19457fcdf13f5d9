//! Domain layer - pure decision logic with no I/O.
//!
//! Everything in this module is deterministic and callable without a runtime:
//! intent classification, identifier matching, artifact extraction, and the
//! in-memory session model the orchestrator drives.

pub mod artifact;
pub mod events;
pub mod ids;
pub mod intent;
pub mod knowledge;
pub mod problem;
pub mod resolve;
pub mod session;
pub mod turn;

pub use events::OutputEvent;
pub use ids::SessionId;
pub use intent::Intent;
pub use problem::{CatalogEntry, ProblemDetail, ResolvedProblem};
pub use session::{AwaitedInput, ClarificationContext, Session, SessionMode, SessionRegistry};
pub use turn::{Role, Turn};
