//! The seat allocation and waitlist engine: scoring, the per-course
//! waitlist, the course state machine, the allocation orchestrator, the
//! event bus and the classroom projector.

pub mod course_actor;
pub mod events;
pub mod orchestrator;
pub mod projector;
pub mod scoring;
pub mod state_machine;
pub mod waitlist_queue;

pub use events::EventBus;
pub use orchestrator::AllocationOrchestrator;
pub use scoring::{ScoringEngine, ScoringWeights};
pub use waitlist_queue::WaitlistQueue;
