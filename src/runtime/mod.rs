/// Runtime orchestrator module - Gateway

mod orchestrator;
mod turn_loop;

pub use orchestrator::Orchestrator;
pub use turn_loop::{SessionOutcome, StopReason, TurnLoop};
