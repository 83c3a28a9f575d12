pub mod app;
pub mod cli;
pub mod constants;
pub mod models;
pub mod runtime;
pub mod session;
pub mod tools;
pub mod utils;
pub mod workflow;

pub use app::{load_config, Config};
pub use models::{Model, ModelFactory};
pub use runtime::{Orchestrator, TurnLoop};
pub use utils::TillerError;
pub use workflow::{WorkflowStage, WorkflowState};
