/// Session management module - Gateway

mod conversation;
mod state;

pub use conversation::{ConversationHistory, ConversationManager};
pub use state::SessionState;
