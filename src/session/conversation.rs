use anyhow::Result;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::{ChatMessage, MessageRole};
use crate::workflow::WorkflowState;

/// A complete conversation history, including the workflow state it ended in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationHistory {
    pub id: String,
    pub title: String,
    pub messages: Vec<ChatMessage>,
    pub model_name: String,
    pub workflow: WorkflowState,
    pub created_at: DateTime<Local>,
    pub updated_at: DateTime<Local>,
}

impl ConversationHistory {
    /// Create a new conversation history
    pub fn new(model_name: String) -> Self {
        let now = Local::now();
        let id = format!("{}", now.format("%Y%m%d_%H%M%S"));
        Self {
            id,
            title: format!("Session {}", now.format("%Y-%m-%d %H:%M")),
            messages: Vec::new(),
            model_name,
            workflow: WorkflowState::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Add messages to the conversation
    pub fn add_messages(&mut self, messages: &[ChatMessage]) {
        self.messages.extend_from_slice(messages);
        self.updated_at = Local::now();
        self.update_title();
    }

    /// Update the title based on the first user message
    fn update_title(&mut self) {
        if let Some(first_user_msg) = self.messages.iter().find(|m| m.role == MessageRole::User) {
            let content = &first_user_msg.content;
            // Truncate by characters, not bytes: slicing mid-codepoint panics
            let preview = if content.chars().count() > 60 {
                let head: String = content.chars().take(60).collect();
                format!("{}...", head)
            } else {
                content.clone()
            };
            self.title = preview;
        }
    }

    /// Get a summary for display
    pub fn summary(&self) -> String {
        format!(
            "{} | {} messages | stage {} | {}",
            self.updated_at.format("%Y-%m-%d %H:%M"),
            self.messages.len(),
            self.workflow.stage,
            self.title
        )
    }
}

/// Manages conversation persistence for a working directory
pub struct ConversationManager {
    conversations_dir: PathBuf,
}

impl ConversationManager {
    /// Create a new conversation manager rooted at a working directory
    pub fn new(working_dir: impl AsRef<Path>) -> Result<Self> {
        let conversations_dir = working_dir.as_ref().join(".tiller").join("conversations");
        fs::create_dir_all(&conversations_dir)?;
        Ok(Self { conversations_dir })
    }

    /// Save a conversation to disk
    pub fn save_conversation(&self, conversation: &ConversationHistory) -> Result<()> {
        let filename = format!("{}.json", conversation.id);
        let path = self.conversations_dir.join(filename);

        let json = serde_json::to_string_pretty(conversation)?;
        fs::write(path, json)?;

        Ok(())
    }

    /// Load the most recent conversation
    pub fn load_last_conversation(&self) -> Result<Option<ConversationHistory>> {
        Ok(self.list_conversations()?.into_iter().next())
    }

    /// List all conversations, newest first
    pub fn list_conversations(&self) -> Result<Vec<ConversationHistory>> {
        let mut conversations = Vec::new();

        if let Ok(entries) = fs::read_dir(&self.conversations_dir) {
            for entry in entries.flatten() {
                if entry.path().extension().is_some_and(|ext| ext == "json") {
                    if let Ok(json) = fs::read_to_string(entry.path()) {
                        if let Ok(conv) = serde_json::from_str::<ConversationHistory>(&json) {
                            conversations.push(conv);
                        }
                    }
                }
            }
        }

        conversations.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        Ok(conversations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::WorkflowStage;
    use tempfile::TempDir;

    #[test]
    fn save_and_reload_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let manager = ConversationManager::new(temp_dir.path()).unwrap();

        let mut conversation = ConversationHistory::new("openai/gpt-4o".to_string());
        conversation.add_messages(&[
            ChatMessage::user("clone https://x/y/z.git and fix the readme"),
            ChatMessage::assistant("done", vec![]),
        ]);
        conversation.workflow.stage = WorkflowStage::Explore;

        manager.save_conversation(&conversation).unwrap();

        let loaded = manager.load_last_conversation().unwrap().unwrap();
        assert_eq!(loaded.id, conversation.id);
        assert_eq!(loaded.messages.len(), 2);
        assert_eq!(loaded.workflow.stage, WorkflowStage::Explore);
        assert!(loaded.title.starts_with("clone https://x/y/z.git"));
    }

    #[test]
    fn title_truncates_on_character_boundaries() {
        let mut conversation = ConversationHistory::new("openai/gpt-4o".to_string());
        // A multibyte character straddling byte 60 must not break truncation
        let prompt = format!("{}é plus enough trailing text to force a cut", "a".repeat(59));
        conversation.add_messages(&[ChatMessage::user(&prompt)]);

        assert!(conversation.title.ends_with("..."));
        assert_eq!(conversation.title.chars().count(), 63);
        assert!(conversation.title.contains('é'));
    }

    #[test]
    fn empty_directory_has_no_last_conversation() {
        let temp_dir = TempDir::new().unwrap();
        let manager = ConversationManager::new(temp_dir.path()).unwrap();
        assert!(manager.load_last_conversation().unwrap().is_none());
    }
}
