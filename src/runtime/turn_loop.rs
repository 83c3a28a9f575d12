use anyhow::Result;
use tracing::{debug, warn};

use crate::models::{ChatMessage, Model, ModelConfig};
use crate::tools;
use crate::workflow::{build_system_prompt, WorkflowState};

/// Why the loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The model produced a turn with no tool calls
    Completed,
    /// The hard turn cap was reached before the model finished
    TurnLimit,
}

/// Result of a full session: final workflow state, the complete history,
/// and how the loop ended
#[derive(Debug)]
pub struct SessionOutcome {
    pub state: WorkflowState,
    pub history: Vec<ChatMessage>,
    pub stop_reason: StopReason,
    pub turns: usize,
}

/// The sequential model / tools loop. One turn = one model call plus the
/// execution of every tool call it requested, in request order.
pub struct TurnLoop {
    model: Box<dyn Model>,
    model_config: ModelConfig,
    system_template: String,
    max_turns: usize,
}

impl TurnLoop {
    pub fn new(
        model: Box<dyn Model>,
        model_config: ModelConfig,
        system_template: String,
        max_turns: usize,
    ) -> Self {
        Self {
            model,
            model_config,
            system_template,
            max_turns,
        }
    }

    /// Run the loop to completion. The workflow state is threaded through
    /// immutably: each turn's outcomes produce the successor state.
    /// Model invocation failure is fatal; tool failures are not.
    pub async fn run(
        &mut self,
        state: WorkflowState,
        mut history: Vec<ChatMessage>,
        prompt: &str,
    ) -> Result<SessionOutcome> {
        history.push(ChatMessage::user(prompt));

        let mut state = state;
        let mut stop_reason = StopReason::TurnLimit;
        let mut turns = 0;

        for turn in 0..self.max_turns {
            turns = turn + 1;

            // awaiting-model
            let system = build_system_prompt(&self.system_template, &state);
            let mut messages = Vec::with_capacity(history.len() + 1);
            messages.push(ChatMessage::system(system));
            messages.extend(history.iter().cloned());

            debug!(stage = %state.stage, turn = turns, "awaiting model");
            let response = self.model.chat(&messages, &self.model_config).await?;

            history.push(ChatMessage::assistant(
                response.content.clone(),
                response.tool_calls.clone(),
            ));

            if response.tool_calls.is_empty() {
                stop_reason = StopReason::Completed;
                break;
            }

            // awaiting-tools: sequential, in request order
            let mut outcomes = Vec::with_capacity(response.tool_calls.len());
            for request in &response.tool_calls {
                let outcome = tools::execute_request(request).await;
                history.push(ChatMessage::tool_result(
                    request.id.clone(),
                    outcome.result.as_text(),
                ));
                outcomes.push(outcome);
            }

            state = state.apply_turn(&outcomes);
        }

        if stop_reason == StopReason::TurnLimit {
            warn!(
                max_turns = self.max_turns,
                "turn limit reached before the model finished"
            );
        }

        Ok(SessionOutcome {
            state,
            history,
            stop_reason,
            turns,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::BASE_SYSTEM_PROMPT;
    use crate::models::{MockModel, ModelResponse};
    use crate::tools::ToolCallRequest;
    use crate::workflow::WorkflowStage;
    use serde_json::json;

    fn response(content: &str, tool_calls: Vec<ToolCallRequest>) -> ModelResponse {
        ModelResponse {
            content: content.to_string(),
            tool_calls,
            usage: None,
            model_name: "mock".to_string(),
        }
    }

    fn turn_loop(model: MockModel, max_turns: usize) -> TurnLoop {
        TurnLoop::new(
            Box::new(model),
            ModelConfig::default(),
            BASE_SYSTEM_PROMPT.to_string(),
            max_turns,
        )
    }

    #[tokio::test]
    async fn no_tool_calls_completes_immediately() {
        let mut model = MockModel::new();
        model
            .expect_chat()
            .times(1)
            .returning(|_, _| Ok(response("All done.", vec![])));

        let outcome = turn_loop(model, 5)
            .run(WorkflowState::new(), Vec::new(), "hello")
            .await
            .unwrap();

        assert_eq!(outcome.stop_reason, StopReason::Completed);
        assert_eq!(outcome.turns, 1);
        assert_eq!(outcome.state.stage, WorkflowStage::Initialize);
        // user + assistant, nothing else
        assert_eq!(outcome.history.len(), 2);
    }

    #[tokio::test]
    async fn system_prompt_carries_current_stage() {
        let mut model = MockModel::new();
        model
            .expect_chat()
            .times(1)
            .withf(|messages, _| {
                messages[0]
                    .content
                    .contains("Current workflow stage: initialize")
            })
            .returning(|_, _| Ok(response("ok", vec![])));

        turn_loop(model, 5)
            .run(WorkflowState::new(), Vec::new(), "hello")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn tool_results_are_fed_back_to_the_model() {
        let mut model = MockModel::new();
        let mut seq = mockall::Sequence::new();
        // Turn 1: request a directory listing; turn 2: finish.
        model.expect_chat().times(1).in_sequence(&mut seq).returning(|_, _| {
            Ok(response(
                "",
                vec![ToolCallRequest {
                    id: "call_1".to_string(),
                    name: "list_directory".to_string(),
                    arguments: json!({"directory": "."}),
                }],
            ))
        });
        model
            .expect_chat()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|messages, _| {
                messages
                    .iter()
                    .any(|m| m.tool_call_id.as_deref() == Some("call_1"))
            })
            .returning(|_, _| Ok(response("Listed.", vec![])));

        let outcome = turn_loop(model, 5)
            .run(WorkflowState::new(), Vec::new(), "what is here?")
            .await
            .unwrap();

        assert_eq!(outcome.stop_reason, StopReason::Completed);
        assert_eq!(outcome.turns, 2);
        // Listing alone never advances the workflow.
        assert_eq!(outcome.state.stage, WorkflowStage::Initialize);
    }

    #[tokio::test]
    async fn successful_clone_advances_to_explore() {
        // A local source repository to clone from, and a target inside the
        // same tempdir so nothing leaks into the working directory.
        let temp_dir = tempfile::TempDir::new().unwrap();
        let source = temp_dir.path().join("source");
        let repo = git2::Repository::init(&source).unwrap();
        std::fs::write(source.join("README.md"), "hello").unwrap();
        drop(repo);
        let committed = crate::tools::execute(&crate::tools::ToolCall::GitCommit {
            directory: source.to_str().unwrap().to_string(),
            message: "init".to_string(),
            add_all: true,
        })
        .await;
        assert!(committed.is_success(), "setup commit failed: {:?}", committed);

        let source_url = source.to_str().unwrap().to_string();
        let target = temp_dir.path().join("clone").to_str().unwrap().to_string();

        let mut model = MockModel::new();
        let mut seq = mockall::Sequence::new();
        let args = json!({"repo_url": source_url.clone(), "directory": target.clone()});
        model.expect_chat().times(1).in_sequence(&mut seq).returning(move |_, _| {
            Ok(response(
                "",
                vec![ToolCallRequest {
                    id: "call_clone".to_string(),
                    name: "git_clone".to_string(),
                    arguments: args.clone(),
                }],
            ))
        });
        model
            .expect_chat()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(response("Cloned.", vec![])));

        let outcome = turn_loop(model, 5)
            .run(WorkflowState::new(), Vec::new(), "clone it")
            .await
            .unwrap();

        assert_eq!(outcome.stop_reason, StopReason::Completed);
        assert_eq!(outcome.state.stage, WorkflowStage::Explore);
        assert_eq!(outcome.state.repository.url.as_deref(), Some(source_url.as_str()));
        assert_eq!(outcome.state.repository.directory.as_deref(), Some(target.as_str()));
    }

    #[tokio::test]
    async fn misbehaving_model_hits_the_turn_cap() {
        let mut model = MockModel::new();
        model.expect_chat().times(3).returning(|_, _| {
            Ok(response(
                "",
                vec![ToolCallRequest {
                    id: "call_x".to_string(),
                    name: "git_status".to_string(),
                    arguments: json!({"directory": "/nonexistent"}),
                }],
            ))
        });

        let outcome = turn_loop(model, 3)
            .run(WorkflowState::new(), Vec::new(), "loop forever")
            .await
            .unwrap();

        assert_eq!(outcome.stop_reason, StopReason::TurnLimit);
        assert_eq!(outcome.turns, 3);
    }

    #[tokio::test]
    async fn model_failure_is_fatal() {
        let mut model = MockModel::new();
        model
            .expect_chat()
            .times(1)
            .returning(|_, _| Err(anyhow::anyhow!("proxy unreachable")));

        let result = turn_loop(model, 5)
            .run(WorkflowState::new(), Vec::new(), "hello")
            .await;

        assert!(result.is_err());
    }
}
