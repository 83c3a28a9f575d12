use anyhow::{Context, Result};
use colored::Colorize;

use crate::{
    app::{load_config, Config},
    cli::{handle_command, Cli},
    constants::{BASE_SYSTEM_PROMPT, DEFAULT_TOP_P},
    models::{MessageRole, ModelConfig, ModelFactory},
    session::{ConversationHistory, ConversationManager, SessionState},
    workflow::WorkflowState,
};

use super::turn_loop::{StopReason, TurnLoop};

/// Main runtime orchestrator
pub struct Orchestrator {
    cli: Cli,
    config: Config,
    session: SessionState,
}

impl Orchestrator {
    /// Create a new orchestrator from CLI args
    pub fn new(cli: Cli) -> Result<Self> {
        let config = if let Some(config_path) = &cli.config {
            let toml_str = std::fs::read_to_string(config_path)?;
            toml::from_str::<Config>(&toml_str)?
        } else {
            match load_config() {
                Ok(cfg) => cfg,
                Err(e) => {
                    eprintln!("Failed to load config: {}. Using defaults.", e);
                    Config::default()
                }
            }
        };

        let session = SessionState::load().unwrap_or_default();

        Ok(Self {
            cli,
            config,
            session,
        })
    }

    /// Run the orchestrator
    pub async fn run(mut self) -> Result<()> {
        if let Some(command) = &self.cli.command {
            if handle_command(command).await? {
                return Ok(());
            }
        }

        // Determine the model to use (CLI arg > session > config)
        let (model_id, should_save_session) = if let Some(model) = &self.cli.model {
            (model.clone(), true)
        } else if let Some(last_model) = self.session.get_model() {
            (last_model.to_string(), false)
        } else {
            (
                format!(
                    "{}/{}",
                    self.config.default_model.provider, self.config.default_model.name
                ),
                true,
            )
        };

        if should_save_session {
            self.session.set_model(model_id.clone());
            if let Err(e) = self.session.save() {
                eprintln!("Failed to save session: {}", e);
            }
        }

        let prompt = self
            .cli
            .prompt
            .clone()
            .context("No task given. Pass one with --prompt, e.g. tiller -p \"clone <url> and ...\"")?;

        if let Some(path) = &self.cli.path {
            std::env::set_current_dir(path)
                .with_context(|| format!("Cannot change to working directory {}", path.display()))?;
        }

        println!("Starting Tiller with model: {}", model_id.green());

        let model = match ModelFactory::create(&model_id, Some(&self.config)) {
            Ok(m) => m,
            Err(e) => {
                eprintln!("Failed to initialize model: {}", e);
                eprintln!("   Make sure the model is available and properly configured.");
                std::process::exit(1);
            }
        };

        let manager = ConversationManager::new(".")?;

        let (history, state, mut conversation) = if self.cli.continue_conversation {
            match manager.load_last_conversation()? {
                Some(previous) => {
                    println!("Continuing: {}", previous.summary().cyan());
                    (
                        previous.messages.clone(),
                        previous.workflow.clone(),
                        previous,
                    )
                }
                None => {
                    eprintln!("No previous conversation here; starting fresh.");
                    (
                        Vec::new(),
                        WorkflowState::new(),
                        ConversationHistory::new(model_id.clone()),
                    )
                }
            }
        } else {
            (
                Vec::new(),
                WorkflowState::new(),
                ConversationHistory::new(model_id.clone()),
            )
        };

        let model_config = ModelConfig {
            temperature: Some(self.config.default_model.temperature),
            max_tokens: Some(self.config.default_model.max_tokens),
            top_p: Some(DEFAULT_TOP_P),
        };

        let system_template = self
            .config
            .agent
            .system_prompt
            .clone()
            .unwrap_or_else(|| BASE_SYSTEM_PROMPT.to_string());

        let max_turns = self.cli.max_turns.unwrap_or(self.config.agent.max_turns);

        let mut turn_loop = TurnLoop::new(model, model_config, system_template, max_turns);
        let outcome = turn_loop.run(state, history, &prompt).await?;

        // The final text answer, if the model gave one
        if let Some(answer) = outcome
            .history
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::Assistant && !m.content.is_empty())
        {
            println!("\n{}", answer.content);
        }

        if outcome.stop_reason == StopReason::TurnLimit {
            eprintln!(
                "{}",
                format!("Stopped after {} turns without finishing.", outcome.turns).yellow()
            );
        }

        println!(
            "\n{}",
            format!(
                "Session ended at stage '{}' after {} turns.",
                outcome.state.stage, outcome.turns
            )
            .cyan()
        );
        if !outcome.state.repository.is_empty() {
            print!("{}", outcome.state.repository.to_prompt_context());
        }

        conversation.model_name = model_id;
        conversation.messages.clear();
        conversation.add_messages(&outcome.history);
        conversation.workflow = outcome.state;
        manager.save_conversation(&conversation)?;

        Ok(())
    }
}
