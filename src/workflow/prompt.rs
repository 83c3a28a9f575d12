use chrono::Local;

use super::state::WorkflowState;

/// Build the stage-specific system prompt for one turn: base template with
/// `{system_time}` substituted, then stage, repository summary, and the
/// stage's guidance line.
pub fn build_system_prompt(template: &str, state: &WorkflowState) -> String {
    let mut prompt = template.replace("{system_time}", &Local::now().to_rfc3339());

    prompt.push_str(&format!("\n\nCurrent workflow stage: {}\n", state.stage));

    if !state.repository.is_empty() {
        prompt.push('\n');
        prompt.push_str(&state.repository.to_prompt_context());
    }

    prompt.push('\n');
    prompt.push_str(state.stage.guidance());

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::BASE_SYSTEM_PROMPT;
    use crate::workflow::{WorkflowStage, WorkflowState};

    #[test]
    fn substitutes_system_time() {
        let prompt = build_system_prompt(BASE_SYSTEM_PROMPT, &WorkflowState::new());
        assert!(!prompt.contains("{system_time}"));
        assert!(prompt.contains("Current time: "));
    }

    #[test]
    fn includes_stage_and_guidance() {
        let state = WorkflowState::new();
        let prompt = build_system_prompt(BASE_SYSTEM_PROMPT, &state);
        assert!(prompt.contains("Current workflow stage: initialize"));
        assert!(prompt.contains(WorkflowStage::Initialize.guidance()));
    }

    #[test]
    fn repository_context_appears_once_populated() {
        let mut state = WorkflowState::new();
        let bare = build_system_prompt(BASE_SYSTEM_PROMPT, &state);
        assert!(!bare.contains("Repository context:"));

        state.repository.url = Some("https://x/y/z.git".to_string());
        state.repository.directory = Some("./z".to_string());
        let populated = build_system_prompt(BASE_SYSTEM_PROMPT, &state);
        assert!(populated.contains("Repository context:"));
        assert!(populated.contains("directory: ./z"));
    }
}
