use serde_json::Value;

use crate::agent::prompt::PromptTemplate;
use crate::agent::turn::{ConversationTurn, ToolAction, TurnOutcome};
use crate::llm::provider::{
    AssistantCandidate, AssistantInput, AssistantPart, LlmProvider, ToolCallingMode,
};
use crate::tools::{ToolContext, ToolRegistry};

/// Sampling temperature for every chat request.
pub const TEMPERATURE: f32 = 0.0;

const STEP_LIMIT_MESSAGE: &str =
    "Assistant reached the step limit while reasoning about your question.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentConfig {
    pub max_steps: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self { max_steps: 6 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentAnswer {
    pub text: String,
    pub degraded: bool,
    pub tool_calls: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AgentProgressEvent {
    StepStarted {
        step: usize,
    },
    ModelResponse {
        step: usize,
        thought_signatures: usize,
        tool_calls: usize,
        has_text: bool,
    },
    ToolRequest {
        step: usize,
        id: Option<String>,
        name: String,
        args_json: Value,
    },
    ToolResult {
        step: usize,
        id: Option<String>,
        name: String,
        response_json: Value,
    },
}

/// Answers one user message, calling tools from `registry` as the model requests them.
///
/// Provider failures and unusable responses end the turn with a degraded answer; there
/// are no retries and no timeouts. The last allowed step is sent with tool calling
/// disabled, and any calls the model still asks for there are not run.
pub async fn run_turn<P: LlmProvider, F: FnMut(AgentProgressEvent)>(
    provider: &P,
    registry: &ToolRegistry,
    ctx: &ToolContext,
    template: &PromptTemplate,
    question: &str,
    config: &AgentConfig,
    on_event: &mut F,
) -> AgentAnswer {
    let mut turn = ConversationTurn::new(question);
    let tools = registry.declarations();

    for step in 1..=config.max_steps {
        on_event(AgentProgressEvent::StepStarted { step });

        let last_step = step == config.max_steps;
        let prompt = template.format(&turn);
        let llm = provider
            .generate(AssistantInput {
                system_instruction: Some(prompt.system_instruction),
                messages: prompt.messages,
                tools: tools.clone(),
                tool_calling_mode: if last_step {
                    ToolCallingMode::None
                } else {
                    ToolCallingMode::Auto
                },
                temperature: Some(TEMPERATURE),
            })
            .await;

        let output = match llm {
            Ok(output) => output,
            Err(err) => {
                return finish(
                    &mut turn,
                    format!("Assistant request failed while reasoning: {err}"),
                    true,
                );
            }
        };

        let Some(candidate) = select_candidate(&output.candidates) else {
            return finish(
                &mut turn,
                "Assistant returned no usable response for your question.",
                true,
            );
        };

        let actions = extract_actions(step, &candidate.message.parts);
        let text = extract_text(&candidate.message.parts);
        on_event(AgentProgressEvent::ModelResponse {
            step,
            thought_signatures: count_thought_signatures(&candidate.message.parts),
            tool_calls: actions.len(),
            has_text: !text.is_empty(),
        });

        if actions.is_empty() {
            if text.is_empty() {
                return finish(&mut turn, "Assistant returned an empty response.", true);
            }
            return finish(&mut turn, text, false);
        }

        turn.set_outcome(TurnOutcome::Actions(actions.clone()));
        if last_step {
            break;
        }
        for action in actions {
            on_event(AgentProgressEvent::ToolRequest {
                step,
                id: action.id.clone(),
                name: action.name.clone(),
                args_json: action.args_json.clone(),
            });

            let response_json = registry.dispatch(ctx, &action.call_spec()).await;
            on_event(AgentProgressEvent::ToolResult {
                step,
                id: action.id.clone(),
                name: action.name.clone(),
                response_json: response_json.clone(),
            });
            turn.record_step(action, response_json);
        }
    }

    AgentAnswer::from_turn(&turn)
}

impl AgentAnswer {
    /// A turn that stopped without a finished outcome ran out of steps.
    fn from_turn(turn: &ConversationTurn) -> Self {
        let (text, degraded) = match turn.outcome() {
            Some(TurnOutcome::Finish { text, degraded }) => (text.clone(), *degraded),
            Some(TurnOutcome::Actions(_)) | None => (STEP_LIMIT_MESSAGE.to_string(), true),
        };
        Self {
            text,
            degraded,
            tool_calls: turn.steps().len(),
        }
    }
}

fn finish(turn: &mut ConversationTurn, text: impl Into<String>, degraded: bool) -> AgentAnswer {
    turn.set_outcome(TurnOutcome::Finish {
        text: text.into(),
        degraded,
    });
    AgentAnswer::from_turn(turn)
}

fn select_candidate(candidates: &[AssistantCandidate]) -> Option<&AssistantCandidate> {
    candidates
        .iter()
        .find(|candidate| {
            is_usable_candidate(candidate)
                && !has_function_calls(&candidate.message.parts)
                && !extract_text(&candidate.message.parts).is_empty()
        })
        .or_else(|| {
            candidates.iter().find(|candidate| {
                is_usable_candidate(candidate) && has_function_calls(&candidate.message.parts)
            })
        })
        .or_else(|| candidates.iter().find(|c| is_usable_candidate(c)))
}

fn is_usable_candidate(candidate: &AssistantCandidate) -> bool {
    let blocked_reason = matches!(
        candidate.finish_reason.as_deref(),
        Some("SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT")
    );
    !candidate.safety_blocked && !blocked_reason && !candidate.message.parts.is_empty()
}

fn has_function_calls(parts: &[AssistantPart]) -> bool {
    parts
        .iter()
        .any(|part| matches!(part, AssistantPart::FunctionCall { .. }))
}

fn count_thought_signatures(parts: &[AssistantPart]) -> usize {
    parts
        .iter()
        .filter(|part| match part {
            AssistantPart::Text {
                thought_signature, ..
            }
            | AssistantPart::FunctionCall {
                thought_signature, ..
            }
            | AssistantPart::FunctionResponse {
                thought_signature, ..
            } => thought_signature.is_some(),
        })
        .count()
}

fn extract_actions(step: usize, parts: &[AssistantPart]) -> Vec<ToolAction> {
    parts
        .iter()
        .filter_map(|part| match part {
            AssistantPart::FunctionCall {
                id,
                name,
                args_json,
                thought_signature,
            } => Some(ToolAction {
                step,
                id: id.clone(),
                name: name.clone(),
                args_json: args_json.clone(),
                thought_signature: thought_signature.clone(),
            }),
            _ => None,
        })
        .collect()
}

fn extract_text(parts: &[AssistantPart]) -> String {
    parts
        .iter()
        .filter_map(|part| match part {
            AssistantPart::Text { text, .. } => Some(text.trim()).filter(|t| !t.is_empty()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}
