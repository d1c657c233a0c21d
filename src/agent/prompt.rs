use crate::agent::turn::ConversationTurn;
use crate::llm::provider::{AssistantMessage, AssistantPart, AssistantRole};

pub const FPL_SYSTEM_PROMPT: &str = r#"You are a Fantasy Premier League (FPL) expert who answers questions based on the user prompt.

Rules:
1) Use the search function for anything time-sensitive: injuries, suspensions, press conferences, price changes, fixtures and form.
2) Use YourTeam when the question is about the user's own squad, captaincy, transfers or chips. Use PlayerDetails to turn pick element ids into player names.
   Use ManagerSummary for the user's points, ranks, mini-leagues, bank and free transfers, and GameweekHistory for how their season has gone week by week.
3) Be specific with recommendations (e.g. "transfer out Player A for Player B") and keep answers concise.
4) Do not recommend players who are no longer in the Premier League.
5) If a tool result contains an error, say what could not be fetched and answer from what is available.
6) If the question is not about FPL, ask the user to stick to FPL questions.

Be friendly and act like the user's FPL assistant manager. You can mock their decisions now and then, not always."#;

#[derive(Debug, Clone, PartialEq)]
pub struct PromptMessages {
    pub system_instruction: String,
    pub messages: Vec<AssistantMessage>,
}

/// System persona, the human message, then the scratchpad of prior tool steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    system: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new(FPL_SYSTEM_PROMPT)
    }
}

impl PromptTemplate {
    pub fn new(system: impl Into<String>) -> Self {
        Self {
            system: system.into(),
        }
    }

    pub fn system(&self) -> &str {
        &self.system
    }

    pub fn format(&self, turn: &ConversationTurn) -> PromptMessages {
        let mut messages = vec![AssistantMessage {
            role: AssistantRole::User,
            parts: vec![AssistantPart::Text {
                text: turn.input().to_string(),
                thought_signature: None,
            }],
        }];

        for group in turn.steps().grouped_by_step() {
            messages.push(AssistantMessage {
                role: AssistantRole::Model,
                parts: group
                    .iter()
                    .map(|step| AssistantPart::FunctionCall {
                        id: step.action.id.clone(),
                        name: step.action.name.clone(),
                        args_json: step.action.args_json.clone(),
                        thought_signature: step.action.thought_signature.clone(),
                    })
                    .collect(),
            });
            messages.push(AssistantMessage {
                role: AssistantRole::User,
                parts: group
                    .iter()
                    .map(|step| AssistantPart::FunctionResponse {
                        id: step.action.id.clone(),
                        name: step.action.name.clone(),
                        response_json: step.observation.clone(),
                        thought_signature: None,
                    })
                    .collect(),
            });
        }

        PromptMessages {
            system_instruction: self.system.clone(),
            messages,
        }
    }
}
