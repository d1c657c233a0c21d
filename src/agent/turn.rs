use serde_json::Value;

use crate::tools::FunctionCallSpec;

/// A tool call the model asked for, as it arrived.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolAction {
    pub step: usize,
    pub id: Option<String>,
    pub name: String,
    pub args_json: Value,
    pub thought_signature: Option<String>,
}

impl ToolAction {
    pub fn call_spec(&self) -> FunctionCallSpec {
        FunctionCallSpec {
            id: self.id.clone(),
            name: self.name.clone(),
            args_json: self.args_json.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntermediateStep {
    pub action: ToolAction,
    pub observation: Value,
}

/// Append-only, ordered record of tool invocations within one turn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepLog {
    steps: Vec<IntermediateStep>,
}

impl StepLog {
    pub fn push(&mut self, action: ToolAction, observation: Value) {
        self.steps.push(IntermediateStep {
            action,
            observation,
        });
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &IntermediateStep> {
        self.steps.iter()
    }

    /// Consecutive steps issued by the same model response, in log order.
    pub fn grouped_by_step(&self) -> Vec<&[IntermediateStep]> {
        self.steps
            .chunk_by(|a, b| a.action.step == b.action.step)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    Actions(Vec<ToolAction>),
    Finish { text: String, degraded: bool },
}

/// State of one user message from input to final answer.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationTurn {
    input: String,
    steps: StepLog,
    outcome: Option<TurnOutcome>,
}

impl ConversationTurn {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            steps: StepLog::default(),
            outcome: None,
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn steps(&self) -> &StepLog {
        &self.steps
    }

    pub fn outcome(&self) -> Option<&TurnOutcome> {
        self.outcome.as_ref()
    }

    pub fn record_step(&mut self, action: ToolAction, observation: Value) {
        self.steps.push(action, observation);
    }

    pub fn set_outcome(&mut self, outcome: TurnOutcome) {
        self.outcome = Some(outcome);
    }
}
