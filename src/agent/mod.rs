pub mod loop_impl;
pub mod prompt;
pub mod turn;

pub use loop_impl::{AgentAnswer, AgentConfig, AgentProgressEvent, run_turn};
pub use prompt::{FPL_SYSTEM_PROMPT, PromptTemplate};
pub use turn::{ConversationTurn, StepLog, ToolAction, TurnOutcome};
