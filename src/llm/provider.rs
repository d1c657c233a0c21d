use std::error::Error;
use std::fmt::{Display, Formatter};

use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct AssistantInput {
    pub system_instruction: Option<String>,
    pub messages: Vec<AssistantMessage>,
    pub tools: Vec<FunctionDeclaration>,
    pub tool_calling_mode: ToolCallingMode,
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolCallingMode {
    Auto,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssistantRole {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssistantMessage {
    pub role: AssistantRole,
    pub parts: Vec<AssistantPart>,
}

/// One part of a message. `thought_signature` is opaque provider state that has to be
/// sent back unchanged on the part it arrived with.
#[derive(Debug, Clone, PartialEq)]
pub enum AssistantPart {
    Text {
        text: String,
        thought_signature: Option<String>,
    },
    FunctionCall {
        id: Option<String>,
        name: String,
        args_json: Value,
        thought_signature: Option<String>,
    },
    FunctionResponse {
        id: Option<String>,
        name: String,
        response_json: Value,
        thought_signature: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDeclaration {
    pub name: String,
    pub description: String,
    pub parameters_json_schema: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssistantCandidate {
    pub message: AssistantMessage,
    pub finish_reason: Option<String>,
    pub safety_blocked: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssistantOutput {
    pub candidates: Vec<AssistantCandidate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    MissingApiKey,
    HttpStatus { status: u16, body: String },
    Transport(String),
    Parse(String),
    EmptyResponse,
}

impl Display for LlmError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingApiKey => write!(f, "missing GEMINI_API_KEY"),
            Self::HttpStatus { status, body } => {
                write!(f, "provider request failed with status {status}: {body}")
            }
            Self::Transport(msg) => write!(f, "provider transport error: {msg}"),
            Self::Parse(msg) => write!(f, "provider parse error: {msg}"),
            Self::EmptyResponse => write!(f, "provider returned empty response text"),
        }
    }
}

impl Error for LlmError {}

pub type LlmResult<T> = std::result::Result<T, LlmError>;

pub trait LlmProvider {
    fn generate(
        &self,
        input: AssistantInput,
    ) -> impl std::future::Future<Output = LlmResult<AssistantOutput>> + Send;
}
