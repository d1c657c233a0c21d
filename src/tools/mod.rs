pub mod manager;
pub mod players;
pub mod registry;
pub mod search;
pub mod team;

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use serde_json::{Value, json};

use crate::fpl::format::to_spaced_json;
use crate::fpl::{FplError, ManagerId};
use crate::llm::provider::LlmError;

pub use manager::{GameweekHistoryTool, ManagerSummaryTool};
pub use players::PlayerDetailsTool;
pub use registry::{FunctionCallSpec, ToolEntry, ToolRegistry};
pub use search::{SearchService, SearchTool};
pub use team::TeamTool;

/// Per-session state handed to every tool call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToolContext {
    pub manager_id: Option<ManagerId>,
}

impl ToolContext {
    pub fn for_manager(manager_id: ManagerId) -> Self {
        Self {
            manager_id: Some(manager_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    InvalidArgs(String),
    Search(LlmError),
    Fpl(FplError),
    Internal(String),
}

impl Display for ToolError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArgs(msg) => write!(f, "invalid arguments: {msg}"),
            Self::Search(err) => write!(f, "search failed: {err}"),
            Self::Fpl(err) => write!(f, "FPL request failed: {err}"),
            Self::Internal(msg) => write!(f, "internal tool error: {msg}"),
        }
    }
}

impl Error for ToolError {}

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

pub type ToolResult<T> = std::result::Result<T, ToolError>;

pub type ToolFuture<'a> = Pin<Box<dyn Future<Output = ToolResult<String>> + Send + 'a>>;

/// A callable capability. The returned string is the observation shown to the model.
pub trait ToolHandler: Send + Sync {
    fn call<'a>(&'a self, ctx: &'a ToolContext, args: &'a Value) -> ToolFuture<'a>;
}

/// Observation reporting a failure the model should talk about rather than a fault.
pub(crate) fn error_observation(message: impl Into<String>) -> ToolResult<String> {
    Ok(to_spaced_json(&json!({ "error": message.into() }))?)
}

pub(crate) fn expect_no_args(tool: &str, args: &Value) -> ToolResult<()> {
    if args.is_null() || args.as_object().is_some_and(|obj| obj.is_empty()) {
        Ok(())
    } else {
        Err(ToolError::InvalidArgs(format!(
            "{tool} does not accept arguments"
        )))
    }
}
