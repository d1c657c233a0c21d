use serde_json::{Value, json};

use super::{ToolContext, ToolError, ToolFuture, ToolHandler, ToolResult};
use crate::llm::provider::LlmResult;

pub const SEARCH_TOOL_NAME: &str = "search";
pub const SEARCH_QUERY_PREFIX: &str = "FPL Fantasy Premier League ";

pub const SEARCH_TOOL_DESCRIPTION: &str = "Searches the web to stay up to date with the current FPL (Fantasy Premier League) ecosystem: player injuries, transfer news, price changes, press conferences and fixtures. The query is automatically scoped to Fantasy Premier League.";

/// Backend that answers a batch of search queries with an opaque text payload.
pub trait SearchService: Send + Sync {
    fn search(
        &self,
        queries: Vec<String>,
    ) -> impl std::future::Future<Output = LlmResult<String>> + Send;
}

#[derive(Debug, Clone)]
pub struct SearchTool<S> {
    service: S,
}

impl<S: SearchService> SearchTool<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    /// Result payload is passed through untouched; service errors propagate as they are.
    pub async fn run(&self, query: &str) -> ToolResult<String> {
        let scoped = format!("{SEARCH_QUERY_PREFIX}{query}");
        self.service
            .search(vec![scoped])
            .await
            .map_err(ToolError::Search)
    }

    pub fn input_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "What to look up, e.g. \"player injuries\" or \"transfer news\""
                }
            },
            "required": ["query"]
        })
    }
}

impl<S: SearchService> ToolHandler for SearchTool<S> {
    fn call<'a>(&'a self, _ctx: &'a ToolContext, args: &'a Value) -> ToolFuture<'a> {
        Box::pin(async move {
            let query = args
                .get("query")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    ToolError::InvalidArgs("search requires a string 'query'".to_string())
                })?;
            self.run(query).await
        })
    }
}
