use serde_json::{Value, json};

use super::manager::{
    GAMEWEEK_HISTORY_TOOL_DESCRIPTION, GAMEWEEK_HISTORY_TOOL_NAME, GameweekHistoryTool,
    MANAGER_SUMMARY_TOOL_DESCRIPTION, MANAGER_SUMMARY_TOOL_NAME, ManagerSummaryTool,
};
use super::players::{PLAYERS_TOOL_DESCRIPTION, PLAYERS_TOOL_NAME, PlayerDetailsTool};
use super::search::{SEARCH_TOOL_DESCRIPTION, SEARCH_TOOL_NAME, SearchService, SearchTool};
use super::team::{TEAM_TOOL_DESCRIPTION, TEAM_TOOL_NAME, TeamTool};
use super::{ToolContext, ToolError, ToolHandler};
use crate::fpl::FplClient;
use crate::llm::provider::FunctionDeclaration;

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCallSpec {
    pub id: Option<String>,
    pub name: String,
    pub args_json: Value,
}

pub struct ToolEntry {
    pub description: String,
    pub input_schema: Value,
    pub handler: Box<dyn ToolHandler>,
}

/// Capability table: tool name to schema, description and handler, in registration order.
#[derive(Default)]
pub struct ToolRegistry {
    entries: Vec<(String, ToolEntry)>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The FPL assistant's tools: `search`, `YourTeam`, `PlayerDetails`, `ManagerSummary`
    /// and `GameweekHistory`.
    pub fn fpl<S: SearchService + 'static>(search: S, fpl: FplClient) -> Self {
        let mut registry = Self::new();
        registry.register(
            SEARCH_TOOL_NAME,
            ToolEntry {
                description: SEARCH_TOOL_DESCRIPTION.to_string(),
                input_schema: SearchTool::<S>::input_schema(),
                handler: Box::new(SearchTool::new(search)),
            },
        );
        registry.register(
            TEAM_TOOL_NAME,
            ToolEntry {
                description: TEAM_TOOL_DESCRIPTION.to_string(),
                input_schema: TeamTool::input_schema(),
                handler: Box::new(TeamTool::new(fpl.clone())),
            },
        );
        registry.register(
            PLAYERS_TOOL_NAME,
            ToolEntry {
                description: PLAYERS_TOOL_DESCRIPTION.to_string(),
                input_schema: PlayerDetailsTool::input_schema(),
                handler: Box::new(PlayerDetailsTool::new(fpl.clone())),
            },
        );
        registry.register(
            MANAGER_SUMMARY_TOOL_NAME,
            ToolEntry {
                description: MANAGER_SUMMARY_TOOL_DESCRIPTION.to_string(),
                input_schema: ManagerSummaryTool::input_schema(),
                handler: Box::new(ManagerSummaryTool::new(fpl.clone())),
            },
        );
        registry.register(
            GAMEWEEK_HISTORY_TOOL_NAME,
            ToolEntry {
                description: GAMEWEEK_HISTORY_TOOL_DESCRIPTION.to_string(),
                input_schema: GameweekHistoryTool::input_schema(),
                handler: Box::new(GameweekHistoryTool::new(fpl)),
            },
        );
        registry
    }

    /// Registering an existing name replaces its entry in place.
    pub fn register(&mut self, name: impl Into<String>, entry: ToolEntry) {
        let name = name.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = entry,
            None => self.entries.push((name, entry)),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn declarations(&self) -> Vec<FunctionDeclaration> {
        self.entries
            .iter()
            .map(|(name, entry)| FunctionDeclaration {
                name: name.clone(),
                description: entry.description.clone(),
                parameters_json_schema: entry.input_schema.clone(),
            })
            .collect()
    }

    /// Runs one call and wraps the outcome in an `ok`/`error` envelope for the model.
    pub async fn dispatch(&self, ctx: &ToolContext, call: &FunctionCallSpec) -> Value {
        let Some((_, entry)) = self.entries.iter().find(|(name, _)| *name == call.name) else {
            return error_envelope(
                "unknown_function",
                format!("unknown function: {}", call.name),
                json!({}),
            );
        };

        match entry.handler.call(ctx, &call.args_json).await {
            Ok(observation) => json!({
                "ok": true,
                "result": observation
            }),
            Err(err) => map_tool_error(call, err),
        }
    }
}

fn map_tool_error(call: &FunctionCallSpec, err: ToolError) -> Value {
    match err {
        ToolError::InvalidArgs(msg) => error_envelope(
            "invalid_args",
            msg,
            json!({
                "args": call.args_json
            }),
        ),
        other => error_envelope(
            "tool_failed",
            other.to_string(),
            json!({
                "tool": call.name
            }),
        ),
    }
}

fn error_envelope(code: &str, message: impl Into<String>, details: Value) -> Value {
    json!({
        "ok": false,
        "error": {
            "code": code,
            "message": message.into(),
            "details": details
        }
    })
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::{FunctionCallSpec, ToolEntry, ToolRegistry};
    use crate::fpl::{FplClient, ManagerId};
    use crate::http::client::HttpClient;
    use crate::http::debug::HttpDebugConfig;
    use crate::llm::provider::{LlmError, LlmResult};
    use crate::tools::{SearchService, ToolContext, ToolFuture, ToolHandler};

    struct EchoManager;

    impl ToolHandler for EchoManager {
        fn call<'a>(&'a self, ctx: &'a ToolContext, _args: &'a Value) -> ToolFuture<'a> {
            Box::pin(async move {
                Ok(ctx
                    .manager_id
                    .map_or_else(|| "none".to_string(), |id| id.to_string()))
            })
        }
    }

    struct DownSearch;

    impl SearchService for DownSearch {
        async fn search(&self, _queries: Vec<String>) -> LlmResult<String> {
            Err(LlmError::Transport("connection reset".to_string()))
        }
    }

    fn call(name: &str, args_json: Value) -> FunctionCallSpec {
        FunctionCallSpec {
            id: Some("c1".to_string()),
            name: name.to_string(),
            args_json,
        }
    }

    fn fpl_registry() -> ToolRegistry {
        ToolRegistry::fpl(
            DownSearch,
            FplClient::new(
                HttpClient::new(reqwest::Client::new(), HttpDebugConfig::disabled()),
                "http://127.0.0.1:9/api",
            ),
        )
    }

    #[test]
    fn fpl_registry_declares_tools_in_order() {
        let registry = fpl_registry();
        let declarations = registry.declarations();

        assert_eq!(
            registry.names().collect::<Vec<_>>(),
            vec![
                "search",
                "YourTeam",
                "PlayerDetails",
                "ManagerSummary",
                "GameweekHistory"
            ]
        );
        assert_eq!(declarations[0].parameters_json_schema["required"], json!(["query"]));
        assert_eq!(declarations[1].parameters_json_schema["properties"], json!({}));
        assert!(declarations.iter().all(|d| !d.description.is_empty()));
    }

    #[test]
    fn register_replaces_existing_entry() {
        let mut registry = ToolRegistry::new();
        for description in ["first", "second"] {
            registry.register(
                "whoami",
                ToolEntry {
                    description: description.to_string(),
                    input_schema: json!({"type": "object", "properties": {}}),
                    handler: Box::new(EchoManager),
                },
            );
        }

        let declarations = registry.declarations();
        assert_eq!(declarations.len(), 1);
        assert_eq!(declarations[0].description, "second");
    }

    #[tokio::test]
    async fn dispatch_passes_context_to_handler() {
        let mut registry = ToolRegistry::new();
        registry.register(
            "whoami",
            ToolEntry {
                description: "echo manager".to_string(),
                input_schema: json!({"type": "object", "properties": {}}),
                handler: Box::new(EchoManager),
            },
        );

        let response = registry
            .dispatch(&ToolContext::for_manager(ManagerId(77)), &call("whoami", json!({})))
            .await;

        assert_eq!(response, json!({"ok": true, "result": "77"}));
    }

    #[tokio::test]
    async fn dispatch_reports_unknown_function() {
        let response = fpl_registry()
            .dispatch(&ToolContext::default(), &call("transfer_planner", json!({})))
            .await;

        assert_eq!(response["ok"], json!(false));
        assert_eq!(response["error"]["code"], json!("unknown_function"));
        assert_eq!(
            response["error"]["message"],
            json!("unknown function: transfer_planner")
        );
    }

    #[tokio::test]
    async fn dispatch_reports_invalid_args_with_original_args() {
        let response = fpl_registry()
            .dispatch(&ToolContext::default(), &call("YourTeam", json!({"id": 1})))
            .await;

        assert_eq!(response["error"]["code"], json!("invalid_args"));
        assert_eq!(response["error"]["details"]["args"], json!({"id": 1}));
    }

    #[tokio::test]
    async fn dispatch_wraps_search_failure_as_tool_failed() {
        let response = fpl_registry()
            .dispatch(&ToolContext::default(), &call("search", json!({"query": "injuries"})))
            .await;

        assert_eq!(response["ok"], json!(false));
        assert_eq!(response["error"]["code"], json!("tool_failed"));
        assert!(
            response["error"]["message"]
                .as_str()
                .expect("message")
                .contains("connection reset")
        );
    }

    #[tokio::test]
    async fn dispatch_returns_team_error_observation_as_ok() {
        let response = fpl_registry()
            .dispatch(&ToolContext::default(), &call("YourTeam", json!({})))
            .await;

        assert_eq!(response["ok"], json!(true));
        assert_eq!(
            response["result"],
            json!(r#"{"error": "No FPL manager id is configured for this session."}"#)
        );
    }
}
