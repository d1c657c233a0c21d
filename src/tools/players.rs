use serde_json::{Value, json};

use super::{ToolContext, ToolError, ToolFuture, ToolHandler, ToolResult, error_observation};
use crate::fpl::FplClient;
use crate::fpl::format::to_spaced_json;

pub const PLAYERS_TOOL_NAME: &str = "PlayerDetails";

pub const PLAYERS_TOOL_DESCRIPTION: &str = "Looks up FPL players by element id (the `element` field of team picks) and returns name, position, club, current form and price for each, in the order requested.";

const MAX_ELEMENT_IDS: usize = 30;

#[derive(Debug, Clone)]
pub struct PlayerDetailsTool {
    fpl: FplClient,
}

impl PlayerDetailsTool {
    pub fn new(fpl: FplClient) -> Self {
        Self { fpl }
    }

    pub async fn run(&self, element_ids: &[u32]) -> ToolResult<String> {
        let bootstrap = match self.fpl.bootstrap().await {
            Ok(bootstrap) => bootstrap,
            Err(err) if err.is_transport() => {
                return error_observation(format!("Error fetching player data: {err}"));
            }
            Err(err) => return Err(ToolError::Fpl(err)),
        };

        let details = element_ids
            .iter()
            .map(|id| bootstrap.player_details(*id))
            .collect::<Vec<_>>();
        Ok(to_spaced_json(&details)?)
    }

    pub fn input_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "element_ids": {
                    "type": "array",
                    "items": {"type": "integer"},
                    "description": "Player element ids, at most 30"
                }
            },
            "required": ["element_ids"]
        })
    }
}

fn parse_element_ids(args: &Value) -> ToolResult<Vec<u32>> {
    let invalid = || {
        ToolError::InvalidArgs(format!(
            "{PLAYERS_TOOL_NAME} requires 'element_ids': a non-empty array of at most {MAX_ELEMENT_IDS} positive integers"
        ))
    };

    let items = args
        .get("element_ids")
        .and_then(Value::as_array)
        .filter(|items| !items.is_empty() && items.len() <= MAX_ELEMENT_IDS)
        .ok_or_else(invalid)?;

    items
        .iter()
        .map(|item| {
            item.as_u64()
                .filter(|id| *id > 0)
                .and_then(|id| u32::try_from(id).ok())
                .ok_or_else(invalid)
        })
        .collect()
}

impl ToolHandler for PlayerDetailsTool {
    fn call<'a>(&'a self, _ctx: &'a ToolContext, args: &'a Value) -> ToolFuture<'a> {
        Box::pin(async move {
            let element_ids = parse_element_ids(args)?;
            self.run(&element_ids).await
        })
    }
}
