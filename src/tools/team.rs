use serde_json::{Value, json};

use super::{
    ToolContext, ToolError, ToolFuture, ToolHandler, ToolResult, error_observation,
    expect_no_args,
};
use crate::fpl::format::to_spaced_json;
use crate::fpl::{FplClient, ManagerId};

pub const TEAM_TOOL_NAME: &str = "YourTeam";

pub const TEAM_TOOL_DESCRIPTION: &str = "Fetches the user's current FPL team. Finds the current gameweek and returns the manager's picks for it (players, captain and vice-captain flags), the gameweek entry history and the active chip, as a JSON string. Takes no arguments: the manager is known from the session.";

pub const NO_MANAGER_MESSAGE: &str = "No FPL manager id is configured for this session.";
pub const NO_CURRENT_GAMEWEEK_MESSAGE: &str = "Could not determine the current gameweek.";

#[derive(Debug, Clone)]
pub struct TeamTool {
    fpl: FplClient,
}

impl TeamTool {
    pub fn new(fpl: FplClient) -> Self {
        Self { fpl }
    }

    /// Resolves the current gameweek, then fetches the manager's picks for it.
    ///
    /// Transport failures and an unresolvable gameweek come back as an `{"error": ...}`
    /// observation. Malformed payloads are returned as `ToolError::Fpl`.
    pub async fn run(&self, manager_id: Option<ManagerId>) -> ToolResult<String> {
        let Some(manager_id) = manager_id else {
            return error_observation(NO_MANAGER_MESSAGE);
        };

        let events = match self.fpl.events().await {
            Ok(events) => events,
            Err(err) if err.is_transport() => {
                return error_observation(format!(
                    "Error fetching current gameweek data: {err}"
                ));
            }
            Err(err) => return Err(ToolError::Fpl(err)),
        };

        let Some(gameweek) = events.current_gameweek() else {
            return error_observation(NO_CURRENT_GAMEWEEK_MESSAGE);
        };

        let summary = match self.fpl.picks(manager_id, gameweek).await {
            Ok(summary) => summary,
            Err(err) if err.is_transport() => {
                return error_observation(format!(
                    "Error fetching team data for manager {manager_id}: {err}"
                ));
            }
            Err(err) => return Err(ToolError::Fpl(err)),
        };

        Ok(to_spaced_json(&summary)?)
    }

    pub fn input_schema() -> Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }
}

impl ToolHandler for TeamTool {
    fn call<'a>(&'a self, ctx: &'a ToolContext, args: &'a Value) -> ToolFuture<'a> {
        Box::pin(async move {
            expect_no_args(TEAM_TOOL_NAME, args)?;
            self.run(ctx.manager_id).await
        })
    }
}
