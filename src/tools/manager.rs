use serde_json::{Value, json};

use super::team::NO_MANAGER_MESSAGE;
use super::{
    ToolContext, ToolError, ToolFuture, ToolHandler, ToolResult, error_observation,
    expect_no_args,
};
use crate::fpl::format::to_spaced_json;
use crate::fpl::{FplClient, FplError, ManagerId};

pub const MANAGER_SUMMARY_TOOL_NAME: &str = "ManagerSummary";

pub const MANAGER_SUMMARY_TOOL_DESCRIPTION: &str = "Fetches the user's FPL manager profile: team and manager name, current gameweek, gameweek and overall points, overall rank, money in the bank, team value, free transfers and rank in each classic mini-league. Takes no arguments: the manager is known from the session.";

pub const GAMEWEEK_HISTORY_TOOL_NAME: &str = "GameweekHistory";

pub const GAMEWEEK_HISTORY_TOOL_DESCRIPTION: &str = "Fetches the user's results for every gameweek of the current season (points, running total, overall rank, bench points, transfers and their cost) and the chips played so far. Takes no arguments: the manager is known from the session.";

fn fetch_failure(manager_id: ManagerId, err: FplError) -> ToolResult<String> {
    match err {
        FplError::HttpStatus { status: 404, .. } => {
            error_observation(format!("FPL manager {manager_id} was not found."))
        }
        err if err.is_transport() => error_observation(format!(
            "Error fetching manager data for manager {manager_id}: {err}"
        )),
        err => Err(ToolError::Fpl(err)),
    }
}

fn no_args_schema() -> Value {
    json!({
        "type": "object",
        "properties": {}
    })
}

#[derive(Debug, Clone)]
pub struct ManagerSummaryTool {
    fpl: FplClient,
}

impl ManagerSummaryTool {
    pub fn new(fpl: FplClient) -> Self {
        Self { fpl }
    }

    pub async fn run(&self, manager_id: Option<ManagerId>) -> ToolResult<String> {
        let Some(manager_id) = manager_id else {
            return error_observation(NO_MANAGER_MESSAGE);
        };

        match self.fpl.entry(manager_id).await {
            Ok(entry) => Ok(to_spaced_json(&entry.summary())?),
            Err(err) => fetch_failure(manager_id, err),
        }
    }

    pub fn input_schema() -> Value {
        no_args_schema()
    }
}

impl ToolHandler for ManagerSummaryTool {
    fn call<'a>(&'a self, ctx: &'a ToolContext, args: &'a Value) -> ToolFuture<'a> {
        Box::pin(async move {
            expect_no_args(MANAGER_SUMMARY_TOOL_NAME, args)?;
            self.run(ctx.manager_id).await
        })
    }
}

#[derive(Debug, Clone)]
pub struct GameweekHistoryTool {
    fpl: FplClient,
}

impl GameweekHistoryTool {
    pub fn new(fpl: FplClient) -> Self {
        Self { fpl }
    }

    pub async fn run(&self, manager_id: Option<ManagerId>) -> ToolResult<String> {
        let Some(manager_id) = manager_id else {
            return error_observation(NO_MANAGER_MESSAGE);
        };

        match self.fpl.history(manager_id).await {
            Ok(history) => Ok(to_spaced_json(&history)?),
            Err(err) => fetch_failure(manager_id, err),
        }
    }

    pub fn input_schema() -> Value {
        no_args_schema()
    }
}

impl ToolHandler for GameweekHistoryTool {
    fn call<'a>(&'a self, ctx: &'a ToolContext, args: &'a Value) -> ToolFuture<'a> {
        Box::pin(async move {
            expect_no_args(GAMEWEEK_HISTORY_TOOL_NAME, args)?;
            self.run(ctx.manager_id).await
        })
    }
}

#[cfg(test)]
mod tests {
    use reqwest::Client;
    use serde_json::{Value, json};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::{GameweekHistoryTool, ManagerSummaryTool};
    use crate::fpl::{FplClient, ManagerId};
    use crate::http::client::HttpClient;
    use crate::http::debug::HttpDebugConfig;
    use crate::tools::{ToolContext, ToolError, ToolHandler};

    const MANAGER: ManagerId = ManagerId(1234567);

    fn client_for(server: &MockServer) -> FplClient {
        FplClient::new(
            HttpClient::new(Client::new(), HttpDebugConfig::disabled()),
            format!("{}/api", server.uri()),
        )
    }

    fn parse(observation: &str) -> Value {
        serde_json::from_str(observation).expect("observation is json")
    }

    #[tokio::test]
    async fn summary_reports_points_money_and_leagues() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/entry/1234567/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 1234567,
                "name": "Klopp Til You Drop",
                "player_first_name": "Ana",
                "player_last_name": "Lima",
                "current_event": 6,
                "summary_event_points": 60,
                "summary_overall_points": 372,
                "summary_overall_rank": 81234,
                "last_deadline_bank": 3,
                "last_deadline_value": 1004,
                "leagues": {"classic": [{"name": "Office League", "entry_rank": 2}]}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let out = ManagerSummaryTool::new(client_for(&server))
            .call(&ToolContext::for_manager(MANAGER), &json!({}))
            .await
            .expect("observation");

        assert!(out.starts_with(r#"{"team_name": "Klopp Til You Drop", "manager_name": "Ana Lima""#));
        let value = parse(&out);
        assert_eq!(value["gameweek_points"], json!(60));
        assert_eq!(value["overall_points"], json!(372));
        assert_eq!(value["bank"], json!("£0.3m"));
        assert_eq!(value["team_value"], json!("£100.4m"));
        assert_eq!(
            value["classic_leagues"],
            json!([{"name": "Office League", "rank": 2}])
        );
    }

    #[tokio::test]
    async fn unknown_manager_is_reported_as_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/entry/1234567/"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Not found."})))
            .expect(1)
            .mount(&server)
            .await;

        let out = ManagerSummaryTool::new(client_for(&server))
            .run(Some(MANAGER))
            .await
            .expect("observation");

        assert_eq!(out, r#"{"error": "FPL manager 1234567 was not found."}"#);
    }

    #[tokio::test]
    async fn summary_server_error_names_manager() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let out = ManagerSummaryTool::new(client_for(&server))
            .run(Some(MANAGER))
            .await
            .expect("observation");

        let message = parse(&out)["error"].as_str().expect("error").to_string();
        assert!(
            message.starts_with("Error fetching manager data for manager 1234567: HTTP 503"),
            "message: {message}"
        );
    }

    #[tokio::test]
    async fn missing_manager_skips_requests() {
        let server = MockServer::start().await;

        let summary = ManagerSummaryTool::new(client_for(&server))
            .call(&ToolContext::default(), &Value::Null)
            .await
            .expect("observation");
        let history = GameweekHistoryTool::new(client_for(&server))
            .call(&ToolContext::default(), &Value::Null)
            .await
            .expect("observation");

        for out in [summary, history] {
            assert_eq!(
                out,
                r#"{"error": "No FPL manager id is configured for this session."}"#
            );
        }
        assert!(server.received_requests().await.expect("recorded").is_empty());
    }

    #[tokio::test]
    async fn history_lists_gameweeks_and_chips() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/entry/1234567/history/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "current": [
                    {"event": 1, "points": 71, "total_points": 71, "overall_rank": 512000,
                     "points_on_bench": 4, "event_transfers": 0, "event_transfers_cost": 0},
                    {"event": 2, "points": 48, "total_points": 119, "overall_rank": 901000,
                     "points_on_bench": 0, "event_transfers": 2, "event_transfers_cost": 4}
                ],
                "past": [],
                "chips": [{"name": "wildcard", "time": "2025-08-29T10:00:00Z", "event": 2}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let out = GameweekHistoryTool::new(client_for(&server))
            .call(&ToolContext::for_manager(MANAGER), &json!({}))
            .await
            .expect("observation");

        assert!(out.starts_with(r#"{"gameweeks": [{"gameweek": 1, "points": 71, "total_points": 71"#));
        let value = parse(&out);
        assert_eq!(value["gameweeks"][1]["event_transfers_cost"], json!(4));
        assert_eq!(value["chips"], json!([{"name": "wildcard", "gameweek": 2}]));
    }

    #[tokio::test]
    async fn malformed_history_propagates_as_tool_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/entry/1234567/history/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let err = GameweekHistoryTool::new(client_for(&server))
            .run(Some(MANAGER))
            .await
            .expect_err("parse failures are not swallowed");

        assert!(matches!(err, ToolError::Fpl(_)));
    }

    #[tokio::test]
    async fn arguments_are_rejected() {
        let server = MockServer::start().await;

        let err = GameweekHistoryTool::new(client_for(&server))
            .call(&ToolContext::for_manager(MANAGER), &json!({"gameweek": 3}))
            .await
            .expect_err("no arguments accepted");

        assert_eq!(
            err,
            ToolError::InvalidArgs("GameweekHistory does not accept arguments".to_string())
        );
    }
}
