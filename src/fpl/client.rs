use serde::de::DeserializeOwned;

use super::types::{Bootstrap, BootstrapEvents, ManagerEntry, ManagerHistory, TeamSummary};
use super::{FplError, FplResult, ManagerId};
use crate::http::client::HttpClient;

/// Read-only access to the public FPL API. Nothing is cached: every call is a fresh GET.
#[derive(Debug, Clone)]
pub struct FplClient {
    http: HttpClient,
    base_url: String,
}

impl FplClient {
    pub fn new(http: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn bootstrap_url(&self) -> String {
        format!("{}/bootstrap-static/", self.base_url)
    }

    pub fn picks_url(&self, manager_id: ManagerId, gameweek: u32) -> String {
        format!(
            "{}/entry/{manager_id}/event/{gameweek}/picks/",
            self.base_url
        )
    }

    pub fn entry_url(&self, manager_id: ManagerId) -> String {
        format!("{}/entry/{manager_id}/", self.base_url)
    }

    pub fn history_url(&self, manager_id: ManagerId) -> String {
        format!("{}/entry/{manager_id}/history/", self.base_url)
    }

    /// Only the gameweek list of `bootstrap-static/`.
    pub async fn events(&self) -> FplResult<BootstrapEvents> {
        self.get(&self.bootstrap_url()).await
    }

    pub async fn bootstrap(&self) -> FplResult<Bootstrap> {
        self.get(&self.bootstrap_url()).await
    }

    pub async fn entry(&self, manager_id: ManagerId) -> FplResult<ManagerEntry> {
        self.get(&self.entry_url(manager_id)).await
    }

    pub async fn history(&self, manager_id: ManagerId) -> FplResult<ManagerHistory> {
        self.get(&self.history_url(manager_id)).await
    }

    pub async fn picks(&self, manager_id: ManagerId, gameweek: u32) -> FplResult<TeamSummary> {
        self.get(&self.picks_url(manager_id, gameweek)).await
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> FplResult<T> {
        let resp = self
            .http
            .get_json(url)
            .await
            .map_err(|err| FplError::Transport(err.to_string()))?;

        if !resp.is_success() {
            return Err(FplError::HttpStatus {
                status: resp.status,
                url: resp.url,
            });
        }

        serde_json::from_str(&resp.body).map_err(|err| FplError::Parse(err.to_string()))
    }
}
