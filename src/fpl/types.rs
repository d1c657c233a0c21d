use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Reads an explicit `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn tenths_as_millions(tenths: u32) -> String {
    format!("£{:.1}m", f64::from(tenths) / 10.0)
}

/// The gameweek list of `bootstrap-static/`. Everything else in the payload is ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BootstrapEvents {
    #[serde(default, deserialize_with = "null_as_default")]
    pub events: Vec<Event>,
}

/// A gameweek descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Event {
    pub id: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_current: bool,
}

impl BootstrapEvents {
    /// Id of the first event flagged current, if any.
    pub fn current_gameweek(&self) -> Option<u32> {
        self.events
            .iter()
            .find(|event| event.is_current)
            .map(|event| event.id)
    }
}

/// Players, clubs and positions from `bootstrap-static/`. Missing arrays read as empty.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Bootstrap {
    #[serde(default, deserialize_with = "null_as_default")]
    pub elements: Vec<Element>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub teams: Vec<Team>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub element_types: Vec<ElementType>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Element {
    pub id: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub first_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub second_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub web_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub team: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub element_type: u32,
    #[serde(default)]
    pub form: Option<String>,
    #[serde(default)]
    pub now_cost: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Team {
    pub id: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ElementType {
    pub id: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub singular_name_short: String,
}

impl Bootstrap {
    pub fn player_details(&self, element_id: u32) -> PlayerDetails {
        let Some(element) = self.elements.iter().find(|e| e.id == element_id) else {
            return PlayerDetails {
                id: element_id,
                name: format!("Unknown player {element_id}"),
                web_name: None,
                position: "UNK".to_string(),
                team: "UNK".to_string(),
                form: None,
                price: None,
            };
        };

        let team = self
            .teams
            .iter()
            .find(|t| t.id == element.team && !t.name.is_empty())
            .map_or_else(|| "UNK".to_string(), |t| t.name.clone());
        let position = self
            .element_types
            .iter()
            .find(|p| p.id == element.element_type && !p.singular_name_short.is_empty())
            .map_or_else(|| "UNK".to_string(), |p| p.singular_name_short.clone());

        PlayerDetails {
            id: element.id,
            name: format!("{} {}", element.first_name, element.second_name)
                .trim()
                .to_string(),
            web_name: Some(element.web_name.clone()).filter(|name| !name.is_empty()),
            position,
            team,
            form: element.form.clone(),
            price: element.now_cost.map(tenths_as_millions),
        }
    }
}

/// A manager's picks for one gameweek, reduced to the three fields the assistant sees.
/// Everything else in the picks payload is dropped on deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSummary {
    #[serde(default)]
    pub entry_history: Value,
    #[serde(default)]
    pub picks: Value,
    #[serde(default)]
    pub active_chip: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerDetails {
    pub id: u32,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_name: Option<String>,
    pub position: String,
    pub team: String,
    pub form: Option<String>,
    pub price: Option<String>,
}

/// `entry/{id}/`: a manager's profile and season summary.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ManagerEntry {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub player_first_name: Option<String>,
    #[serde(default)]
    pub player_last_name: Option<String>,
    #[serde(default)]
    pub current_event: Option<u32>,
    #[serde(default)]
    pub summary_event_points: Option<i64>,
    #[serde(default)]
    pub summary_overall_points: Option<i64>,
    #[serde(default)]
    pub summary_overall_rank: Option<u64>,
    #[serde(default)]
    pub last_deadline_bank: Option<u32>,
    #[serde(default)]
    pub last_deadline_value: Option<u32>,
    #[serde(default)]
    pub event_transfers_left: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub leagues: Leagues,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Leagues {
    #[serde(default, deserialize_with = "null_as_default")]
    pub classic: Vec<ClassicLeague>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClassicLeague {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub entry_rank: Option<u64>,
}

/// What the assistant sees of a manager entry. Money is rendered as `£X.Ym`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManagerSummary {
    pub team_name: Option<String>,
    pub manager_name: Option<String>,
    pub current_gameweek: Option<u32>,
    pub gameweek_points: Option<i64>,
    pub overall_points: Option<i64>,
    pub overall_rank: Option<u64>,
    pub bank: Option<String>,
    pub team_value: Option<String>,
    pub free_transfers: Option<u32>,
    pub classic_leagues: Vec<LeagueRank>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeagueRank {
    pub name: String,
    pub rank: Option<u64>,
}

impl ManagerEntry {
    pub fn summary(&self) -> ManagerSummary {
        let manager_name = [&self.player_first_name, &self.player_last_name]
            .into_iter()
            .flatten()
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        ManagerSummary {
            team_name: self.name.clone(),
            manager_name: Some(manager_name).filter(|name| !name.is_empty()),
            current_gameweek: self.current_event,
            gameweek_points: self.summary_event_points,
            overall_points: self.summary_overall_points,
            overall_rank: self.summary_overall_rank,
            bank: self.last_deadline_bank.map(tenths_as_millions),
            team_value: self.last_deadline_value.map(tenths_as_millions),
            free_transfers: self.event_transfers_left,
            classic_leagues: self
                .leagues
                .classic
                .iter()
                .map(|league| LeagueRank {
                    name: league.name.clone(),
                    rank: league.entry_rank,
                })
                .collect(),
        }
    }
}

/// `entry/{id}/history/`: this season's gameweeks and the chips played.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManagerHistory {
    #[serde(
        default,
        deserialize_with = "null_as_default",
        rename(serialize = "gameweeks")
    )]
    pub current: Vec<GameweekResult>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub chips: Vec<ChipPlay>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameweekResult {
    #[serde(rename(serialize = "gameweek"))]
    pub event: u32,
    #[serde(default)]
    pub points: Option<i64>,
    #[serde(default)]
    pub total_points: Option<i64>,
    #[serde(default)]
    pub overall_rank: Option<u64>,
    #[serde(default)]
    pub points_on_bench: Option<i64>,
    #[serde(default)]
    pub event_transfers: Option<u32>,
    #[serde(default)]
    pub event_transfers_cost: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChipPlay {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, rename(serialize = "gameweek"))]
    pub event: Option<u32>,
}
