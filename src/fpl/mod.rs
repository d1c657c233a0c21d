pub mod client;
pub mod format;
pub mod types;

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

pub use client::FplClient;

pub const DEFAULT_FPL_BASE_URL: &str = "https://fantasy.premierleague.com/api";

/// A manager's fantasy team entry id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ManagerId(pub u64);

impl Display for ManagerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ManagerId {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.trim().parse::<u64>() {
            Ok(0) | Err(_) => Err(format!(
                "invalid manager id '{value}', expected a positive integer"
            )),
            Ok(id) => Ok(Self(id)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FplError {
    Transport(String),
    HttpStatus { status: u16, url: String },
    Parse(String),
}

impl FplError {
    /// Connection failures and non-2xx statuses. Parse failures are not transport errors.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::HttpStatus { .. })
    }
}

impl Display for FplError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(msg) => write!(f, "{msg}"),
            Self::HttpStatus { status, url } => {
                write!(f, "HTTP {status} error for url: {url}")
            }
            Self::Parse(msg) => write!(f, "FPL response parse error: {msg}"),
        }
    }
}

impl Error for FplError {}

pub type FplResult<T> = std::result::Result<T, FplError>;
