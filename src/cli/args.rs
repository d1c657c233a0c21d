use clap::Parser;
use std::path::PathBuf;

use crate::fpl::ManagerId;

#[derive(Debug, Parser, Clone, PartialEq, Eq)]
#[command(name = "fplchat")]
#[command(
    about = "Fantasy Premier League assistant backed by Gemini",
    long_about = "Fantasy Premier League assistant backed by Gemini\n\nPass a question to get a single answer, or start without one for an interactive session.\n\nConfig file loading:\n  - --config <path> (explicit file, overrides default path discovery)\n  - Default probe path when --config is not provided:\n    1. $XDG_CONFIG_HOME/fplchat/config.toml\n    2. ~/.config/fplchat/config.toml"
)]
pub struct CliArgs {
    /// Load config from this file path instead of the default discovery path.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// FPL manager (entry) id whose team the assistant reads.
    #[arg(long, value_name = "ID")]
    pub manager_id: Option<ManagerId>,

    /// Print redacted HTTP requests and responses to stderr.
    #[arg(short, long)]
    pub verbose: bool,

    /// Ask one question and exit.
    #[arg(value_name = "QUESTION", trailing_var_arg = true)]
    pub question: Vec<String>,
}

impl CliArgs {
    pub fn question(&self) -> Option<String> {
        let question = self.question.join(" ");
        let question = question.trim();
        (!question.is_empty()).then(|| question.to_string())
    }
}
