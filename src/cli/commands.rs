use std::str::FromStr;

use crate::fpl::ManagerId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    Help,
    Manager(Option<ManagerId>),
    Trace,
    Steps(Option<bool>),
    Projected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParseError {
    message: String,
}

impl ParseError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub(crate) fn message(&self) -> &str {
        &self.message
    }
}

pub(crate) const HELP_TEXT: &str = "Available commands:\n  /help                Show this command list\n  /manager [id]        Show or set the FPL manager id used for your team\n  /trace               Show path to the current trace file\n  /steps [on|off]      Show or hide assistant tool steps\n  /projected           Project your team's points for the gameweek\n  exit | quit          Leave the session";

pub(crate) fn parse_command(line: &str) -> Result<Command, ParseError> {
    if !line.starts_with('/') {
        return Err(ParseError::new("not a command"));
    }

    let trimmed = line.trim();
    if trimmed == "/" {
        return Err(ParseError::new("empty command. Try /help"));
    }

    let command_text = &trimmed[1..];
    let mut parts = command_text.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or("").to_ascii_lowercase();
    if name.is_empty() {
        return Err(ParseError::new("empty command. Try /help"));
    }
    let rest = parts.next().map(str::trim).unwrap_or("");

    match name.as_str() {
        "help" => expect_no_args(rest, Command::Help, "usage: /help"),
        "manager" => parse_manager(rest),
        "trace" => expect_no_args(rest, Command::Trace, "usage: /trace"),
        "steps" => parse_steps(rest),
        "projected" => expect_no_args(rest, Command::Projected, "usage: /projected"),
        _ => Err(ParseError::new(format!(
            "unknown command '/{name}'. Try /help"
        ))),
    }
}

pub(crate) fn is_command_line(line: &str) -> bool {
    line.starts_with('/')
}

pub(crate) fn is_exit_line(line: &str) -> bool {
    line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit")
}

fn expect_no_args(rest: &str, command: Command, usage: &str) -> Result<Command, ParseError> {
    if rest.is_empty() {
        Ok(command)
    } else {
        Err(ParseError::new(usage))
    }
}

fn parse_manager(rest: &str) -> Result<Command, ParseError> {
    if rest.is_empty() {
        return Ok(Command::Manager(None));
    }

    ManagerId::from_str(rest)
        .map(|id| Command::Manager(Some(id)))
        .map_err(|_| ParseError::new("usage: /manager [id] (id must be a positive integer)"))
}

fn parse_steps(rest: &str) -> Result<Command, ParseError> {
    if rest.is_empty() {
        return Ok(Command::Steps(None));
    }

    match rest {
        "on" => Ok(Command::Steps(Some(true))),
        "off" => Ok(Command::Steps(Some(false))),
        _ => Err(ParseError::new("usage: /steps [on|off]")),
    }
}
