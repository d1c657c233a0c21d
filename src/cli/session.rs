use anyhow::Result;
use std::io::{self, BufRead, Write};

use super::commands::{Command, HELP_TEXT, is_command_line, is_exit_line, parse_command};
use crate::agent::{AgentAnswer, AgentConfig, AgentProgressEvent, PromptTemplate, run_turn};
use crate::llm::gemini::GeminiProvider;
use crate::llm::provider::LlmProvider;
use crate::tools::{ToolContext, ToolRegistry};
use crate::trace::SessionTrace;

pub const PROMPT: &str = "fpl> ";

/// Fixed question behind `/projected`.
pub const PROJECTED_POINTS_QUESTION: &str = "Project my team's points for the current gameweek. Use my current team, the details of its players and the latest news on form, fixtures and injuries. Start with the projected score on its own line in exactly this format: **Projected Points: NUMBER**. After that line add one brief, witty sentence of analysis.";

const PROJECTED_NEEDS_MANAGER: &str =
    "Set your manager id with /manager <id> before asking for projected points.";

pub const MISSING_KEY_MESSAGE: &str = "Assistant unavailable: missing GEMINI_API_KEY. Configure it in your shell or .env file (example: GEMINI_API_KEY=your_key).";

pub struct Assistant<P = GeminiProvider> {
    pub provider: P,
    pub registry: ToolRegistry,
}

pub struct AppState<P = GeminiProvider> {
    pub session_id: String,
    pub assistant: Option<Assistant<P>>,
    pub template: PromptTemplate,
    pub agent_config: AgentConfig,
    pub context: ToolContext,
    pub show_steps: bool,
    pub trace: SessionTrace,
}

/// Answers `question` on stdout and returns.
pub async fn answer_once<P: LlmProvider>(state: &AppState<P>, question: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    ask(state, question, &mut stdout).await?;
    Ok(())
}

/// Interactive `fpl> ` loop on stdin until `exit`, `quit` or EOF.
pub async fn run_session<P: LlmProvider>(state: &mut AppState<P>) -> Result<()> {
    let stdin = io::stdin().lock();
    let mut stdout = io::stdout().lock();
    run_session_with(state, stdin, &mut stdout).await
}

pub async fn run_session_with<P: LlmProvider, R: BufRead, W: Write>(
    state: &mut AppState<P>,
    mut input: R,
    out: &mut W,
) -> Result<()> {
    writeln!(out, "FPL assistant ready. Type /help for commands, exit to leave.")?;
    write_manager_status(state, out)?;

    let mut buf = String::new();
    loop {
        write!(out, "{PROMPT}")?;
        out.flush()?;

        buf.clear();
        if input.read_line(&mut buf)? == 0 {
            writeln!(out)?;
            break;
        }

        let line = buf.trim();
        if is_exit_line(line) {
            break;
        }
        if line.is_empty() {
            continue;
        }

        if is_command_line(line) {
            match parse_command(line) {
                Ok(command) => handle_command(state, command, out).await?,
                Err(err) => writeln!(out, "{}", err.message())?,
            }
            continue;
        }

        ask(state, line, out).await?;
    }

    out.flush()?;
    Ok(())
}

/// Runs one assistant turn and prints its answer. `None` when no assistant is configured.
pub async fn ask<P: LlmProvider, W: Write>(
    state: &AppState<P>,
    question: &str,
    out: &mut W,
) -> Result<Option<AgentAnswer>> {
    let Some(assistant) = &state.assistant else {
        writeln!(out, "{MISSING_KEY_MESSAGE}")?;
        return Ok(None);
    };

    state.trace.log_turn_input(question);

    let show_steps = state.show_steps;
    let trace = &state.trace;
    let mut step_write_err: Option<io::Error> = None;
    let mut on_event = |event: AgentProgressEvent| {
        match &event {
            AgentProgressEvent::ToolRequest {
                name, args_json, ..
            } => trace.log_tool_call(name, &args_json.to_string()),
            AgentProgressEvent::ToolResult {
                name,
                response_json,
                ..
            } => trace.log_tool_result(name, &response_json.to_string()),
            _ => {}
        }
        if show_steps && step_write_err.is_none() {
            if let Some(line) = describe_event(&event) {
                if let Err(err) = writeln!(out, "{line}") {
                    step_write_err = Some(err);
                }
            }
        }
    };

    let answer = run_turn(
        &assistant.provider,
        &assistant.registry,
        &state.context,
        &state.template,
        question,
        &state.agent_config,
        &mut on_event,
    )
    .await;

    state.trace.log_turn_output(&answer.text);
    if let Some(err) = step_write_err {
        return Err(err.into());
    }
    writeln!(out, "{}", answer.text)?;
    Ok(Some(answer))
}

async fn handle_command<P: LlmProvider, W: Write>(
    state: &mut AppState<P>,
    command: Command,
    out: &mut W,
) -> Result<()> {
    match command {
        Command::Help => writeln!(out, "{HELP_TEXT}")?,
        Command::Manager(None) => write_manager_status(state, out)?,
        Command::Manager(Some(id)) => {
            state.context = ToolContext::for_manager(id);
            writeln!(out, "Manager id set to {id}")?;
        }
        Command::Trace => writeln!(out, "Trace file: {}", state.trace.file_path().display())?,
        Command::Steps(None) => writeln!(
            out,
            "Tool steps are {}",
            if state.show_steps { "on" } else { "off" }
        )?,
        Command::Steps(Some(show)) => {
            state.show_steps = show;
            writeln!(out, "Tool steps {}", if show { "on" } else { "off" })?;
        }
        Command::Projected => {
            if state.context.manager_id.is_some() {
                ask(state, PROJECTED_POINTS_QUESTION, out).await?;
            } else {
                writeln!(out, "{PROJECTED_NEEDS_MANAGER}")?;
            }
        }
    }
    Ok(())
}

fn write_manager_status<P, W: Write>(state: &AppState<P>, out: &mut W) -> Result<()> {
    match state.context.manager_id {
        Some(id) => writeln!(out, "Manager id: {id}")?,
        None => writeln!(
            out,
            "No manager id set. Use /manager <id> so the assistant can read your team."
        )?,
    }
    Ok(())
}

fn describe_event(event: &AgentProgressEvent) -> Option<String> {
    match event {
        AgentProgressEvent::ToolRequest {
            name, args_json, ..
        } => Some(format!("-> {name} {args_json}")),
        AgentProgressEvent::ToolResult {
            name,
            response_json,
            ..
        } => {
            if response_json["ok"].as_bool() == Some(true) {
                Some(format!("<- {name}: ok"))
            } else {
                let code = response_json["error"]["code"].as_str().unwrap_or("error");
                let message = response_json["error"]["message"].as_str().unwrap_or("");
                Some(format!("<- {name}: {code}: {message}"))
            }
        }
        AgentProgressEvent::StepStarted { .. } | AgentProgressEvent::ModelResponse { .. } => None,
    }
}
