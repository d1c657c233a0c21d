mod args;
mod commands;
mod session;

pub use args::CliArgs;
pub use session::{
    AppState, Assistant, MISSING_KEY_MESSAGE, PROMPT, answer_once, ask, run_session,
    run_session_with,
};
