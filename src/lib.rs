pub mod agent;
pub mod cli;
pub mod config;
pub mod fpl;
pub mod http;
pub mod llm;
pub mod tools;
pub mod trace;

use agent::PromptTemplate;
use anyhow::Result;
use cli::{AppState, Assistant, CliArgs, answer_once, run_session};
use config::AppConfig;
use fpl::FplClient;
use http::client::HttpClient;
use http::debug::HttpDebugConfig;
use llm::gemini::GeminiProvider;
use std::time::{SystemTime, UNIX_EPOCH};
use tools::{ToolContext, ToolRegistry};
use trace::SessionTrace;

pub async fn run(args: CliArgs) -> Result<()> {
    let config = AppConfig::load_with_path(args.config.as_deref())?;
    let session_id = generate_session_id();
    let trace = SessionTrace::create(&session_id)?;
    let http = HttpClient::new(
        reqwest::Client::new(),
        HttpDebugConfig::from_verbose(args.verbose),
    )
    .with_trace(trace.clone());
    let fpl = FplClient::new(http.clone(), config.fpl_base_url.clone());
    let assistant = GeminiProvider::new(
        http,
        config.gemini_api_key.clone(),
        config.gemini_model.clone(),
        config.gemini_base_url.clone(),
    )
    .ok()
    .map(|provider| Assistant {
        registry: ToolRegistry::fpl(provider.clone(), fpl),
        provider,
    });

    let mut app_state = AppState {
        session_id,
        assistant,
        template: PromptTemplate::default(),
        agent_config: config.agent_config(),
        context: ToolContext {
            manager_id: args.manager_id.or(config.manager_id),
        },
        show_steps: false,
        trace,
    };

    match args.question() {
        Some(question) => answer_once(&app_state, &question).await,
        None => run_session(&mut app_state).await,
    }
}

fn generate_session_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_millis());
    format!("{millis:x}-{:x}", std::process::id())
}
