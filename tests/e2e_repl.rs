#![cfg(unix)]

use expectrl::{Eof, Error as ExpectError, Regex, Session};
use serial_test::serial;
use std::fs;
use std::path::Path;
use std::process::Command;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method, path as path_matcher};
use wiremock::{Mock, MockServer, ResponseTemplate};

const EXPECT_TIMEOUT: Duration = Duration::from_secs(4);
const EXPECT_RETRIES: usize = 3;

#[test]
#[serial]
fn session_starts_with_prompt_and_exits() {
    let homes = Homes::new();
    let mut session = spawn_session(&homes, None, |command| {
        command.env_remove("GEMINI_API_KEY");
    });

    expect_text(&mut session, "No manager id set.");
    expect_text(&mut session, "fpl> ");
    submit_line(&mut session, "exit");
    session.expect(Eof).expect("process exits");
}

#[test]
#[serial]
fn session_without_key_prints_guidance_and_stays_interactive() {
    let homes = Homes::new();
    let mut session = spawn_session(&homes, None, |command| {
        command.env_remove("GEMINI_API_KEY");
    });

    expect_text(&mut session, "fpl> ");
    submit_line(&mut session, "who should I captain?");
    session
        .expect(Regex(
            "Assistant unavailable: missing GEMINI_API_KEY\\. Configure it in your shell or \\.env file",
        ))
        .expect("missing key guidance");
    expect_text(&mut session, "fpl> ");
    submit_line(&mut session, "quit");
    session.expect(Eof).expect("process exits");
}

#[test]
#[serial]
fn session_commands_update_manager_and_steps() {
    let homes = Homes::new();
    let mut session = spawn_session(&homes, None, |command| {
        command.env_remove("GEMINI_API_KEY");
    });

    expect_text(&mut session, "fpl> ");
    submit_line(&mut session, "/manager 1234567");
    expect_text(&mut session, "Manager id set to 1234567");
    submit_line(&mut session, "/manager");
    expect_text(&mut session, "Manager id: 1234567");
    submit_line(&mut session, "/steps on");
    expect_text(&mut session, "Tool steps on");
    submit_line(&mut session, "/trace");
    expect_text(&mut session, "Trace file: ");
    submit_line(&mut session, "/manager zero");
    expect_text(&mut session, "usage: /manager [id]");
    submit_line(&mut session, "quit");
    session.expect(Eof).expect("process exits");
}

#[test]
#[serial]
fn session_recovers_after_provider_failure() {
    let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
    let server = rt.block_on(MockServer::start());
    rt.block_on(async {
        Mock::given(method("POST"))
            .and(path_matcher("/v1beta/models/gemini-test:generateContent"))
            .and(body_string_contains("first question"))
            .respond_with(ResponseTemplate::new(500).set_body_string("provider down"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path_matcher("/v1beta/models/gemini-test:generateContent"))
            .and(body_string_contains("second question"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"candidates": [{"finishReason":"STOP","content":{"parts":[{"text":"Recovered answer"}]}}]}"#,
                "application/json",
            ))
            .expect(1)
            .mount(&server)
            .await;
    });

    let homes = Homes::new();
    let mut session = spawn_session(&homes, Some(&server.uri()), |_| {});

    expect_text(&mut session, "fpl> ");
    submit_line(&mut session, "first question");
    expect_text(&mut session, "Assistant request failed while reasoning");
    expect_text(&mut session, "fpl> ");
    submit_line(&mut session, "second question");
    expect_text(&mut session, "Recovered answer");
    submit_line(&mut session, "quit");
    let _ = session.expect(Eof);

    let trace = read_trace_file(homes.state_home.path());
    assert!(trace.contains("first question"), "trace content:\n{trace}");
    assert!(trace.contains("Recovered answer"), "trace content:\n{trace}");
}

struct Homes {
    config_home: TempDir,
    state_home: TempDir,
}

impl Homes {
    fn new() -> Self {
        Self {
            config_home: tempfile::tempdir().expect("create XDG_CONFIG_HOME tempdir"),
            state_home: tempfile::tempdir().expect("create XDG_STATE_HOME tempdir"),
        }
    }
}

fn spawn_session(
    homes: &Homes,
    gemini_base_url: Option<&str>,
    configure: impl FnOnce(&mut Command),
) -> Session {
    let mut command = Command::new(binary_path());
    command
        .current_dir(homes.config_home.path())
        .env("XDG_CONFIG_HOME", homes.config_home.path())
        .env("XDG_STATE_HOME", homes.state_home.path())
        .env("GEMINI_API_KEY", "test-key")
        .env("GEMINI_MODEL", "gemini-test")
        .env("GEMINI_BASE_URL", gemini_base_url.unwrap_or("http://127.0.0.1:9"))
        .env("FPL_BASE_URL", "http://127.0.0.1:9/api")
        .env_remove("GOOGLE_API_KEY")
        .env_remove("FPL_MANAGER_ID");
    configure(&mut command);

    let mut session = Session::spawn(command).expect("spawn fplchat in PTY");
    session.set_expect_timeout(Some(EXPECT_TIMEOUT));
    session
}

fn binary_path() -> String {
    std::env::var("CARGO_BIN_EXE_fplchat_ai")
        .unwrap_or_else(|_| "target/debug/fplchat_ai".to_string())
}

fn submit_line(session: &mut Session, line: &str) {
    session.send(line).expect("send line text");
    session.send([b'\r']).expect("send Enter");
}

fn expect_text(session: &mut Session, text: &str) {
    for attempt in 1..=EXPECT_RETRIES {
        match session.expect(text) {
            Ok(_) => return,
            Err(ExpectError::ExpectTimeout) if attempt < EXPECT_RETRIES => continue,
            Err(err) => panic!(
                "failed to match text {:?} on attempt {}: {}",
                text, attempt, err
            ),
        }
    }

    panic!("unreachable: retries exhausted without returning");
}

fn read_trace_file(state_home: &Path) -> String {
    let trace_dir = state_home.join("fplchat").join("traces");
    let entries = fs::read_dir(&trace_dir)
        .unwrap_or_else(|err| panic!("failed to read {}: {err}", trace_dir.display()))
        .collect::<Result<Vec<_>, _>>()
        .unwrap_or_else(|err| panic!("failed to iterate {}: {err}", trace_dir.display()));
    assert_eq!(entries.len(), 1, "expected exactly one trace file");
    let path = entries[0].path();
    fs::read_to_string(&path)
        .unwrap_or_else(|err| panic!("failed to read {}: {err}", path.display()))
}
