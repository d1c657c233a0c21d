use anyhow::{Context, Result, anyhow};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::fmt::Write as _;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

const KIND_WIDTH: usize = 11;

/// What a trace entry records. The label fills the fixed-width kind column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceKind {
    TurnIn,
    TurnOut,
    ToolCall,
    ToolResult,
    HttpRequest,
    HttpResponse,
    HttpError,
}

impl TraceKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::TurnIn => "turn.in",
            Self::TurnOut => "turn.out",
            Self::ToolCall => "tool.call",
            Self::ToolResult => "tool.result",
            Self::HttpRequest => "http.req",
            Self::HttpResponse => "http.resp",
            Self::HttpError => "http.err",
        }
    }
}

/// Owner-only log of one session: questions, answers, tool traffic and the raw HTTP
/// exchanges behind them. Clones share the same file.
#[derive(Clone)]
pub struct SessionTrace {
    shared: Arc<Shared>,
}

struct Shared {
    path: PathBuf,
    sink: Mutex<Sink>,
}

struct Sink {
    writer: BufWriter<File>,
    warned: bool,
}

impl SessionTrace {
    /// Opens `fplchat-<session_id>.log` in the user's state directory.
    pub fn create(session_id: &str) -> Result<Self> {
        let dir = trace_dir(dirs::state_dir(), dirs::home_dir()).ok_or_else(|| {
            anyhow!("Failed to resolve trace path: no state or home directory is available")
        })?;
        Self::open(&dir, session_id)
    }

    #[cfg(test)]
    pub fn create_in_temp_dir(session_id: &str, dir: &Path) -> Result<Self> {
        Self::open(dir, session_id)
    }

    fn open(dir: &Path, session_id: &str) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create trace directory {}", dir.display()))?;

        let path = dir.join(format!("fplchat-{session_id}.log"));
        let file = open_private(&path)
            .with_context(|| format!("Failed to create trace file {}", path.display()))?;

        Ok(Self {
            shared: Arc::new(Shared {
                path,
                sink: Mutex::new(Sink {
                    writer: BufWriter::new(file),
                    warned: false,
                }),
            }),
        })
    }

    pub fn file_path(&self) -> &Path {
        &self.shared.path
    }

    pub fn log_turn_input(&self, question: &str) {
        self.record(TraceKind::TurnIn, question);
    }

    pub fn log_turn_output(&self, answer: &str) {
        self.record(TraceKind::TurnOut, answer);
    }

    pub fn log_tool_call(&self, name: &str, args_json: &str) {
        self.record(TraceKind::ToolCall, &format!("{name} {args_json}"));
    }

    pub fn log_tool_result(&self, name: &str, response_json: &str) {
        self.record(TraceKind::ToolResult, &format!("{name} {response_json}"));
    }

    /// Logged unredacted: the file is private to the user.
    pub fn log_http_request(&self, method: &str, url: &str, headers: &HeaderMap, body: &str) {
        let mut text = format!("{method} {url}");
        push_headers(&mut text, headers);
        if !body.is_empty() {
            text.push('\n');
            text.push_str(body);
        }
        self.record(TraceKind::HttpRequest, &text);
    }

    pub fn log_http_response(&self, status: u16, headers: &HeaderMap, body: &str) {
        let mut text = format!("HTTP {status}");
        push_headers(&mut text, headers);
        text.push('\n');
        text.push_str(if body.is_empty() { "<empty body>" } else { body });
        self.record(TraceKind::HttpResponse, &text);
    }

    pub fn log_http_error(&self, message: &str) {
        self.record(TraceKind::HttpError, message);
    }

    /// Writes every line of `text` under one timestamp, in a single append.
    pub fn record(&self, kind: TraceKind, text: &str) {
        let entry = format_entry(&timestamp(), kind, text);

        let mut sink = match self.shared.sink.lock() {
            Ok(sink) => sink,
            Err(poisoned) => poisoned.into_inner(),
        };
        let written = sink
            .writer
            .write_all(entry.as_bytes())
            .and_then(|()| sink.writer.flush());
        if let Err(err) = written {
            if !sink.warned {
                sink.warned = true;
                eprintln!(
                    "fplchat trace warning: cannot write {}: {err}",
                    self.shared.path.display()
                );
            }
        }
    }
}

fn format_entry(stamp: &str, kind: TraceKind, text: &str) -> String {
    let mut entry = String::with_capacity(text.len() + 48);
    let mut lines = text.lines().peekable();
    if lines.peek().is_none() {
        let _ = writeln!(entry, "[{stamp}] [{:<KIND_WIDTH$}] <empty>", kind.label());
    }
    for line in lines {
        let _ = writeln!(entry, "[{stamp}] [{:<KIND_WIDTH$}] {line}", kind.label());
    }
    entry
}

fn push_headers(text: &mut String, headers: &HeaderMap) {
    for (name, value) in headers {
        text.push('\n');
        text.push_str(&header_line(name, value));
    }
}

fn header_line(name: &HeaderName, value: &HeaderValue) -> String {
    format!(
        "{}: {}",
        name.as_str(),
        value.to_str().unwrap_or("<non-utf8>")
    )
}

fn timestamp() -> String {
    let now = OffsetDateTime::now_utc();
    now.format(&Rfc3339)
        .unwrap_or_else(|_| now.unix_timestamp().to_string())
}

#[cfg(unix)]
fn open_private(path: &Path) -> std::io::Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// `<state dir>/fplchat/traces`, falling back to `~/.local/state` where the platform
/// has no state directory.
fn trace_dir(state_dir: Option<PathBuf>, home_dir: Option<PathBuf>) -> Option<PathBuf> {
    state_dir
        .or_else(|| home_dir.map(|home| home.join(".local").join("state")))
        .map(|base| base.join("fplchat").join("traces"))
}
