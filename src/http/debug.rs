use reqwest::Url;
use reqwest::header::HeaderValue;
use serde_json::Value;

const REDACTION: &str = "***REDACTED***";
const SENSITIVE_KEYS: [&str; 10] = [
    "key",
    "apikey",
    "authorization",
    "cookie",
    "set-cookie",
    "password",
    "secret",
    "pl_profile",
    "sessionid",
    "csrftoken",
];
const SENSITIVE_SUFFIXES: [&str; 3] = ["_key", "-key", "token"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpDebugConfig {
    pub enabled: bool,
    pub redact_secrets: bool,
    pub max_body_chars: usize,
}

impl HttpDebugConfig {
    pub fn from_verbose(verbose: bool) -> Self {
        Self {
            enabled: verbose,
            redact_secrets: true,
            max_body_chars: 4_000,
        }
    }

    pub fn disabled() -> Self {
        Self::from_verbose(false)
    }
}

pub fn redact_url(url: &Url, enable_redaction: bool) -> String {
    if !enable_redaction || url.query().is_none() {
        return url.as_str().to_string();
    }

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let value = if is_sensitive_key(&k) {
                REDACTION.to_string()
            } else {
                v.into_owned()
            };
            (k.into_owned(), value)
        })
        .collect();

    let mut redacted = url.clone();
    redacted.set_query(None);
    if !pairs.is_empty() {
        redacted.query_pairs_mut().extend_pairs(pairs);
    }

    redacted.as_str().to_string()
}

pub fn redact_header_value(name: &str, value: &HeaderValue, enable_redaction: bool) -> String {
    if enable_redaction && is_sensitive_key(name) {
        return REDACTION.to_string();
    }

    value
        .to_str()
        .map(ToString::to_string)
        .unwrap_or_else(|_| "<non-utf8>".to_string())
}

/// Bodies that are not JSON are logged as-is.
pub fn redact_text_body(raw: &str, enable_redaction: bool) -> String {
    if !enable_redaction {
        return raw.to_string();
    }

    match serde_json::from_str::<Value>(raw) {
        Ok(mut json) => {
            redact_json_value(&mut json);
            serde_json::to_string(&json).unwrap_or_else(|_| raw.to_string())
        }
        Err(_) => raw.to_string(),
    }
}

pub fn truncate_for_log(input: &str, max_chars: usize) -> String {
    let count = input.chars().count();
    if count <= max_chars {
        return input.to_string();
    }

    let truncated = input.chars().take(max_chars).collect::<String>();
    format!("{truncated}... <truncated {} chars>", count - max_chars)
}

fn redact_json_value(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, item) in map.iter_mut() {
                if is_sensitive_key(key) {
                    *item = Value::String(REDACTION.to_string());
                } else {
                    redact_json_value(item);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact_json_value),
        _ => {}
    }
}

fn is_sensitive_key(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    SENSITIVE_KEYS.contains(&key.as_str())
        || SENSITIVE_SUFFIXES
            .iter()
            .any(|suffix| key.ends_with(suffix))
}
