//! Chat model boundary and the Ollama client.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use kgqa_store::RetryPolicy;

use crate::error::{LlmError, QaError};

pub const OLLAMA_HOST_ENV: &str = "OLLAMA_HOST";
pub const KGQA_LLM_MODEL_ENV: &str = "KGQA_LLM_MODEL";
pub const KGQA_LLM_TIMEOUT_SECS_ENV: &str = "KGQA_LLM_TIMEOUT_SECS";

pub const DEFAULT_OLLAMA_HOST: &str = "http://127.0.0.1:11434";
pub const DEFAULT_MODEL: &str = "llama3.2";
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 120;

/// One chat turn: optional system prompt, user prompt, and whether the
/// model should be constrained to JSON output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub system: Option<String>,
    pub user: String,
    pub json: bool,
}

impl ChatRequest {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            system: None,
            user: text.into(),
            json: false,
        }
    }

    pub fn with_system(mut self, text: impl Into<String>) -> Self {
        self.system = Some(text.into());
        self
    }

    pub fn expect_json(mut self) -> Self {
        self.json = true;
        self
    }
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send one request and return the assistant's text.
    async fn chat(&self, request: &ChatRequest) -> Result<String, LlmError>;

    fn describe(&self) -> String;
}

/// Replays canned responses in order, wrapping around. Records every request.
pub struct ScriptedChat {
    responses: Vec<Result<String, String>>,
    next: AtomicUsize,
    seen: parking_lot::Mutex<Vec<ChatRequest>>,
}

impl ScriptedChat {
    pub fn new(responses: Vec<Result<String, String>>) -> Self {
        Self {
            responses,
            next: AtomicUsize::new(0),
            seen: parking_lot::Mutex::new(Vec::new()),
        }
    }

    pub fn always(response: &str) -> Self {
        Self::new(vec![Ok(response.to_string())])
    }

    /// A model that is never reachable.
    pub fn failing(message: &str) -> Self {
        Self::new(vec![Err(message.to_string())])
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.seen.lock().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedChat {
    async fn chat(&self, request: &ChatRequest) -> Result<String, LlmError> {
        self.seen.lock().push(request.clone());
        if self.responses.is_empty() {
            return Err(LlmError::InvalidResponse("no scripted responses".into()));
        }
        let idx = self.next.fetch_add(1, Ordering::SeqCst) % self.responses.len();
        self.responses[idx].clone().map_err(|message| LlmError::Unreachable {
            url: "scripted://".into(),
            message,
        })
    }

    fn describe(&self) -> String {
        "scripted".to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LlmConfig {
    pub host: String,
    pub model: String,
    /// `None` waits forever.
    pub timeout: Option<Duration>,
    pub retry: RetryPolicy,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_OLLAMA_HOST.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Some(Duration::from_secs(DEFAULT_LLM_TIMEOUT_SECS)),
            retry: RetryPolicy::default(),
        }
    }
}

impl LlmConfig {
    pub fn from_env() -> Result<Self, QaError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, QaError> {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();
        if let Some(host) = get(OLLAMA_HOST_ENV) {
            config.host = normalize_ollama_host(&host);
        }
        if let Some(model) = get(KGQA_LLM_MODEL_ENV) {
            config.model = model;
        }
        if let Some(raw) = get(KGQA_LLM_TIMEOUT_SECS_ENV) {
            config.timeout = parse_timeout_secs(KGQA_LLM_TIMEOUT_SECS_ENV, &raw)?;
        }
        Ok(config)
    }
}

/// Parse integer seconds where `0` disables the timeout.
pub(crate) fn parse_timeout_secs(var: &str, raw: &str) -> Result<Option<Duration>, QaError> {
    let secs = raw.trim().parse::<u64>().map_err(|_| {
        QaError::Config(format!(
            "invalid {var}={raw:?} (expected integer seconds; 0 disables)"
        ))
    })?;
    Ok((secs > 0).then(|| Duration::from_secs(secs)))
}

pub fn normalize_ollama_host(host: &str) -> String {
    let mut host = host.trim().to_string();
    if host.is_empty() {
        // `localhost` may resolve to ::1 while Ollama listens on IPv4 only.
        host = DEFAULT_OLLAMA_HOST.to_string();
    }
    if !host.starts_with("http://") && !host.starts_with("https://") {
        host = format!("http://{host}");
    }
    host.trim_end_matches('/').to_string()
}

/// Parse model output as JSON, tolerating prose or markdown around it.
///
/// Tries the whole text first, then the first complete `{...}` or `[...]`
/// value found by bracket balancing outside of strings.
pub fn parse_llm_json<T: for<'de> Deserialize<'de>>(text: &str) -> Result<T, LlmError> {
    let trimmed = text.trim();
    if let Ok(v) = serde_json::from_str(trimmed) {
        return Ok(v);
    }

    let Some(start) = trimmed.find(['{', '[']) else {
        return Err(LlmError::InvalidResponse("no JSON value in model output".into()));
    };
    let (open, close) = if trimmed[start..].starts_with('{') {
        ('{', '}')
    } else {
        ('[', ']')
    };

    let mut depth: i64 = 0;
    let mut in_string = false;
    let mut escape = false;
    let mut end: Option<usize> = None;
    for (idx, ch) in trimmed.char_indices().skip_while(|(i, _)| *i < start) {
        if in_string {
            if escape {
                escape = false;
                continue;
            }
            match ch {
                '\\' => escape = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        if ch == '"' {
            in_string = true;
        } else if ch == open {
            depth += 1;
        } else if ch == close {
            depth -= 1;
            if depth == 0 {
                end = Some(idx);
                break;
            }
        }
    }

    let Some(end) = end.or_else(|| trimmed.rfind(close)) else {
        return Err(LlmError::InvalidResponse(format!("unterminated JSON value (no {close:?})")));
    };
    serde_json::from_str(&trimmed[start..=end])
        .map_err(|e| LlmError::InvalidResponse(format!("invalid JSON from model: {e}")))
}

#[cfg(feature = "llm-ollama")]
pub use ollama::OllamaClient;

#[cfg(feature = "llm-ollama")]
mod ollama {
    use super::*;
    use serde_json::json;

    /// Client for Ollama's `/api/chat` endpoint. Temperature is pinned to 0.
    pub struct OllamaClient {
        http: reqwest::Client,
        url: String,
        model: String,
        timeout: Option<Duration>,
        retry: RetryPolicy,
    }

    #[derive(Deserialize)]
    struct OllamaChatResponse {
        message: OllamaChatMessage,
    }

    #[derive(Deserialize)]
    struct OllamaChatMessage {
        content: String,
    }

    impl OllamaClient {
        pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
            if config.model.trim().is_empty() {
                return Err(LlmError::Config("no model selected".into()));
            }
            let mut builder = reqwest::Client::builder();
            if let Some(timeout) = config.timeout {
                builder = builder.timeout(timeout);
            }
            let http = builder
                .build()
                .map_err(|e| LlmError::Config(format!("failed to build http client: {e}")))?;
            let host = normalize_ollama_host(&config.host);
            Ok(Self {
                http,
                url: format!("{host}/api/chat"),
                model: config.model.clone(),
                timeout: config.timeout,
                retry: config.retry,
            })
        }

        fn body(&self, request: &ChatRequest, with_format: bool) -> serde_json::Value {
            let mut messages = Vec::new();
            if let Some(system) = &request.system {
                messages.push(json!({ "role": "system", "content": system }));
            }
            messages.push(json!({ "role": "user", "content": request.user }));

            let mut body = json!({
                "model": self.model,
                "stream": false,
                "messages": messages,
                "options": { "temperature": 0 }
            });
            if with_format && request.json {
                body["format"] = json!("json");
            }
            body
        }

        async fn post(&self, body: &serde_json::Value) -> Result<reqwest::Response, LlmError> {
            self.http
                .post(&self.url)
                .json(body)
                .send()
                .await
                .map_err(|e| self.transport_error(e))
        }

        fn transport_error(&self, e: reqwest::Error) -> LlmError {
            if e.is_timeout() {
                LlmError::Timeout {
                    secs: self.timeout.map(|t| t.as_secs()).unwrap_or_default(),
                }
            } else {
                LlmError::Unreachable {
                    url: self.url.clone(),
                    message: e.to_string(),
                }
            }
        }

        async fn chat_once(&self, request: &ChatRequest) -> Result<String, LlmError> {
            let mut resp = self.post(&self.body(request, true)).await?;
            if !resp.status().is_success() {
                let status = resp.status().as_u16();
                let text = resp.text().await.unwrap_or_default();
                // Some Ollama versions want a JSON schema in `format`; retry once without it.
                if request.json && text.contains("invalid JSON schema in format") {
                    resp = self.post(&self.body(request, false)).await?;
                    if !resp.status().is_success() {
                        let status = resp.status().as_u16();
                        let body = resp.text().await.unwrap_or_default();
                        return Err(LlmError::Http { status, body });
                    }
                } else {
                    return Err(LlmError::Http { status, body: text });
                }
            }

            let out: OllamaChatResponse = resp
                .json()
                .await
                .map_err(|e| LlmError::InvalidResponse(format!("ollama returned invalid JSON: {e}")))?;
            Ok(out.message.content)
        }
    }

    #[async_trait]
    impl ChatModel for OllamaClient {
        async fn chat(&self, request: &ChatRequest) -> Result<String, LlmError> {
            self.retry
                .run("ollama chat", LlmError::is_transient, || self.chat_once(request))
                .await
        }

        fn describe(&self) -> String {
            format!("ollama({}, {})", self.url, self.model)
        }
    }
}
