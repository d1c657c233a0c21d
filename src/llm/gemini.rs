use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::provider::{
    AssistantCandidate, AssistantInput, AssistantMessage, AssistantOutput, AssistantPart,
    AssistantRole, FunctionDeclaration, LlmError, LlmProvider, LlmResult, ToolCallingMode,
};
use crate::http::client::HttpClient;
use crate::tools::SearchService;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const ERROR_BODY_LIMIT: usize = 400;

#[derive(Debug, Clone)]
pub struct GeminiProvider {
    http: HttpClient,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(
        http: HttpClient,
        api_key: Option<String>,
        model: String,
        base_url: String,
    ) -> LlmResult<Self> {
        let api_key = api_key
            .filter(|v| !v.trim().is_empty())
            .ok_or(LlmError::MissingApiKey)?;

        Ok(Self {
            http,
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    async fn send(&self, payload: &GeminiGenerateRequest) -> LlmResult<GeminiGenerateResponse> {
        let response = self
            .http
            .post_json(&self.endpoint(), &[("key", self.api_key.as_str())], payload)
            .await
            .map_err(|err| LlmError::Transport(err.to_string()))?;

        if !response.is_success() {
            let body = response.body.chars().take(ERROR_BODY_LIMIT).collect();
            return Err(LlmError::HttpStatus {
                status: response.status,
                body,
            });
        }

        serde_json::from_str(&response.body).map_err(|err| LlmError::Parse(err.to_string()))
    }

    fn build_request(input: &AssistantInput) -> GeminiGenerateRequest {
        let tools = if input.tools.is_empty() {
            Vec::new()
        } else {
            vec![GeminiTool {
                function_declarations: Some(
                    input.tools.iter().map(map_function_declaration).collect(),
                ),
                google_search: None,
            }]
        };
        let tool_config = (!input.tools.is_empty()).then(|| GeminiToolConfig {
            function_calling_config: GeminiFunctionCallingConfig {
                mode: match input.tool_calling_mode {
                    ToolCallingMode::Auto => "AUTO",
                    ToolCallingMode::None => "NONE",
                }
                .to_string(),
            },
        });

        GeminiGenerateRequest {
            contents: input.messages.iter().map(map_message).collect(),
            system_instruction: input
                .system_instruction
                .as_ref()
                .map(|text| GeminiSystemInstruction {
                    parts: vec![GeminiPart::text(text.clone())],
                }),
            tools,
            tool_config,
            generation_config: input
                .temperature
                .map(|temperature| GeminiGenerationConfig { temperature }),
        }
    }

    fn build_search_request(query: &str) -> GeminiGenerateRequest {
        GeminiGenerateRequest {
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart::text(query.to_string())],
            }],
            system_instruction: None,
            tools: vec![GeminiTool {
                function_declarations: None,
                google_search: Some(serde_json::json!({})),
            }],
            tool_config: None,
            generation_config: Some(GeminiGenerationConfig { temperature: 0.0 }),
        }
    }
}

impl LlmProvider for GeminiProvider {
    async fn generate(&self, input: AssistantInput) -> LlmResult<AssistantOutput> {
        let payload = Self::build_request(&input);
        let parsed = self.send(&payload).await?;
        Ok(map_response(parsed))
    }
}

impl SearchService for GeminiProvider {
    /// One grounded `generateContent` call per query, answers joined by a blank line.
    async fn search(&self, queries: Vec<String>) -> LlmResult<String> {
        let mut answers = Vec::with_capacity(queries.len());
        for query in &queries {
            let parsed = self.send(&Self::build_search_request(query)).await?;
            let text = map_response(parsed)
                .candidates
                .into_iter()
                .map(|candidate| candidate_text(&candidate))
                .find(|text| !text.is_empty());
            if let Some(text) = text {
                answers.push(text);
            }
        }

        if answers.is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(answers.join("\n\n"))
    }
}

fn candidate_text(candidate: &AssistantCandidate) -> String {
    candidate
        .message
        .parts
        .iter()
        .filter_map(|part| match part {
            AssistantPart::Text { text, .. } => Some(text.trim()).filter(|t| !t.is_empty()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn map_function_declaration(decl: &FunctionDeclaration) -> GeminiFunctionDeclaration {
    GeminiFunctionDeclaration {
        name: decl.name.clone(),
        description: decl.description.clone(),
        parameters: decl.parameters_json_schema.clone(),
    }
}

fn map_message(message: &AssistantMessage) -> GeminiContent {
    GeminiContent {
        role: Some(
            match message.role {
                AssistantRole::User => "user",
                AssistantRole::Model => "model",
            }
            .to_string(),
        ),
        parts: message.parts.iter().map(map_part).collect(),
    }
}

fn map_part(part: &AssistantPart) -> GeminiPart {
    match part {
        AssistantPart::Text {
            text,
            thought_signature,
        } => GeminiPart {
            text: Some(text.clone()),
            thought_signature: thought_signature.clone(),
            ..GeminiPart::default()
        },
        AssistantPart::FunctionCall {
            id,
            name,
            args_json,
            thought_signature,
        } => GeminiPart {
            function_call: Some(GeminiFunctionCall {
                id: id.clone(),
                name: name.clone(),
                args: args_json.clone(),
            }),
            thought_signature: thought_signature.clone(),
            ..GeminiPart::default()
        },
        AssistantPart::FunctionResponse {
            id,
            name,
            response_json,
            thought_signature,
        } => GeminiPart {
            function_response: Some(GeminiFunctionResponse {
                id: id.clone(),
                name: name.clone(),
                response: response_json.clone(),
            }),
            thought_signature: thought_signature.clone(),
            ..GeminiPart::default()
        },
    }
}

fn map_response(resp: GeminiGenerateResponse) -> AssistantOutput {
    let candidates = resp
        .candidates
        .into_iter()
        .map(|candidate| {
            let safety_blocked = candidate.safety_ratings.iter().any(|r| r.blocked);
            let parts = candidate
                .content
                .map(|content| content.parts)
                .unwrap_or_default()
                .into_iter()
                .filter(|part| !part.thought.unwrap_or(false))
                .filter_map(|part| {
                    let GeminiPart {
                        text,
                        function_call,
                        function_response,
                        thought_signature,
                        ..
                    } = part;
                    if let Some(call) = function_call {
                        return Some(AssistantPart::FunctionCall {
                            id: call.id,
                            name: call.name,
                            args_json: call.args,
                            thought_signature,
                        });
                    }
                    if let Some(response) = function_response {
                        return Some(AssistantPart::FunctionResponse {
                            id: response.id,
                            name: response.name,
                            response_json: response.response,
                            thought_signature,
                        });
                    }
                    text.map(|text| AssistantPart::Text {
                        text,
                        thought_signature,
                    })
                })
                .collect();

            AssistantCandidate {
                message: AssistantMessage {
                    role: AssistantRole::Model,
                    parts,
                },
                finish_reason: candidate.finish_reason,
                safety_blocked,
            }
        })
        .collect();

    AssistantOutput { candidates }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerateRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiSystemInstruction>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<GeminiTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_config: Option<GeminiToolConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiSystemInstruction {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_call: Option<GeminiFunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_response: Option<GeminiFunctionResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    thought_signature: Option<String>,
    #[serde(default, skip_serializing)]
    thought: Option<bool>,
}

impl GeminiPart {
    fn text(text: String) -> Self {
        Self {
            text: Some(text),
            ..Self::default()
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiFunctionCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiFunctionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    name: String,
    #[serde(default)]
    response: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTool {
    #[serde(skip_serializing_if = "Option::is_none")]
    function_declarations: Option<Vec<GeminiFunctionDeclaration>>,
    #[serde(rename = "google_search", skip_serializing_if = "Option::is_none")]
    google_search: Option<Value>,
}

#[derive(Debug, Serialize)]
struct GeminiFunctionDeclaration {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiToolConfig {
    function_calling_config: GeminiFunctionCallingConfig,
}

#[derive(Debug, Serialize)]
struct GeminiFunctionCallingConfig {
    mode: String,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GeminiGenerateResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
    #[serde(default)]
    finish_reason: Option<String>,
    #[serde(default)]
    safety_ratings: Vec<GeminiSafetyRating>,
}

#[derive(Debug, Deserialize)]
struct GeminiSafetyRating {
    #[serde(default)]
    blocked: bool,
}
