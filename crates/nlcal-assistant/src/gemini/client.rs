//! [`LanguageModel`] on the Gemini REST API.

use std::time::Duration;

use chrono::NaiveDate;
use nlcal_core::{Command, ConversationHistory, LocalZone, RawEventDraft, ZonedTimestamp};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{AssistantError, AssistantResult};
use crate::model::{BoxFuture, EventQuery, LanguageModel};

use super::prompts;
use super::tools::{self, CREATE_EVENT, FIND_EVENT};
use super::types::{
    Content, ErrorEnvelope, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
    Tool, ToolConfig,
};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Gemini `generateContent` client.
///
/// Classification asks for a JSON string answer; extraction forces a call
/// to the single declared function.
#[derive(Debug, Clone)]
pub struct GeminiModel {
    http_client: reqwest::Client,
    api_key: String,
    model: String,
    api_base: String,
}

impl GeminiModel {
    pub fn new(api_key: impl Into<String>) -> AssistantResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(AssistantError::Configuration(
                "Gemini API key is empty".to_string(),
            ));
        }
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .user_agent(format!("nlcal/{}", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http_client,
            api_key,
            model: DEFAULT_MODEL.to_string(),
            api_base: GEMINI_API_BASE.to_string(),
        })
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Points the client at another server, such as a local mock.
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        request: &GenerateContentRequest,
    ) -> AssistantResult<GenerateContentResponse> {
        let url = format!("{}/models/{}:generateContent", self.api_base, self.model);
        let response = self
            .http_client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        debug!(status = status.as_u16(), model = %self.model, "model responded");
        let body = response.text().await?;
        if !status.is_success() {
            return Err(api_error(status.as_u16(), &body));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|e| AssistantError::Decode(format!("unexpected response: {}", e)))?;
        if let Some(reason) = parsed
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            return Err(AssistantError::Api {
                status: status.as_u16(),
                message: format!("prompt blocked: {}", reason),
            });
        }
        if let Some(reason) = parsed.candidates.first().and_then(|c| c.finish_reason.as_deref()) {
            debug!(finish_reason = reason, "candidate finished");
        }
        Ok(parsed)
    }

    /// Sends `prompt` with one declared function the model must call, and
    /// returns the call's arguments.
    async fn call_function(
        &self,
        instructions: String,
        prompt: &str,
        declaration: Value,
        function: &'static str,
    ) -> AssistantResult<Value> {
        let request = GenerateContentRequest {
            system_instruction: Content::system(instructions),
            contents: vec![Content::user(prompt)],
            tools: vec![Tool {
                function_declarations: vec![declaration],
            }],
            tool_config: Some(ToolConfig::require(function)),
            generation_config: None,
        };
        let response = self.generate(&request).await?;
        let call = response
            .function_call(function)
            .ok_or(AssistantError::NoFunctionCall { function })?;
        debug!(function, args = %call.args, "model called function");
        Ok(call.args.clone())
    }

    async fn classify_impl(
        &self,
        prompt: &str,
        history: &ConversationHistory,
    ) -> AssistantResult<Command> {
        let request = GenerateContentRequest {
            system_instruction: Content::system(prompts::classifier_instructions(history)),
            contents: vec![Content::user(prompt)],
            tools: Vec::new(),
            tool_config: None,
            generation_config: Some(GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                temperature: Some(0.0),
            }),
        };
        let response = self.generate(&request).await?;
        let text = response.text().unwrap_or_default();
        let command = Command::from_response(&text);
        info!(command = command.label(), "classified request");
        Ok(command)
    }

    async fn draft_event_impl(
        &self,
        prompt: &str,
        now: ZonedTimestamp,
        zone: LocalZone,
    ) -> AssistantResult<RawEventDraft> {
        let args = self
            .call_function(
                prompts::event_instructions(now, zone),
                prompt,
                tools::create_event_declaration(),
                CREATE_EVENT,
            )
            .await?;
        serde_json::from_value(stringify_scalars(args))
            .map_err(|e| AssistantError::Decode(format!("invalid {} arguments: {}", CREATE_EVENT, e)))
    }

    async fn locate_event_impl(
        &self,
        prompt: &str,
        now: ZonedTimestamp,
        zone: LocalZone,
    ) -> AssistantResult<EventQuery> {
        let args = self
            .call_function(
                prompts::locate_instructions(now, zone),
                prompt,
                tools::find_event_declaration(),
                FIND_EVENT,
            )
            .await?;
        let args: FindEventArgs = serde_json::from_value(stringify_scalars(args))
            .map_err(|e| AssistantError::Decode(format!("invalid {} arguments: {}", FIND_EVENT, e)))?;

        let date_text = args.date.trim();
        let date = date_text
            .get(..10)
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .ok_or_else(|| AssistantError::Decode(format!("invalid event date {:?}", date_text)))?;
        Ok(EventQuery::new(args.title.trim(), date))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FindEventArgs {
    title: String,
    date: String,
}

/// Function arguments sometimes come back as numbers (a color id, say);
/// the draft types expect strings. Nulls are dropped.
fn stringify_scalars(args: Value) -> Value {
    match args {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter_map(|(key, value)| match value {
                    Value::Null => None,
                    Value::Number(n) => Some((key, Value::String(n.to_string()))),
                    Value::Bool(b) => Some((key, Value::String(b.to_string()))),
                    other => Some((key, other)),
                })
                .collect(),
        ),
        other => other,
    }
}

fn api_error(status: u16, body: &str) -> AssistantError {
    let message = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) if envelope.error.status.is_empty() => envelope.error.message,
        Ok(envelope) => format!("{}: {}", envelope.error.status, envelope.error.message),
        Err(_) => body.trim().to_string(),
    };
    AssistantError::Api { status, message }
}

impl LanguageModel for GeminiModel {
    fn name(&self) -> &str {
        &self.model
    }

    fn classify<'a>(
        &'a self,
        prompt: &'a str,
        history: &'a ConversationHistory,
    ) -> BoxFuture<'a, AssistantResult<Command>> {
        Box::pin(self.classify_impl(prompt, history))
    }

    fn draft_event<'a>(
        &'a self,
        prompt: &'a str,
        now: ZonedTimestamp,
        zone: LocalZone,
    ) -> BoxFuture<'a, AssistantResult<RawEventDraft>> {
        Box::pin(self.draft_event_impl(prompt, now, zone))
    }

    fn locate_event<'a>(
        &'a self,
        prompt: &'a str,
        now: ZonedTimestamp,
        zone: LocalZone,
    ) -> BoxFuture<'a, AssistantResult<EventQuery>> {
        Box::pin(self.locate_event_impl(prompt, now, zone))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const GENERATE_PATH: &str = "/models/gemini-2.0-flash:generateContent";

    async fn model(server: &MockServer) -> GeminiModel {
        GeminiModel::new("test-key")
            .unwrap()
            .with_api_base(server.uri())
    }

    fn now() -> ZonedTimestamp {
        LocalZone::default().now()
    }

    fn function_call(name: &str, args: Value) -> Value {
        json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"functionCall": {"name": name, "args": args}}]},
                "finishReason": "STOP"
            }]
        })
    }

    #[test]
    fn empty_api_key_is_rejected() {
        assert!(matches!(
            GeminiModel::new("  "),
            Err(AssistantError::Configuration(_))
        ));
    }

    mod classify {
        use super::*;

        #[tokio::test]
        async fn reads_json_string_label() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path(GENERATE_PATH))
                .and(header("x-goog-api-key", "test-key"))
                .and(body_partial_json(json!({
                    "generationConfig": {"responseMimeType": "application/json"}
                })))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "candidates": [{"content": {"parts": [{"text": "\"list_events\"\n"}]}}]
                })))
                .expect(1)
                .mount(&server)
                .await;

            let command = model(&server)
                .await
                .classify("pokaż wydarzenia", &ConversationHistory::default())
                .await
                .unwrap();
            assert_eq!(command, Command::ListEvents);
        }

        #[tokio::test]
        async fn reads_switch_calendar_object() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path(GENERATE_PATH))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "candidates": [{"content": {"parts": [
                        {"text": "{\"command\":\"switch_calendar\",\"calendar\":\"Praca\"}"}
                    ]}}]
                })))
                .mount(&server)
                .await;

            let command = model(&server)
                .await
                .classify("przełącz na Praca", &ConversationHistory::default())
                .await
                .unwrap();
            assert_eq!(
                command,
                Command::SwitchCalendar {
                    calendar: "Praca".to_string()
                }
            );
        }

        #[tokio::test]
        async fn empty_answer_needs_clarification() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
                .mount(&server)
                .await;

            let command = model(&server)
                .await
                .classify("hmm", &ConversationHistory::default())
                .await
                .unwrap();
            assert_eq!(command, Command::ClarificationNeeded);
        }

        #[tokio::test]
        async fn api_error_carries_status_and_message() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                    "error": {"code": 400, "message": "API key not valid.", "status": "INVALID_ARGUMENT"}
                })))
                .mount(&server)
                .await;

            let err = model(&server)
                .await
                .classify("x", &ConversationHistory::default())
                .await
                .unwrap_err();
            match err {
                AssistantError::Api { status, message } => {
                    assert_eq!(status, 400);
                    assert_eq!(message, "INVALID_ARGUMENT: API key not valid.");
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }

        #[tokio::test]
        async fn blocked_prompt_is_an_api_error() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "promptFeedback": {"blockReason": "SAFETY"}
                })))
                .mount(&server)
                .await;

            let err = model(&server)
                .await
                .classify("x", &ConversationHistory::default())
                .await
                .unwrap_err();
            assert!(err.to_string().contains("prompt blocked: SAFETY"));
        }
    }

    mod extraction {
        use super::*;

        #[tokio::test]
        async fn draft_event_forces_create_event_call() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path(GENERATE_PATH))
                .and(body_partial_json(json!({
                    "toolConfig": {"functionCallingConfig": {
                        "mode": "ANY",
                        "allowedFunctionNames": ["create_event"]
                    }}
                })))
                .respond_with(ResponseTemplate::new(200).set_body_json(function_call(
                    "create_event",
                    json!({
                        "title": "Spotkanie z zespołem",
                        "start_iso": "2025-08-15T10:00:00",
                        "end_iso": "2025-08-15T11:00:00",
                        "timezone": "Europe/Warsaw",
                        "color": 11,
                        "location": null
                    }),
                )))
                .expect(1)
                .mount(&server)
                .await;

            let draft = model(&server)
                .await
                .draft_event("spotkanie jutro", now(), LocalZone::default())
                .await
                .unwrap();
            assert_eq!(draft.title, "Spotkanie z zespołem");
            assert_eq!(draft.start_iso, "2025-08-15T10:00:00");
            assert_eq!(draft.color, "11");
            assert_eq!(draft.location, "");
        }

        #[tokio::test]
        async fn text_instead_of_call_is_no_function_call() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "candidates": [{"content": {"parts": [{"text": "{}"}]}}]
                })))
                .mount(&server)
                .await;

            let err = model(&server)
                .await
                .draft_event("x", now(), LocalZone::default())
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                AssistantError::NoFunctionCall {
                    function: "create_event"
                }
            ));
        }

        #[tokio::test]
        async fn locate_event_parses_date() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(200).set_body_json(function_call(
                    "find_event",
                    json!({"title": " dentysta ", "date": "2025-08-15T00:00:00"}),
                )))
                .mount(&server)
                .await;

            let query = model(&server)
                .await
                .locate_event("usuń dentystę jutro", now(), LocalZone::default())
                .await
                .unwrap();
            assert_eq!(
                query,
                EventQuery::new("dentysta", NaiveDate::from_ymd_opt(2025, 8, 15).unwrap())
            );
        }

        #[tokio::test]
        async fn locate_event_rejects_bad_date() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(200).set_body_json(function_call(
                    "find_event",
                    json!({"title": "x", "date": "jutro"}),
                )))
                .mount(&server)
                .await;

            let err = model(&server)
                .await
                .locate_event("x", now(), LocalZone::default())
                .await
                .unwrap_err();
            assert!(matches!(err, AssistantError::Decode(_)));
        }
    }
}
