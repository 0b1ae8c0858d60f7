//! OpenRouter provider (OpenAI-compatible chat completions API).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, instrument};

use preprint_alert_shared::{ModelError, OpenRouterConfig};

use crate::{CompletionRequest, LlmClient};

/// Attribution headers OpenRouter shows on its dashboard.
const REFERER: &str = "https://github.com/preprint-alert-agent";
const APP_TITLE: &str = "Preprint Alert Agent";

/// Longest slice of an error body kept in [`ModelError::Status`].
const MAX_ERROR_BODY: usize = 500;

/// Connection settings for [`OpenRouterClient`].
#[derive(Debug, Clone)]
pub struct OpenRouterOptions {
    pub base_url: String,
    pub model: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

impl OpenRouterOptions {
    pub fn from_config(config: &OpenRouterConfig, api_key: impl Into<String>) -> Self {
        Self {
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            api_key: api_key.into(),
            timeout_secs: config.timeout_secs,
        }
    }
}

/// [`LlmClient`] that talks to `<base_url>/chat/completions`.
pub struct OpenRouterClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl OpenRouterClient {
    pub fn new(options: OpenRouterOptions) -> Result<Self, ModelError> {
        if options.api_key.trim().is_empty() {
            return Err(ModelError::Auth("API key is empty".into()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_secs))
            .build()
            .map_err(|e| ModelError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/chat/completions",
                options.base_url.trim_end_matches('/')
            ),
            model: options.model,
            api_key: options.api_key,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_body(&self, request: &CompletionRequest) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": request.user },
            ],
            "stream": false,
        });

        if let Some(schema) = &request.schema {
            body["response_format"] = json!({
                "type": "json_schema",
                "json_schema": {
                    "name": request.task.as_str(),
                    "strict": true,
                    "schema": schema,
                },
            });
        }

        body
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl LlmClient for OpenRouterClient {
    #[instrument(skip_all, fields(task = request.task.as_str(), model = %self.model))]
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ModelError> {
        let body = self.request_body(request);
        debug!(endpoint = %self.endpoint, "sending completion request");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", REFERER)
            .header("X-Title", APP_TITLE)
            .json(&body)
            .send()
            .await
            .map_err(|e| ModelError::Request(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ModelError::Request(format!("failed to read response body: {e}")))?;

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ModelError::Auth(format!("HTTP {status}")));
        }
        if !status.is_success() {
            let mut body = text;
            if body.len() > MAX_ERROR_BODY {
                let cut = (0..=MAX_ERROR_BODY)
                    .rev()
                    .find(|i| body.is_char_boundary(*i))
                    .unwrap_or(0);
                body.truncate(cut);
            }
            return Err(ModelError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| ModelError::Response(format!("invalid completion JSON: {e}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ModelError::Response("completion has no message content".into()))?;

        debug!(len = content.len(), "completion received");
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TaskKind;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> OpenRouterClient {
        OpenRouterClient::new(OpenRouterOptions {
            base_url: format!("{}/api/v1/", server.uri()),
            model: "test/model".into(),
            api_key: "sk-test".into(),
            timeout_secs: 5,
        })
        .expect("build client")
    }

    fn completion(content: &str) -> serde_json::Value {
        json!({
            "id": "gen-1",
            "choices": [{ "index": 0, "message": { "role": "assistant", "content": content } }]
        })
    }

    #[tokio::test]
    async fn returns_first_choice_content() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(header("x-title", APP_TITLE))
            .and(body_partial_json(json!({ "model": "test/model" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("hello")))
            .expect(1)
            .mount(&server)
            .await;

        let request = CompletionRequest::new(TaskKind::SynthesizeReport, "sys", "user");
        let text = client_for(&server).complete(&request).await.unwrap();
        assert_eq!(text, "hello");
    }

    #[tokio::test]
    async fn schema_becomes_response_format() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/chat/completions"))
            .and(body_partial_json(json!({
                "response_format": {
                    "type": "json_schema",
                    "json_schema": { "name": "classify_papers" }
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("{}")))
            .expect(1)
            .mount(&server)
            .await;

        let request = CompletionRequest::new(TaskKind::ClassifyPapers, "sys", "user")
            .with_schema(json!({ "type": "object" }));
        client_for(&server).complete(&request).await.unwrap();
    }

    #[tokio::test]
    async fn unauthorized_maps_to_auth_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let request = CompletionRequest::new(TaskKind::AnalyzePaper, "sys", "user");
        let err = client_for(&server).complete(&request).await.unwrap_err();
        assert!(matches!(err, ModelError::Auth(_)));
    }

    #[tokio::test]
    async fn server_error_keeps_status_and_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("upstream down"))
            .expect(1)
            .mount(&server)
            .await;

        let request = CompletionRequest::new(TaskKind::AnalyzePaper, "sys", "user");
        let err = client_for(&server).complete(&request).await.unwrap_err();
        match err {
            ModelError::Status { status, body } => {
                assert_eq!(status, 502);
                assert_eq!(body, "upstream down");
            }
            other => panic!("expected Status, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_content_is_response_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let request = CompletionRequest::new(TaskKind::AnalyzePaper, "sys", "user");
        let err = client_for(&server).complete(&request).await.unwrap_err();
        assert!(matches!(err, ModelError::Response(_)));
    }

    #[test]
    fn empty_api_key_is_rejected() {
        let result = OpenRouterClient::new(OpenRouterOptions {
            base_url: "https://openrouter.ai/api/v1".into(),
            model: "m".into(),
            api_key: "  ".into(),
            timeout_secs: 5,
        });
        assert!(matches!(result, Err(ModelError::Auth(_))));
    }
}
