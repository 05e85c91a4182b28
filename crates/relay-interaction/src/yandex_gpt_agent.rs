//! YandexGptAgent - completion requests to the YandexGPT foundation models API.
//!
//! Each request exchanges the OAuth token for a fresh IAM token first.

use async_trait::async_trait;
use relay_core::agent::CompletionAgent;
use relay_core::config::{ModelSettings, YandexCloudConfig};
use relay_core::{RelayError, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::yandex_iam::IamTokenClient;

const COMPLETION_URL: &str = "https://llm.api.cloud.yandex.net/foundationModels/v1/completion";

/// Agent implementation that talks to the YandexGPT HTTP API.
#[derive(Clone)]
pub struct YandexGptAgent {
    client: Client,
    iam: IamTokenClient,
    url: String,
    model_uri: String,
    temperature: f64,
    max_tokens: u32,
    timeout: Duration,
}

impl YandexGptAgent {
    /// Creates an agent for the folder and model in the given configuration.
    pub fn new(cloud: &YandexCloudConfig, model: &ModelSettings) -> Self {
        Self {
            client: Client::new(),
            iam: IamTokenClient::new(cloud.oauth_token.clone()),
            url: COMPLETION_URL.to_string(),
            model_uri: model_uri(&cloud.folder_id, &model.name),
            temperature: model.temperature,
            max_tokens: model.max_tokens,
            timeout: Duration::from_secs(30),
        }
    }

    /// Sets the per-request timeout for both the IAM and completion calls.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self.iam = self.iam.with_timeout(timeout);
        self
    }

    fn build_request(&self, prompt: &str) -> CompletionRequest {
        CompletionRequest {
            model_uri: self.model_uri.clone(),
            completion_options: CompletionOptions {
                temperature: self.temperature,
                max_tokens: self.max_tokens,
            },
            messages: vec![Message {
                role: "user".to_string(),
                text: prompt.to_string(),
            }],
        }
    }

    async fn send_request(&self, iam_token: &str, body: &CompletionRequest) -> Result<String> {
        let response = self
            .client
            .post(&self.url)
            .header("Accept", "application/json")
            .header("Authorization", format!("Bearer {}", iam_token))
            .json(body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| RelayError::network(format!("YandexGPT request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read YandexGPT error body".to_string());
            return Err(map_http_error(status, body_text));
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| RelayError::network(format!("Failed to parse YandexGPT response: {}", e)))?;

        extract_text_response(parsed)
    }
}

#[async_trait]
impl CompletionAgent for YandexGptAgent {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let iam_token = self.iam.fetch_token().await?;
        let request = self.build_request(prompt);
        self.send_request(&iam_token, &request).await
    }
}

/// `gpt://<folder>/<model>`
pub fn model_uri(folder_id: &str, model: &str) -> String {
    format!("gpt://{}/{}", folder_id, model)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CompletionRequest {
    model_uri: String,
    completion_options: CompletionOptions,
    messages: Vec<Message>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CompletionOptions {
    temperature: f64,
    max_tokens: u32,
}

#[derive(Serialize, Deserialize)]
struct Message {
    role: String,
    text: String,
}

#[derive(Deserialize)]
struct CompletionResponse {
    result: Option<CompletionResult>,
}

#[derive(Deserialize)]
struct CompletionResult {
    #[serde(default)]
    alternatives: Vec<Alternative>,
}

#[derive(Deserialize)]
struct Alternative {
    message: Option<Message>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

fn extract_text_response(response: CompletionResponse) -> Result<String> {
    response
        .result
        .and_then(|result| result.alternatives.into_iter().next())
        .and_then(|alternative| alternative.message)
        .map(|message| message.text)
        .ok_or_else(|| RelayError::internal("YandexGPT returned no alternatives in the response"))
}

fn map_http_error(status: StatusCode, body: String) -> RelayError {
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|wrapper| wrapper.error.message)
        .unwrap_or(body);

    if status == StatusCode::UNAUTHORIZED {
        RelayError::Unauthorized(message)
    } else {
        RelayError::http(status.as_u16(), message)
    }
}
