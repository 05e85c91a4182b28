//! Exchange of a Yandex OAuth token for a short-lived IAM token.

use relay_core::{RelayError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const IAM_TOKENS_URL: &str = "https://iam.api.cloud.yandex.net/iam/v1/tokens";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IamTokenRequest<'a> {
    yandex_passport_oauth_token: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IamTokenResponse {
    iam_token: String,
}

/// Client for the IAM token endpoint.
#[derive(Clone)]
pub struct IamTokenClient {
    client: Client,
    url: String,
    oauth_token: String,
    timeout: Duration,
}

impl IamTokenClient {
    pub fn new(oauth_token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: IAM_TOKENS_URL.to_string(),
            oauth_token: oauth_token.into(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Requests a fresh IAM token.
    pub async fn fetch_token(&self) -> Result<String> {
        let body = IamTokenRequest {
            yandex_passport_oauth_token: &self.oauth_token,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| RelayError::network(format!("IAM token request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(if status.as_u16() == 401 {
                RelayError::Unauthorized(format!("IAM token exchange rejected: {}", error_text))
            } else {
                RelayError::http(status.as_u16(), format!("IAM token exchange failed: {}", error_text))
            });
        }

        let parsed: IamTokenResponse = response
            .json()
            .await
            .map_err(|e| RelayError::network(format!("Failed to parse IAM token response: {}", e)))?;

        Ok(parsed.iam_token)
    }
}
