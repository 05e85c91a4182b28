//! YandexDiskStorage - remote backup destination over the Yandex Disk REST API.

use async_trait::async_trait;
use relay_core::backup::RemoteStorage;
use relay_core::{RelayError, Result};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

const DEFAULT_DISK_API_URL: &str = "https://cloud-api.yandex.net/v1/disk";

/// Remote storage that talks to the Yandex Disk HTTP API with an OAuth token.
#[derive(Clone)]
pub struct YandexDiskStorage {
    client: Client,
    api_url: String,
    token: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct UploadLink {
    href: String,
}

#[derive(Debug, Deserialize)]
struct DiskErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl YandexDiskStorage {
    /// Creates a client with the given OAuth token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_url: DEFAULT_DISK_API_URL.to_string(),
            token: token.into(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Overrides the API root (e.g. for a proxy).
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn auth_request(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Authorization", format!("OAuth {}", self.token))
            .header("Accept", "application/json")
            .timeout(self.timeout)
    }

    fn resources_url(&self) -> String {
        format!("{}/resources", self.api_url)
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response> {
        request
            .send()
            .await
            .map_err(|e| RelayError::network(format!("{} failed: {}", what, e)))
    }
}

#[async_trait]
impl RemoteStorage for YandexDiskStorage {
    async fn validate_credentials(&self) -> Result<bool> {
        let request = self.auth_request(self.client.get(&self.api_url));
        let response = self.send(request, "Token check").await?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                tracing::debug!("[YandexDisk] Token rejected with {}", response.status());
                Ok(false)
            }
            _ => Err(error_from_response(response).await),
        }
    }

    async fn exists(&self, remote_path: &str) -> Result<bool> {
        let request = self.auth_request(
            self.client
                .get(self.resources_url())
                .query(&[("path", remote_path), ("fields", "path,type")]),
        );
        let response = self.send(request, "Resource lookup").await?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(error_from_response(response).await),
        }
    }

    async fn create_dir(&self, remote_path: &str) -> Result<()> {
        let request = self.auth_request(
            self.client
                .put(self.resources_url())
                .query(&[("path", remote_path)]),
        );
        let response = self.send(request, "Directory creation").await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            // created by someone else in the meantime
            StatusCode::CONFLICT => {
                tracing::debug!("[YandexDisk] Directory {} already exists", remote_path);
                Ok(())
            }
            _ => Err(error_from_response(response).await),
        }
    }

    async fn upload(&self, local_path: &Path, remote_path: &str, overwrite: bool) -> Result<()> {
        let bytes = tokio::fs::read(local_path)
            .await
            .map_err(|e| RelayError::io_at(local_path, e))?;

        let overwrite = if overwrite { "true" } else { "false" };
        let link_request = self.auth_request(
            self.client
                .get(format!("{}/upload", self.resources_url()))
                .query(&[("path", remote_path), ("overwrite", overwrite)]),
        );
        let response = self.send(link_request, "Upload link request").await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        let link: UploadLink = response.json().await.map_err(|e| {
            RelayError::network(format!("Failed to parse upload link response: {}", e))
        })?;

        // the upload host is pre-signed and takes no OAuth header
        let upload_request = self
            .client
            .put(&link.href)
            .body(bytes)
            .timeout(self.timeout);
        let response = self.send(upload_request, "Upload").await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        tracing::debug!(
            "[YandexDisk] Uploaded {} to {}",
            local_path.display(),
            remote_path
        );
        Ok(())
    }
}

async fn error_from_response(response: Response) -> RelayError {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to read Yandex Disk error body".to_string());
    map_disk_error(status, &body)
}

fn map_disk_error(status: StatusCode, body: &str) -> RelayError {
    let message = serde_json::from_str::<DiskErrorBody>(body)
        .ok()
        .and_then(|parsed| {
            let text = parsed.description.or(parsed.message)?;
            Some(match parsed.error {
                Some(code) => format!("{} ({})", text, code),
                None => text,
            })
        })
        .unwrap_or_else(|| body.to_string());

    if status == StatusCode::UNAUTHORIZED {
        RelayError::Unauthorized(message)
    } else {
        RelayError::http(status.as_u16(), message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_disk_error_uses_description() {
        let body = r#"{"message":"Не удалось найти запрошенный ресурс.","description":"Resource not found.","error":"DiskNotFoundError"}"#;
        let err = map_disk_error(StatusCode::NOT_FOUND, body);
        match err {
            RelayError::Http { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Resource not found. (DiskNotFoundError)");
            }
            other => panic!("Expected Http error, got {:?}", other),
        }
    }

    #[test]
    fn test_map_disk_error_unauthorized() {
        let body = r#"{"description":"Unauthorized","error":"UnauthorizedError"}"#;
        assert!(map_disk_error(StatusCode::UNAUTHORIZED, body).is_unauthorized());
    }

    #[test]
    fn test_map_disk_error_plain_body() {
        let err = map_disk_error(StatusCode::BAD_GATEWAY, "upstream down");
        assert_eq!(err.to_string(), "HTTP error 502: upstream down");
    }

    #[test]
    fn test_api_url_trailing_slash() {
        let storage = YandexDiskStorage::new("t").with_api_url("http://localhost:8080/v1/disk/");
        assert_eq!(storage.resources_url(), "http://localhost:8080/v1/disk/resources");
    }
}
