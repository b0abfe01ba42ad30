use futures::Stream;
use futures::TryStreamExt;
use reqwest::{header, Client, StatusCode};
use serde_json::Value;
use thiserror::Error;
use url::Url;

use super::models::{ApiConfig, LinkResponse};
use crate::domain::{AppError, DownloadRequest, DownloadResult};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Backend unavailable: HTTP status {0}")]
    Status(StatusCode),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Download URL not found")]
    NoDownloadUrl,

    #[error("Invalid backend endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
}

pub type Result<T> = std::result::Result<T, ApiError>;

impl From<ApiError> for AppError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::RequestError(e) => AppError::BackendUnavailable(e.to_string()),
            ApiError::Status(status) => AppError::BackendUnavailable(status.to_string()),
            ApiError::NoDownloadUrl => AppError::NoVideoFound,
            ApiError::InvalidResponse(detail) => AppError::Unknown(detail),
            ApiError::Endpoint(e) => AppError::Unknown(e.to_string()),
        }
    }
}

#[derive(Clone)]
pub struct ApiClient {
    config: ApiConfig,
    http: Client,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> Self {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "falling back to default HTTP client");
                Client::new()
            });

        Self { config, http }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// `{base}/api/instagram?url=<encoded>`
    fn link_endpoint(&self, instagram_url: &str) -> Result<Url> {
        let mut endpoint = Url::parse(&format!(
            "{}/api/instagram",
            self.config.base_url.trim_end_matches('/')
        ))?;
        endpoint
            .query_pairs_mut()
            .append_pair("url", instagram_url);
        Ok(endpoint)
    }

    /// Ask the backend for a direct media link. Single attempt, no retry.
    pub async fn fetch_link(&self, request: &DownloadRequest) -> Result<DownloadResult> {
        let endpoint = self.link_endpoint(&request.input_url)?;
        tracing::debug!(%endpoint, is_retry = request.is_retry, "requesting download link");

        let response = self
            .http
            .get(endpoint)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status));
        }

        let body = response.text().await?;
        let json: Value = serde_json::from_str(&body)
            .map_err(|e| ApiError::InvalidResponse(format!("JSON decode error: {}", e)))?;

        let parsed: LinkResponse =
            serde_json::from_value(json).map_err(|_| ApiError::NoDownloadUrl)?;

        match parsed.download_url {
            Some(download_url) if !download_url.trim().is_empty() => {
                Ok(DownloadResult { download_url })
            }
            _ => Err(ApiError::NoDownloadUrl),
        }
    }

    /// Stream the media behind a resolved link
    /// Returns (total_size, stream)
    pub async fn download_file_stream(
        &self,
        download_url: &str,
    ) -> Result<(Option<u64>, impl Stream<Item = Result<bytes::Bytes>>)> {
        let response = self
            .http
            .get(download_url)
            .send()
            .await?
            .error_for_status()?;

        let total_size = response.content_length();
        let stream = response.bytes_stream().map_err(ApiError::RequestError);

        Ok((total_size, stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use mockito::Matcher;

    const REEL: &str = "https://www.instagram.com/reel/Cabc123/";

    fn client_for(server: &mockito::ServerGuard) -> ApiClient {
        ApiClient::new(ApiConfig {
            base_url: server.url(),
            ..ApiConfig::default()
        })
    }

    #[test]
    fn test_endpoint_encodes_target_url() {
        let client = ApiClient::new(ApiConfig {
            base_url: "https://backend.example/".to_string(),
            ..ApiConfig::default()
        });
        let endpoint = client.link_endpoint(REEL).unwrap();
        assert_eq!(endpoint.path(), "/api/instagram");
        assert_eq!(
            endpoint.query(),
            Some("url=https%3A%2F%2Fwww.instagram.com%2Freel%2FCabc123%2F")
        );
    }

    #[tokio::test]
    async fn test_fetch_link_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/instagram")
            .match_query(Matcher::UrlEncoded("url".into(), REEL.into()))
            .match_header("accept", "application/json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"downloadUrl":"https://cdn.example/video.mp4"}"#)
            .create_async()
            .await;

        let result = client_for(&server)
            .fetch_link(&DownloadRequest::first(REEL))
            .await
            .unwrap();

        assert_eq!(result.download_url, "https://cdn.example/video.mp4");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_success_status_is_backend_unavailable() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/instagram")
            .match_query(Matcher::Any)
            .with_status(502)
            .create_async()
            .await;

        let err = client_for(&server)
            .fetch_link(&DownloadRequest::first(REEL))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Status(StatusCode::BAD_GATEWAY)));
        assert!(matches!(AppError::from(err), AppError::BackendUnavailable(_)));
    }

    #[tokio::test]
    async fn test_missing_or_empty_download_url_is_no_video() {
        for body in [r#"{"error":"private"}"#, r#"{"downloadUrl":""}"#, r#"{"downloadUrl":42}"#] {
            let mut server = mockito::Server::new_async().await;
            server
                .mock("GET", "/api/instagram")
                .match_query(Matcher::Any)
                .with_status(200)
                .with_body(body)
                .create_async()
                .await;

            let err = client_for(&server)
                .fetch_link(&DownloadRequest::first(REEL))
                .await
                .unwrap_err();

            assert!(matches!(err, ApiError::NoDownloadUrl), "body: {body}");
            assert_eq!(AppError::from(err), AppError::NoVideoFound);
        }
    }

    #[tokio::test]
    async fn test_non_json_body_is_unknown() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/instagram")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create_async()
            .await;

        let err = client_for(&server)
            .fetch_link(&DownloadRequest::first(REEL))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::InvalidResponse(_)));
        assert!(matches!(AppError::from(err), AppError::Unknown(_)));
    }

    #[tokio::test]
    async fn test_download_file_stream_yields_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/media/video.mp4")
            .with_status(200)
            .with_body("0123456789")
            .create_async()
            .await;

        let client = client_for(&server);
        let url = format!("{}/media/video.mp4", server.url());
        let (total, stream) = client.download_file_stream(&url).await.unwrap();

        let chunks: Vec<bytes::Bytes> = stream.map(|c| c.unwrap()).collect().await;
        let body: Vec<u8> = chunks.concat();
        assert_eq!(total, Some(10));
        assert_eq!(body, b"0123456789");
    }
}
