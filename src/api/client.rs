use async_trait::async_trait;
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{
    build_download_url, ArtifactDownloader, ArtifactKind, ProcessingRequest, ProcessingResult,
    ProgressStatus, TranscriptApi,
};
use crate::config::Config;
use crate::utils;
use crate::ClientError;

/// HTTP client for the processing backend
#[derive(Clone)]
pub struct HttpApiClient {
    client: Client,
    base_url: String,
    request_timeout: Duration,
    show_progress: bool,
}

impl HttpApiClient {
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            request_timeout,
            show_progress: false,
        }
    }

    /// Build a client from the loaded configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.backend.base_url.clone(), config.request_timeout())
    }

    /// Draw a progress bar while streaming downloads
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute download location of an artifact
    pub fn download_url(&self, job_id: &str, kind: ArtifactKind) -> String {
        format!("{}{}", self.base_url, build_download_url(job_id, kind))
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Map a transport failure onto the client error taxonomy
fn classify_transport_error(error: reqwest::Error) -> ClientError {
    if error.is_timeout() || error.is_connect() || error.is_request() {
        ClientError::NetworkUnreachable
    } else {
        ClientError::UnknownError(error.to_string())
    }
}

/// Message to surface for an error response
///
/// Prefers a string `detail`, then a string `message`, then a generic status line.
pub fn backend_error_message(status: StatusCode, body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();

    parsed
        .as_ref()
        .and_then(|value| {
            value
                .get("detail")
                .and_then(Value::as_str)
                .or_else(|| value.get("message").and_then(Value::as_str))
        })
        .filter(|message| !message.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Server error: {}", status.as_u16()))
}

#[async_trait]
impl TranscriptApi for HttpApiClient {
    async fn submit(&self, request: &ProcessingRequest) -> Result<ProcessingResult, ClientError> {
        tracing::info!("Submitting processing request for {}", request.youtube_url);
        tracing::debug!("Request body: {:?}", request);

        let response = self
            .client
            .post(self.endpoint("/api/transcript"))
            .timeout(self.request_timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Processing request failed before a response: {}", e);
                classify_transport_error(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = backend_error_message(status, &body);
            tracing::warn!("Backend rejected processing request ({}): {}", status, message);
            return Err(ClientError::BackendError(message));
        }

        let body = response.text().await.map_err(classify_transport_error)?;
        let result: ProcessingResult = serde_json::from_str(&body)
            .map_err(|e| ClientError::UnknownError(format!("invalid response body: {}", e)))?;

        tracing::info!(
            "Processing finished for job {} ({} -> {})",
            result.job_id,
            result.detected_language,
            result.target_language
        );
        Ok(result)
    }

    async fn query_progress(&self, job_id: &str) -> Result<ProgressStatus, ClientError> {
        let url = self.endpoint(&format!("/api/progress/{}", urlencoding::encode(job_id)));
        tracing::debug!("Querying progress: {}", url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            tracing::warn!("Progress query failed: {}", e);
            ClientError::ProgressQueryFailed
        })?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(ClientError::ProgressNotFound),
            status if !status.is_success() => {
                tracing::warn!("Progress query returned HTTP {}", status);
                Err(ClientError::ProgressQueryFailed)
            }
            _ => response.json::<ProgressStatus>().await.map_err(|e| {
                tracing::warn!("Progress response could not be decoded: {}", e);
                ClientError::ProgressQueryFailed
            }),
        }
    }
}

/// Write a response body to `path`, returning the number of bytes received
async fn stream_to_file(
    response: reqwest::Response,
    path: &Path,
    progress: Option<&ProgressBar>,
) -> Result<u64, ClientError> {
    let mut file =
        fs_err::File::create(path).map_err(|e| ClientError::DownloadFailed(e.to_string()))?;

    let mut downloaded = 0u64;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| ClientError::DownloadFailed(e.to_string()))?;
        file.write_all(&chunk)
            .map_err(|e| ClientError::DownloadFailed(e.to_string()))?;
        downloaded += chunk.len() as u64;
        if let Some(bar) = progress {
            bar.set_position(downloaded);
        }
    }
    file.flush()
        .map_err(|e| ClientError::DownloadFailed(e.to_string()))?;

    Ok(downloaded)
}

#[async_trait]
impl ArtifactDownloader for HttpApiClient {
    async fn download(
        &self,
        job_id: &str,
        kind: ArtifactKind,
        dir: &Path,
    ) -> Result<PathBuf, ClientError> {
        let url = self.download_url(job_id, kind);
        let output_path = dir.join(utils::sanitize_filename(&kind.file_name(job_id)));
        tracing::info!("Downloading {} to {}", kind, output_path.display());

        let response = self
            .client
            .get(&url)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| ClientError::DownloadFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::DownloadFailed(backend_error_message(status, &body)));
        }

        let progress = if self.show_progress {
            let bar = ProgressBar::new(response.content_length().unwrap_or(0));
            if let Ok(style) = ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}")
            {
                bar.set_style(style);
            }
            bar.set_message(format!("Downloading {}...", kind.title()));
            Some(bar)
        } else {
            None
        };

        fs_err::create_dir_all(dir).map_err(|e| ClientError::DownloadFailed(e.to_string()))?;

        // Only a fully received artifact gets its final name
        let part_path = output_path.with_extension(format!("{}.part", kind.extension()));
        let downloaded = match stream_to_file(response, &part_path, progress.as_ref()).await {
            Ok(downloaded) => downloaded,
            Err(e) => {
                if let Err(cleanup) = fs_err::remove_file(&part_path) {
                    tracing::debug!("Could not remove partial download: {}", cleanup);
                }
                if let Some(bar) = progress {
                    bar.abandon_with_message(format!("{} failed", kind.title()));
                }
                tracing::warn!("Download of {} failed: {}", kind, e);
                return Err(e);
            }
        };
        fs_err::rename(&part_path, &output_path)
            .map_err(|e| ClientError::DownloadFailed(e.to_string()))?;

        if let Some(bar) = progress {
            bar.finish_with_message(format!("{} saved", kind.title()));
        }
        tracing::info!(
            "Saved {} ({})",
            output_path.display(),
            utils::format_file_size(downloaded)
        );

        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::ModelSize;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn sample_request() -> ProcessingRequest {
        ProcessingRequest {
            youtube_url: "https://youtu.be/dQw4w9WgXcQ".to_string(),
            model_size: ModelSize::Base,
            target_language: "en".to_string(),
        }
    }

    fn json_response(status_line: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        )
    }

    /// Read a full HTTP/1.1 request (headers plus Content-Length body)
    async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
        let mut buffer = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let read = socket.read(&mut chunk).await.unwrap();
            if read == 0 {
                break;
            }
            buffer.extend_from_slice(&chunk[..read]);

            let text = String::from_utf8_lossy(&buffer).to_string();
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|line| {
                        let lower = line.to_lowercase();
                        lower
                            .strip_prefix("content-length:")
                            .map(|v| v.trim().parse::<usize>().unwrap_or(0))
                    })
                    .unwrap_or(0);
                if buffer.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buffer).to_string()
    }

    /// Serve one canned response and hand back the raw request that was received
    async fn serve_once(response: String) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            request
        });

        (base_url, handle)
    }

    #[test]
    fn test_backend_error_message_prefers_detail() {
        let body = r#"{"detail": "model overloaded", "message": "other"}"#;
        assert_eq!(
            backend_error_message(StatusCode::INTERNAL_SERVER_ERROR, body),
            "model overloaded"
        );
    }

    #[test]
    fn test_backend_error_message_falls_back_to_message() {
        let body = r#"{"message": "quota exceeded"}"#;
        assert_eq!(backend_error_message(StatusCode::TOO_MANY_REQUESTS, body), "quota exceeded");
    }

    #[test]
    fn test_backend_error_message_generic() {
        assert_eq!(
            backend_error_message(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>"),
            "Server error: 502"
        );
        // Validation errors carry a list in `detail`
        let body = r#"{"detail": [{"loc": ["body"], "msg": "field required"}]}"#;
        assert_eq!(
            backend_error_message(StatusCode::UNPROCESSABLE_ENTITY, body),
            "Server error: 422"
        );
    }

    #[tokio::test]
    async fn test_submit_success() {
        let body = r#"{"video_id":"abc123","detected_language":"en","target_language":"en","translated":false,"audio_path":"a.mp3","transcript_path":"t.txt","notes_path":"n.md","pdf_path":"p.pdf"}"#;
        let (base_url, server) = serve_once(json_response("200 OK", body)).await;

        let client = HttpApiClient::new(base_url, Duration::from_secs(5));
        let result = client.submit(&sample_request()).await.unwrap();

        assert_eq!(result.job_id, "abc123");
        assert!(!result.was_translated);

        let raw_request = server.await.unwrap();
        assert!(raw_request.starts_with("POST /api/transcript "));
        assert!(raw_request.contains(r#""youtube_url":"https://youtu.be/dQw4w9WgXcQ""#));
        assert!(raw_request.contains(r#""model_size":"base""#));
    }

    #[tokio::test]
    async fn test_submit_backend_error_detail() {
        let (base_url, _server) = serve_once(json_response(
            "500 Internal Server Error",
            r#"{"detail":"model overloaded"}"#,
        ))
        .await;

        let client = HttpApiClient::new(base_url, Duration::from_secs(5));
        let error = client.submit(&sample_request()).await.unwrap_err();

        assert_eq!(error, ClientError::BackendError("model overloaded".to_string()));
        assert_eq!(error.to_string(), "model overloaded");
    }

    #[tokio::test]
    async fn test_submit_bare_error_status() {
        let (base_url, _server) =
            serve_once(json_response("503 Service Unavailable", "")).await;

        let client = HttpApiClient::new(base_url, Duration::from_secs(5));
        let error = client.submit(&sample_request()).await.unwrap_err();

        assert_eq!(error, ClientError::BackendError("Server error: 503".to_string()));
    }

    #[tokio::test]
    async fn test_submit_connection_refused_is_unreachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let client = HttpApiClient::new(base_url, Duration::from_secs(5));
        let error = client.submit(&sample_request()).await.unwrap_err();

        assert_eq!(error, ClientError::NetworkUnreachable);
    }

    #[tokio::test]
    async fn test_submit_timeout_is_unreachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let _server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let _ = read_request(&mut socket).await;
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let client = HttpApiClient::new(base_url, Duration::from_millis(200));
        let error = client.submit(&sample_request()).await.unwrap_err();

        assert_eq!(error, ClientError::NetworkUnreachable);
    }

    #[tokio::test]
    async fn test_submit_undecodable_body_is_unknown() {
        let (base_url, _server) = serve_once(json_response("200 OK", r#"{"video_id":1}"#)).await;

        let client = HttpApiClient::new(base_url, Duration::from_secs(5));
        let error = client.submit(&sample_request()).await.unwrap_err();

        assert!(matches!(error, ClientError::UnknownError(_)));
    }

    #[tokio::test]
    async fn test_query_progress_not_found() {
        let (base_url, server) =
            serve_once(json_response("404 Not Found", r#"{"detail":"Progress not found"}"#)).await;

        let client = HttpApiClient::new(base_url, Duration::from_secs(5));
        let error = client.query_progress("abc123").await.unwrap_err();

        assert_eq!(error, ClientError::ProgressNotFound);
        assert!(server.await.unwrap().starts_with("GET /api/progress/abc123 "));
    }

    #[tokio::test]
    async fn test_query_progress_other_failure() {
        let (base_url, _server) =
            serve_once(json_response("500 Internal Server Error", "{}")).await;

        let client = HttpApiClient::new(base_url, Duration::from_secs(5));
        let error = client.query_progress("abc123").await.unwrap_err();

        assert_eq!(error, ClientError::ProgressQueryFailed);
    }

    #[tokio::test]
    async fn test_query_progress_success() {
        let body = r#"{"video_id":"abc123","current_step":"notes","progress_percentage":80.0,"step_description":"Generating notes","completed":false}"#;
        let (base_url, _server) = serve_once(json_response("200 OK", body)).await;

        let client = HttpApiClient::new(base_url, Duration::from_secs(5));
        let status = client.query_progress("abc123").await.unwrap();

        assert_eq!(status.current_step, "notes");
        assert_eq!(status.progress_percentage, 80.0);
    }

    #[tokio::test]
    async fn test_download_writes_named_file() {
        let (base_url, server) = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: text/markdown\r\nContent-Length: 7\r\nConnection: close\r\n\r\n# Notes"
                .to_string(),
        )
        .await;
        let dir = tempfile::TempDir::new().unwrap();

        let client = HttpApiClient::new(base_url, Duration::from_secs(5));
        let path = client
            .download("abc123", ArtifactKind::Notes, dir.path())
            .await
            .unwrap();

        assert_eq!(path, dir.path().join("video_abc123_notes.md"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# Notes");
        assert!(server.await.unwrap().starts_with("GET /api/download/abc123/notes "));
    }

    #[tokio::test]
    async fn test_download_missing_file_fails() {
        let (base_url, _server) =
            serve_once(json_response("404 Not Found", r#"{"detail":"File not found"}"#)).await;
        let dir = tempfile::TempDir::new().unwrap();

        let client = HttpApiClient::new(base_url, Duration::from_secs(5));
        let error = client
            .download("abc123", ArtifactKind::Pdf, dir.path())
            .await
            .unwrap_err();

        assert_eq!(error, ClientError::DownloadFailed("File not found".to_string()));
        assert!(!dir.path().join("video_abc123_pdf.pdf").exists());
    }

    #[tokio::test]
    async fn test_truncated_download_leaves_no_file() {
        let (base_url, _server) = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: application/pdf\r\nContent-Length: 1000\r\nConnection: close\r\n\r\n%PDF-1.4 partial"
                .to_string(),
        )
        .await;
        let dir = tempfile::TempDir::new().unwrap();

        let client = HttpApiClient::new(base_url, Duration::from_secs(5));
        let error = client
            .download("abc123", ArtifactKind::Pdf, dir.path())
            .await
            .unwrap_err();

        assert!(matches!(error, ClientError::DownloadFailed(_)));
        assert!(!dir.path().join("video_abc123_pdf.pdf").exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_stalled_download_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let _server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let _ = read_request(&mut socket).await;
            tokio::time::sleep(Duration::from_secs(30)).await;
        });
        let dir = tempfile::TempDir::new().unwrap();

        let client = HttpApiClient::new(base_url, Duration::from_millis(200));
        let error = tokio::time::timeout(
            Duration::from_secs(5),
            client.download("abc123", ArtifactKind::Transcript, dir.path()),
        )
        .await
        .expect("download should give up on its own")
        .unwrap_err();

        assert!(matches!(error, ClientError::DownloadFailed(_)));
        assert!(!dir.path().join("video_abc123_transcript.txt").exists());
    }

    #[test]
    fn test_download_url_joins_base() {
        let client = HttpApiClient::new("http://localhost:8000/", Duration::from_secs(1));
        assert_eq!(
            client.download_url("abc123", ArtifactKind::Transcript),
            "http://localhost:8000/api/download/abc123/transcript"
        );
    }
}
