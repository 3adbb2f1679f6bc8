use crate::config::Config;
use crate::event::AppEvent;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use thiserror::Error;
use tokio::runtime::Handle;
use tracing::{info, warn};

pub mod wire;

use wire::{AskReply, AskRequest, ErrorReply, UploadReply};

const STATUS_PATH: &str = "/api/status";
const UPLOAD_PATH: &str = "/api/upload";
const ASK_PATH: &str = "/api/ask";

/// How a request ended, for the failures the UI is expected to handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Success(T),
    ServerError { status: u16, error: Option<String> },
    TransportError(String),
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("malformed response (HTTP {status}): {source}")]
    Decode {
        status: u16,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to read {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to build request: {0}")]
    BuildRequest(#[from] reqwest::Error),
    #[error("tokio runtime unavailable: {0}")]
    Runtime(String),
}

pub type ApiResult<T> = Result<Outcome<T>, ApiError>;

#[derive(Clone)]
pub struct BackendClient {
    base_url: String,
    http: Client,
    tx: mpsc::Sender<AppEvent>,
    runtime_handle: Handle,
}

impl BackendClient {
    pub fn new(config: &Config, tx: mpsc::Sender<AppEvent>) -> Result<Self, ApiError> {
        let runtime_handle =
            Handle::try_current().map_err(|err| ApiError::Runtime(err.to_string()))?;
        let http = Client::builder().build()?;

        Ok(Self {
            base_url: config.server_url.clone(),
            http,
            tx,
            runtime_handle,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub fn fetch_status(&self) {
        let http = self.http.clone();
        let url = self.endpoint(STATUS_PATH);
        let tx = self.tx.clone();

        self.runtime_handle.spawn(async move {
            let result = send(http.get(url)).await;
            let _ = tx.send(AppEvent::StatusLoaded(result));
        });
    }

    pub fn upload(&self, path: PathBuf, file_name: String) {
        let http = self.http.clone();
        let url = self.endpoint(UPLOAD_PATH);
        let tx = self.tx.clone();
        info!(path = %path.display(), "uploading document");

        self.runtime_handle.spawn(async move {
            let result = upload_file(&http, url, &path, file_name).await;
            if let Err(err) = &result {
                warn!("upload failed before a reply: {err}");
            }
            let _ = tx.send(AppEvent::UploadFinished(result));
        });
    }

    pub fn ask(&self, request: AskRequest) {
        let http = self.http.clone();
        let url = self.endpoint(ASK_PATH);
        let tx = self.tx.clone();
        info!(chars = request.question.chars().count(), "asking question");

        self.runtime_handle.spawn(async move {
            let result = send::<AskReply>(http.post(url).json(&request)).await;
            if let Err(err) = &result {
                warn!("ask reply unusable: {err}");
            }
            let _ = tx.send(AppEvent::AskFinished(result));
        });
    }
}

async fn upload_file(
    http: &Client,
    url: String,
    path: &Path,
    file_name: String,
) -> ApiResult<UploadReply> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| ApiError::ReadFile {
            path: path.display().to_string(),
            source,
        })?;
    let part = Part::bytes(bytes)
        .file_name(file_name)
        .mime_str("application/pdf")?;
    let form = Form::new().part("file", part);

    send(http.post(url).multipart(form)).await
}

async fn send<T: DeserializeOwned>(request: RequestBuilder) -> ApiResult<T> {
    match request.send().await {
        Ok(response) => read_outcome(response).await,
        Err(err) => Ok(Outcome::TransportError(err.to_string())),
    }
}

async fn read_outcome<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    let status = response.status();
    match response.bytes().await {
        Ok(body) => classify(status, &body),
        Err(err) => Ok(Outcome::TransportError(err.to_string())),
    }
}

fn classify<T: DeserializeOwned>(status: StatusCode, body: &[u8]) -> ApiResult<T> {
    if status.is_success() {
        let reply = serde_json::from_slice(body).map_err(|source| ApiError::Decode {
            status: status.as_u16(),
            source,
        })?;
        return Ok(Outcome::Success(reply));
    }

    let error = serde_json::from_slice::<ErrorReply>(body)
        .ok()
        .and_then(|reply| reply.error);
    Ok(Outcome::ServerError {
        status: status.as_u16(),
        error,
    })
}

#[cfg(test)]
mod tests {
    use super::{classify, ApiError, BackendClient, Outcome};
    use crate::backend::wire::{AskReply, AskRequest, StatusReply, UploadReply};
    use crate::config::Config;
    use crate::event::AppEvent;
    use reqwest::StatusCode;
    use std::path::PathBuf;
    use std::sync::mpsc;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    fn client_for(server_url: String) -> (BackendClient, mpsc::Receiver<AppEvent>) {
        let (tx, rx) = mpsc::channel();
        let config = Config {
            server_url,
            log_filter: "off".to_string(),
        };
        let client = BackendClient::new(&config, tx).expect("backend client should build");
        (client, rx)
    }

    /// Answers a single request with `status_line` and a JSON `body`, and
    /// hands back the raw request it received.
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("ephemeral port should bind");
        let addr = listener
            .local_addr()
            .expect("listener should expose its address");

        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.expect("client should connect");
            let request = read_request(&mut stream).await;
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream
                .write_all(response.as_bytes())
                .await
                .expect("response should write");
            let _ = stream.shutdown().await;
            request
        });

        (format!("http://{addr}"), handle)
    }

    async fn read_request(stream: &mut TcpStream) -> String {
        let mut raw = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let read = stream.read(&mut chunk).await.expect("request should read");
            if read == 0 {
                break;
            }
            raw.extend_from_slice(&chunk[..read]);
            if request_complete(&raw) {
                break;
            }
        }
        String::from_utf8_lossy(&raw).into_owned()
    }

    fn request_complete(raw: &[u8]) -> bool {
        let Some(header_end) = raw.windows(4).position(|window| window == b"\r\n\r\n") else {
            return false;
        };
        let headers = String::from_utf8_lossy(&raw[..header_end]).to_ascii_lowercase();
        let body_len = raw.len() - (header_end + 4);

        let content_length = headers
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|value| value.trim().parse::<usize>().ok());
        match content_length {
            Some(length) => body_len >= length,
            None if headers.contains("transfer-encoding: chunked") => raw.ends_with(b"0\r\n\r\n"),
            None => true,
        }
    }

    async fn next_event(rx: &mpsc::Receiver<AppEvent>) -> AppEvent {
        for _ in 0..500 {
            if let Ok(event) = rx.try_recv() {
                return event;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("no completion event within 5s");
    }

    async fn assert_no_further_event(rx: &mpsc::Receiver<AppEvent>) {
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err(), "each request should post exactly one event");
    }

    fn unreachable_server_url() -> String {
        let listener =
            std::net::TcpListener::bind("127.0.0.1:0").expect("ephemeral port should bind");
        let addr = listener
            .local_addr()
            .expect("listener should expose its address");
        drop(listener);
        format!("http://{addr}")
    }

    fn temp_pdf(prefix: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time should be monotonic")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "docqa_backend_{prefix}_{}_{}.pdf",
            std::process::id(),
            nanos
        ))
    }

    #[tokio::test]
    async fn fetch_status_reads_status_endpoint() {
        let (server_url, server) =
            serve_once("200 OK", r#"{"file_name":"report.pdf","has_pdf":true}"#).await;
        let (client, rx) = client_for(server_url);

        client.fetch_status();
        let result = match next_event(&rx).await {
            AppEvent::StatusLoaded(result) => result,
            other => panic!("unexpected event: {other:?}"),
        };
        assert_eq!(
            result.expect("status reply should decode"),
            Outcome::Success(StatusReply {
                has_pdf: true,
                file_name: Some("report.pdf".to_string()),
            })
        );

        let request = server.await.expect("server task should finish");
        assert!(request.starts_with("GET /api/status HTTP/1.1"));
        assert_no_further_event(&rx).await;
    }

    #[tokio::test]
    async fn upload_sends_file_as_single_multipart_field() {
        let path = temp_pdf("upload");
        std::fs::write(&path, b"%PDF-1.4 fixture").expect("pdf fixture should write");
        let (server_url, server) = serve_once(
            "200 OK",
            r#"{"message":"Indexed","file_name":"report.pdf"}"#,
        )
        .await;
        let (client, rx) = client_for(server_url);

        client.upload(path.clone(), "report.pdf".to_string());
        let result = match next_event(&rx).await {
            AppEvent::UploadFinished(result) => result,
            other => panic!("unexpected event: {other:?}"),
        };
        assert_eq!(
            result.expect("upload reply should decode"),
            Outcome::Success(UploadReply {
                message: Some("Indexed".to_string()),
                file_name: Some("report.pdf".to_string()),
            })
        );

        let request = server.await.expect("server task should finish");
        let lowered = request.to_ascii_lowercase();
        assert!(request.starts_with("POST /api/upload HTTP/1.1"));
        assert!(lowered.contains("content-type: multipart/form-data; boundary="));
        assert!(request.contains(r#"name="file"; filename="report.pdf""#));
        assert!(lowered.contains("content-type: application/pdf"));
        assert!(request.contains("%PDF-1.4 fixture"));
        assert_eq!(request.matches("Content-Disposition").count(), 1);
        assert_no_further_event(&rx).await;

        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn ask_posts_json_question_and_reports_server_error() {
        let (server_url, server) = serve_once(
            "500 Internal Server Error",
            r#"{"error":"index missing"}"#,
        )
        .await;
        let (client, rx) = client_for(server_url);

        client.ask(AskRequest {
            question: "What is the total?".to_string(),
        });
        let result = match next_event(&rx).await {
            AppEvent::AskFinished(result) => result,
            other => panic!("unexpected event: {other:?}"),
        };
        assert_eq!(
            result.expect("error reply should classify"),
            Outcome::ServerError {
                status: 500,
                error: Some("index missing".to_string()),
            }
        );

        let request = server.await.expect("server task should finish");
        assert!(request.starts_with("POST /api/ask HTTP/1.1"));
        assert!(request
            .to_ascii_lowercase()
            .contains("content-type: application/json"));
        assert!(request.ends_with(r#"{"question":"What is the total?"}"#));
        assert_no_further_event(&rx).await;
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_transport_error() {
        let (client, rx) = client_for(unreachable_server_url());

        client.fetch_status();
        match next_event(&rx).await {
            AppEvent::StatusLoaded(Ok(Outcome::TransportError(message))) => {
                assert!(!message.is_empty());
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert_no_further_event(&rx).await;
    }

    #[tokio::test]
    async fn unreadable_file_fails_before_any_request() {
        let (client, rx) = client_for(unreachable_server_url());

        client.upload(temp_pdf("missing"), "missing.pdf".to_string());
        match next_event(&rx).await {
            AppEvent::UploadFinished(Err(ApiError::ReadFile { path, .. })) => {
                assert!(path.contains("docqa_backend_missing"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert_no_further_event(&rx).await;
    }

    #[test]
    fn classify_decodes_success_body() {
        let outcome = classify::<UploadReply>(
            StatusCode::OK,
            br#"{"message":"Indexed","file_name":"report.pdf"}"#,
        )
        .expect("success body should decode");
        assert_eq!(
            outcome,
            Outcome::Success(UploadReply {
                message: Some("Indexed".to_string()),
                file_name: Some("report.pdf".to_string()),
            })
        );
    }

    #[test]
    fn classify_surfaces_server_error_field() {
        let outcome = classify::<AskReply>(
            StatusCode::INTERNAL_SERVER_ERROR,
            br#"{"error":"index missing"}"#,
        )
        .expect("error body should classify");
        assert_eq!(
            outcome,
            Outcome::ServerError {
                status: 500,
                error: Some("index missing".to_string()),
            }
        );
    }

    #[test]
    fn classify_tolerates_non_json_error_body() {
        let outcome = classify::<StatusReply>(StatusCode::BAD_GATEWAY, b"<html>bad gateway</html>")
            .expect("non-json error body should still classify");
        assert_eq!(
            outcome,
            Outcome::ServerError {
                status: 502,
                error: None,
            }
        );
    }

    #[test]
    fn classify_rejects_malformed_success_body() {
        let error = classify::<AskReply>(StatusCode::OK, b"not json")
            .expect_err("malformed success body should be a hard failure");
        assert!(matches!(error, ApiError::Decode { status: 200, .. }));
        assert!(error.to_string().contains("malformed response"));
    }
}
