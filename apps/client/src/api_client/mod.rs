//! The single point of HTTP access to the resume backend.
//!
//! No other module builds requests. Every call attaches the bearer token when
//! the session holds one, and every 401 clears the session and forces
//! navigation to the sign-in view before the error reaches the caller.
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::ClientError;
use crate::models::{
    AnalyzeRequest, AuthRequest, AuthResponse, DirectFormat, EnhanceRequest, EnhancedResume,
    ExportEnvelope, ExportRequest, Resume, SuggestionRequest, SuggestionResponse,
    TextResumeRequest, TranslateRequest, UsageLimits, UsageReset,
};
use crate::session::SessionStore;
use crate::validation::{upload_mime, validate_upload};

pub mod navigation;

pub use navigation::{Navigator, SystemNavigator};

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: SessionStore,
    navigator: Arc<dyn Navigator>,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        session: SessionStore,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ClientError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url,
            session,
            navigator,
        })
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    // ────────────────────────────────────────────────────────────────────────
    // Auth
    // ────────────────────────────────────────────────────────────────────────

    pub async fn register(&self, request: &AuthRequest) -> Result<AuthResponse, ClientError> {
        self.post_json("/auth/register", request).await
    }

    pub async fn login(&self, request: &AuthRequest) -> Result<AuthResponse, ClientError> {
        self.post_json("/auth/login", request).await
    }

    // ────────────────────────────────────────────────────────────────────────
    // Resumes
    // ────────────────────────────────────────────────────────────────────────

    /// Validates the file's name and size from metadata, then uploads it.
    pub async fn upload_resume(&self, path: &Path) -> Result<Resume, ClientError> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ClientError::Validation(format!("{} is not a file", path.display())))?
            .to_string();
        let size = tokio::fs::metadata(path).await?.len();
        validate_upload(&file_name, size)?;

        let contents = tokio::fs::read(path).await?;
        self.upload_resume_bytes(&file_name, contents).await
    }

    pub async fn upload_resume_bytes(
        &self,
        file_name: &str,
        contents: Vec<u8>,
    ) -> Result<Resume, ClientError> {
        validate_upload(file_name, contents.len() as u64)?;

        let part = Part::bytes(contents)
            .file_name(file_name.to_string())
            .mime_str(upload_mime(file_name))?;
        let form = Form::new().part("file", part);

        let response = self
            .send(self.request(Method::POST, "/resumes/upload").multipart(form))
            .await?;
        decode(response).await
    }

    pub async fn create_text_resume(&self, text: &str) -> Result<Resume, ClientError> {
        let body = TextResumeRequest {
            text: text.to_string(),
        };
        self.post_json("/resumes/text", &body).await
    }

    pub async fn list_resumes(&self) -> Result<Vec<Resume>, ClientError> {
        self.get_json("/resumes").await
    }

    pub async fn get_resume(&self, id: i64) -> Result<Resume, ClientError> {
        self.get_json(&format!("/resumes/{id}")).await
    }

    // ────────────────────────────────────────────────────────────────────────
    // Enhancement
    // ────────────────────────────────────────────────────────────────────────

    pub async fn analyze(&self, request: &AnalyzeRequest) -> Result<EnhancedResume, ClientError> {
        self.post_json("/analyze", request).await
    }

    pub async fn enhance(&self, request: &EnhanceRequest) -> Result<EnhancedResume, ClientError> {
        self.post_json("/enhance", request).await
    }

    pub async fn suggestions(
        &self,
        request: &SuggestionRequest,
    ) -> Result<SuggestionResponse, ClientError> {
        self.post_json("/suggestions", request).await
    }

    pub async fn translate(
        &self,
        request: &TranslateRequest,
    ) -> Result<EnhancedResume, ClientError> {
        self.post_json("/translate", request).await
    }

    pub async fn get_enhanced(&self, id: i64) -> Result<EnhancedResume, ClientError> {
        self.get_json(&format!("/enhanced/{id}")).await
    }

    /// All enhanced versions of a resume, in server order.
    pub async fn get_enhanced_versions(
        &self,
        resume_id: i64,
    ) -> Result<Vec<EnhancedResume>, ClientError> {
        self.get_json(&format!("/resumes/{resume_id}/enhanced")).await
    }

    // ────────────────────────────────────────────────────────────────────────
    // Export
    // ────────────────────────────────────────────────────────────────────────

    pub async fn export(&self, request: &ExportRequest) -> Result<ExportEnvelope, ClientError> {
        self.post_json("/export", request).await
    }

    /// Raw file body for a direct download.
    pub async fn export_direct(
        &self,
        enhanced_id: i64,
        format: DirectFormat,
    ) -> Result<Bytes, ClientError> {
        let path = format!("/export/{}/{enhanced_id}", format.path_segment());
        let response = self.send(self.request(Method::GET, &path)).await?;
        Ok(response.bytes().await?)
    }

    // ────────────────────────────────────────────────────────────────────────
    // Usage
    // ────────────────────────────────────────────────────────────────────────

    pub async fn usage_limits(&self) -> Result<UsageLimits, ClientError> {
        self.get_json("/usage/limits").await
    }

    pub async fn reset_usage(&self) -> Result<UsageReset, ClientError> {
        let response = self.send(self.request(Method::POST, "/usage/reset")).await?;
        decode(response).await
    }

    // ────────────────────────────────────────────────────────────────────────
    // Plumbing
    // ────────────────────────────────────────────────────────────────────────

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!("{method} {url}");
        let builder = self.client.request(method, url);
        match self.session.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self.send(self.request(Method::GET, path)).await?;
        decode(response).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let response = self
            .send(self.request(Method::POST, path).json(body))
            .await?;
        decode(response).await
    }

    /// Sends a request and turns every non-2xx status into a `ClientError`.
    async fn send(&self, builder: RequestBuilder) -> Result<Response, ClientError> {
        let response = builder.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            warn!("Backend answered 401 for {}; clearing session", response.url().path());
            self.session.clear();
            self.navigator.to_login();
            return Err(ClientError::Unauthorized);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = error_message(status, &body);
            debug!("Backend answered {status}: {message}");
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

/// Pulls a human-readable message out of an error body.
/// Accepts `{"message": ..}`, `{"error": ".."}` and `{"error": {"message": ..}}`.
fn error_message(status: StatusCode, body: &str) -> String {
    let parsed = serde_json::from_str::<Value>(body).ok();
    parsed
        .as_ref()
        .and_then(|v| {
            v.get("message").and_then(Value::as_str).or_else(|| {
                v.get("error").and_then(|e| {
                    e.as_str()
                        .or_else(|| e.get("message").and_then(Value::as_str))
                })
            })
        })
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()))
}

#[cfg(test)]
mod tests {
    use super::navigation::testing::RecordingNavigator;
    use super::*;
    use crate::models::{ExportFormat, Mode, Session};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn resume_json(id: i64) -> Value {
        json!({
            "id": id,
            "fileUrl": null,
            "rawText": "Jane Doe\nRust engineer",
            "parsedJson": {"skills": ["Rust"]},
            "parseError": false,
            "createdAt": "2024-05-01T10:00:00"
        })
    }

    fn enhanced_json(id: i64, resume_id: i64) -> Value {
        json!({
            "id": id,
            "resumeId": resume_id,
            "enhancedText": format!("version {id}"),
            "language": "EN",
            "suggestions": null,
            "enhancementType": "rewrite",
            "createdAt": "2024-05-01T10:00:00"
        })
    }

    fn signed_in_client(server: &MockServer) -> (ApiClient, Arc<RecordingNavigator>) {
        let session = SessionStore::in_memory();
        session
            .save(Session {
                user_id: 1,
                email: "a@b.com".into(),
                token: "T".into(),
            })
            .unwrap();
        let navigator = Arc::new(RecordingNavigator::default());
        let client = ApiClient::new(
            format!("{}/api/v1", server.uri()),
            Duration::from_secs(5),
            session,
            navigator.clone(),
        )
        .unwrap();
        (client, navigator)
    }

    #[test]
    fn test_error_message_prefers_message_field() {
        let msg = error_message(StatusCode::BAD_REQUEST, r#"{"message":"Bad input"}"#);
        assert_eq!(msg, "Bad input");
    }

    #[test]
    fn test_error_message_reads_error_string() {
        let msg = error_message(StatusCode::BAD_REQUEST, r#"{"error": "Invalid credentials"}"#);
        assert_eq!(msg, "Invalid credentials");
    }

    #[test]
    fn test_error_message_reads_nested_error() {
        let body = r#"{"error":{"code":"NOT_FOUND","message":"Resume 4 not found"}}"#;
        assert_eq!(error_message(StatusCode::NOT_FOUND, body), "Resume 4 not found");
    }

    #[test]
    fn test_error_message_falls_back_to_status() {
        assert_eq!(
            error_message(StatusCode::INTERNAL_SERVER_ERROR, "<html>oops</html>"),
            "Request failed with status 500"
        );
        assert_eq!(
            error_message(StatusCode::BAD_GATEWAY, r#"{"message":"  "}"#),
            "Request failed with status 502"
        );
    }

    #[tokio::test]
    async fn test_bearer_token_is_attached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/resumes/3"))
            .and(header("authorization", "Bearer T"))
            .respond_with(ResponseTemplate::new(200).set_body_json(resume_json(3)))
            .expect(1)
            .mount(&server)
            .await;

        let (client, _) = signed_in_client(&server);
        let resume = client.get_resume(3).await.unwrap();
        assert_eq!(resume.id, 3);
    }

    #[tokio::test]
    async fn test_no_header_without_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/auth/login"))
            .and(body_json(json!({"email": "a@b.com", "password": "12345678"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"userId": 1, "email": "a@b.com", "token": "T"})),
            )
            .mount(&server)
            .await;

        let client = ApiClient::new(
            format!("{}/api/v1/", server.uri()),
            Duration::from_secs(5),
            SessionStore::in_memory(),
            Arc::new(RecordingNavigator::default()),
        )
        .unwrap();
        let response = client
            .login(&AuthRequest {
                email: "a@b.com".into(),
                password: "12345678".into(),
                full_name: None,
            })
            .await
            .unwrap();
        assert_eq!(response.token, "T");

        let requests = server.received_requests().await.unwrap();
        assert!(requests[0].headers.get("authorization").is_none());
    }

    #[tokio::test]
    async fn test_unauthorized_clears_session_on_any_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        for call in ["resume", "versions", "usage"] {
            let (client, navigator) = signed_in_client(&server);
            let err = match call {
                "resume" => client.get_resume(1).await.unwrap_err(),
                "versions" => client.get_enhanced_versions(1).await.unwrap_err(),
                _ => client.usage_limits().await.unwrap_err(),
            };
            assert!(matches!(err, ClientError::Unauthorized), "{call}");
            assert!(!client.session().is_authenticated(), "{call}");
            assert!(client.session().restore().is_none(), "{call}");
            assert_eq!(navigator.login_count(), 1, "{call}");
        }
    }

    #[tokio::test]
    async fn test_unauthorized_from_post_clears_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/enhance"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let (client, navigator) = signed_in_client(&server);
        let err = client
            .enhance(&EnhanceRequest {
                resume_id: 1,
                job_description: None,
                output_language: None,
                mode: Mode::Local,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Unauthorized));
        assert!(!client.session().is_authenticated());
        assert_eq!(navigator.login_count(), 1);
    }

    #[tokio::test]
    async fn test_server_error_message_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/resumes/text"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(json!({"error": "Resume text must be at least 50 characters"})),
            )
            .mount(&server)
            .await;

        let (client, navigator) = signed_in_client(&server);
        let err = client.create_text_resume("short").await.unwrap_err();
        match err {
            ClientError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Resume text must be at least 50 characters");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(client.session().is_authenticated());
        assert_eq!(navigator.login_count(), 0);
    }

    #[tokio::test]
    async fn test_enhanced_versions_keep_server_order_and_repeat() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/resumes/3/enhanced"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                enhanced_json(12, 3),
                enhanced_json(10, 3),
                enhanced_json(11, 3)
            ])))
            .expect(2)
            .mount(&server)
            .await;

        let (client, _) = signed_in_client(&server);
        let first = client.get_enhanced_versions(3).await.unwrap();
        let second = client.get_enhanced_versions(3).await.unwrap();
        let ids: Vec<i64> = first.iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![12, 10, 11]);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_oversized_upload_never_hits_network() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/resumes/upload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(resume_json(1)))
            .expect(0)
            .mount(&server)
            .await;

        let (client, _) = signed_in_client(&server);
        let six_mb = vec![b'a'; 6 * 1024 * 1024];
        let err = client
            .upload_resume_bytes("resume.txt", six_mb)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_oversized_file_on_disk_rejected_before_read() {
        let server = MockServer::start().await;
        let tmp = tempfile::TempDir::new().expect("tmp dir");
        let file = tmp.path().join("resume.pdf");
        let handle = std::fs::File::create(&file).unwrap();
        handle.set_len(6 * 1024 * 1024).unwrap();

        let (client, _) = signed_in_client(&server);
        let err = client.upload_resume(&file).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upload_sends_multipart_file() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/resumes/upload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(resume_json(5)))
            .expect(1)
            .mount(&server)
            .await;

        let (client, _) = signed_in_client(&server);
        let resume = client
            .upload_resume_bytes("resume.md", b"# Jane Doe".to_vec())
            .await
            .unwrap();
        assert_eq!(resume.id, 5);

        let requests = server.received_requests().await.unwrap();
        let content_type = requests[0]
            .headers
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(content_type.starts_with("multipart/form-data"));
        let body = String::from_utf8_lossy(&requests[0].body);
        assert!(body.contains("name=\"file\""));
        assert!(body.contains("filename=\"resume.md\""));
    }

    #[tokio::test]
    async fn test_export_envelope_request_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/export"))
            .and(body_json(json!({"enhancedResumeId": 9, "format": "pdf"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "downloadUrl": null,
                "format": "pdf",
                "filename": "resume_9.pdf",
                "fileSize": null
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (client, _) = signed_in_client(&server);
        let envelope = client
            .export(&ExportRequest {
                enhanced_resume_id: 9,
                format: ExportFormat::Pdf,
                filename: None,
            })
            .await
            .unwrap();
        assert!(envelope.download_url.is_none());
    }

    #[tokio::test]
    async fn test_malformed_success_body_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/usage/limits"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let (client, _) = signed_in_client(&server);
        let err = client.usage_limits().await.unwrap_err();
        assert!(matches!(err, ClientError::Parse(_)));
    }
}
