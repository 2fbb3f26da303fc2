//! Getting an enhanced resume out of the system.
//!
//! Direct downloads write the raw body to the download directory. Envelope
//! exports only hand back a URL; a null URL is reported as unavailable and
//! nothing is opened.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::api_client::ApiClient;
use crate::errors::ClientError;
use crate::models::{DirectFormat, ExportEnvelope, ExportFormat, ExportRequest};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExportOutcome {
    /// The file exists at `url`, which has been handed to the navigator.
    Ready {
        url: String,
        filename: String,
        format: String,
        file_size: Option<u64>,
    },
    Unavailable {
        filename: String,
        format: String,
    },
}

impl From<ExportEnvelope> for ExportOutcome {
    fn from(envelope: ExportEnvelope) -> Self {
        match envelope.download_url {
            Some(url) if !url.trim().is_empty() => ExportOutcome::Ready {
                url,
                filename: envelope.filename,
                format: envelope.format,
                file_size: envelope.file_size,
            },
            _ => ExportOutcome::Unavailable {
                filename: envelope.filename,
                format: envelope.format,
            },
        }
    }
}

pub struct Exporter {
    api: ApiClient,
    download_dir: PathBuf,
}

impl Exporter {
    pub fn new(api: ApiClient, download_dir: impl Into<PathBuf>) -> Self {
        Self {
            api,
            download_dir: download_dir.into(),
        }
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Fetches the raw body and saves it under `DirectFormat::file_name`.
    pub async fn download(
        &self,
        enhanced_id: i64,
        format: DirectFormat,
    ) -> Result<PathBuf, ClientError> {
        let body = self.api.export_direct(enhanced_id, format).await?;

        tokio::fs::create_dir_all(&self.download_dir).await?;
        let target = self.download_dir.join(format.file_name(enhanced_id));
        tokio::fs::write(&target, &body).await?;

        info!(
            "Saved {} export of enhanced resume {enhanced_id} to {} ({} bytes)",
            format.path_segment(),
            target.display(),
            body.len()
        );
        Ok(target)
    }

    /// Requests a generated file through `POST /export` and opens it when ready.
    pub async fn export(
        &self,
        enhanced_id: i64,
        format: ExportFormat,
        filename: Option<String>,
    ) -> Result<ExportOutcome, ClientError> {
        let request = ExportRequest {
            enhanced_resume_id: enhanced_id,
            format,
            filename: filename.filter(|f| !f.trim().is_empty()),
        };
        let outcome = ExportOutcome::from(self.api.export(&request).await?);

        match &outcome {
            ExportOutcome::Ready { url, .. } => self.api.navigator().open(url)?,
            ExportOutcome::Unavailable { filename, .. } => {
                warn!("Export {filename} for enhanced resume {enhanced_id} has no download URL yet")
            }
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::api_client::navigation::testing::RecordingNavigator;
    use crate::session::SessionStore;

    fn exporter(server: &MockServer, dir: &Path) -> (Exporter, Arc<RecordingNavigator>) {
        let navigator = Arc::new(RecordingNavigator::default());
        let api = ApiClient::new(
            format!("{}/api/v1", server.uri()),
            Duration::from_secs(5),
            SessionStore::in_memory(),
            navigator.clone(),
        )
        .unwrap();
        (Exporter::new(api, dir), navigator)
    }

    #[tokio::test]
    async fn test_markdown_download_skips_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/export/markdown/7"))
            .respond_with(ResponseTemplate::new(200).set_body_string("# Jane Doe\n"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/export"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let (exporter, _) = exporter(&server, &dir.path().join("downloads"));
        let saved = exporter.download(7, DirectFormat::Markdown).await.unwrap();

        assert_eq!(saved, dir.path().join("downloads").join("resume_7.md"));
        assert_eq!(std::fs::read_to_string(&saved).unwrap(), "# Jane Doe\n");
    }

    #[tokio::test]
    async fn test_compare_download_file_name() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/export/compare/9"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let (exporter, _) = exporter(&server, dir.path());
        let saved = exporter.download(9, DirectFormat::Compare).await.unwrap();
        assert_eq!(saved.file_name().unwrap(), "comparison_9.html");
    }

    #[tokio::test]
    async fn test_pdf_export_opens_download_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/export"))
            .and(body_json(json!({"enhancedResumeId": 7, "format": "pdf"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "downloadUrl": "https://files.example.com/resume_7.pdf",
                "format": "pdf",
                "filename": "resume_7.pdf",
                "fileSize": 2048
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let (exporter, navigator) = exporter(&server, dir.path());
        let outcome = exporter.export(7, ExportFormat::Pdf, None).await.unwrap();

        assert!(matches!(outcome, ExportOutcome::Ready { file_size: Some(2048), .. }));
        assert_eq!(
            navigator.opened(),
            vec!["https://files.example.com/resume_7.pdf".to_string()]
        );
    }

    #[tokio::test]
    async fn test_null_download_url_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/export"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "downloadUrl": null,
                "format": "pdf",
                "filename": "resume_7.pdf",
                "fileSize": null
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let (exporter, navigator) = exporter(&server, dir.path());
        let outcome = exporter
            .export(7, ExportFormat::Pdf, Some("cv.pdf".into()))
            .await
            .unwrap();

        assert!(matches!(outcome, ExportOutcome::Unavailable { .. }));
        assert!(navigator.opened().is_empty());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
