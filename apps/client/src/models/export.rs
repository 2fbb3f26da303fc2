use serde::{Deserialize, Serialize};

/// Formats accepted by `POST /export`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Markdown,
    Pdf,
}

/// Formats served as a raw file body from `GET /export/<kind>/{id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectFormat {
    Markdown,
    Html,
    Compare,
}

impl DirectFormat {
    pub fn path_segment(self) -> &'static str {
        match self {
            DirectFormat::Markdown => "markdown",
            DirectFormat::Html => "html",
            DirectFormat::Compare => "compare",
        }
    }

    /// Local file name for a downloaded body, e.g. `resume_7.md` or `comparison_7.html`.
    pub fn file_name(self, enhanced_id: i64) -> String {
        match self {
            DirectFormat::Markdown => format!("resume_{enhanced_id}.md"),
            DirectFormat::Html => format!("resume_{enhanced_id}.html"),
            DirectFormat::Compare => format!("comparison_{enhanced_id}.html"),
        }
    }
}

/// `POST /export`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub enhanced_resume_id: i64,
    pub format: ExportFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

/// Envelope for asynchronous exports. A null `download_url` means the file
/// does not exist yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportEnvelope {
    #[serde(default)]
    pub download_url: Option<String>,
    pub format: String,
    pub filename: String,
    #[serde(default)]
    pub file_size: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_file_names() {
        assert_eq!(DirectFormat::Markdown.file_name(7), "resume_7.md");
        assert_eq!(DirectFormat::Html.file_name(7), "resume_7.html");
        assert_eq!(DirectFormat::Compare.file_name(7), "comparison_7.html");
    }

    #[test]
    fn test_envelope_with_null_url() {
        let json = r#"{"downloadUrl":null,"format":"pdf","filename":"resume.pdf","fileSize":null}"#;
        let envelope: ExportEnvelope = serde_json::from_str(json).unwrap();
        assert!(envelope.download_url.is_none());
        assert_eq!(envelope.filename, "resume.pdf");
    }
}
