use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A resume as returned by `GET /resumes/{id}`.
/// Mutated only by server-side processing; the client re-fetches to see changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resume {
    pub id: i64,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub raw_text: Option<String>,
    #[serde(default)]
    pub parsed_json: Option<Value>,
    #[serde(default, deserialize_with = "null_as_false")]
    pub parse_error: bool,
    pub created_at: NaiveDateTime,
}

impl Resume {
    /// Typed view over `parsed_json`. `None` until parsing has finished.
    pub fn parsed(&self) -> Option<ParsedResume> {
        self.parsed_json
            .as_ref()
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

/// Structured fields extracted by the external parser.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsedResume {
    pub skills: Vec<String>,
    pub experiences: Vec<Experience>,
    pub education: Vec<Education>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Experience {
    pub company: String,
    pub title: String,
    pub years: String,
    pub bullets: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Education {
    pub institution: String,
    pub degree: String,
    pub field: String,
    pub years: String,
}

/// Body for `POST /resumes/text`.
#[derive(Debug, Clone, Serialize)]
pub struct TextResumeRequest {
    pub text: String,
}

fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_resume_deserializes() {
        let json = r#"{"id":3,"fileUrl":"uploads/a.pdf","rawText":null,"parsedJson":null,"parseError":false,"createdAt":"2024-05-01T10:00:00"}"#;
        let resume: Resume = serde_json::from_str(json).unwrap();
        assert_eq!(resume.id, 3);
        assert!(resume.raw_text.is_none());
        assert!(resume.parsed().is_none());
    }

    #[test]
    fn test_null_parse_error_reads_as_false() {
        let json = r#"{"id":3,"parseError":null,"createdAt":"2024-05-01T10:00:00.123456"}"#;
        let resume: Resume = serde_json::from_str(json).unwrap();
        assert!(!resume.parse_error);
    }

    #[test]
    fn test_parsed_view_tolerates_missing_sections() {
        let json = r#"{"id":3,"rawText":"x","parsedJson":{"skills":["Rust","SQL"]},"parseError":false,"createdAt":"2024-05-01T10:00:00"}"#;
        let resume: Resume = serde_json::from_str(json).unwrap();
        let parsed = resume.parsed().unwrap();
        assert_eq!(parsed.skills, vec!["Rust", "SQL"]);
        assert!(parsed.experiences.is_empty());
    }
}
