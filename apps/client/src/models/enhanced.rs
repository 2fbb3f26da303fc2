use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Language of an enhanced version. Codes the client does not know are kept
/// as sent so they can be shown and written back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Language {
    Original,
    En,
    Zh,
    Other(String),
}

impl Language {
    pub fn code(&self) -> &str {
        match self {
            Language::Original => "ORIGINAL",
            Language::En => "EN",
            Language::Zh => "ZH",
            Language::Other(code) => code,
        }
    }
}

impl From<String> for Language {
    fn from(code: String) -> Self {
        match code.as_str() {
            "ORIGINAL" => Language::Original,
            "EN" => Language::En,
            "ZH" => Language::Zh,
            _ => Language::Other(code),
        }
    }
}

impl From<Language> for String {
    fn from(language: Language) -> Self {
        match language {
            Language::Other(code) => code,
            known => known.code().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnhancementType {
    Rewrite,
    Translate,
    Suggest,
}

/// Which engine the backend should use. The server may silently fall back
/// from `gpt` to `local`; that decision is not the client's.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Local,
    Gpt,
}

/// A derived artifact generated from a resume. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedResume {
    pub id: i64,
    pub resume_id: i64,
    pub enhanced_text: String,
    pub language: Language,
    #[serde(default)]
    pub suggestions: Option<Vec<String>>,
    pub enhancement_type: EnhancementType,
    pub created_at: NaiveDateTime,
}

// ────────────────────────────────────────────────────────────────────────────
// Request bodies
// ────────────────────────────────────────────────────────────────────────────

/// `POST /analyze`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub resume_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_description: Option<String>,
    pub mode: Mode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_refresh: Option<bool>,
}

/// `POST /enhance`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhanceRequest {
    pub resume_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_language: Option<String>,
    pub mode: Mode,
}

/// `POST /suggestions`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionRequest {
    pub resume_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_description: Option<String>,
    pub mode: Mode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SuggestionResponse {
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// `POST /translate`. Either `resume_id` or free `text` is translated.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub target_lang: String,
    pub mode: Mode,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enhanced_resume_deserializes() {
        let json = r#"{"id":9,"resumeId":3,"enhancedText":"Led 4 teams","language":"EN","suggestions":null,"enhancementType":"rewrite","createdAt":"2024-05-01T10:00:00"}"#;
        let enhanced: EnhancedResume = serde_json::from_str(json).unwrap();
        assert_eq!(enhanced.language, Language::En);
        assert_eq!(enhanced.enhancement_type, EnhancementType::Rewrite);
        assert!(enhanced.suggestions.is_none());
    }

    #[test]
    fn test_unknown_language_keeps_its_code() {
        let lang: Language = serde_json::from_str(r#""FR""#).unwrap();
        assert_eq!(lang, Language::Other("FR".into()));
        assert_eq!(lang.code(), "FR");
        assert_eq!(serde_json::to_string(&lang).unwrap(), r#""FR""#);
        assert_eq!(
            serde_json::to_string(&Language::Original).unwrap(),
            r#""ORIGINAL""#
        );
    }

    #[test]
    fn test_enhance_request_wire_shape() {
        let req = EnhanceRequest {
            resume_id: 3,
            job_description: None,
            output_language: Some("zh".into()),
            mode: Mode::Gpt,
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            serde_json::json!({"resumeId": 3, "outputLanguage": "zh", "mode": "gpt"})
        );
    }

    #[test]
    fn test_translate_request_omits_absent_fields() {
        let req = TranslateRequest {
            resume_id: Some(3),
            text: None,
            target_lang: "en".into(),
            mode: Mode::Local,
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            serde_json::json!({"resumeId": 3, "targetLang": "en", "mode": "local"})
        );
    }
}
