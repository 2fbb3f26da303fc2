//! The enhanced versions known for the viewed resume, plus the selection.
//!
//! Suggestion-only requests produce no server record, so they are held as
//! `EnhancedVersion::Transient`. The server list is authoritative: any
//! re-fetch replaces the collection and transient drafts disappear.

use chrono::{NaiveDateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{EnhancedResume, EnhancementType, Language};

/// Client-local suggestion list shaped like an enhanced resume.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionDraft {
    pub id: Uuid,
    pub resume_id: i64,
    pub suggestions: Vec<String>,
    pub created_at: NaiveDateTime,
}

impl SuggestionDraft {
    pub fn new(resume_id: i64, suggestions: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            resume_id,
            suggestions,
            created_at: Utc::now().naive_utc(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "origin", content = "id", rename_all = "snake_case")]
pub enum VersionKey {
    Stored(i64),
    Transient(Uuid),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "origin", rename_all = "snake_case")]
pub enum EnhancedVersion {
    Stored(EnhancedResume),
    Transient(SuggestionDraft),
}

impl EnhancedVersion {
    pub fn key(&self) -> VersionKey {
        match self {
            EnhancedVersion::Stored(v) => VersionKey::Stored(v.id),
            EnhancedVersion::Transient(d) => VersionKey::Transient(d.id),
        }
    }

    pub fn enhancement_type(&self) -> EnhancementType {
        match self {
            EnhancedVersion::Stored(v) => v.enhancement_type,
            EnhancedVersion::Transient(_) => EnhancementType::Suggest,
        }
    }

    pub fn language(&self) -> Language {
        match self {
            EnhancedVersion::Stored(v) => v.language.clone(),
            EnhancedVersion::Transient(_) => Language::Original,
        }
    }

    /// Display text. Drafts render their suggestions as a numbered list.
    pub fn text(&self) -> String {
        match self {
            EnhancedVersion::Stored(v) => v.enhanced_text.clone(),
            EnhancedVersion::Transient(d) => d
                .suggestions
                .iter()
                .enumerate()
                .map(|(i, s)| format!("{}. {s}", i + 1))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    pub fn suggestions(&self) -> &[String] {
        match self {
            EnhancedVersion::Stored(v) => v.suggestions.as_deref().unwrap_or(&[]),
            EnhancedVersion::Transient(d) => &d.suggestions,
        }
    }

    /// Server id usable with the export endpoints.
    pub fn exportable_id(&self) -> Option<i64> {
        match self {
            EnhancedVersion::Stored(v) => Some(v.id),
            EnhancedVersion::Transient(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VersionCollection {
    versions: Vec<EnhancedVersion>,
    selected: Option<VersionKey>,
}

impl VersionCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces everything with the server's list, in server order.
    /// The selection survives only if the selected record is still listed.
    pub fn replace_from_server(&mut self, versions: Vec<EnhancedResume>) {
        self.versions = versions.into_iter().map(EnhancedVersion::Stored).collect();
        if let Some(key) = self.selected {
            if !self.contains(key) {
                self.selected = None;
            }
        }
    }

    /// Adds a new version (replacing one with the same key) and selects it.
    pub fn push_selected(&mut self, version: EnhancedVersion) {
        let key = version.key();
        match self.versions.iter_mut().find(|v| v.key() == key) {
            Some(existing) => *existing = version,
            None => self.versions.push(version),
        }
        self.selected = Some(key);
    }

    /// Returns false when the key is unknown; the selection is unchanged then.
    pub fn select(&mut self, key: VersionKey) -> bool {
        if self.contains(key) {
            self.selected = Some(key);
            true
        } else {
            false
        }
    }

    pub fn selected(&self) -> Option<&EnhancedVersion> {
        let key = self.selected?;
        self.versions.iter().find(|v| v.key() == key)
    }

    pub fn get(&self, key: VersionKey) -> Option<&EnhancedVersion> {
        self.versions.iter().find(|v| v.key() == key)
    }

    pub fn contains(&self, key: VersionKey) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EnhancedVersion> {
        self.versions.iter()
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    pub fn transient_count(&self) -> usize {
        self.versions
            .iter()
            .filter(|v| matches!(v, EnhancedVersion::Transient(_)))
            .count()
    }
}
