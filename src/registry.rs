//! Registry data model
//!
//! The typed graph decoded from a registry document. It is built once per
//! invocation and read by every validator and generator; only the digest
//! repair operation mutates it.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, LoadError, Result};

/// Language code → text. Ordered by key so serialization is stable; the
/// fallback order comes from the project's declared languages, never from
/// this map.
pub type LocalizedText = BTreeMap<String, String>;

// =============================================================================
// Enumerations
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Internal,
    Draft,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Internal => "internal",
            Self::Draft => "draft",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Draft,
    Published,
    Archived,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Archived => "archived",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentStatus {
    Draft,
    Published,
    Archived,
    Missing,
}

impl ContentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Archived => "archived",
            Self::Missing => "missing",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LanguageStatus {
    #[default]
    Active,
    Inactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VersionStatus {
    #[default]
    Active,
    Deprecated,
    Beta,
}

// =============================================================================
// Entities
// =============================================================================

/// Root of a registry document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registry {
    pub schema_version: String,
    pub metadata: RegistryMetadata,
    pub projects: Vec<Project>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintainer: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub display_name: LocalizedText,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub description: LocalizedText,
    pub languages: Vec<Language>,
    pub versions: Vec<Version>,
    #[serde(default)]
    pub categories: Vec<Category>,
    pub documents: Vec<Document>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub licenses: Vec<License>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub glossary: Vec<GlossaryEntry>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub options: ProjectOptions,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectOptions {
    #[serde(default)]
    pub search: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Language {
    pub code: String,
    pub display_name: LocalizedText,
    #[serde(default)]
    pub status: LanguageStatus,
    #[serde(default)]
    pub default: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub is_latest: bool,
    #[serde(default)]
    pub status: VersionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    #[serde(deserialize_with = "order::deserialize")]
    pub order: i64,
    pub title: LocalizedText,
    #[serde(default)]
    pub docs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Category>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub slug: String,
    pub title: LocalizedText,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub summary: LocalizedText,
    pub versions: Vec<String>,
    pub status: DocumentStatus,
    pub visibility: Visibility,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub content: BTreeMap<String, ContentEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contributors: Vec<String>,
    #[serde(
        default,
        deserialize_with = "order::option::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub order: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentEntry {
    pub path: String,
    pub status: ContentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct License {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribution: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlossaryEntry {
    pub term: String,
    pub definition: LocalizedText,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related: Vec<String>,
}

/// Sort keys accept any JSON integer the schema accepts: `1.0` is read as
/// `1` and values past the `i64` range saturate.
mod order {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    #[derive(Clone, Copy, Deserialize)]
    #[serde(untagged)]
    enum RawOrder {
        Signed(i64),
        Unsigned(u64),
        Float(f64),
    }

    impl RawOrder {
        fn to_i64(self) -> Result<i64, String> {
            match self {
                Self::Signed(n) => Ok(n),
                Self::Unsigned(n) => Ok(i64::try_from(n).unwrap_or(i64::MAX)),
                // `as` saturates at the i64 bounds
                Self::Float(f) if f.is_finite() && f.fract() == 0.0 => Ok(f as i64),
                Self::Float(f) => Err(format!("order must be an integer, got {}", f)),
            }
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        RawOrder::deserialize(deserializer)?.to_i64().map_err(D::Error::custom)
    }

    pub mod option {
        use serde::de::Error;
        use serde::{Deserialize, Deserializer};

        use super::RawOrder;

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
            Option::<RawOrder>::deserialize(deserializer)?
                .map(RawOrder::to_i64)
                .transpose()
                .map_err(D::Error::custom)
        }
    }
}

// =============================================================================
// Lookups
// =============================================================================

impl Registry {
    /// Decode a raw document that has already passed the loader's shape check
    pub fn from_value(value: serde_json::Value) -> std::result::Result<Self, LoadError> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn require_project(&self, id: &str) -> Result<&Project> {
        self.project(id)
            .ok_or_else(|| EngineError::ProjectNotFound(id.to_string()))
    }

    /// Write the registry back as pretty JSON, TOML or YAML depending on the
    /// extension. Used after digest repair.
    pub fn save(&self, path: &Path) -> Result<()> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("json")
            .to_ascii_lowercase();
        let content = match ext.as_str() {
            "yaml" | "yml" => serde_yaml::to_string(self)
                .map_err(|e| EngineError::Serialize(e.to_string()))?,
            "toml" => toml::to_string_pretty(self)
                .map_err(|e| EngineError::Serialize(e.to_string()))?,
            _ => serde_json::to_string_pretty(self)?,
        };
        std::fs::write(path, content)?;
        Ok(())
    }
}

impl Project {
    /// The language flagged default, or the first declared language
    pub fn default_language(&self) -> Option<&Language> {
        self.languages
            .iter()
            .find(|l| l.default)
            .or_else(|| self.languages.first())
    }

    pub fn default_language_code(&self) -> &str {
        self.default_language().map(|l| l.code.as_str()).unwrap_or("en")
    }

    pub fn language(&self, code: &str) -> Option<&Language> {
        self.languages.iter().find(|l| l.code == code)
    }

    pub fn version(&self, id: &str) -> Option<&Version> {
        self.versions.iter().find(|v| v.id == id)
    }

    pub fn latest_version(&self) -> Option<&Version> {
        self.versions.iter().find(|v| v.is_latest)
    }

    pub fn document(&self, id: &str) -> Option<&Document> {
        self.documents.iter().find(|d| d.id == id)
    }

    pub fn require_version(&self, id: &str) -> Result<&Version> {
        self.version(id).ok_or_else(|| EngineError::VersionNotFound {
            project: self.id.clone(),
            version: id.to_string(),
        })
    }

    pub fn require_language(&self, code: &str) -> Result<&Language> {
        self.language(code)
            .ok_or_else(|| EngineError::LanguageNotFound {
                project: self.id.clone(),
                language: code.to_string(),
            })
    }

    /// Ordered languages to try for `requested`: the language itself, its
    /// declared fallback, the project default, then every declared language
    /// in declaration order.
    pub fn fallback_chain<'a>(&'a self, requested: &'a str) -> Vec<&'a str> {
        let mut chain: Vec<&str> = Vec::with_capacity(self.languages.len() + 2);
        let mut push = |code: &'a str| {
            if !chain.contains(&code) {
                chain.push(code);
            }
        };

        push(requested);
        if let Some(fallback) = self.language(requested).and_then(|l| l.fallback.as_deref()) {
            push(fallback);
        }
        if let Some(default) = self.default_language() {
            push(&default.code);
        }
        for lang in &self.languages {
            push(&lang.code);
        }
        chain
    }

    /// Resolve localized text through the fallback chain. Keys not declared
    /// as project languages are tried last, in key order.
    pub fn localize<'t>(&self, text: &'t LocalizedText, requested: &str) -> Option<&'t str> {
        self.fallback_chain(requested)
            .into_iter()
            .find_map(|code| text.get(code))
            .or_else(|| text.values().next())
            .map(String::as_str)
    }

    /// Same as [`Project::localize`] but never empty; falls back to `fallback`.
    pub fn localize_or<'t>(&self, text: &'t LocalizedText, requested: &str, fallback: &'t str) -> &'t str {
        self.localize(text, requested).unwrap_or(fallback)
    }

    pub fn has_licenses(&self) -> bool {
        !self.licenses.is_empty()
    }
}

impl Document {
    pub fn applies_to_version(&self, version: &str) -> bool {
        self.versions.iter().any(|v| v == version)
    }

    pub fn content_for(&self, language: &str) -> Option<&ContentEntry> {
        self.content.get(language)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn project() -> Project {
        serde_json::from_value(json!({
            "id": "guide",
            "displayName": { "en": "Guide", "ja": "ガイド" },
            "languages": [
                { "code": "ja", "displayName": { "ja": "日本語" }, "fallback": "en" },
                { "code": "en", "displayName": { "en": "English" }, "default": true },
                { "code": "fr", "displayName": { "fr": "Français" } }
            ],
            "versions": [
                { "id": "v1", "displayName": "1.x" },
                { "id": "v2", "displayName": "2.x", "isLatest": true }
            ],
            "documents": []
        }))
        .unwrap()
    }

    #[test]
    fn test_default_language_and_latest() {
        let p = project();
        assert_eq!(p.default_language_code(), "en");
        assert_eq!(p.latest_version().map(|v| v.id.as_str()), Some("v2"));
        assert_eq!(p.visibility, Visibility::Public);
    }

    #[test]
    fn test_fallback_chain_order() {
        let p = project();
        assert_eq!(p.fallback_chain("fr"), vec!["fr", "en", "ja"]);
        assert_eq!(p.fallback_chain("ja"), vec!["ja", "en", "fr"]);
        assert_eq!(p.fallback_chain("de"), vec!["de", "en", "ja", "fr"]);
    }

    #[test]
    fn test_localize_uses_declared_order() {
        let p = project();
        let mut text = LocalizedText::new();
        text.insert("fr".into(), "Bonjour".into());
        text.insert("ja".into(), "こんにちは".into());

        // en absent: the next declared language wins, not the map's first key
        assert_eq!(p.localize(&text, "de"), Some("こんにちは"));
        assert_eq!(p.localize(&text, "fr"), Some("Bonjour"));
        assert_eq!(p.localize(&LocalizedText::new(), "en"), None);
    }

    #[test]
    fn test_order_accepts_any_json_integer() {
        let category: Category = serde_json::from_value(json!({
            "id": "basics", "order": 2.0, "title": { "en": "Basics" }
        }))
        .unwrap();
        assert_eq!(category.order, 2);

        let category: Category = serde_json::from_value(json!({
            "id": "basics", "order": u64::MAX, "title": { "en": "Basics" }
        }))
        .unwrap();
        assert_eq!(category.order, i64::MAX);

        let doc = |order: serde_json::Value| -> std::result::Result<Document, serde_json::Error> {
            let mut value = json!({
                "id": "intro", "slug": "intro", "title": { "en": "Intro" },
                "versions": ["v1"], "status": "published", "visibility": "public",
                "content": {}
            });
            if !order.is_null() {
                value["order"] = order;
            }
            serde_json::from_value(value)
        };
        assert_eq!(doc(json!(1.0)).unwrap().order, Some(1));
        assert_eq!(doc(json!(-3)).unwrap().order, Some(-3));
        assert_eq!(doc(serde_json::Value::Null).unwrap().order, None);
        assert!(doc(json!(1.5)).is_err());
    }
}
