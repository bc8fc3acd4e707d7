//! Sitemap Generation
//!
//! One `<url>` per published (project, version, language, document), with
//! the latest version boosted in priority.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::routes::RouteParams;
use super::{content_is_buildable, normalize_slashes};
use crate::error::EngineError;
use crate::registry::{Project, Registry};
use crate::visibility::{allows, Environment};

pub const DEFAULT_PRIORITY: f64 = 0.5;
pub const DEFAULT_LATEST_BOOST: f64 = 0.3;

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFrequency {
    Always,
    Hourly,
    Daily,
    #[default]
    Weekly,
    Monthly,
    Yearly,
    Never,
}

impl ChangeFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
            Self::Never => "never",
        }
    }
}

impl fmt::Display for ChangeFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeFrequency {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "always" => Ok(Self::Always),
            "hourly" => Ok(Self::Hourly),
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            "never" => Ok(Self::Never),
            other => Err(EngineError::InvalidChangeFrequency(other.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SitemapOptions {
    pub environment: Environment,
    /// Absolute site root, e.g. `https://docs.example.com`
    pub base_url: String,
    pub default_changefreq: ChangeFrequency,
    pub default_priority: f64,
    pub latest_version_boost: f64,
}

impl Default for SitemapOptions {
    fn default() -> Self {
        Self {
            environment: Environment::Production,
            base_url: String::new(),
            default_changefreq: ChangeFrequency::Weekly,
            default_priority: DEFAULT_PRIORITY,
            latest_version_boost: DEFAULT_LATEST_BOOST,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SitemapEntry {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lastmod: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changefreq: Option<ChangeFrequency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<f64>,
}

/// Entry counts by priority bucket and change frequency
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SitemapSummary {
    pub total: usize,
    /// priority >= 0.8
    pub high: usize,
    /// 0.5 <= priority < 0.8
    pub medium: usize,
    pub low: usize,
    pub by_changefreq: BTreeMap<String, usize>,
}

/// Sitemap priorities carry three decimals; rounding also keeps sums such
/// as 0.5 + 0.3 at exactly 0.8.
fn priority(raw: f64) -> f64 {
    ((raw * 1000.0).round() / 1000.0).clamp(0.0, 1.0)
}

pub fn generate_sitemap(registry: &Registry, options: &SitemapOptions) -> Vec<SitemapEntry> {
    let mut entries = Vec::new();

    for project in &registry.projects {
        let decision = allows(project.visibility, &options.environment);
        if !decision.should_build {
            tracing::debug!(project = %project.id, reason = %decision.reason, "project left out of sitemap");
            continue;
        }
        project_entries(project, options, &mut entries);
    }

    tracing::info!(urls = entries.len(), "sitemap generated");
    entries
}

fn project_entries(project: &Project, options: &SitemapOptions, entries: &mut Vec<SitemapEntry>) {
    let base = options.base_url.trim_end_matches('/');

    for doc in &project.documents {
        if !allows(doc.visibility, &options.environment).should_build {
            continue;
        }
        for version_id in &doc.versions {
            let Some(version) = project.version(version_id) else {
                continue;
            };
            let boost = if version.is_latest {
                options.latest_version_boost
            } else {
                0.0
            };

            for language in &project.languages {
                let Some(entry) = doc.content_for(&language.code) else {
                    continue;
                };
                if !content_is_buildable(entry.status, &options.environment) {
                    continue;
                }
                let path = RouteParams {
                    project: project.id.clone(),
                    version: version.id.clone(),
                    lang: language.code.clone(),
                    slug: doc.slug.clone(),
                }
                .to_path();

                entries.push(SitemapEntry {
                    url: normalize_slashes(&format!("{}{}", base, path)),
                    lastmod: entry
                        .last_updated
                        .clone()
                        .or_else(|| version.release_date.clone()),
                    changefreq: Some(options.default_changefreq),
                    priority: Some(priority(options.default_priority + boost)),
                });
            }
        }
    }
}

/// Escape the five XML special characters
pub fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

/// `0.8`, `1.0`, `0.75`: at least one decimal, no trailing zeros beyond it
fn format_priority(value: f64) -> String {
    let fixed = format!("{:.3}", value);
    let trimmed = fixed.trim_end_matches('0');
    if trimmed.ends_with('.') {
        format!("{}0", trimmed)
    } else {
        trimmed.to_string()
    }
}

/// Serialize to the sitemaps.org 0.9 format
pub fn sitemap_to_xml(entries: &[SitemapEntry]) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str(&format!("<urlset xmlns=\"{}\">\n", SITEMAP_NS));

    for entry in entries {
        xml.push_str("  <url>\n");
        xml.push_str(&format!("    <loc>{}</loc>\n", escape_xml(&entry.url)));
        if let Some(lastmod) = &entry.lastmod {
            xml.push_str(&format!("    <lastmod>{}</lastmod>\n", escape_xml(lastmod)));
        }
        if let Some(freq) = entry.changefreq {
            xml.push_str(&format!("    <changefreq>{}</changefreq>\n", freq));
        }
        if let Some(priority) = entry.priority {
            xml.push_str(&format!("    <priority>{}</priority>\n", format_priority(priority)));
        }
        xml.push_str("  </url>\n");
    }

    xml.push_str("</urlset>\n");
    xml
}

pub fn summarize_sitemap(entries: &[SitemapEntry]) -> SitemapSummary {
    let mut summary = SitemapSummary {
        total: entries.len(),
        ..Default::default()
    };

    for entry in entries {
        match entry.priority.unwrap_or(DEFAULT_PRIORITY) {
            p if p >= 0.8 => summary.high += 1,
            p if p >= 0.5 => summary.medium += 1,
            _ => summary.low += 1,
        }
        let freq = entry
            .changefreq
            .map(|f| f.as_str())
            .unwrap_or("unspecified");
        *summary.by_changefreq.entry(freq.to_string()).or_insert(0) += 1;
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;
    use serde_json::json;

    fn registry() -> Registry {
        Registry::from_value(json!({
            "schemaVersion": "1.0.0",
            "metadata": {},
            "projects": [
                {
                    "id": "guide",
                    "displayName": { "en": "Guide" },
                    "languages": [
                        { "code": "en", "displayName": { "en": "English" }, "default": true },
                        { "code": "ja", "displayName": { "ja": "日本語" } }
                    ],
                    "versions": [
                        { "id": "v1", "displayName": "1.x", "releaseDate": "2024-01-01" },
                        { "id": "v2", "displayName": "2.x", "isLatest": true }
                    ],
                    "documents": [{
                        "id": "intro", "slug": "intro", "title": { "en": "Intro" },
                        "versions": ["v1", "v2", "v9"], "status": "published", "visibility": "public",
                        "content": {
                            "en": { "path": "en/intro.md", "status": "published",
                                    "lastUpdated": "2024-06-01T00:00:00Z" },
                            "ja": { "path": "ja/intro.md", "status": "draft" }
                        }
                    }]
                },
                {
                    "id": "ops",
                    "displayName": { "en": "Ops" },
                    "visibility": "internal",
                    "languages": [{ "code": "en", "displayName": { "en": "English" } }],
                    "versions": [{ "id": "v1", "displayName": "1.x", "isLatest": true }],
                    "documents": [{
                        "id": "runbook", "slug": "runbook", "title": { "en": "Runbook" },
                        "versions": ["v1"], "status": "published", "visibility": "public",
                        "content": { "en": { "path": "en/runbook.md", "status": "published" } }
                    }]
                }
            ]
        }))
        .unwrap()
    }

    fn options() -> SitemapOptions {
        SitemapOptions {
            base_url: "https://docs.example.com/".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_entries_in_production() {
        let entries = generate_sitemap(&registry(), &options());
        let urls: Vec<&str> = entries.iter().map(|e| e.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://docs.example.com/guide/v1/en/intro",
                "https://docs.example.com/guide/v2/en/intro",
            ]
        );
        assert_eq!(entries[0].lastmod.as_deref(), Some("2024-06-01T00:00:00Z"));
    }

    #[test]
    fn test_all_statuses_outside_production() {
        let entries = generate_sitemap(
            &registry(),
            &SitemapOptions {
                environment: Environment::Staging,
                ..options()
            },
        );
        // 2 versions x 2 languages for guide, plus the internal project
        assert_eq!(entries.len(), 5);
    }

    #[test]
    fn test_latest_boost() {
        let entries = generate_sitemap(&registry(), &options());
        assert_eq!(entries[0].priority, Some(0.5));
        assert_eq!(entries[1].priority, Some(0.8));

        let clipped = generate_sitemap(
            &registry(),
            &SitemapOptions {
                default_priority: 0.9,
                latest_version_boost: 0.3,
                ..options()
            },
        );
        assert_eq!(clipped[1].priority, Some(1.0));
    }

    #[test]
    fn test_xml_loc_round_trip() {
        let entries = vec![
            SitemapEntry {
                url: "https://docs.example.com/a?x=1&y=<2>".into(),
                lastmod: None,
                changefreq: None,
                priority: None,
            },
            SitemapEntry {
                url: "https://docs.example.com/it's/\"quoted\"".into(),
                lastmod: Some("2024-01-01".into()),
                changefreq: Some(ChangeFrequency::Daily),
                priority: Some(0.8),
            },
        ];
        let xml = sitemap_to_xml(&entries);
        assert!(xml.contains("&amp;y=&lt;2&gt;"));
        assert!(xml.contains("<priority>0.8</priority>"));

        let loc = Regex::new(r"<loc>([^<]*)</loc>").unwrap();
        let unescape = |s: &str| {
            s.replace("&lt;", "<")
                .replace("&gt;", ">")
                .replace("&quot;", "\"")
                .replace("&apos;", "'")
                .replace("&amp;", "&")
        };
        let recovered: Vec<String> = loc
            .captures_iter(&xml)
            .map(|c| unescape(&c[1]))
            .collect();
        let original: Vec<String> = entries.iter().map(|e| e.url.clone()).collect();
        assert_eq!(recovered, original);
    }

    #[test]
    fn test_summary_buckets() {
        let mut entries = generate_sitemap(&registry(), &options());
        entries.push(SitemapEntry {
            url: "https://docs.example.com/old".into(),
            lastmod: None,
            changefreq: Some(ChangeFrequency::Yearly),
            priority: Some(0.1),
        });
        let summary = summarize_sitemap(&entries);
        assert_eq!(summary.total, 3);
        assert_eq!((summary.high, summary.medium, summary.low), (1, 1, 1));
        assert_eq!(summary.by_changefreq["weekly"], 2);
        assert_eq!(summary.by_changefreq["yearly"], 1);
    }

    #[test]
    fn test_format_priority() {
        assert_eq!(format_priority(1.0), "1.0");
        assert_eq!(format_priority(0.8), "0.8");
        assert_eq!(format_priority(0.75), "0.75");
    }

    #[test]
    fn test_changefreq_parse() {
        assert_eq!("Daily".parse::<ChangeFrequency>().unwrap(), ChangeFrequency::Daily);
        assert!("sometimes".parse::<ChangeFrequency>().is_err());
    }
}
