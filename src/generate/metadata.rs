//! Site metadata: crawler directives, the web-app manifest and social
//! preview tags. Each generator is a pure function of its inputs.

use serde::{Deserialize, Serialize};

use super::join_path;
use super::sitemap::escape_xml;
use crate::registry::Project;

/// Longest short name shown under an installed app icon
pub const SHORT_NAME_MAX: usize = 12;

// =============================================================================
// robots.txt
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotsOptions {
    /// Paths crawlers are asked to skip
    pub disallow: Vec<String>,
    pub crawl_delay: Option<u32>,
    /// Absolute sitemap URL referenced at the end of the file
    pub sitemap_url: Option<String>,
}

pub fn generate_robots(options: &RobotsOptions) -> String {
    let mut lines = vec!["User-agent: *".to_string(), "Allow: /".to_string()];
    for path in &options.disallow {
        let path = path.trim();
        if path.is_empty() {
            continue;
        }
        lines.push(format!("Disallow: {}", path));
    }
    if let Some(delay) = options.crawl_delay {
        lines.push(format!("Crawl-delay: {}", delay));
    }
    if let Some(url) = &options.sitemap_url {
        lines.push(String::new());
        lines.push(format!("Sitemap: {}", url));
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

// =============================================================================
// manifest.webmanifest
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestIcon {
    pub src: String,
    pub sizes: String,
    #[serde(rename = "type")]
    pub mime_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestOptions {
    pub display: String,
    pub theme_color: String,
    pub background_color: String,
    pub icons: Vec<ManifestIcon>,
    /// Overrides the project's latest-version landing path
    pub start_url: Option<String>,
}

impl Default for ManifestOptions {
    fn default() -> Self {
        Self {
            display: "standalone".to_string(),
            theme_color: "#ffffff".to_string(),
            background_color: "#ffffff".to_string(),
            icons: Vec::new(),
            start_url: None,
        }
    }
}

/// Serialized with the snake_case keys browsers expect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebManifest {
    pub name: String,
    pub short_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub lang: String,
    pub start_url: String,
    pub display: String,
    pub theme_color: String,
    pub background_color: String,
    pub icons: Vec<ManifestIcon>,
}

/// Cut `name` to [`SHORT_NAME_MAX`] characters with a trailing ellipsis
pub fn short_name(name: &str) -> String {
    if name.chars().count() <= SHORT_NAME_MAX {
        return name.to_string();
    }
    let cut: String = name.chars().take(SHORT_NAME_MAX).collect();
    format!("{}…", cut.trim_end())
}

pub fn generate_manifest(project: &Project, language: &str, options: &ManifestOptions) -> WebManifest {
    let name = project
        .localize_or(&project.display_name, language, &project.id)
        .to_string();

    let start_url = options.start_url.clone().unwrap_or_else(|| {
        let version = project.latest_version().map(|v| v.id.as_str()).unwrap_or("");
        let base = project.options.base_path.as_deref().unwrap_or("");
        format!("{}/", join_path([base, project.id.as_str(), version, language]))
    });

    WebManifest {
        short_name: short_name(&name),
        name,
        description: project.localize(&project.description, language).map(str::to_string),
        lang: language.to_string(),
        start_url,
        display: options.display.clone(),
        theme_color: options.theme_color.clone(),
        background_color: options.background_color.clone(),
        icons: options.icons.clone(),
    }
}

// =============================================================================
// Social preview tags
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SocialTagInput {
    pub title: String,
    pub description: String,
    pub url: String,
    pub image: Option<String>,
    pub site_name: Option<String>,
    pub locale: Option<String>,
}

/// One `<meta>` tag. Open Graph tags use `property`, Twitter tags `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SocialTag {
    pub attribute: &'static str,
    pub key: String,
    pub content: String,
}

impl SocialTag {
    fn og(key: &str, content: &str) -> Self {
        Self {
            attribute: "property",
            key: format!("og:{}", key),
            content: content.to_string(),
        }
    }

    fn twitter(key: &str, content: &str) -> Self {
        Self {
            attribute: "name",
            key: format!("twitter:{}", key),
            content: content.to_string(),
        }
    }

    pub fn to_html(&self) -> String {
        format!(
            "<meta {}=\"{}\" content=\"{}\">",
            self.attribute,
            escape_xml(&self.key),
            escape_xml(&self.content)
        )
    }
}

pub fn generate_social_tags(input: &SocialTagInput) -> Vec<SocialTag> {
    let mut tags = vec![
        SocialTag::og("type", "article"),
        SocialTag::og("title", &input.title),
        SocialTag::og("description", &input.description),
        SocialTag::og("url", &input.url),
    ];
    if let Some(image) = &input.image {
        tags.push(SocialTag::og("image", image));
    }
    if let Some(site_name) = &input.site_name {
        tags.push(SocialTag::og("site_name", site_name));
    }
    if let Some(locale) = &input.locale {
        tags.push(SocialTag::og("locale", &locale.replace('-', "_")));
    }

    let card = if input.image.is_some() {
        "summary_large_image"
    } else {
        "summary"
    };
    tags.push(SocialTag::twitter("card", card));
    tags.push(SocialTag::twitter("title", &input.title));
    tags.push(SocialTag::twitter("description", &input.description));
    if let Some(image) = &input.image {
        tags.push(SocialTag::twitter("image", image));
    }
    tags
}

pub fn render_social_tags(tags: &[SocialTag]) -> Vec<String> {
    tags.iter().map(SocialTag::to_html).collect()
}
