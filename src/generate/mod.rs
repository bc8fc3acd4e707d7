//! Artifact Generation
//!
//! Derives build artifacts from a validated registry. Every generator reads
//! the same immutable graph and asks [`crate::visibility`] for inclusion
//! decisions.

pub mod cache;
pub mod metadata;
pub mod routes;
pub mod sidebar;
pub mod sitemap;

pub use cache::{ArtifactCache, CacheKey};
pub use metadata::{
    generate_manifest, generate_robots, generate_social_tags, render_social_tags, ManifestIcon,
    ManifestOptions, RobotsOptions, SocialTag, SocialTagInput, WebManifest,
};
pub use routes::{generate_routes, Route, RouteOptions, RouteParams, RouteProps};
pub use sidebar::{SidebarCategory, SidebarGenerator, SidebarItem, SidebarOptions};
pub use sitemap::{
    generate_sitemap, sitemap_to_xml, summarize_sitemap, ChangeFrequency, SitemapEntry,
    SitemapOptions, SitemapSummary,
};

use std::sync::OnceLock;

use regex::Regex;

use crate::registry::ContentStatus;
use crate::visibility::Environment;

/// Whether content in `status` produces output in `environment`.
///
/// Production only ships published content. Other environments also ship
/// drafts and archived pages for review; `missing` never has a file to build.
pub fn content_is_buildable(status: ContentStatus, environment: &Environment) -> bool {
    match status {
        ContentStatus::Published => true,
        ContentStatus::Missing => false,
        ContentStatus::Draft | ContentStatus::Archived => !environment.is_production(),
    }
}

fn repeated_slashes() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([^:/]|^)/{2,}").expect("slash pattern is valid"))
}

/// Collapse duplicate separators, leaving a scheme's `://` intact
pub fn normalize_slashes(url: &str) -> String {
    repeated_slashes().replace_all(url, "$1/").into_owned()
}

/// Join path segments with single separators and a leading `/`
pub fn join_path<'a>(segments: impl IntoIterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for segment in segments {
        let trimmed = segment.trim_matches('/');
        if trimmed.is_empty() {
            continue;
        }
        out.push('/');
        out.push_str(trimmed);
    }
    if out.is_empty() {
        out.push('/');
    }
    normalize_slashes(&out)
}
