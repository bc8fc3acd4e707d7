//! Configuration management for the content registry engine
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (registry.toml)
//! - Environment variables (REGISTRY__*)
//!
//! ## Example config file (registry.toml):
//! ```toml
//! [registry]
//! path = "content/registry.json"
//! project_root = "content"
//!
//! [build]
//! default_environment = "production"
//!
//! [validation]
//! strict = true
//! check_digests = true
//! workers = 4
//!
//! [sitemap]
//! base_url = "https://docs.example.com"
//! changefreq = "weekly"
//! priority = 0.5
//! latest_version_boost = 0.3
//!
//! [robots]
//! disallow = ["/drafts/"]
//! crawl_delay = 5
//!
//! [manifest]
//! display = "standalone"
//! theme_color = "#0b5fff"
//! ```
//!
//! There is no process-wide instance: callers load an [`EngineConfig`] and
//! hand the derived option structs to each component.

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{EngineError, Result};
use crate::generate::{ChangeFrequency, ManifestOptions, RobotsOptions, SitemapOptions};
use crate::validate::{meta, ValidationOptions};
use crate::visibility;

/// Main configuration for the engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Registry location
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Build target defaults
    #[serde(default)]
    pub build: BuildConfig,

    /// Validation settings
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Sitemap settings
    #[serde(default)]
    pub sitemap: SitemapConfig,

    /// Crawler directives
    #[serde(default)]
    pub robots: RobotsOptions,

    /// Web-app manifest settings
    #[serde(default)]
    pub manifest: ManifestOptions,
}

/// Registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Path to the registry document
    #[serde(default = "default_registry_path")]
    pub path: PathBuf,

    /// Directory content paths are resolved against. Defaults to the
    /// directory holding the registry document.
    #[serde(default)]
    pub project_root: Option<PathBuf>,
}

/// Build configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Environment used when a command does not name one
    #[serde(default = "default_environment")]
    pub default_environment: String,
}

/// Validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Report public documents that are not published
    #[serde(default)]
    pub strict: bool,

    /// Check content files against their declared status
    #[serde(default = "default_true")]
    pub check_content: bool,

    /// Recompute stored content digests
    #[serde(default)]
    pub check_digests: bool,

    #[serde(default = "default_max_keywords")]
    pub max_keywords: usize,

    #[serde(default = "default_max_tags")]
    pub max_tags: usize,

    /// Fail the run on warnings
    #[serde(default)]
    pub warnings_as_errors: bool,

    /// Report digest drift as an error
    #[serde(default)]
    pub digest_drift_is_error: bool,

    /// Worker threads for content checks
    #[serde(default = "default_workers")]
    pub workers: usize,
}

/// Sitemap configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SitemapConfig {
    /// Absolute site root
    #[serde(default)]
    pub base_url: String,

    #[serde(default = "default_changefreq")]
    pub changefreq: String,

    #[serde(default = "default_priority")]
    pub priority: f64,

    #[serde(default = "default_latest_boost")]
    pub latest_version_boost: f64,
}

// Default value functions
fn default_registry_path() -> PathBuf {
    PathBuf::from("registry.json")
}

fn default_environment() -> String {
    visibility::Environment::Production.as_str().to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_keywords() -> usize {
    meta::DEFAULT_MAX_KEYWORDS
}

fn default_max_tags() -> usize {
    meta::DEFAULT_MAX_TAGS
}

fn default_workers() -> usize {
    1
}

fn default_changefreq() -> String {
    ChangeFrequency::default().as_str().to_string()
}

fn default_priority() -> f64 {
    crate::generate::sitemap::DEFAULT_PRIORITY
}

fn default_latest_boost() -> f64 {
    crate::generate::sitemap::DEFAULT_LATEST_BOOST
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            path: default_registry_path(),
            project_root: None,
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            default_environment: default_environment(),
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            strict: false,
            check_content: true,
            check_digests: false,
            max_keywords: default_max_keywords(),
            max_tags: default_max_tags(),
            warnings_as_errors: false,
            digest_drift_is_error: false,
            workers: default_workers(),
        }
    }
}

impl Default for SitemapConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            changefreq: default_changefreq(),
            priority: default_priority(),
            latest_version_boost: default_latest_boost(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from default locations
    pub fn load() -> std::result::Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, layering an explicit file over the defaults
    pub fn load_from(config_path: Option<&str>) -> std::result::Result<Self, ConfigError> {
        let mut builder = Config::builder();

        for location in ["registry.toml", ".registry.toml", "config/registry.toml"] {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(dirs) = directories::ProjectDirs::from("dev", "content-registry", "registry") {
            let xdg_config = dirs.config_dir().join("registry.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // REGISTRY__VALIDATION__STRICT=true -> validation.strict
        builder = builder.add_source(
            Environment::with_prefix("REGISTRY")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("robots.disallow"),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| EngineError::Serialize(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Registry path, resolved against the working directory
    pub fn registry_path(&self) -> PathBuf {
        absolute(&self.registry.path)
    }

    /// Content root: explicit, else the registry's directory
    pub fn project_root(&self) -> PathBuf {
        match &self.registry.project_root {
            Some(root) => absolute(root),
            None => self
                .registry_path()
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        }
    }

    pub fn environment(&self) -> Result<visibility::Environment> {
        self.build.default_environment.parse()
    }

    pub fn validation_options(&self) -> ValidationOptions {
        let v = &self.validation;
        ValidationOptions {
            project_root: self.project_root(),
            strict: v.strict,
            check_content: v.check_content,
            check_digests: v.check_digests,
            digest_drift_is_error: v.digest_drift_is_error,
            max_keywords: v.max_keywords,
            max_tags: v.max_tags,
            warnings_as_errors: v.warnings_as_errors,
            workers: v.workers,
        }
    }

    pub fn sitemap_options(&self, environment: visibility::Environment) -> Result<SitemapOptions> {
        Ok(SitemapOptions {
            environment,
            base_url: self.sitemap.base_url.clone(),
            default_changefreq: self.sitemap.changefreq.parse()?,
            default_priority: self.sitemap.priority,
            latest_version_boost: self.sitemap.latest_version_boost,
        })
    }

    /// Robots options; the sitemap reference defaults to `<base_url>/sitemap.xml`
    pub fn robots_options(&self) -> RobotsOptions {
        let mut robots = self.robots.clone();
        let base = self.sitemap.base_url.trim_end_matches('/');
        if robots.sitemap_url.is_none() && !base.is_empty() {
            robots.sitemap_url = Some(format!("{}/sitemap.xml", base));
        }
        robots
    }
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().unwrap_or_default().join(path)
    }
}
