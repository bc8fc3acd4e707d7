//! Content Registry Engine
//!
//! Validates a documentation content registry and derives the artifacts a
//! site build consumes from it.
//!
//! ## Features
//!
//! - **Multi-pass Validation**: structure, cross-references, content files and
//!   metadata limits, merged into one diagnostic collection
//! - **Visibility Policy**: one decision table for what each environment builds
//! - **Route Table**: every buildable (project, version, language, document)
//! - **Navigation**: ordered sidebar per project, version and language
//! - **Site Metadata**: sitemap, robots.txt, web-app manifest, social tags
//! - **Content Digests**: SHA256-based drift detection and repair
//!
//! ## Pipeline
//!
//! ```text
//! registry.{json,yaml,toml}
//!     │  loader
//!     ▼
//! serde_json::Value ── schema ──▶ Registry ── references ─┐
//!                                    │        content    ├─▶ Diagnostics
//!                                    │        meta      ─┘
//!                                    ▼
//!                 routes · sidebar · sitemap · metadata
//! ```

pub mod checksum;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod generate;
pub mod loader;
pub mod registry;
pub mod report;
pub mod validate;
pub mod version;
pub mod visibility;

pub use checksum::ContentDigest;
pub use config::EngineConfig;
pub use diagnostics::{Diagnostic, Diagnostics, Finding, Severity, Summary};
pub use error::{EngineError, LoadError, Result};
pub use generate::{
    generate_routes, generate_sitemap, ArtifactCache, Route, RouteOptions, SidebarGenerator,
    SidebarOptions, SitemapOptions,
};
pub use loader::{load_document, load_registry};
pub use registry::Registry;
pub use validate::{validate_registry, ValidationOptions, ValidationOutcome, Validator};
pub use version::RegistrySchemaVersion;
pub use visibility::{decide, Decision, Environment, VisibilityPolicy};
