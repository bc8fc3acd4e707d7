//! Validation
//!
//! Four passes over one registry:
//!
//! 1. [`schema`]: structure of the raw document; failure stops here
//! 2. [`references`]: cross-references, uniqueness, category cycles
//! 3. [`content`]: content files against declared status (optional)
//! 4. [`meta`]: keyword/tag cardinality (advisory)
//!
//! The [`Validator`] runs them in that order and merges their findings.

pub mod content;
pub mod meta;
pub mod references;
pub mod schema;

pub use content::{ContentOptions, ContentValidator, DigestRefresh};
pub use meta::{MetaOptions, MetaValidator};
pub use references::{ReferenceOptions, ReferenceValidator};
pub use schema::SchemaValidator;

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::diagnostics::{Diagnostics, Finding, Summary};
use crate::error::{LoadError, Result};
use crate::loader;
use crate::registry::Registry;

/// Options for a full validation run
#[derive(Debug, Clone)]
pub struct ValidationOptions {
    pub project_root: PathBuf,
    pub strict: bool,
    pub check_content: bool,
    pub check_digests: bool,
    pub digest_drift_is_error: bool,
    pub max_keywords: usize,
    pub max_tags: usize,
    pub warnings_as_errors: bool,
    pub workers: usize,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            strict: false,
            check_content: true,
            check_digests: false,
            digest_drift_is_error: false,
            max_keywords: meta::DEFAULT_MAX_KEYWORDS,
            max_tags: meta::DEFAULT_MAX_TAGS,
            warnings_as_errors: false,
            workers: 1,
        }
    }
}

impl ValidationOptions {
    pub fn content_options(&self) -> ContentOptions {
        ContentOptions {
            project_root: self.project_root.clone(),
            check_digests: self.check_digests,
            digest_drift_is_error: self.digest_drift_is_error,
            workers: self.workers,
        }
    }

    pub fn meta_options(&self) -> MetaOptions {
        MetaOptions {
            max_keywords: self.max_keywords,
            max_tags: self.max_tags,
        }
    }
}

/// Merged result of a validation run
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    pub diagnostics: Diagnostics,
    pub summary: Summary,
    /// The decoded graph, present when the schema pass succeeded
    pub registry: Option<Registry>,
}

impl ValidationOutcome {
    pub fn success(&self) -> bool {
        self.summary.success
    }
}

/// Runs every pass with one set of options
pub struct Validator {
    schema: SchemaValidator,
    options: ValidationOptions,
}

impl Validator {
    pub fn new(options: ValidationOptions) -> Result<Self> {
        Ok(Self {
            schema: SchemaValidator::new()?,
            options,
        })
    }

    pub fn options(&self) -> &ValidationOptions {
        &self.options
    }

    /// Validate a raw registry document
    pub fn validate(&self, document: &Value) -> ValidationOutcome {
        let mut diags = Diagnostics::new();
        let run = guarded(&mut diags, "validation", || self.run(document));
        self.finish(diags, run)
    }

    /// Load a registry file and validate it. Load failures are returned as
    /// errors; everything after loading is reported as diagnostics.
    pub fn validate_path(&self, path: &Path) -> std::result::Result<ValidationOutcome, LoadError> {
        let document = loader::load_document(path)?;
        Ok(self.validate(&document))
    }

    fn run(&self, document: &Value) -> (Diagnostics, Option<Registry>) {
        let mut diags = self.schema.validate(document);
        if diags.has_errors() {
            tracing::info!("schema validation failed; skipping later passes");
            return (diags, None);
        }

        let registry = match Registry::from_value(document.clone()) {
            Ok(registry) => registry,
            Err(e) => {
                diags.report_global(Finding::Internal {
                    detail: e.to_string(),
                });
                return (diags, None);
            }
        };

        let references = ReferenceValidator::new(ReferenceOptions {
            strict: self.options.strict,
        });
        if let Some(found) = guarded(&mut diags, "reference", || references.validate(&registry)) {
            diags.merge(found);
        }

        if self.options.check_content {
            let content = ContentValidator::new(self.options.content_options());
            if let Some(found) = guarded(&mut diags, "content", || content.validate(&registry)) {
                diags.merge(found);
            }
        }

        let meta = MetaValidator::new(self.options.meta_options());
        if let Some(found) = guarded(&mut diags, "meta", || meta.validate(&registry)) {
            diags.merge(found);
        }

        (diags, Some(registry))
    }

    fn finish(&self, mut diags: Diagnostics, run: Option<(Diagnostics, Option<Registry>)>) -> ValidationOutcome {
        let registry = match run {
            Some((found, registry)) => {
                diags.merge(found);
                registry
            }
            None => None,
        };
        let summary = diags.summary(self.options.warnings_as_errors);
        ValidationOutcome {
            diagnostics: diags,
            summary,
            registry,
        }
    }
}

/// Run a pass, converting a panic into a single internal error
fn guarded<T>(diags: &mut Diagnostics, pass: &str, f: impl FnOnce() -> T) -> Option<T> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => Some(value),
        Err(payload) => {
            let detail = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            tracing::warn!(pass, %detail, "validation pass failed unexpectedly");
            diags.report_global(Finding::Internal {
                detail: format!("{} pass: {}", pass, detail),
            });
            None
        }
    }
}

/// Validate a raw document with default-constructed validators
pub fn validate_registry(document: &Value, options: ValidationOptions) -> ValidationOutcome {
    match Validator::new(options.clone()) {
        Ok(validator) => validator.validate(document),
        Err(e) => {
            let mut diags = Diagnostics::new();
            diags.report_global(Finding::Internal {
                detail: e.to_string(),
            });
            let summary = diags.summary(options.warnings_as_errors);
            ValidationOutcome {
                diagnostics: diags,
                summary,
                registry: None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document() -> Value {
        json!({
            "schemaVersion": "1.0.0",
            "metadata": {},
            "projects": [{
                "id": "guide",
                "displayName": { "en": "Guide" },
                "languages": [{ "code": "en", "displayName": { "en": "English" }, "default": true }],
                "versions": [{ "id": "v1", "displayName": "1" }],
                "documents": [{
                    "id": "intro", "slug": "intro", "title": { "en": "Intro" },
                    "versions": ["v1"], "status": "published", "visibility": "public",
                    "related": ["ghost"],
                    "content": { "en": { "path": "en/intro.md", "status": "published" } }
                }]
            }]
        })
    }

    fn options() -> ValidationOptions {
        ValidationOptions {
            check_content: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_schema_failure_short_circuits() {
        let mut doc = document();
        doc["projects"][0]["documents"][0]["status"] = json!("live");
        let outcome = validate_registry(&doc, options());
        assert!(!outcome.success());
        assert!(outcome.registry.is_none());
        assert!(outcome.diagnostics.all().iter().all(|d| d.code.starts_with("SCHEMA_")));
    }

    #[test]
    fn test_passes_merge() {
        let outcome = validate_registry(&document(), options());
        // no latest version + dangling related document: both warnings
        assert!(outcome.success());
        assert_eq!(outcome.summary.warning_count, 2);
        assert!(outcome.registry.is_some());

        let fatal = validate_registry(
            &document(),
            ValidationOptions {
                warnings_as_errors: true,
                ..options()
            },
        );
        assert!(!fatal.success());
    }

    #[test]
    fn test_integral_float_order_reaches_later_passes() {
        let mut doc = document();
        doc["projects"][0]["documents"][0]["order"] = json!(1.0);
        doc["projects"][0]["categories"] = json!([{
            "id": "basics", "order": 18446744073709551615u64,
            "title": { "en": "Basics" }, "docs": ["intro"]
        }]);

        let outcome = validate_registry(&doc, options());
        assert!(!outcome.diagnostics.has_code("INTERNAL_ERROR"), "{:?}", outcome.diagnostics.all());
        assert!(outcome.diagnostics.has_code("REF_RELATED_MISSING"));

        let registry = outcome.registry.unwrap();
        assert_eq!(registry.projects[0].documents[0].order, Some(1));
        assert_eq!(registry.projects[0].categories[0].order, i64::MAX);
    }

    #[test]
    fn test_content_pass_optional() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = validate_registry(
            &document(),
            ValidationOptions {
                project_root: dir.path().to_path_buf(),
                check_content: true,
                ..Default::default()
            },
        );
        assert!(outcome.diagnostics.has_code("CONTENT_FILE_NOT_FOUND"));
        assert!(!outcome.success());
    }

    #[test]
    fn test_guarded_converts_panic() {
        let mut diags = Diagnostics::new();
        let result: Option<()> = guarded(&mut diags, "test", || panic!("broken file"));
        assert!(result.is_none());
        assert_eq!(diags.count_code("INTERNAL_ERROR"), 1);
        assert!(diags.all()[0].message.contains("broken file"));
    }
}
