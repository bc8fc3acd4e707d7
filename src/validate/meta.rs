//! Advisory checks on descriptive metadata. Never blocks a build.

use crate::diagnostics::{Diagnostics, Finding};
use crate::registry::Registry;

pub const DEFAULT_MAX_KEYWORDS: usize = 10;
pub const DEFAULT_MAX_TAGS: usize = 10;

#[derive(Debug, Clone, Copy)]
pub struct MetaOptions {
    pub max_keywords: usize,
    pub max_tags: usize,
}

impl Default for MetaOptions {
    fn default() -> Self {
        Self {
            max_keywords: DEFAULT_MAX_KEYWORDS,
            max_tags: DEFAULT_MAX_TAGS,
        }
    }
}

pub struct MetaValidator {
    options: MetaOptions,
}

impl MetaValidator {
    pub fn new(options: MetaOptions) -> Self {
        Self { options }
    }

    pub fn validate(&self, registry: &Registry) -> Diagnostics {
        let mut diags = Diagnostics::new();
        for (pi, project) in registry.projects.iter().enumerate() {
            for (di, doc) in project.documents.iter().enumerate() {
                let path = format!("projects[{}].documents[{}]", pi, di);
                if doc.keywords.len() > self.options.max_keywords {
                    diags.report(
                        Finding::TooManyKeywords {
                            document: doc.id.clone(),
                            count: doc.keywords.len(),
                            max: self.options.max_keywords,
                        },
                        format!("{}.keywords", path),
                    );
                }
                if doc.tags.len() > self.options.max_tags {
                    diags.report(
                        Finding::TooManyTags {
                            document: doc.id.clone(),
                            count: doc.tags.len(),
                            max: self.options.max_tags,
                        },
                        format!("{}.tags", path),
                    );
                }
            }
        }
        diags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_counts_over_limit_warn() {
        let registry = Registry::from_value(json!({
            "schemaVersion": "1.0.0",
            "metadata": {},
            "projects": [{
                "id": "guide",
                "displayName": { "en": "Guide" },
                "languages": [{ "code": "en", "displayName": { "en": "English" } }],
                "versions": [{ "id": "v1", "displayName": "1" }],
                "documents": [{
                    "id": "intro", "slug": "intro", "title": { "en": "Intro" },
                    "versions": ["v1"], "status": "published", "visibility": "public",
                    "keywords": ["a", "b", "c"],
                    "tags": ["x", "y"],
                    "content": {}
                }]
            }]
        }))
        .unwrap();

        let diags = MetaValidator::new(MetaOptions {
            max_keywords: 2,
            max_tags: 2,
        })
        .validate(&registry);
        assert_eq!(diags.len(), 1);
        assert!(!diags.has_errors());
        assert!(diags.all()[0].message.contains("3 keywords"));

        assert!(MetaValidator::new(MetaOptions::default())
            .validate(&registry)
            .is_empty());
    }
}
