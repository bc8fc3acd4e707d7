//! Sidebar Generation
//!
//! Builds the navigation tree for one (project, version, language). Categories
//! are rendered one level deep: nested `children` are validated for cycles but
//! not expanded here. A document is linked only when the route table builds
//! its page in the same environment.

use serde::Serialize;

use super::cache::{ArtifactCache, CacheKey};
use super::{content_is_buildable, join_path};
use crate::error::Result;
use crate::registry::{Category, Document, Project, Registry};
use crate::visibility::{allows, Environment};

/// Sort key for documents without an explicit order
pub const UNORDERED: i64 = 999;

#[derive(Debug, Clone, Default)]
pub struct SidebarOptions {
    pub environment: Environment,
    /// Prefix for every link, e.g. `/docs`
    pub base_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SidebarItem {
    pub title: String,
    pub href: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    pub doc_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SidebarCategory {
    pub title: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub order: i64,
    pub items: Vec<SidebarItem>,
}

pub struct SidebarGenerator {
    options: SidebarOptions,
}

impl SidebarGenerator {
    pub fn new(options: SidebarOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SidebarOptions {
        &self.options
    }

    /// Generate the sidebar. Unknown project, version or language is an error;
    /// everything below that is filtered silently with a debug note.
    pub fn generate(
        &self,
        registry: &Registry,
        project_id: &str,
        version: &str,
        language: &str,
    ) -> Result<Vec<SidebarCategory>> {
        let project = registry.require_project(project_id)?;
        project.require_version(version)?;
        project.require_language(language)?;

        let decision = allows(project.visibility, &self.options.environment);
        if !decision.should_build {
            tracing::debug!(project = project_id, reason = %decision.reason, "project not built; empty sidebar");
            return Ok(Vec::new());
        }

        let mut categories: Vec<SidebarCategory> = project
            .categories
            .iter()
            .filter_map(|category| self.category(project, category, version, language))
            .collect();
        // stable: equal orders keep declaration order
        categories.sort_by_key(|c| c.order);

        tracing::debug!(
            project = project_id,
            version,
            language,
            categories = categories.len(),
            "sidebar generated"
        );
        Ok(categories)
    }

    /// [`SidebarGenerator::generate`] through a caller-owned cache. Entries are
    /// keyed by this generator's environment and base path as well, so one
    /// cache can serve several generators.
    pub fn generate_cached<'c>(
        &self,
        cache: &'c mut ArtifactCache<Vec<SidebarCategory>>,
        registry: &Registry,
        project_id: &str,
        version: &str,
        language: &str,
    ) -> Result<&'c [SidebarCategory]> {
        let key = CacheKey::new(project_id, version, language).with_variant(format!(
            "{}:{}",
            self.options.environment,
            self.options.base_path.as_deref().unwrap_or("")
        ));
        cache
            .get_or_try_insert_with(key, || self.generate(registry, project_id, version, language))
            .map(Vec::as_slice)
    }

    fn category(
        &self,
        project: &Project,
        category: &Category,
        version: &str,
        language: &str,
    ) -> Option<SidebarCategory> {
        let mut items: Vec<SidebarItem> = category
            .docs
            .iter()
            .filter_map(|doc_id| self.item(project, &category.id, doc_id, version, language))
            .collect();

        if items.is_empty() {
            tracing::debug!(category = %category.id, "category has no visible documents; omitted");
            return None;
        }
        items.sort_by_key(|item| item.order.unwrap_or(UNORDERED));

        Some(SidebarCategory {
            title: project.localize_or(&category.title, language, &category.id).to_string(),
            slug: category.id.clone(),
            icon: category.icon.clone(),
            order: category.order,
            items,
        })
    }

    fn item(
        &self,
        project: &Project,
        category: &str,
        doc_id: &str,
        version: &str,
        language: &str,
    ) -> Option<SidebarItem> {
        let Some(doc) = project.document(doc_id) else {
            tracing::debug!(category, document = doc_id, "skipped: document not found");
            return None;
        };
        if !doc.applies_to_version(version) {
            tracing::debug!(category, document = doc_id, version, "skipped: not in version");
            return None;
        }
        let decision = allows(doc.visibility, &self.options.environment);
        if !decision.should_build {
            tracing::debug!(category, document = doc_id, reason = %decision.reason, "skipped: visibility");
            return None;
        }
        let Some(content) = doc.content_for(language) else {
            tracing::debug!(category, document = doc_id, language, "skipped: no content for language");
            return None;
        };
        if !content_is_buildable(content.status, &self.options.environment) {
            tracing::debug!(
                category,
                document = doc_id,
                language,
                status = content.status.as_str(),
                "skipped: content not built in this environment"
            );
            return None;
        }

        Some(SidebarItem {
            title: project.localize_or(&doc.title, language, &doc.id).to_string(),
            href: self.href(project, doc, version, language),
            order: doc.order,
            doc_id: doc.id.clone(),
        })
    }

    fn href(&self, project: &Project, doc: &Document, version: &str, language: &str) -> String {
        let base = self
            .options
            .base_path
            .as_deref()
            .or(project.options.base_path.as_deref())
            .unwrap_or("");
        let base_has_project = base.split('/').any(|segment| segment == project.id);
        let project_segment = if base_has_project { "" } else { project.id.as_str() };

        join_path([base, project_segment, version, language, doc.slug.as_str()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> Registry {
        Registry::from_value(json!({
            "schemaVersion": "1.0.0",
            "metadata": {},
            "projects": [{
                "id": "guide",
                "displayName": { "en": "Guide" },
                "languages": [
                    { "code": "en", "displayName": { "en": "English" }, "default": true },
                    { "code": "ja", "displayName": { "ja": "日本語" } }
                ],
                "versions": [{ "id": "v1", "displayName": "1.x", "isLatest": true }],
                "categories": [
                    { "id": "advanced", "order": 2, "title": { "en": "Advanced" },
                      "docs": ["tuning"] },
                    { "id": "basics", "order": 1, "title": { "en": "Basics", "ja": "基本" },
                      "icon": "book", "docs": ["install", "intro", "faq", "ghost"] },
                    { "id": "hidden", "order": 3, "title": { "en": "Hidden" },
                      "docs": ["draft-notes"] }
                ],
                "documents": [
                    doc("intro", Some(1), "public"),
                    doc("install", Some(2), "public"),
                    doc("faq", None, "public"),
                    doc("tuning", Some(3), "public"),
                    doc("draft-notes", Some(1), "draft")
                ]
            }]
        }))
        .unwrap()
    }

    fn doc(id: &str, order: Option<i64>, visibility: &str) -> serde_json::Value {
        let mut value = json!({
            "id": id, "slug": id, "title": { "en": id.to_uppercase() },
            "versions": ["v1"], "status": "published", "visibility": visibility,
            "content": {
                "en": { "path": format!("en/{}.md", id), "status": "published" },
                "ja": { "path": format!("ja/{}.md", id), "status": "draft" }
            }
        });
        if let Some(order) = order {
            value["order"] = json!(order);
        }
        value
    }

    fn production() -> SidebarGenerator {
        SidebarGenerator::new(SidebarOptions::default())
    }

    #[test]
    fn test_category_and_item_order() {
        let sidebar = production().generate(&registry(), "guide", "v1", "en").unwrap();
        let slugs: Vec<&str> = sidebar.iter().map(|c| c.slug.as_str()).collect();
        assert_eq!(slugs, vec!["basics", "advanced"]);

        let ids: Vec<&str> = sidebar[0].items.iter().map(|i| i.doc_id.as_str()).collect();
        assert_eq!(ids, vec!["intro", "install", "faq"]);
        assert_eq!(sidebar[0].icon.as_deref(), Some("book"));
    }

    #[test]
    fn test_invisible_category_omitted() {
        let sidebar = production().generate(&registry(), "guide", "v1", "en").unwrap();
        assert!(sidebar.iter().all(|c| c.slug != "hidden"));

        let dev = SidebarGenerator::new(SidebarOptions {
            environment: Environment::Development,
            base_path: None,
        });
        let sidebar = dev.generate(&registry(), "guide", "v1", "en").unwrap();
        assert_eq!(sidebar.last().map(|c| c.slug.as_str()), Some("hidden"));
    }

    #[test]
    fn test_localized_titles_and_links() {
        let generator = SidebarGenerator::new(SidebarOptions {
            environment: Environment::Staging,
            base_path: Some("/docs/".into()),
        });
        let sidebar = generator.generate(&registry(), "guide", "v1", "ja").unwrap();
        assert_eq!(sidebar[0].title, "基本");
        assert_eq!(sidebar[1].title, "Advanced");
        assert_eq!(sidebar[0].items[0].href, "/docs/guide/v1/ja/intro");

        let scoped = SidebarGenerator::new(SidebarOptions {
            environment: Environment::Production,
            base_path: Some("/docs/guide".into()),
        });
        let sidebar = scoped.generate(&registry(), "guide", "v1", "en").unwrap();
        assert_eq!(sidebar[0].items[0].href, "/docs/guide/v1/en/intro");
    }

    #[test]
    fn test_matches_routes_for_draft_content_and_hidden_projects() {
        // every ja entry is a draft: production builds none of those pages
        let registry = registry();
        assert!(production().generate(&registry, "guide", "v1", "ja").unwrap().is_empty());

        let routes = crate::generate::generate_routes(
            &registry,
            &crate::generate::RouteOptions::for_environment(Environment::Production),
        );
        let sidebar = production().generate(&registry, "guide", "v1", "en").unwrap();
        for item in sidebar.iter().flat_map(|c| &c.items) {
            assert!(
                routes.iter().any(|r| r.path() == item.href),
                "{} has no route",
                item.href
            );
        }

        let mut internal = registry.clone();
        internal.projects[0].visibility = crate::registry::Visibility::Internal;
        assert!(production().generate(&internal, "guide", "v1", "en").unwrap().is_empty());
        let staging = SidebarGenerator::new(SidebarOptions {
            environment: Environment::Staging,
            base_path: None,
        });
        assert!(!staging.generate(&internal, "guide", "v1", "en").unwrap().is_empty());
    }

    #[test]
    fn test_unknown_inputs_are_errors() {
        let generator = production();
        assert!(generator.generate(&registry(), "api", "v1", "en").is_err());
        assert!(generator.generate(&registry(), "guide", "v9", "en").is_err());
        assert!(generator.generate(&registry(), "guide", "v1", "fr").is_err());
    }

    #[test]
    fn test_generate_cached() {
        let generator = production();
        let registry = registry();
        let mut cache = ArtifactCache::new();

        let first = generator
            .generate_cached(&mut cache, &registry, "guide", "v1", "en")
            .unwrap()
            .to_vec();
        assert_eq!(cache.len(), 1);
        let second = generator
            .generate_cached(&mut cache, &registry, "guide", "v1", "en")
            .unwrap();
        assert_eq!(first.as_slice(), second);
        assert_eq!(cache.len(), 1);

        // a development generator sharing the cache gets its own entry
        let dev = SidebarGenerator::new(SidebarOptions {
            environment: Environment::Development,
            base_path: None,
        });
        let dev_sidebar = dev
            .generate_cached(&mut cache, &registry, "guide", "v1", "en")
            .unwrap()
            .to_vec();
        assert_eq!(cache.len(), 2);
        assert_eq!(dev_sidebar.last().map(|c| c.slug.as_str()), Some("hidden"));
        assert!(first.iter().all(|c| c.slug != "hidden"));
    }
}
