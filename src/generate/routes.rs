//! Route Table
//!
//! One route per buildable (project, version, language, document). The
//! rendering layer consumes `params` to place the page and `props` to fill it.
//!
//! Filtering is multiplicative: a project or document rejected by the
//! visibility policy contributes no combinations at all.

use serde::Serialize;

use super::{content_is_buildable, join_path};
use crate::registry::{Document, Project, Registry};
use crate::visibility::{allows, Environment};

/// Filters and context for route generation. Empty filters select everything.
#[derive(Debug, Clone, Default)]
pub struct RouteOptions {
    pub environment: Environment,
    pub projects: Vec<String>,
    pub versions: Vec<String>,
    pub languages: Vec<String>,
    /// Log every exclusion at debug level
    pub debug: bool,
}

impl RouteOptions {
    pub fn for_environment(environment: Environment) -> Self {
        Self {
            environment,
            ..Default::default()
        }
    }

    fn wants_project(&self, id: &str) -> bool {
        self.projects.is_empty() || self.projects.iter().any(|p| p == id)
    }

    fn wants_version(&self, id: &str) -> bool {
        self.versions.is_empty() || self.versions.iter().any(|v| v == id)
    }

    fn wants_language(&self, code: &str) -> bool {
        self.languages.is_empty() || self.languages.iter().any(|l| l == code)
    }
}

/// Where a page lives
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RouteParams {
    pub project: String,
    pub version: String,
    pub lang: String,
    pub slug: String,
}

impl RouteParams {
    /// Normalized URL path, `/project/version/lang/slug`
    pub fn to_path(&self) -> String {
        join_path([
            self.project.as_str(),
            self.version.as_str(),
            self.lang.as_str(),
            self.slug.as_str(),
        ])
    }
}

/// What the page renders, resolved at generation time
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteProps {
    pub doc_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub keywords: Vec<String>,
    pub tags: Vec<String>,
    pub related: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    pub contributors: Vec<String>,
    pub content_path: String,
    pub visibility: String,
    pub status: String,
    pub is_latest: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    pub params: RouteParams,
    pub props: RouteProps,
}

impl Route {
    pub fn path(&self) -> String {
        self.params.to_path()
    }
}

/// Build the route table for every selected project
pub fn generate_routes(registry: &Registry, options: &RouteOptions) -> Vec<Route> {
    let mut routes = Vec::new();

    for project in &registry.projects {
        if !options.wants_project(&project.id) {
            continue;
        }
        let decision = allows(project.visibility, &options.environment);
        if !decision.should_build {
            if options.debug {
                tracing::debug!(project = %project.id, reason = %decision.reason, "project excluded");
            }
            continue;
        }

        for doc in &project.documents {
            let decision = allows(doc.visibility, &options.environment);
            if !decision.should_build {
                if options.debug {
                    tracing::debug!(
                        project = %project.id,
                        document = %doc.id,
                        reason = %decision.reason,
                        "document excluded"
                    );
                }
                continue;
            }
            document_routes(project, doc, options, &mut routes);
        }
    }

    tracing::info!(
        routes = routes.len(),
        environment = %options.environment,
        "route table generated"
    );
    routes
}

fn document_routes(project: &Project, doc: &Document, options: &RouteOptions, routes: &mut Vec<Route>) {
    let versions = doc
        .versions
        .iter()
        .filter(|v| options.wants_version(v) && project.version(v).is_some());

    for version in versions {
        let is_latest = project.version(version).is_some_and(|v| v.is_latest);

        // declared language order, so output is stable across map layouts
        for language in &project.languages {
            let code = language.code.as_str();
            if !options.wants_language(code) {
                continue;
            }
            let Some(entry) = doc.content_for(code) else {
                continue;
            };
            if !content_is_buildable(entry.status, &options.environment) {
                if options.debug {
                    tracing::debug!(
                        document = %doc.id,
                        version = %version,
                        language = code,
                        status = entry.status.as_str(),
                        "content not built in this environment"
                    );
                }
                continue;
            }

            routes.push(Route {
                params: RouteParams {
                    project: project.id.clone(),
                    version: version.clone(),
                    lang: code.to_string(),
                    slug: doc.slug.clone(),
                },
                props: RouteProps {
                    doc_id: doc.id.clone(),
                    title: project.localize_or(&doc.title, code, &doc.id).to_string(),
                    summary: project.localize(&doc.summary, code).map(str::to_string),
                    keywords: doc.keywords.clone(),
                    tags: doc.tags.clone(),
                    related: doc.related.clone(),
                    license: doc.license.clone(),
                    contributors: doc.contributors.clone(),
                    content_path: entry.path.clone(),
                    visibility: doc.visibility.as_str().to_string(),
                    status: entry.status.as_str().to_string(),
                    is_latest,
                },
            });
        }
    }
}
