//! Reference Validation
//!
//! Checks cross-references inside a schema-valid registry: languages,
//! versions, licenses, documents, categories and glossary entries. Lookup
//! sets are built once per project so each reference check is O(1).

use std::collections::{HashMap, HashSet};

use crate::diagnostics::{Diagnostics, Finding};
use crate::registry::{Category, DocumentStatus, Project, Registry, Visibility};

/// Options for the reference pass
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceOptions {
    /// Flag public documents that are not published
    pub strict: bool,
}

/// Per-project lookup sets
struct ProjectIndex<'a> {
    languages: HashSet<&'a str>,
    versions: HashSet<&'a str>,
    licenses: HashSet<&'a str>,
    documents: HashSet<&'a str>,
}

impl<'a> ProjectIndex<'a> {
    fn build(project: &'a Project) -> Self {
        Self {
            languages: project.languages.iter().map(|l| l.code.as_str()).collect(),
            versions: project.versions.iter().map(|v| v.id.as_str()).collect(),
            licenses: project.licenses.iter().map(|l| l.id.as_str()).collect(),
            documents: project.documents.iter().map(|d| d.id.as_str()).collect(),
        }
    }
}

pub struct ReferenceValidator {
    options: ReferenceOptions,
}

impl ReferenceValidator {
    pub fn new(options: ReferenceOptions) -> Self {
        Self { options }
    }

    pub fn validate(&self, registry: &Registry) -> Diagnostics {
        let mut diags = Diagnostics::new();

        let mut seen_projects = HashSet::new();
        for (pi, project) in registry.projects.iter().enumerate() {
            if !seen_projects.insert(project.id.as_str()) {
                diags.report(
                    Finding::DuplicateProject {
                        id: project.id.clone(),
                    },
                    format!("projects[{}].id", pi),
                );
            }
            self.validate_project(project, &format!("projects[{}]", pi), &mut diags);
        }

        tracing::info!(
            errors = diags.error_count(),
            warnings = diags.warning_count(),
            "reference validation finished"
        );
        diags
    }

    fn validate_project(&self, project: &Project, base: &str, diags: &mut Diagnostics) {
        let index = ProjectIndex::build(project);

        check_languages(project, &index, base, diags);
        check_versions(project, base, diags);
        self.check_documents(project, &index, base, diags);
        check_categories(&project.categories, &index, base, diags);
        check_glossary(project, &index, base, diags);
    }

    fn check_documents(
        &self,
        project: &Project,
        index: &ProjectIndex<'_>,
        base: &str,
        diags: &mut Diagnostics,
    ) {
        let mut ids = HashSet::new();
        let mut slugs: HashMap<&str, &str> = HashMap::new();

        for (di, doc) in project.documents.iter().enumerate() {
            let path = format!("{}.documents[{}]", base, di);

            if !ids.insert(doc.id.as_str()) {
                diags.report(
                    Finding::DuplicateDocumentId {
                        project: project.id.clone(),
                        id: doc.id.clone(),
                    },
                    format!("{}.id", path),
                );
            }
            if let Some(first) = slugs.insert(doc.slug.as_str(), doc.id.as_str()) {
                diags.report(
                    Finding::DuplicateSlug {
                        project: project.id.clone(),
                        slug: doc.slug.clone(),
                        first: first.to_string(),
                        second: doc.id.clone(),
                    },
                    format!("{}.slug", path),
                );
            }

            for (vi, version) in doc.versions.iter().enumerate() {
                if !index.versions.contains(version.as_str()) {
                    diags.report(
                        Finding::UnknownVersion {
                            document: doc.id.clone(),
                            version: version.clone(),
                        },
                        format!("{}.versions[{}]", path, vi),
                    );
                }
            }

            for language in doc.content.keys() {
                if !index.languages.contains(language.as_str()) {
                    diags.report(
                        Finding::UnknownLanguage {
                            document: doc.id.clone(),
                            language: language.clone(),
                        },
                        format!("{}.content.{}", path, language),
                    );
                }
            }

            if let Some(license) = &doc.license {
                if project.has_licenses() && !index.licenses.contains(license.as_str()) {
                    diags.report(
                        Finding::UnknownLicense {
                            document: doc.id.clone(),
                            license: license.clone(),
                        },
                        format!("{}.license", path),
                    );
                }
            }

            for (ri, related) in doc.related.iter().enumerate() {
                if !index.documents.contains(related.as_str()) {
                    diags.report(
                        Finding::RelatedDocumentMissing {
                            document: doc.id.clone(),
                            related: related.clone(),
                        },
                        format!("{}.related[{}]", path, ri),
                    );
                }
            }

            if self.options.strict
                && doc.visibility == Visibility::Public
                && doc.status != DocumentStatus::Published
            {
                diags.report(
                    Finding::VisibilityStatusConflict {
                        document: doc.id.clone(),
                        status: doc.status.as_str().to_string(),
                    },
                    format!("{}.status", path),
                );
            }
        }
    }
}

fn check_languages(project: &Project, index: &ProjectIndex<'_>, base: &str, diags: &mut Diagnostics) {
    let mut seen = HashSet::new();
    for (li, lang) in project.languages.iter().enumerate() {
        if !seen.insert(lang.code.as_str()) {
            diags.report(
                Finding::DuplicateLanguage {
                    project: project.id.clone(),
                    code: lang.code.clone(),
                },
                format!("{}.languages[{}].code", base, li),
            );
        }
        if let Some(fallback) = &lang.fallback {
            if !index.languages.contains(fallback.as_str()) {
                diags.report(
                    Finding::UnknownFallbackLanguage {
                        language: lang.code.clone(),
                        fallback: fallback.clone(),
                    },
                    format!("{}.languages[{}].fallback", base, li),
                );
            }
        }
    }

    let defaults: Vec<&str> = project
        .languages
        .iter()
        .filter(|l| l.default)
        .map(|l| l.code.as_str())
        .collect();
    match defaults.len() {
        0 => diags.report(
            Finding::NoDefaultLanguage {
                project: project.id.clone(),
            },
            format!("{}.languages", base),
        ),
        1 => {}
        n => diags.report(
            Finding::MultipleDefaultLanguages {
                project: project.id.clone(),
                count: n,
                codes: defaults.join(", "),
            },
            format!("{}.languages", base),
        ),
    }
}

fn check_versions(project: &Project, base: &str, diags: &mut Diagnostics) {
    let mut seen = HashSet::new();
    for (vi, version) in project.versions.iter().enumerate() {
        if !seen.insert(version.id.as_str()) {
            diags.report(
                Finding::DuplicateVersion {
                    project: project.id.clone(),
                    id: version.id.clone(),
                },
                format!("{}.versions[{}].id", base, vi),
            );
        }
    }

    let latest: Vec<&str> = project
        .versions
        .iter()
        .filter(|v| v.is_latest)
        .map(|v| v.id.as_str())
        .collect();
    match latest.len() {
        0 => diags.report(
            Finding::NoLatestVersion {
                project: project.id.clone(),
            },
            format!("{}.versions", base),
        ),
        1 => {}
        n => diags.report(
            Finding::MultipleLatestVersions {
                project: project.id.clone(),
                count: n,
                ids: latest.join(", "),
            },
            format!("{}.versions", base),
        ),
    }
}

enum Frame<'a> {
    Enter {
        category: &'a Category,
        path: String,
    },
    Exit,
}

/// Depth-first walk over the category tree with an explicit stack.
///
/// `open` holds the ids on the current root-to-node branch. An id is pushed
/// on entry and popped on exit, so reuse of an id in an unrelated branch is
/// not a cycle; only a descendant repeating an ancestor's id is. A cyclic
/// node is reported once and not descended into.
fn check_categories(
    roots: &[Category],
    index: &ProjectIndex<'_>,
    base: &str,
    diags: &mut Diagnostics,
) {
    check_sibling_ids(roots, &format!("{}.categories", base), diags);

    let mut stack: Vec<Frame<'_>> = roots
        .iter()
        .enumerate()
        .rev()
        .map(|(i, category)| Frame::Enter {
            category,
            path: format!("{}.categories[{}]", base, i),
        })
        .collect();
    let mut open: Vec<&str> = Vec::new();

    while let Some(frame) = stack.pop() {
        let (category, path) = match frame {
            Frame::Exit => {
                open.pop();
                continue;
            }
            Frame::Enter { category, path } => (category, path),
        };

        if open.contains(&category.id.as_str()) {
            let mut chain: Vec<&str> = open.clone();
            chain.push(&category.id);
            diags.report(
                Finding::CategoryCycle {
                    id: category.id.clone(),
                    chain: chain.join(" -> "),
                },
                path,
            );
            continue;
        }

        for (di, doc_id) in category.docs.iter().enumerate() {
            if !index.documents.contains(doc_id.as_str()) {
                diags.report(
                    Finding::UnknownCategoryDocument {
                        category: category.id.clone(),
                        document: doc_id.clone(),
                    },
                    format!("{}.docs[{}]", path, di),
                );
            }
        }

        check_sibling_ids(&category.children, &format!("{}.children", path), diags);

        open.push(&category.id);
        stack.push(Frame::Exit);
        for (ci, child) in category.children.iter().enumerate().rev() {
            stack.push(Frame::Enter {
                category: child,
                path: format!("{}.children[{}]", path, ci),
            });
        }
    }
}

fn check_sibling_ids(siblings: &[Category], base: &str, diags: &mut Diagnostics) {
    let mut seen = HashSet::new();
    for (i, category) in siblings.iter().enumerate() {
        if !seen.insert(category.id.as_str()) {
            diags.report(
                Finding::DuplicateCategoryId {
                    id: category.id.clone(),
                },
                format!("{}[{}].id", base, i),
            );
        }
    }
}

fn check_glossary(project: &Project, index: &ProjectIndex<'_>, base: &str, diags: &mut Diagnostics) {
    let mut terms = HashSet::new();
    for (gi, entry) in project.glossary.iter().enumerate() {
        let path = format!("{}.glossary[{}]", base, gi);
        if !terms.insert(entry.term.trim().to_lowercase()) {
            diags.report(
                Finding::DuplicateGlossaryTerm {
                    term: entry.term.clone(),
                },
                format!("{}.term", path),
            );
        }
        for (ri, doc_id) in entry.related.iter().enumerate() {
            if !index.documents.contains(doc_id.as_str()) {
                diags.report(
                    Finding::GlossaryDocumentMissing {
                        term: entry.term.clone(),
                        document: doc_id.clone(),
                    },
                    format!("{}.related[{}]", path, ri),
                );
            }
        }
    }
}
