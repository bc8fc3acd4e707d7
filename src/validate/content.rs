//! Content Validation
//!
//! Resolves each document's per-language content path against the project
//! root and compares reality with the declared status. Optionally recomputes
//! content digests to detect drift, and offers a repair operation that
//! rewrites digests for maintenance tooling.

use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::thread;

use chrono::Utc;

use crate::checksum::ContentDigest;
use crate::diagnostics::{Diagnostic, Diagnostics, Finding, Severity};
use crate::registry::{ContentStatus, Registry};

/// Options for the content pass
#[derive(Debug, Clone)]
pub struct ContentOptions {
    /// Directory content paths are resolved against
    pub project_root: PathBuf,
    /// Recompute digests when one is stored
    pub check_digests: bool,
    /// Report digest drift as an error instead of a warning
    pub digest_drift_is_error: bool,
    /// Worker threads for file checks; 0 or 1 runs inline
    pub workers: usize,
}

impl Default for ContentOptions {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            check_digests: false,
            digest_drift_is_error: false,
            workers: 1,
        }
    }
}

/// One (document, language) file check
#[derive(Debug, Clone)]
struct ContentCheck {
    document: String,
    language: String,
    rel_path: String,
    status: ContentStatus,
    digest: Option<String>,
    location: String,
}

/// Result of [`ContentValidator::refresh_digests`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DigestRefresh {
    pub updated: usize,
    pub unchanged: usize,
    pub unresolved: Vec<String>,
}

pub struct ContentValidator {
    options: ContentOptions,
}

impl ContentValidator {
    pub fn new(options: ContentOptions) -> Self {
        Self { options }
    }

    /// `rel_path` under the project root, or `None` when it is absolute or
    /// climbs above the root
    pub fn resolve(&self, rel_path: &str) -> Option<PathBuf> {
        let mut depth = 0usize;
        for component in Path::new(rel_path).components() {
            match component {
                Component::Normal(_) => depth += 1,
                Component::CurDir => {}
                Component::ParentDir => depth = depth.checked_sub(1)?,
                Component::RootDir | Component::Prefix(_) => return None,
            }
        }
        Some(self.options.project_root.join(rel_path))
    }

    pub fn validate(&self, registry: &Registry) -> Diagnostics {
        let checks = collect_checks(registry);
        let workers = self.options.workers.max(1).min(checks.len().max(1));

        let diags = if workers <= 1 {
            self.run_checks(&checks)
        } else {
            self.run_parallel(&checks, workers)
        };

        tracing::info!(
            files = checks.len(),
            errors = diags.error_count(),
            warnings = diags.warning_count(),
            "content validation finished"
        );
        diags
    }

    /// Checks are independent per file. Each worker fills its own collection
    /// and the results are merged in input order, so output is identical to
    /// the sequential run.
    fn run_parallel(&self, checks: &[ContentCheck], workers: usize) -> Diagnostics {
        let chunk_size = checks.len().div_ceil(workers);
        let mut merged = Diagnostics::new();

        thread::scope(|scope| {
            let handles: Vec<_> = checks
                .chunks(chunk_size)
                .map(|chunk| scope.spawn(move || self.run_checks(chunk)))
                .collect();

            for handle in handles {
                match handle.join() {
                    Ok(diags) => merged.merge(diags),
                    Err(_) => merged.report_global(Finding::Internal {
                        detail: "content check worker panicked".to_string(),
                    }),
                }
            }
        });

        merged
    }

    fn run_checks(&self, checks: &[ContentCheck]) -> Diagnostics {
        let mut diags = Diagnostics::new();
        for check in checks {
            self.check_one(check, &mut diags);
        }
        diags
    }

    fn check_one(&self, check: &ContentCheck, diags: &mut Diagnostics) {
        let Some(full) = self.resolve(&check.rel_path) else {
            diags.report(
                Finding::ContentPathOutsideRoot {
                    document: check.document.clone(),
                    language: check.language.clone(),
                    path: check.rel_path.clone(),
                },
                format!("{}.path", check.location),
            );
            return;
        };
        let exists = match fs::metadata(&full) {
            Ok(meta) => meta.is_file(),
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => {
                diags.report(
                    Finding::ContentUnreadable {
                        path: full.display().to_string(),
                        reason: e.to_string(),
                    },
                    check.location.clone(),
                );
                return;
            }
        };

        match (exists, check.status) {
            (false, ContentStatus::Missing) => diags.report(
                Finding::ContentDeclaredMissing {
                    document: check.document.clone(),
                    language: check.language.clone(),
                    path: check.rel_path.clone(),
                },
                check.location.clone(),
            ),
            (false, status) => diags.report(
                Finding::ContentFileNotFound {
                    document: check.document.clone(),
                    language: check.language.clone(),
                    path: check.rel_path.clone(),
                    status: status.as_str().to_string(),
                },
                check.location.clone(),
            ),
            (true, ContentStatus::Missing) => diags.report(
                Finding::ContentStatusStale {
                    document: check.document.clone(),
                    language: check.language.clone(),
                    path: check.rel_path.clone(),
                },
                format!("{}.status", check.location),
            ),
            (true, _) => {}
        }

        if exists && self.options.check_digests {
            if let Some(stored) = &check.digest {
                self.check_digest(check, &full, stored, diags);
            }
        }
    }

    fn check_digest(&self, check: &ContentCheck, full: &Path, stored: &str, diags: &mut Diagnostics) {
        match ContentDigest::from_file(full) {
            Ok(actual) if actual.matches(stored) => {}
            Ok(actual) => {
                let severity = if self.options.digest_drift_is_error {
                    Severity::Error
                } else {
                    Severity::Warning
                };
                diags.push(
                    Diagnostic::new(
                        Finding::DigestMismatch {
                            document: check.document.clone(),
                            language: check.language.clone(),
                            stored: stored.to_string(),
                            actual: actual.to_string(),
                        },
                        Some(format!("{}.digest", check.location)),
                    )
                    .with_severity(severity),
                );
            }
            Err(e) => diags.report(
                Finding::ContentUnreadable {
                    path: full.display().to_string(),
                    reason: e.to_string(),
                },
                check.location.clone(),
            ),
        }
    }

    /// Recompute and store the digest of every resolvable content file.
    /// Entries whose digest changes also get a fresh `lastUpdated`.
    pub fn refresh_digests(&self, registry: &mut Registry) -> DigestRefresh {
        let mut outcome = DigestRefresh::default();
        let now = Utc::now().to_rfc3339();

        for project in &mut registry.projects {
            for doc in &mut project.documents {
                for entry in doc.content.values_mut() {
                    let Some(full) = self.resolve(&entry.path) else {
                        outcome.unresolved.push(entry.path.clone());
                        continue;
                    };
                    match ContentDigest::from_file(&full) {
                        Ok(digest) => {
                            if entry.digest.as_deref().is_some_and(|d| digest.matches(d)) {
                                outcome.unchanged += 1;
                            } else {
                                entry.digest = Some(digest.into());
                                entry.last_updated = Some(now.clone());
                                outcome.updated += 1;
                            }
                        }
                        Err(_) => outcome.unresolved.push(entry.path.clone()),
                    }
                }
            }
        }

        tracing::info!(
            updated = outcome.updated,
            unchanged = outcome.unchanged,
            unresolved = outcome.unresolved.len(),
            "content digests refreshed"
        );
        outcome
    }
}

fn collect_checks(registry: &Registry) -> Vec<ContentCheck> {
    let mut checks = Vec::new();
    for (pi, project) in registry.projects.iter().enumerate() {
        for (di, doc) in project.documents.iter().enumerate() {
            for (language, entry) in &doc.content {
                checks.push(ContentCheck {
                    document: doc.id.clone(),
                    language: language.clone(),
                    rel_path: entry.path.clone(),
                    status: entry.status,
                    digest: entry.digest.clone(),
                    location: format!("projects[{}].documents[{}].content.{}", pi, di, language),
                });
            }
        }
    }
    checks
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry(content: serde_json::Value) -> Registry {
        Registry::from_value(json!({
            "schemaVersion": "1.0.0",
            "metadata": {},
            "projects": [{
                "id": "guide",
                "displayName": { "en": "Guide" },
                "languages": [{ "code": "en", "displayName": { "en": "English" }, "default": true }],
                "versions": [{ "id": "v1", "displayName": "1", "isLatest": true }],
                "documents": [{
                    "id": "intro", "slug": "intro", "title": { "en": "Intro" },
                    "versions": ["v1"], "status": "published", "visibility": "public",
                    "content": content
                }]
            }]
        }))
        .unwrap()
    }

    fn validator(root: &Path, check_digests: bool) -> ContentValidator {
        ContentValidator::new(ContentOptions {
            project_root: root.to_path_buf(),
            check_digests,
            ..Default::default()
        })
    }

    #[test]
    fn test_status_against_existence() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("en")).unwrap();
        fs::write(dir.path().join("en/present.md"), "# Present").unwrap();

        let reg = registry(json!({
            "en": { "path": "en/absent.md", "status": "published" },
            "ja": { "path": "ja/absent.md", "status": "missing" },
            "fr": { "path": "en/present.md", "status": "missing" }
        }));
        let diags = validator(dir.path(), false).validate(&reg);

        let not_found = diags
            .all()
            .iter()
            .find(|d| d.code == "CONTENT_FILE_NOT_FOUND")
            .unwrap();
        assert!(not_found.is_error());
        assert!(diags.has_code("CONTENT_DECLARED_MISSING"));
        assert!(diags.has_code("CONTENT_STATUS_STALE"));
        assert_eq!(diags.error_count(), 1);
        assert_eq!(diags.warning_count(), 2);
    }

    #[test]
    fn test_digest_drift() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("intro.md"), "v1 body").unwrap();
        let stored = ContentDigest::from_bytes(b"v1 body").to_string();

        let reg = registry(json!({
            "en": { "path": "intro.md", "status": "published", "digest": stored }
        }));
        assert!(validator(dir.path(), true).validate(&reg).is_empty());

        fs::write(dir.path().join("intro.md"), "v2 body").unwrap();
        let diags = validator(dir.path(), true).validate(&reg);
        assert_eq!(diags.count_code("CONTENT_DIGEST_MISMATCH"), 1);
        assert!(!diags.has_errors());

        // digest checks are opt-in
        assert!(validator(dir.path(), false).validate(&reg).is_empty());

        let strict = ContentValidator::new(ContentOptions {
            project_root: dir.path().to_path_buf(),
            check_digests: true,
            digest_drift_is_error: true,
            workers: 1,
        });
        assert!(strict.validate(&reg).has_errors());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.md"), "a").unwrap();
        let reg = registry(json!({
            "en": { "path": "a.md", "status": "missing" },
            "ja": { "path": "b.md", "status": "published" },
            "fr": { "path": "c.md", "status": "missing" },
            "de": { "path": "a.md", "status": "published" }
        }));
        let sequential = validator(dir.path(), false).validate(&reg);
        let parallel = ContentValidator::new(ContentOptions {
            project_root: dir.path().to_path_buf(),
            workers: 3,
            ..Default::default()
        })
        .validate(&reg);
        assert_eq!(sequential, parallel);
        assert_eq!(parallel.len(), 3);
    }

    #[test]
    fn test_paths_outside_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("content");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("intro.md"), "body").unwrap();
        fs::write(dir.path().join("secret.md"), "secret").unwrap();

        let v = validator(&root, false);
        assert_eq!(v.resolve("en/../intro.md"), Some(root.join("en/../intro.md")));
        assert_eq!(v.resolve("./intro.md"), Some(root.join("./intro.md")));
        assert_eq!(v.resolve("../secret.md"), None);
        assert_eq!(v.resolve("en/../../secret.md"), None);
        assert_eq!(v.resolve("/etc/hostname"), None);

        let mut reg = registry(json!({
            "en": { "path": "en/../intro.md", "status": "published" },
            "ja": { "path": "../secret.md", "status": "published" },
            "fr": { "path": "/etc/hostname", "status": "published" }
        }));
        let diags = v.validate(&reg);
        assert_eq!(diags.count_code("CONTENT_PATH_OUTSIDE_ROOT"), 2);
        assert_eq!(diags.error_count(), 2);
        let escape = diags
            .all()
            .iter()
            .find(|d| d.message.contains("../secret.md"))
            .unwrap();
        assert_eq!(
            escape.path.as_deref(),
            Some("projects[0].documents[0].content.ja.path")
        );

        let outcome = v.refresh_digests(&mut reg);
        assert_eq!(outcome.updated, 1);
        assert_eq!(outcome.unresolved.len(), 2);
        assert!(reg.projects[0].documents[0].content["ja"].digest.is_none());
    }

    #[test]
    fn test_unreadable_path_reported_and_others_checked() {
        let dir = tempfile::tempdir().unwrap();
        // a regular file where a directory is expected
        fs::write(dir.path().join("en"), "not a directory").unwrap();

        let reg = registry(json!({
            "en": { "path": "en/intro.md", "status": "published" },
            "ja": { "path": "ja/intro.md", "status": "published" }
        }));
        let diags = validator(dir.path(), false).validate(&reg);

        let unreadable = diags
            .all()
            .iter()
            .find(|d| d.code == "CONTENT_UNREADABLE")
            .unwrap();
        assert!(unreadable.is_error());
        assert_eq!(unreadable.path.as_deref(), Some("projects[0].documents[0].content.en"));
        assert_eq!(diags.count_code("CONTENT_FILE_NOT_FOUND"), 1);
        assert_eq!(diags.len(), 2);
    }

    #[test]
    fn test_refresh_digests() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("intro.md"), "body").unwrap();
        let mut reg = registry(json!({
            "en": { "path": "intro.md", "status": "published", "digest": "deadbeefdeadbeef" },
            "ja": { "path": "gone.md", "status": "missing" }
        }));

        let v = validator(dir.path(), true);
        let outcome = v.refresh_digests(&mut reg);
        assert_eq!(outcome.updated, 1);
        assert_eq!(outcome.unresolved, vec!["gone.md".to_string()]);

        let entry = &reg.projects[0].documents[0].content["en"];
        assert_eq!(
            entry.digest.as_deref(),
            Some(ContentDigest::from_bytes(b"body").as_str())
        );
        assert!(entry.last_updated.is_some());

        let again = v.refresh_digests(&mut reg);
        assert_eq!(again.updated, 0);
        assert_eq!(again.unchanged, 1);
    }
}
