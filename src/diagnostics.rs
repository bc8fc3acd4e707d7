//! Diagnostics
//!
//! Collects validation errors and warnings from every pass. Each finding is a
//! typed [`Finding`] whose parameters feed its message, so a missing
//! parameter is a compile error rather than an empty placeholder.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

// =============================================================================
// Severity
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

// =============================================================================
// Findings
// =============================================================================

/// Every condition a validator can report
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Finding {
    // === Schema ===
    #[error("Missing required field '{property}'")]
    SchemaRequired { property: String },

    #[error("Wrong type: expected {expected}")]
    SchemaType { expected: String },

    #[error("Value {value} does not match pattern '{pattern}'")]
    SchemaPattern { value: String, pattern: String },

    #[error("Value {value} is not one of {allowed}")]
    SchemaEnum { value: String, allowed: String },

    #[error("Array must contain at least {limit} item(s)")]
    SchemaMinItems { limit: u64 },

    #[error("Unexpected field '{field}'")]
    SchemaUnexpectedField { field: String },

    #[error("Schema violation: {detail}")]
    SchemaInvalid { detail: String },

    #[error("Registry has no schemaVersion")]
    SchemaVersionMissing,

    #[error("schemaVersion '{value}' is not a semantic version: {reason}")]
    SchemaVersionInvalid { value: String, reason: String },

    #[error("schemaVersion '{value}' is not supported (supported: {supported})")]
    SchemaVersionUnsupported { value: String, supported: String },

    // === References ===
    #[error("Duplicate project id '{id}'")]
    DuplicateProject { id: String },

    #[error("Duplicate language code '{code}' in project '{project}'")]
    DuplicateLanguage { project: String, code: String },

    #[error("Duplicate version id '{id}' in project '{project}'")]
    DuplicateVersion { project: String, id: String },

    #[error("Duplicate document id '{id}' in project '{project}'")]
    DuplicateDocumentId { project: String, id: String },

    #[error("Duplicate slug '{slug}' in project '{project}' (documents '{first}' and '{second}')")]
    DuplicateSlug {
        project: String,
        slug: String,
        first: String,
        second: String,
    },

    #[error("Duplicate category id '{id}' among siblings")]
    DuplicateCategoryId { id: String },

    #[error("Category '{id}' contains itself: {chain}")]
    CategoryCycle { id: String, chain: String },

    #[error("Project '{project}' has no default language")]
    NoDefaultLanguage { project: String },

    #[error("Project '{project}' has {count} default languages: {codes}")]
    MultipleDefaultLanguages {
        project: String,
        count: usize,
        codes: String,
    },

    #[error("Project '{project}' has no latest version")]
    NoLatestVersion { project: String },

    #[error("Project '{project}' has {count} versions marked latest: {ids}")]
    MultipleLatestVersions {
        project: String,
        count: usize,
        ids: String,
    },

    #[error("Language '{language}' falls back to unknown language '{fallback}'")]
    UnknownFallbackLanguage { language: String, fallback: String },

    #[error("Document '{document}' references unknown version '{version}'")]
    UnknownVersion { document: String, version: String },

    #[error("Document '{document}' has content for unknown language '{language}'")]
    UnknownLanguage { document: String, language: String },

    #[error("Document '{document}' references unknown license '{license}'")]
    UnknownLicense { document: String, license: String },

    #[error("Category '{category}' references unknown document '{document}'")]
    UnknownCategoryDocument { category: String, document: String },

    #[error("Document '{document}' lists related document '{related}' which does not exist")]
    RelatedDocumentMissing { document: String, related: String },

    #[error("Duplicate glossary term '{term}'")]
    DuplicateGlossaryTerm { term: String },

    #[error("Glossary term '{term}' references unknown document '{document}'")]
    GlossaryDocumentMissing { term: String, document: String },

    #[error("Document '{document}' is public but its status is '{status}'")]
    VisibilityStatusConflict { document: String, status: String },

    // === Content ===
    #[error("Content for '{document}' [{language}] is declared missing: {path}")]
    ContentDeclaredMissing {
        document: String,
        language: String,
        path: String,
    },

    #[error("Content file for '{document}' [{language}] not found: {path} (status '{status}')")]
    ContentFileNotFound {
        document: String,
        language: String,
        path: String,
        status: String,
    },

    #[error("Content file for '{document}' [{language}] exists but status is 'missing': {path}")]
    ContentStatusStale {
        document: String,
        language: String,
        path: String,
    },

    #[error("Content for '{document}' [{language}] changed since its digest was recorded (stored {stored}, actual {actual})")]
    DigestMismatch {
        document: String,
        language: String,
        stored: String,
        actual: String,
    },

    #[error("Cannot read content file {path}: {reason}")]
    ContentUnreadable { path: String, reason: String },

    #[error("Content path for '{document}' [{language}] leaves the content root: {path}")]
    ContentPathOutsideRoot {
        document: String,
        language: String,
        path: String,
    },

    // === Meta ===
    #[error("Document '{document}' has {count} keywords (max {max})")]
    TooManyKeywords {
        document: String,
        count: usize,
        max: usize,
    },

    #[error("Document '{document}' has {count} tags (max {max})")]
    TooManyTags {
        document: String,
        count: usize,
        max: usize,
    },

    // === Engine ===
    #[error("Internal validation failure: {detail}")]
    Internal { detail: String },
}

impl Finding {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            Self::SchemaRequired { .. } => "SCHEMA_REQUIRED",
            Self::SchemaType { .. } => "SCHEMA_TYPE",
            Self::SchemaPattern { .. } => "SCHEMA_PATTERN",
            Self::SchemaEnum { .. } => "SCHEMA_ENUM",
            Self::SchemaMinItems { .. } => "SCHEMA_MIN_ITEMS",
            Self::SchemaUnexpectedField { .. } => "SCHEMA_UNEXPECTED_FIELD",
            Self::SchemaInvalid { .. } => "SCHEMA_INVALID",
            Self::SchemaVersionMissing => "SCHEMA_VERSION_MISSING",
            Self::SchemaVersionInvalid { .. } => "SCHEMA_VERSION_INVALID",
            Self::SchemaVersionUnsupported { .. } => "SCHEMA_VERSION_UNSUPPORTED",
            Self::DuplicateProject { .. } => "REF_DUPLICATE_PROJECT",
            Self::DuplicateLanguage { .. } => "REF_DUPLICATE_LANGUAGE",
            Self::DuplicateVersion { .. } => "REF_DUPLICATE_VERSION",
            Self::DuplicateDocumentId { .. } => "REF_DUPLICATE_DOCUMENT",
            Self::DuplicateSlug { .. } => "REF_DUPLICATE_SLUG",
            Self::DuplicateCategoryId { .. } => "REF_DUPLICATE_CATEGORY",
            Self::CategoryCycle { .. } => "REF_CATEGORY_CYCLE",
            Self::NoDefaultLanguage { .. } => "REF_NO_DEFAULT_LANGUAGE",
            Self::MultipleDefaultLanguages { .. } => "REF_MULTIPLE_DEFAULT_LANGUAGES",
            Self::NoLatestVersion { .. } => "REF_NO_LATEST_VERSION",
            Self::MultipleLatestVersions { .. } => "REF_MULTIPLE_LATEST_VERSIONS",
            Self::UnknownFallbackLanguage { .. } => "REF_UNKNOWN_FALLBACK",
            Self::UnknownVersion { .. } => "REF_UNKNOWN_VERSION",
            Self::UnknownLanguage { .. } => "REF_UNKNOWN_LANGUAGE",
            Self::UnknownLicense { .. } => "REF_UNKNOWN_LICENSE",
            Self::UnknownCategoryDocument { .. } => "REF_UNKNOWN_DOCUMENT",
            Self::RelatedDocumentMissing { .. } => "REF_RELATED_MISSING",
            Self::DuplicateGlossaryTerm { .. } => "REF_DUPLICATE_TERM",
            Self::GlossaryDocumentMissing { .. } => "REF_GLOSSARY_DOCUMENT_MISSING",
            Self::VisibilityStatusConflict { .. } => "REF_VISIBILITY_STATUS",
            Self::ContentDeclaredMissing { .. } => "CONTENT_DECLARED_MISSING",
            Self::ContentFileNotFound { .. } => "CONTENT_FILE_NOT_FOUND",
            Self::ContentStatusStale { .. } => "CONTENT_STATUS_STALE",
            Self::DigestMismatch { .. } => "CONTENT_DIGEST_MISMATCH",
            Self::ContentUnreadable { .. } => "CONTENT_UNREADABLE",
            Self::ContentPathOutsideRoot { .. } => "CONTENT_PATH_OUTSIDE_ROOT",
            Self::TooManyKeywords { .. } => "META_TOO_MANY_KEYWORDS",
            Self::TooManyTags { .. } => "META_TOO_MANY_TAGS",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// Severity unless a caller overrides it
    pub fn default_severity(&self) -> Severity {
        match self {
            Self::NoDefaultLanguage { .. }
            | Self::NoLatestVersion { .. }
            | Self::UnknownFallbackLanguage { .. }
            | Self::RelatedDocumentMissing { .. }
            | Self::GlossaryDocumentMissing { .. }
            | Self::ContentDeclaredMissing { .. }
            | Self::ContentStatusStale { .. }
            | Self::DigestMismatch { .. }
            | Self::TooManyKeywords { .. }
            | Self::TooManyTags { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }

    pub fn hint(&self) -> Option<String> {
        let hint = match self {
            Self::SchemaRequired { property } => format!("Add the '{}' field", property),
            Self::SchemaUnexpectedField { field } => {
                format!("Remove '{}' or check its spelling", field)
            }
            Self::SchemaVersionUnsupported { supported, .. } => {
                format!("Use one of: {}", supported)
            }
            Self::DuplicateSlug { .. } => "Slugs must be unique within a project".to_string(),
            Self::CategoryCycle { .. } => {
                "Remove the nested category that points back to an ancestor".to_string()
            }
            Self::NoDefaultLanguage { .. } => {
                "Mark exactly one language with \"default\": true".to_string()
            }
            Self::MultipleDefaultLanguages { .. } => {
                "Keep \"default\": true on a single language".to_string()
            }
            Self::NoLatestVersion { .. } => {
                "Mark exactly one version with \"isLatest\": true".to_string()
            }
            Self::MultipleLatestVersions { .. } => {
                "Keep \"isLatest\": true on a single version".to_string()
            }
            Self::UnknownVersion { .. } | Self::UnknownLanguage { .. } => {
                "Declare it on the project or remove the reference".to_string()
            }
            Self::VisibilityStatusConflict { .. } => {
                "Publish the document or change its visibility to 'draft'".to_string()
            }
            Self::ContentFileNotFound { .. } => {
                "Create the file or set the content status to 'missing'".to_string()
            }
            Self::ContentStatusStale { .. } => {
                "Update the content status now that the file exists".to_string()
            }
            Self::DigestMismatch { .. } => {
                "Review the change and refresh the stored digest".to_string()
            }
            Self::ContentPathOutsideRoot { .. } => {
                "Use a path relative to the content root without '..' segments".to_string()
            }
            Self::TooManyKeywords { max, .. } | Self::TooManyTags { max, .. } => {
                format!("Keep at most {} entries", max)
            }
            _ => return None,
        };
        Some(hint)
    }
}

// =============================================================================
// Diagnostic
// =============================================================================

/// A single reported finding
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub severity: Severity,
}

impl Diagnostic {
    pub fn new(finding: Finding, path: Option<String>) -> Self {
        Self {
            code: finding.code(),
            message: finding.to_string(),
            hint: finding.hint(),
            path,
            severity: finding.default_severity(),
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code, self.severity, self.message)?;
        if let Some(path) = &self.path {
            write!(f, " ({})", path)?;
        }
        Ok(())
    }
}

// =============================================================================
// Diagnostics Collection
// =============================================================================

/// Counts over a collection, computed under a warnings-are-fatal preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub success: bool,
    pub error_count: usize,
    pub warning_count: usize,
    pub total_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: Diagnostic) {
        self.items.push(item);
    }

    /// Record a finding at its default severity
    pub fn report(&mut self, finding: Finding, path: impl Into<String>) {
        self.push(Diagnostic::new(finding, Some(path.into())));
    }

    /// Record a finding with no location in the registry
    pub fn report_global(&mut self, finding: Finding) {
        self.push(Diagnostic::new(finding, None));
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(Diagnostic::is_error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(|i| i.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(|i| i.severity == Severity::Warning)
    }

    pub fn all(&self) -> &[Diagnostic] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    /// Whether the run succeeds. Warnings only fail it when
    /// `warnings_as_errors` is set.
    pub fn passes(&self, warnings_as_errors: bool) -> bool {
        if warnings_as_errors {
            self.items.is_empty()
        } else {
            !self.has_errors()
        }
    }

    pub fn summary(&self, warnings_as_errors: bool) -> Summary {
        Summary {
            success: self.passes(warnings_as_errors),
            error_count: self.error_count(),
            warning_count: self.warning_count(),
            total_count: self.len(),
        }
    }

    pub fn has_code(&self, code: &str) -> bool {
        self.items.iter().any(|i| i.code == code)
    }

    pub fn count_code(&self, code: &str) -> usize {
        self.items.iter().filter(|i| i.code == code).count()
    }

    pub fn merge(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finding_severity() {
        let missing = Finding::RelatedDocumentMissing {
            document: "a".into(),
            related: "b".into(),
        };
        assert_eq!(missing.default_severity(), Severity::Warning);

        let dup = Finding::DuplicateDocumentId {
            project: "p".into(),
            id: "a".into(),
        };
        assert_eq!(dup.default_severity(), Severity::Error);
        assert_eq!(dup.code(), "REF_DUPLICATE_DOCUMENT");
    }

    #[test]
    fn test_message_carries_parameters() {
        let d = Diagnostic::new(
            Finding::TooManyTags {
                document: "intro".into(),
                count: 12,
                max: 10,
            },
            Some("projects[0].documents[0].tags".into()),
        );
        assert_eq!(d.message, "Document 'intro' has 12 tags (max 10)");
        assert_eq!(d.hint.as_deref(), Some("Keep at most 10 entries"));
    }

    #[test]
    fn test_collection_passes() {
        let mut diags = Diagnostics::new();
        diags.report(
            Finding::NoLatestVersion {
                project: "p".into(),
            },
            "projects[0].versions",
        );
        assert!(diags.passes(false));
        assert!(!diags.passes(true));

        diags.report_global(Finding::Internal {
            detail: "boom".into(),
        });
        assert!(!diags.passes(false));

        let summary = diags.summary(false);
        assert_eq!(summary.error_count, 1);
        assert_eq!(summary.warning_count, 1);
        assert_eq!(summary.total_count, 2);
        assert!(!summary.success);
    }
}
