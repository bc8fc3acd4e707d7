//! Schema Validation
//!
//! Validates the raw registry document against the embedded JSON Schema and
//! checks the `schemaVersion` field. Every violation becomes one diagnostic
//! with a dotted path such as `projects[0].documents[2].versions[0]`.

use include_dir::{include_dir, Dir};
use jsonschema::error::{TypeKind, ValidationErrorKind};
use jsonschema::{Draft, JSONSchema};
use serde_json::Value;

use crate::diagnostics::{Diagnostics, Finding};
use crate::error::{EngineError, Result};
use crate::version::{RegistrySchemaVersion, VersionCheck, SUPPORTED_SCHEMA_VERSIONS};

static SCHEMA_DIR: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/schemas");

const REGISTRY_SCHEMA: &str = "registry.schema.json";

/// Compiled structural schema
pub struct SchemaValidator {
    compiled: JSONSchema,
}

impl SchemaValidator {
    /// Compile the embedded registry schema
    pub fn new() -> Result<Self> {
        let file = SCHEMA_DIR
            .get_file(REGISTRY_SCHEMA)
            .ok_or_else(|| EngineError::SchemaAsset(format!("{} is not embedded", REGISTRY_SCHEMA)))?;
        let text = file
            .contents_utf8()
            .ok_or_else(|| EngineError::SchemaAsset(format!("{} is not UTF-8", REGISTRY_SCHEMA)))?;
        let schema: Value = serde_json::from_str(text)?;
        Self::from_schema(&schema)
    }

    /// Compile an arbitrary draft-7 schema
    pub fn from_schema(schema: &Value) -> Result<Self> {
        let compiled = JSONSchema::options()
            .with_draft(Draft::Draft7)
            .compile(schema)
            .map_err(|e| EngineError::SchemaAsset(e.to_string()))?;
        Ok(Self { compiled })
    }

    /// Validate a raw registry document
    pub fn validate(&self, document: &Value) -> Diagnostics {
        let mut diags = Diagnostics::new();

        check_schema_version(document, &mut diags);

        if let Err(errors) = self.compiled.validate(document) {
            for error in errors {
                let path = pointer_to_path(&error.instance_path.to_string());
                let instance = error.instance.to_string();
                let detail = error.to_string();
                match error.kind {
                    ValidationErrorKind::AdditionalProperties { unexpected } => {
                        for field in unexpected {
                            let field_path = join_field(&path, &field);
                            diags.report(Finding::SchemaUnexpectedField { field }, field_path);
                        }
                    }
                    ValidationErrorKind::Required { property } => {
                        let property = property
                            .as_str()
                            .map(str::to_string)
                            .unwrap_or_else(|| property.to_string());
                        diags.report(Finding::SchemaRequired { property }, path);
                    }
                    ValidationErrorKind::Type { kind } => {
                        let expected = match kind {
                            TypeKind::Single(ty) => ty.to_string(),
                            TypeKind::Multiple(_) => "one of several types".to_string(),
                        };
                        diags.report(Finding::SchemaType { expected }, path);
                    }
                    ValidationErrorKind::Pattern { pattern } => {
                        diags.report(
                            Finding::SchemaPattern {
                                value: instance,
                                pattern,
                            },
                            path,
                        );
                    }
                    ValidationErrorKind::Enum { options } => {
                        diags.report(
                            Finding::SchemaEnum {
                                value: instance,
                                allowed: options.to_string(),
                            },
                            path,
                        );
                    }
                    ValidationErrorKind::MinItems { limit } => {
                        diags.report(Finding::SchemaMinItems { limit }, path);
                    }
                    _ => {
                        diags.report(Finding::SchemaInvalid { detail }, path);
                    }
                }
            }
        }

        tracing::info!(errors = diags.error_count(), "schema validation finished");
        diags
    }
}

fn check_schema_version(document: &Value, diags: &mut Diagnostics) {
    match document.get("schemaVersion") {
        None => diags.report(Finding::SchemaVersionMissing, "schemaVersion"),
        // wrong type is reported by the structural pass
        Some(Value::String(raw)) => match RegistrySchemaVersion::check(raw) {
            VersionCheck::Supported(_) => {}
            VersionCheck::Unsupported(v) => diags.report(
                Finding::SchemaVersionUnsupported {
                    value: v.to_string(),
                    supported: SUPPORTED_SCHEMA_VERSIONS.join(", "),
                },
                "schemaVersion",
            ),
            VersionCheck::Malformed(reason) => diags.report(
                Finding::SchemaVersionInvalid {
                    value: raw.clone(),
                    reason,
                },
                "schemaVersion",
            ),
        },
        Some(_) => {}
    }
}

/// Convert a JSON pointer (`/projects/0/id`) into a dotted path
/// (`projects[0].id`). The root pointer maps to `registry`.
pub fn pointer_to_path(pointer: &str) -> String {
    let mut out = String::new();
    for raw in pointer.split('/').skip(1) {
        let segment = raw.replace("~1", "/").replace("~0", "~");
        if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
            out.push_str(&format!("[{}]", segment));
        } else {
            if !out.is_empty() {
                out.push('.');
            }
            out.push_str(&segment);
        }
    }
    if out.is_empty() {
        "registry".to_string()
    } else {
        out
    }
}

fn join_field(path: &str, field: &str) -> String {
    if path == "registry" {
        field.to_string()
    } else {
        format!("{}.{}", path, field)
    }
}
