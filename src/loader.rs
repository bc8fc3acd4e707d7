//! Registry Loading
//!
//! Reads a registry document from disk, normalizes it to a JSON value and
//! runs a cheap shape check so later stages can navigate it. Full structural
//! validation is the schema validator's job.

use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::error::LoadError;
use crate::registry::Registry;

/// Supported registry encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
    Toml,
}

impl DocumentFormat {
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            "toml" => Ok(Self::Toml),
            _ => Err(LoadError::UnsupportedFormat { extension: ext }),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Json => "JSON",
            Self::Yaml => "YAML",
            Self::Toml => "TOML",
        }
    }
}

/// Parse document text into a JSON value
pub fn parse_document(text: &str, format: DocumentFormat) -> Result<Value, LoadError> {
    let parse_err = |message: String| LoadError::Parse {
        format: format.name(),
        message,
    };
    match format {
        DocumentFormat::Json => serde_json::from_str(text).map_err(|e| parse_err(e.to_string())),
        DocumentFormat::Yaml => serde_yaml::from_str(text).map_err(|e| parse_err(e.to_string())),
        DocumentFormat::Toml => {
            let table: toml::Value = toml::from_str(text).map_err(|e| parse_err(e.to_string()))?;
            serde_json::to_value(table).map_err(|e| parse_err(e.to_string()))
        }
    }
}

/// Read, parse and shape-check a registry document
pub fn load_document(path: &Path) -> Result<Value, LoadError> {
    let format = DocumentFormat::from_path(path)?;
    let text = fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let value = parse_document(&text, format)?;
    check_shape(&value)?;
    tracing::debug!(path = %path.display(), "loaded registry document");
    Ok(value)
}

/// Load a registry straight into the typed graph
pub fn load_registry(path: &Path) -> Result<Registry, LoadError> {
    let value = load_document(path)?;
    Registry::from_value(value)
}

/// Gross shape checks: enough structure for the later passes to walk.
pub fn check_shape(value: &Value) -> Result<(), LoadError> {
    let root = value
        .as_object()
        .ok_or_else(|| LoadError::shape("registry root must be an object"))?;

    if !root.contains_key("schemaVersion") {
        return Err(LoadError::shape("missing 'schemaVersion'"));
    }
    if !root.get("metadata").map(Value::is_object).unwrap_or(false) {
        return Err(LoadError::shape("missing 'metadata' object"));
    }

    let projects = root
        .get("projects")
        .and_then(Value::as_array)
        .ok_or_else(|| LoadError::shape("'projects' must be a list"))?;
    if projects.is_empty() {
        return Err(LoadError::shape("'projects' must not be empty"));
    }

    for (i, project) in projects.iter().enumerate() {
        let Some(obj) = project.as_object() else {
            return Err(LoadError::shape(format!("projects[{}] must be an object", i)));
        };
        if !obj.get("id").map(Value::is_string).unwrap_or(false) {
            return Err(LoadError::shape(format!("projects[{}] has no 'id'", i)));
        }
        for list in ["documents", "languages", "versions"] {
            if !obj.get(list).map(Value::is_array).unwrap_or(false) {
                return Err(LoadError::shape(format!(
                    "projects[{}] has no '{}' list",
                    i, list
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal() -> Value {
        json!({
            "schemaVersion": "1.0.0",
            "metadata": {},
            "projects": [
                { "id": "p", "documents": [], "languages": [], "versions": [] }
            ]
        })
    }

    #[test]
    fn test_shape_accepts_minimal() {
        assert!(check_shape(&minimal()).is_ok());
    }

    #[test]
    fn test_shape_rejects_missing_pieces() {
        let mut v = minimal();
        v.as_object_mut().unwrap().remove("schemaVersion");
        assert!(matches!(check_shape(&v), Err(LoadError::Shape { .. })));

        let mut v = minimal();
        v["projects"] = json!([]);
        assert!(check_shape(&v).is_err());

        let mut v = minimal();
        v["projects"][0].as_object_mut().unwrap().remove("versions");
        let err = check_shape(&v).unwrap_err();
        assert!(err.to_string().contains("versions"));
    }

    #[test]
    fn test_parse_yaml_and_toml() {
        let yaml = "schemaVersion: '1.0.0'\nmetadata: {}\nprojects:\n  - id: p\n    documents: []\n    languages: []\n    versions: []\n";
        let v = parse_document(yaml, DocumentFormat::Yaml).unwrap();
        assert!(check_shape(&v).is_ok());

        let toml = "schemaVersion = \"1.0.0\"\n[metadata]\n[[projects]]\nid = \"p\"\ndocuments = []\nlanguages = []\nversions = []\n";
        let v = parse_document(toml, DocumentFormat::Toml).unwrap();
        assert!(check_shape(&v).is_ok());
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(matches!(load_document(&missing), Err(LoadError::Read { .. })));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{ not json").unwrap();
        assert!(matches!(load_document(&bad), Err(LoadError::Parse { .. })));

        let other = dir.path().join("registry.ini");
        assert!(matches!(
            load_document(&other),
            Err(LoadError::UnsupportedFormat { .. })
        ));
    }
}
