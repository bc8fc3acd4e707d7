//! Registry schema version handling

use semver::Version;
use std::fmt;

/// Schema versions this engine can validate
pub const SUPPORTED_SCHEMA_VERSIONS: &[&str] = &["1.0.0", "1.1.0"];

/// Outcome of checking a registry's `schemaVersion`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionCheck {
    Supported(RegistrySchemaVersion),
    Unsupported(RegistrySchemaVersion),
    Malformed(String),
}

/// A parsed `schemaVersion` value
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct RegistrySchemaVersion {
    pub version: Version,
}

impl RegistrySchemaVersion {
    /// Parse a version string. A leading `v` is not accepted; the registry
    /// field is a bare semantic version.
    pub fn parse(version_str: &str) -> Result<Self, semver::Error> {
        let version = Version::parse(version_str.trim())?;
        Ok(Self { version })
    }

    pub fn is_supported(&self) -> bool {
        SUPPORTED_SCHEMA_VERSIONS
            .iter()
            .filter_map(|v| Version::parse(v).ok())
            .any(|v| v == self.version)
    }

    /// Classify a raw `schemaVersion` value
    pub fn check(raw: &str) -> VersionCheck {
        match Self::parse(raw) {
            Ok(v) if v.is_supported() => VersionCheck::Supported(v),
            Ok(v) => VersionCheck::Unsupported(v),
            Err(e) => VersionCheck::Malformed(e.to_string()),
        }
    }
}

impl fmt::Display for RegistrySchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_version() {
        assert!(matches!(
            RegistrySchemaVersion::check("1.0.0"),
            VersionCheck::Supported(_)
        ));
    }

    #[test]
    fn test_unsupported_version() {
        match RegistrySchemaVersion::check("9.0.0") {
            VersionCheck::Unsupported(v) => assert_eq!(v.to_string(), "9.0.0"),
            other => panic!("Expected Unsupported, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_version() {
        assert!(matches!(
            RegistrySchemaVersion::check("one.two"),
            VersionCheck::Malformed(_)
        ));
        assert!(matches!(
            RegistrySchemaVersion::check("v1.0.0"),
            VersionCheck::Malformed(_)
        ));
    }
}
