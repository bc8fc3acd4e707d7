//! Visibility Policy
//!
//! The single decision function for build inclusion. Validators and
//! generators call into this module; none of them re-implement the table.
//!
//! | visibility | production | staging | development | preview |
//! |------------|------------|---------|-------------|---------|
//! | public     | yes        | yes     | yes         | yes     |
//! | internal   | no         | yes     | yes         | yes     |
//! | draft      | no         | no      | yes         | yes     |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::EngineError;
use crate::registry::Visibility;

/// Build target context
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Production,
    Staging,
    Development,
    Preview,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Staging => "staging",
            Self::Development => "development",
            Self::Preview => "preview",
        }
    }

    pub fn is_production(&self) -> bool {
        *self == Self::Production
    }
}

impl FromStr for Environment {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Self::Production),
            "staging" => Ok(Self::Staging),
            "development" | "dev" => Ok(Self::Development),
            "preview" => Ok(Self::Preview),
            other => Err(EngineError::InvalidEnvironment(other.to_string())),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict of the policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub should_build: bool,
    pub reason: String,
}

impl Decision {
    fn build(reason: String) -> Self {
        Self {
            should_build: true,
            reason,
        }
    }

    fn skip(reason: String) -> Self {
        Self {
            should_build: false,
            reason,
        }
    }
}

/// Decide whether content with `visibility` is built in `environment`.
///
/// Both inputs are compared case-insensitively. An unrecognized environment
/// is treated as a non-production, non-preview target.
pub fn decide(visibility: &str, environment: &str) -> Decision {
    let vis = visibility.trim().to_ascii_lowercase();
    let env = environment.trim().to_ascii_lowercase();

    match vis.as_str() {
        "public" => Decision::build("public content is always built".to_string()),
        "draft" => {
            if env == "development" || env == "preview" {
                Decision::build(format!("draft content is built in {}", env))
            } else {
                Decision::skip(format!(
                    "draft content is only built in development or preview, not {}",
                    env
                ))
            }
        }
        "internal" => {
            if env == "production" {
                Decision::skip("internal content is not built in production".to_string())
            } else {
                Decision::build(format!("internal content is built in {}", env))
            }
        }
        other => Decision::skip(format!("unrecognized visibility '{}'", other)),
    }
}

/// Policy bound to a configured default environment
#[derive(Debug, Clone, Default)]
pub struct VisibilityPolicy {
    default_environment: Environment,
}

impl VisibilityPolicy {
    pub fn new(default_environment: Environment) -> Self {
        Self {
            default_environment,
        }
    }

    pub fn default_environment(&self) -> &Environment {
        &self.default_environment
    }

    /// Decide with an optional environment name, falling back to the default
    pub fn decide(&self, visibility: &str, environment: Option<&str>) -> Decision {
        decide(
            visibility,
            environment.unwrap_or(self.default_environment.as_str()),
        )
    }
}

/// Typed convenience over [`decide`]
pub fn allows(visibility: Visibility, environment: &Environment) -> Decision {
    decide(visibility.as_str(), environment.as_str())
}
