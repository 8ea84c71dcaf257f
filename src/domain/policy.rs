use std::{fmt, str::FromStr};

use serde::Deserialize;

/// What happens to dependents when their parent record is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeletePolicy {
    /// Dependents are deleted together with the parent.
    Cascade,
    /// The delete is rejected while dependents exist.
    Restrict,
}

impl FromStr for DeletePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cascade" => Ok(DeletePolicy::Cascade),
            "restrict" => Ok(DeletePolicy::Restrict),
            _ => Err(format!("Invalid delete policy: {}", s)),
        }
    }
}

impl fmt::Display for DeletePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeletePolicy::Cascade => "cascade",
            DeletePolicy::Restrict => "restrict",
        };
        write!(f, "{s}")
    }
}

/// Policies for the two parent relationships of the model.
///
/// - `category` governs Category → Project
/// - `project` governs Project → attachments and testimonies
///
/// Project ↔ Skill links are always removed with either side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeletePolicies {
    pub category: DeletePolicy,
    pub project: DeletePolicy,
}

impl Default for DeletePolicies {
    fn default() -> Self {
        DeletePolicies {
            category: DeletePolicy::Restrict,
            project: DeletePolicy::Cascade,
        }
    }
}
