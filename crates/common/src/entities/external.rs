use chrono::{DateTime, Utc};
use faststr::FastStr;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExternalClusterProvider {
    Aks,
    Eks,
    Gke,
}

impl ExternalClusterProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aks => "aks",
            Self::Eks => "eks",
            Self::Gke => "gke",
        }
    }
}

impl Display for ExternalClusterProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A cluster managed outside the platform and imported into a project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalCluster {
    #[serde(default)]
    pub id:                 FastStr,
    #[serde(default)]
    pub name:               FastStr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider:           Option<ExternalClusterProvider>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub version:            FastStr,
}

/// A cluster offered by a hosted provider, candidate for import.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderCluster {
    #[serde(default)]
    pub name:     FastStr,
    #[serde(default)]
    pub region:   FastStr,
    #[serde(default)]
    pub imported: bool,
}
