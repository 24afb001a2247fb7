use chrono::{DateTime, Utc};
use faststr::FastStr;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    #[serde(default)]
    pub id:                 FastStr,
    #[serde(default)]
    pub name:               FastStr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletion_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub spec:               ClusterSpec,
    #[serde(default)]
    pub status:             ClusterStatus,
}

impl Cluster {
    /// True for the placeholder substituted when the detail fetch fails.
    pub fn is_placeholder(&self) -> bool {
        self.id.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSpec {
    #[serde(default)]
    pub version: FastStr,
    /// Provider specific settings, kept as raw JSON.
    #[serde(default)]
    pub cloud:   Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterStatus {
    #[serde(default)]
    pub version: FastStr,
    #[serde(default)]
    pub url:     FastStr,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    #[default]
    #[serde(rename = "HealthStatusDown")]
    Down,
    #[serde(rename = "HealthStatusUp")]
    Up,
    #[serde(rename = "HealthStatusProvisioning")]
    Provisioning,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterHealth {
    #[serde(default)]
    pub apiserver:          HealthStatus,
    #[serde(default)]
    pub controller:         HealthStatus,
    #[serde(default)]
    pub etcd:               HealthStatus,
    #[serde(default)]
    pub machine_controller: HealthStatus,
    #[serde(default)]
    pub scheduler:          HealthStatus,
}

impl ClusterHealth {
    pub fn is_healthy(&self) -> bool {
        [
            self.apiserver,
            self.controller,
            self.etcd,
            self.machine_controller,
            self.scheduler,
        ]
        .iter()
        .all(|s| *s == HealthStatus::Up)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(default)]
    pub name:           FastStr,
    #[serde(default, rename = "type")]
    pub ty:             FastStr,
    #[serde(default)]
    pub message:        FastStr,
    #[serde(default)]
    pub count:          u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_timestamp: Option<DateTime<Utc>>,
}

/// A node pool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineDeployment {
    #[serde(default)]
    pub id:       FastStr,
    #[serde(default)]
    pub name:     FastStr,
    #[serde(default)]
    pub replicas: u32,
    #[serde(default)]
    pub spec:     Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_from_api() {
        let cluster: Cluster = serde_json::from_value(serde_json::json!({
            "id": "4k6txp5sq",
            "name": "prod",
            "creationTimestamp": "2024-03-01T10:00:00Z",
            "spec": { "version": "1.29.2", "cloud": { "aws": {} } },
            "status": { "version": "1.29.2", "url": "https://4k6txp5sq.example:6443" }
        }))
        .unwrap();
        assert_eq!(cluster.id.as_str(), "4k6txp5sq");
        assert!(!cluster.is_placeholder());
        assert!(cluster.creation_timestamp.is_some());
        assert!(Cluster::default().is_placeholder());
    }

    #[test]
    fn test_health() {
        let health: ClusterHealth = serde_json::from_value(serde_json::json!({
            "apiserver": "HealthStatusUp",
            "controller": "HealthStatusUp",
            "etcd": "HealthStatusUp",
            "machineController": "HealthStatusUp",
            "scheduler": "HealthStatusProvisioning"
        }))
        .unwrap();
        assert!(!health.is_healthy());
        assert!(!ClusterHealth::default().is_healthy());
    }
}
