use common::entities::ExternalClusterProvider;
use faststr::FastStr;
use std::fmt::Display;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectKey(pub FastStr);

impl ProjectKey {
    pub fn new(project: &str) -> Self {
        Self(project.to_owned().into())
    }
}

impl Display for ProjectKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClusterKey {
    pub project: FastStr,
    pub cluster: FastStr,
}

impl ClusterKey {
    pub fn new(project: &str, cluster: &str) -> Self {
        Self {
            project: project.to_owned().into(),
            cluster: cluster.to_owned().into(),
        }
    }
}

impl Display for ClusterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.project, self.cluster)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProviderKey {
    pub project:  FastStr,
    pub provider: ExternalClusterProvider,
}

impl Display for ProviderKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.project, self.provider)
    }
}

/// Admin endpoints have a single instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AdminKey;

impl Display for AdminKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "admin")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScheduleKey(pub FastStr);

impl Display for ScheduleKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `None` lists presets of every provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PresetKey(pub Option<FastStr>);

impl Display for PresetKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Some(provider) => write!(f, "{provider}"),
            None => write!(f, "*"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(ClusterKey::new("project-1", "cluster-A").to_string(), "project-1:cluster-A");
        assert_eq!(
            ProviderKey {
                project:  "p".into(),
                provider: ExternalClusterProvider::Eks,
            }
            .to_string(),
            "p:eks"
        );
        assert_eq!(PresetKey(None).to_string(), "*");
        assert_ne!(ClusterKey::new("a", "b"), ClusterKey::new("a", "c"));
    }
}
