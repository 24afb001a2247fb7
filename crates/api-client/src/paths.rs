//! URL templates below the API root. Every id is percent-encoded as a
//! single path segment.

use std::fmt::Display;

fn segment(value: impl Display) -> String {
    urlencoding::encode(&value.to_string()).into_owned()
}

pub fn clusters(project: impl Display) -> String {
    format!("projects/{}/clusters", segment(project))
}

pub fn cluster(project: impl Display, cluster: impl Display) -> String {
    format!("projects/{}/clusters/{}", segment(project), segment(cluster))
}

pub fn cluster_health(project: impl Display, cluster: impl Display) -> String {
    format!("projects/{}/clusters/{}/health", segment(project), segment(cluster))
}

pub fn cluster_events(project: impl Display, cluster: impl Display) -> String {
    format!("projects/{}/clusters/{}/events", segment(project), segment(cluster))
}

pub fn machine_deployments(project: impl Display, cluster: impl Display) -> String {
    format!("projects/{}/clusters/{}/machinedeployments", segment(project), segment(cluster))
}

pub fn external_clusters(project: impl Display) -> String {
    format!("projects/{}/kubernetes/clusters", segment(project))
}

pub fn external_cluster(project: impl Display, cluster: impl Display) -> String {
    format!("projects/{}/kubernetes/clusters/{}", segment(project), segment(cluster))
}

pub fn provider_clusters(project: impl Display, provider: impl Display) -> String {
    format!("projects/{}/providers/{}/clusters", segment(project), segment(provider))
}

pub fn metering_schedules() -> String {
    "admin/metering/configurations/reports".to_owned()
}

pub fn metering_schedule(name: impl Display) -> String {
    format!("admin/metering/configurations/reports/{}", segment(name))
}

pub fn metering_reports() -> String {
    "admin/metering/reports".to_owned()
}

pub fn metering_report(report: impl Display) -> String {
    format!("admin/metering/reports/{}", segment(report))
}

pub fn presets(provider: Option<impl Display>) -> String {
    match provider {
        Some(provider) => format!("providers/{}/presets", segment(provider)),
        None => "presets".to_owned(),
    }
}

pub fn preset_status(name: impl Display) -> String {
    format!("presets/{}/status", segment(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates() {
        assert_eq!(cluster_health("p1", "c1"), "projects/p1/clusters/c1/health");
        assert_eq!(provider_clusters("p1", "eks"), "projects/p1/providers/eks/clusters");
        assert_eq!(presets(Some("aws")), "providers/aws/presets");
        assert_eq!(presets(None::<&str>), "presets");
        assert_eq!(
            metering_report("weekly/2026-10-05.csv"),
            "admin/metering/reports/weekly%2F2026-10-05.csv"
        );
        assert_eq!(cluster("p 1", "c?1"), "projects/p%201/clusters/c%3F1");
    }
}
