use crate::{
    error::Result,
    fetch::{JsonCache, Wiring},
    keys::{ClusterKey, ProjectKey},
};
use api_client::{ApiClient, ApiRequest, paths};
use cache::{InvalidationSignal, Observation, RefreshClock};
use common::{
    Config,
    entities::{Cluster, ClusterHealth, Event, MachineDeployment},
};
use serde::Serialize;
use tracing::info;

const REFRESH_MULTIPLIER: u32 = 10;
const HEALTH_REFRESH_MULTIPLIER: u32 = 5;

/// Clusters of a project and the per-cluster views hanging off them. All
/// caches share one clock and one invalidation signal, so any mutation
/// refreshes every cluster view currently observed.
#[derive(Clone)]
pub struct ClusterService {
    client:              ApiClient,
    clusters:            JsonCache<ProjectKey, Vec<Cluster>>,
    cluster:             JsonCache<ClusterKey, Cluster>,
    health:              JsonCache<ClusterKey, ClusterHealth>,
    events:              JsonCache<ClusterKey, Vec<Event>>,
    machine_deployments: JsonCache<ClusterKey, Vec<MachineDeployment>>,
}

impl ClusterService {
    pub fn new(client: ApiClient, config: &Config) -> Self {
        let clock = RefreshClock::start(config.refresh_every(REFRESH_MULTIPLIER));
        let health_clock = RefreshClock::start(config.refresh_every(HEALTH_REFRESH_MULTIPLIER));
        Self::with_clocks(client, clock, health_clock)
    }

    pub fn with_clock(client: ApiClient, clock: RefreshClock) -> Self {
        Self::with_clocks(client, clock.clone(), clock)
    }

    /// Health polls on its own, usually faster, clock.
    pub fn with_clocks(client: ApiClient, clock: RefreshClock, health_clock: RefreshClock) -> Self {
        let signal = InvalidationSignal::new();
        let wiring = Wiring {
            client: &client,
            clock:  &clock,
            signal: &signal,
        };
        let health_wiring = Wiring {
            clock: &health_clock,
            ..wiring
        };

        Self {
            clusters: wiring.json_cache(
                "clusters",
                |k: &ProjectKey| ApiRequest::get(paths::clusters(&k.0)),
                Vec::new(),
            ),
            cluster: wiring.json_cache(
                "cluster",
                |k: &ClusterKey| ApiRequest::get(paths::cluster(&k.project, &k.cluster)),
                Cluster::default(),
            ),
            health: health_wiring.json_cache(
                "cluster-health",
                |k: &ClusterKey| ApiRequest::get(paths::cluster_health(&k.project, &k.cluster)),
                ClusterHealth::default(),
            ),
            events: wiring.json_cache(
                "cluster-events",
                |k: &ClusterKey| ApiRequest::get(paths::cluster_events(&k.project, &k.cluster)),
                Vec::new(),
            ),
            machine_deployments: wiring.json_cache(
                "machine-deployments",
                |k: &ClusterKey| {
                    ApiRequest::get(paths::machine_deployments(&k.project, &k.cluster))
                },
                Vec::new(),
            ),
            client,
        }
    }

    pub fn clusters(&self, project: &str) -> Observation<Vec<Cluster>> {
        self.clusters.get_or_create(ProjectKey::new(project))
    }

    /// Resolves to an empty placeholder cluster while the cluster cannot be fetched.
    pub fn cluster(&self, project: &str, cluster: &str) -> Observation<Cluster> {
        self.cluster.get_or_create(ClusterKey::new(project, cluster))
    }

    pub fn health(&self, project: &str, cluster: &str) -> Observation<ClusterHealth> {
        self.health.get_or_create(ClusterKey::new(project, cluster))
    }

    pub fn events(&self, project: &str, cluster: &str) -> Observation<Vec<Event>> {
        self.events.get_or_create(ClusterKey::new(project, cluster))
    }

    pub fn machine_deployments(
        &self,
        project: &str,
        cluster: &str,
    ) -> Observation<Vec<MachineDeployment>> {
        self.machine_deployments
            .get_or_create(ClusterKey::new(project, cluster))
    }

    pub fn refresh_clusters(&self, project: Option<&str>) {
        let key = project.map(ProjectKey::new);
        self.clusters.invalidate(key.as_ref());
    }

    pub fn refresh_cluster(&self, project: &str, cluster: &str) {
        self.cluster
            .invalidate(Some(&ClusterKey::new(project, cluster)));
    }

    pub async fn create<B: Serialize>(&self, project: &str, body: &B) -> Result<Cluster> {
        let request = ApiRequest::post(paths::clusters(project), body)?;
        let cluster: Cluster = self.client.execute(request).await?;
        info!(project, cluster = %cluster.id, "cluster created");
        self.refresh_clusters(Some(project));
        Ok(cluster)
    }

    pub async fn patch<B: Serialize>(&self, project: &str, cluster: &str, patch: &B) -> Result<Cluster> {
        let request = ApiRequest::patch(paths::cluster(project, cluster), patch)?;
        let updated = self.client.execute(request).await?;
        self.refresh_cluster(project, cluster);
        Ok(updated)
    }

    pub async fn delete(&self, project: &str, cluster: &str) -> Result<()> {
        self.client
            .execute_unit(ApiRequest::delete(paths::cluster(project, cluster)))
            .await?;
        info!(project, cluster, "cluster deleted");
        self.refresh_clusters(Some(project));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{api_client, settle};
    use cache::EntryState;
    use futures_util::StreamExt;
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    #[tokio::test]
    async fn test_cluster_list_and_detail() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/projects/p1/clusters"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": "c1", "name": "prod" },
                { "id": "c2", "name": "staging" }
            ])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v2/projects/p1/clusters/c1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "c1", "name": "prod" })))
            .expect(1)
            .mount(&server)
            .await;

        let (clock, _driver) = RefreshClock::manual();
        let service = ClusterService::with_clock(api_client(&server), clock);

        let mut list = service.clusters("p1");
        let mut shared = service.clusters("p1");
        let names: Vec<_> = list.next().await.unwrap().iter().map(|c| c.name.to_string()).collect();
        assert_eq!(names, ["prod", "staging"]);
        assert_eq!(shared.next().await.unwrap().len(), 2);

        let detail = service.cluster("p1", "c1");
        assert_eq!(detail.value().await.unwrap().name.as_str(), "prod");
    }

    #[tokio::test]
    async fn test_detail_failure_yields_placeholder() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let (clock, _driver) = RefreshClock::manual();
        let service = ClusterService::with_clock(api_client(&server), clock);

        let cluster = service.cluster("p1", "gone").value().await.unwrap();
        assert!(cluster.is_placeholder());
        let health = service.health("p1", "gone").value().await.unwrap();
        assert!(!health.is_healthy());
        assert!(service.events("p1", "gone").value().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_patch_refreshes_observed_views() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/projects/p1/clusters/c1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "c1", "name": "prod" })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v2/projects/p1/clusters/c1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "c1", "name": "renamed" })))
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/api/v2/projects/p1/clusters/c1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "c1", "name": "renamed" })))
            .expect(1)
            .mount(&server)
            .await;

        let (clock, _driver) = RefreshClock::manual();
        let service = ClusterService::with_clock(api_client(&server), clock);

        let mut detail = service.cluster("p1", "c1");
        assert_eq!(detail.next().await.unwrap().name.as_str(), "prod");

        let updated = service
            .patch("p1", "c1", &json!({ "name": "renamed" }))
            .await
            .unwrap();
        assert_eq!(updated.name.as_str(), "renamed");
        assert_eq!(detail.next().await.unwrap().name.as_str(), "renamed");
        assert_eq!(detail.state(), EntryState::HasValue);

        // Re-observing after the mutation joins the refreshed entry.
        let again = service.cluster("p1", "c1");
        assert_eq!(again.latest().unwrap().name.as_str(), "renamed");
        assert_eq!(service.cluster.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_refreshes_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/projects/p1/clusters"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": "c1" }])))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v2/projects/p1/clusters"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/v2/projects/p1/clusters/c1"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let (clock, _driver) = RefreshClock::manual();
        let service = ClusterService::with_clock(api_client(&server), clock);

        let mut list = service.clusters("p1");
        assert_eq!(list.next().await.unwrap().len(), 1);

        service.delete("p1", "c1").await.unwrap();
        assert!(list.next().await.unwrap().is_empty());
        settle().await;
        assert!(list.latest().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_health_polls_on_its_own_clock() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/projects/p1/clusters/c1/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "apiserver": "HealthStatusUp" })))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v2/projects/p1/clusters/c1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "c1" })))
            .expect(1)
            .mount(&server)
            .await;

        let (clock, _driver) = RefreshClock::manual();
        let (health_clock, health_driver) = RefreshClock::manual();
        let service = ClusterService::with_clocks(api_client(&server), clock, health_clock);

        let mut health = service.health("p1", "c1");
        let mut detail = service.cluster("p1", "c1");
        health.next().await.unwrap();
        detail.next().await.unwrap();

        health_driver.tick();
        health.next().await.unwrap();
        settle().await;
        assert!(detail.latest().is_some());
    }

    #[tokio::test]
    async fn test_failed_mutation_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(422).set_body_string("invalid spec"))
            .mount(&server)
            .await;

        let (clock, _driver) = RefreshClock::manual();
        let service = ClusterService::with_clock(api_client(&server), clock);
        let err = service.create("p1", &json!({ "name": "" })).await.unwrap_err();
        assert!(matches!(err, crate::error::Error::Api(ref e) if e.status() == Some(422)));
    }
}
