use crate::{
    error::{Error, Result},
    fetch::{JsonCache, Wiring},
    keys::{ClusterKey, ProjectKey, ProviderKey},
};
use api_client::{ApiClient, ApiRequest, paths};
use cache::{CacheBuilder, Fetch, Guarded, InvalidationSignal, KeyedCache, Observation, RefreshClock};
use common::{
    Config,
    entities::{ExternalCluster, ExternalClusterProvider, ProviderCluster},
};
use dashmap::DashMap;
use faststr::FastStr;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

const REFRESH_MULTIPLIER: u32 = 10;

/// How provider calls authenticate against the hosted provider.
#[derive(Debug, Clone, PartialEq)]
pub enum Credentials {
    /// Name of a stored preset.
    Preset(FastStr),
    /// Raw provider credentials passed as request headers.
    Headers(Vec<(FastStr, FastStr)>),
}

impl Credentials {
    fn apply(&self, mut request: ApiRequest) -> ApiRequest {
        match self {
            Self::Preset(name) => request.header("Credential", name.clone()),
            Self::Headers(headers) => {
                for (k, v) in headers {
                    request = request.header(k.clone(), v.clone());
                }
                request
            }
        }
    }
}

type CredentialStore = Arc<DashMap<ExternalClusterProvider, Credentials>>;
type CredentialGate = Box<dyn Fn(&ProviderKey) -> bool + Send + Sync>;

/// Lists the clusters a provider offers for import.
struct ProviderClusters {
    client:      ApiClient,
    credentials: CredentialStore,
}

impl Fetch<ProviderKey, Vec<ProviderCluster>> for ProviderClusters {
    type Error = Error;

    fn fetch(
        &self,
        key: &ProviderKey,
    ) -> impl Future<Output = Result<Vec<ProviderCluster>>> + Send {
        let request = self.credentials.get(&key.provider).map(|credentials| {
            credentials.apply(ApiRequest::get(paths::provider_clusters(
                &key.project,
                key.provider,
            )))
        });
        let provider = key.provider;
        async move {
            let request = request.ok_or(Error::MissingCredentials(provider))?;
            Ok(self.client.execute(request).await?)
        }
    }
}

#[derive(Clone)]
pub struct ExternalClusterService {
    client:            ApiClient,
    credentials:       CredentialStore,
    external_clusters: JsonCache<ProjectKey, Vec<ExternalCluster>>,
    external_cluster:  JsonCache<ClusterKey, ExternalCluster>,
    provider_clusters: KeyedCache<ProviderKey, Vec<ProviderCluster>, Guarded<ProviderClusters, CredentialGate>>,
}

impl ExternalClusterService {
    pub fn new(client: ApiClient, config: &Config) -> Self {
        let clock = RefreshClock::start(config.refresh_every(REFRESH_MULTIPLIER));
        Self::with_clock(client, clock)
    }

    pub fn with_clock(client: ApiClient, clock: RefreshClock) -> Self {
        let signal = InvalidationSignal::new();
        let credentials = CredentialStore::default();
        let wiring = Wiring {
            client: &client,
            clock:  &clock,
            signal: &signal,
        };

        let external_clusters = wiring.json_cache(
            "external-clusters",
            |k: &ProjectKey| ApiRequest::get(paths::external_clusters(&k.0)),
            Vec::new(),
        );
        let external_cluster = wiring.json_cache(
            "external-cluster",
            |k: &ClusterKey| ApiRequest::get(paths::external_cluster(&k.project, &k.cluster)),
            ExternalCluster::default(),
        );
        let store = credentials.clone();
        let gate: CredentialGate = Box::new(move |k: &ProviderKey| store.contains_key(&k.provider));
        // Skipped until credentials for the provider are set.
        let fetcher = Guarded::new(
            ProviderClusters {
                client:      client.clone(),
                credentials: credentials.clone(),
            },
            gate,
        );
        // Candidates have their own signal so credential changes do not
        // refetch the imported clusters.
        let provider_clusters = CacheBuilder::new("provider-clusters", fetcher, Vec::new())
            .clock(clock.clone())
            .build();

        Self {
            client,
            credentials,
            external_clusters,
            external_cluster,
            provider_clusters,
        }
    }

    pub fn external_clusters(&self, project: &str) -> Observation<Vec<ExternalCluster>> {
        self.external_clusters
            .get_or_create(ProjectKey::new(project))
    }

    pub fn external_cluster(&self, project: &str, cluster: &str) -> Observation<ExternalCluster> {
        self.external_cluster
            .get_or_create(ClusterKey::new(project, cluster))
    }

    /// Stays empty until [`Self::set_credentials`] is called for `provider`.
    pub fn provider_clusters(
        &self,
        project: &str,
        provider: ExternalClusterProvider,
    ) -> Observation<Vec<ProviderCluster>> {
        self.provider_clusters.get_or_create(ProviderKey {
            project: project.to_owned().into(),
            provider,
        })
    }

    pub fn set_credentials(&self, provider: ExternalClusterProvider, credentials: Credentials) {
        info!(%provider, "provider credentials set");
        self.credentials.insert(provider, credentials);
        self.provider_clusters.invalidate(None);
    }

    /// Observed candidate lists of `provider` fall back to empty.
    pub fn clear_credentials(&self, provider: ExternalClusterProvider) {
        if self.credentials.remove(&provider).is_some() {
            info!(%provider, "provider credentials cleared");
            self.provider_clusters.invalidate(None);
        }
    }

    pub fn has_credentials(&self, provider: ExternalClusterProvider) -> bool {
        self.credentials.contains_key(&provider)
    }

    pub fn refresh_external_clusters(&self, project: Option<&str>) {
        let key = project.map(ProjectKey::new);
        self.external_clusters.invalidate(key.as_ref());
    }

    /// Imports a provider cluster into `project`.
    pub async fn import<B: Serialize>(
        &self,
        project: &str,
        provider: ExternalClusterProvider,
        body: &B,
    ) -> Result<ExternalCluster> {
        let credentials = self
            .credentials
            .get(&provider)
            .map(|c| c.value().clone())
            .ok_or(Error::MissingCredentials(provider))?;
        let request = credentials.apply(ApiRequest::post(paths::external_clusters(project), body)?);
        let cluster: ExternalCluster = self.client.execute(request).await?;
        info!(project, %provider, cluster = %cluster.id, "external cluster imported");
        self.refresh_external_clusters(Some(project));
        Ok(cluster)
    }

    pub async fn delete(&self, project: &str, cluster: &str) -> Result<()> {
        self.client
            .execute_unit(ApiRequest::delete(paths::external_cluster(project, cluster)))
            .await?;
        info!(project, cluster, "external cluster disconnected");
        self.refresh_external_clusters(Some(project));
        Ok(())
    }
}
