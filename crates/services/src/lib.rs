//! Cached console entities. Every service polls its endpoints on its own
//! clock, shares one fetch between all observers of a key and refreshes
//! observed views right after a successful mutation.

mod clusters;
pub mod error;
mod external;
mod fetch;
pub mod keys;
mod metering;
mod presets;

use api_client::ApiClient;
use common::Config;

pub use clusters::ClusterService;
pub use external::{Credentials, ExternalClusterService};
pub use fetch::{GetJson, JsonCache};
pub use metering::MeteringService;
pub use presets::PresetService;

/// All services over one client.
#[derive(Clone)]
pub struct Services {
    pub clusters:          ClusterService,
    pub external_clusters: ExternalClusterService,
    pub metering:          MeteringService,
    pub presets:           PresetService,
}

impl Services {
    pub fn new(client: ApiClient, config: &Config) -> Self {
        Self {
            clusters:          ClusterService::new(client.clone(), config),
            external_clusters: ExternalClusterService::new(client.clone(), config),
            metering:          MeteringService::new(client.clone(), config),
            presets:           PresetService::new(client, config),
        }
    }
}
