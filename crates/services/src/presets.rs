use crate::{
    error::Result,
    fetch::{JsonCache, Wiring},
    keys::PresetKey,
};
use api_client::{ApiClient, ApiRequest, paths};
use cache::{InvalidationSignal, Observation, RefreshClock};
use common::{Config, entities::PresetList};
use serde_json::json;
use tracing::info;

const REFRESH_MULTIPLIER: u32 = 30;

#[derive(Clone)]
pub struct PresetService {
    client:  ApiClient,
    presets: JsonCache<PresetKey, PresetList>,
}

impl PresetService {
    pub fn new(client: ApiClient, config: &Config) -> Self {
        let clock = RefreshClock::start(config.refresh_every(REFRESH_MULTIPLIER));
        Self::with_clock(client, clock)
    }

    pub fn with_clock(client: ApiClient, clock: RefreshClock) -> Self {
        let signal = InvalidationSignal::new();
        let wiring = Wiring {
            client: &client,
            clock:  &clock,
            signal: &signal,
        };

        Self {
            presets: wiring.json_cache(
                "presets",
                |k: &PresetKey| ApiRequest::get(paths::presets(k.0.as_ref())),
                PresetList::default(),
            ),
            client,
        }
    }

    /// Presets usable with `provider`, or all of them.
    pub fn presets(&self, provider: Option<&str>) -> Observation<PresetList> {
        self.presets
            .get_or_create(PresetKey(provider.map(|p| p.to_owned().into())))
    }

    pub fn refresh(&self) {
        self.presets.invalidate(None);
    }

    /// Enables or disables `name`, for one provider or as a whole.
    pub async fn set_enabled(&self, name: &str, provider: Option<&str>, enabled: bool) -> Result<()> {
        let mut request = ApiRequest::put(paths::preset_status(name), &json!({ "enabled": enabled }))?;
        if let Some(provider) = provider {
            request = request.query("provider", provider.to_owned());
        }
        self.client.execute_unit(request).await?;
        info!(preset = name, provider = provider.unwrap_or("*"), enabled, "preset status changed");
        self.refresh();
        Ok(())
    }
}
