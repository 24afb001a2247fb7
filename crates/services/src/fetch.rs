use api_client::{ApiClient, ApiRequest};
use cache::{CacheBuilder, CacheKey, Fetch, InvalidationSignal, KeyedCache, RefreshClock};
use serde::de::DeserializeOwned;

/// GETs the JSON document a key maps to.
pub struct GetJson<K> {
    client:  ApiClient,
    request: fn(&K) -> ApiRequest,
}

impl<K> GetJson<K> {
    pub fn new(client: ApiClient, request: fn(&K) -> ApiRequest) -> Self {
        Self { client, request }
    }
}

impl<K, T> Fetch<K, T> for GetJson<K>
where
    K: Send + Sync + 'static,
    T: DeserializeOwned + Send + 'static,
{
    type Error = api_client::error::Error;

    fn fetch(&self, key: &K) -> impl Future<Output = Result<T, Self::Error>> + Send {
        let request = (self.request)(key);
        async move { self.client.execute(request).await }
    }
}

pub type JsonCache<K, T> = KeyedCache<K, T, GetJson<K>>;

/// Everything a service needs to wire one cached endpoint.
pub(crate) struct Wiring<'a> {
    pub(crate) client: &'a ApiClient,
    pub(crate) clock:  &'a RefreshClock,
    pub(crate) signal: &'a InvalidationSignal,
}

impl Wiring<'_> {
    pub(crate) fn json_cache<K, T>(
        &self,
        name: &'static str,
        request: fn(&K) -> ApiRequest,
        default: T,
    ) -> JsonCache<K, T>
    where
        K: CacheKey,
        T: DeserializeOwned + Clone + Send + Sync + 'static,
    {
        CacheBuilder::new(name, GetJson::new(self.client.clone(), request), default)
            .clock(self.clock.clone())
            .signal(self.signal.clone())
            .build()
    }
}
