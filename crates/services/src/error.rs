use common::entities::ExternalClusterProvider;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("api error: {0}")]
    Api(#[from] api_client::error::Error),

    #[error("no credentials configured for {0}")]
    MissingCredentials(ExternalClusterProvider),
}

pub type Result<T> = std::result::Result<T, Error>;
