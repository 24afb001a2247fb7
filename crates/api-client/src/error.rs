use faststr::FastStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Reqwest error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("unexpected response status {status} from {url}: {body}")]
    UnexpectedStatus {
        url:    FastStr,
        status: u16,
        body:   FastStr,
    },

    #[error("invalid response data from {url}: {source}")]
    InvalidResponseData {
        url:    FastStr,
        #[source]
        source: serde_json::Error,
    },

    #[error("serde error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("failed to build client")]
    FailedToBuildClient,
}

impl Error {
    /// HTTP status of the failed call, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::UnexpectedStatus { status, .. } => Some(*status),
            Self::ReqwestError(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
