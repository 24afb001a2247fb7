use anyhow::{Context, Result};
use api_client::ApiClient;
use common::{Config, logging_stdout};
use dotenvy::dotenv;
use faststr::FastStr;
use futures_util::StreamExt;
use services::Services;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let config = Config::from_env().context("failed to load configuration")?;
    let _guard = logging_stdout(&config.log);

    let project: FastStr = std::env::args()
        .nth(1)
        .context("usage: console-cache <project-id>")?
        .into();

    let client = ApiClient::new(&config)?;
    let services = Services::new(client, &config);
    info!(%project, root = %config.api_root, "watching clusters");

    let mut updates = services.clusters.clusters(&project);
    loop {
        tokio::select! {
            update = updates.next() => {
                let Some(update) = update else {
                    warn!(%project, "cluster stream ended");
                    break;
                };
                let names: Vec<&str> = update.iter().map(|c| c.name.as_str()).collect();
                info!(%project, count = update.len(), ?names, "clusters updated");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted, shutting down");
                break;
            }
        }
    }

    Ok(())
}
