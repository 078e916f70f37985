use tracing_subscriber::EnvFilter;

use radiko_pipeline::config::ServerConfig;
use radiko_pipeline::server::run_read_server;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "failed to load configuration");
            std::process::exit(1);
        }
    };

    if let Err(e) = run_read_server(config).await {
        tracing::error!(error = %e, "read server exited with error");
        std::process::exit(1);
    }
}
