use anyhow::Context;
use redactor_app::app::App;
use redactor_app::config::AppConfig;
use redactor_app::logging::{self, LogDestination};
use redactor_app::routes;
use redactor_engine::{open_store, JobStores};
use redactor_logging::redact_info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::initialize(LogDestination::Terminal);

    // Configuration problems are fatal before any network activity.
    let config = AppConfig::from_env().context("configuration error")?;

    let ingest = open_store(&config.storage, &config.ingest_bucket)
        .with_context(|| format!("open ingest bucket {}", config.ingest_bucket))?;
    let output = open_store(&config.storage, &config.output_bucket)
        .with_context(|| format!("open output bucket {}", config.output_bucket))?;

    let app = App::new(JobStores { ingest, output }, config.poll.clone());
    let router = routes::router(app);

    redact_info!("listening on http://{}", config.listen_addr);
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .context("bind listen address")?;
    axum::serve(listener, router).await.context("serve")?;

    Ok(())
}
