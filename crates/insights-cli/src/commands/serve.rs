//! Serve command - run the HTTP API with on-disk stores.

use std::sync::Arc;

use colored::Colorize;
use insights::{FsUploadStore, JsonJobStore, Orchestrator, UploadGateway};

use crate::server::{app, state::AppState};
use crate::settings::Settings;

pub fn run(mut settings: Settings, host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    if let Some(host) = host {
        settings.host = host;
    }
    if let Some(port) = port {
        settings.port = port;
    }

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let store = Arc::new(JsonJobStore::open(settings.jobs_dir()).await?);
        let interrupted = store.fail_interrupted().await?;
        if interrupted > 0 {
            tracing::warn!(count = interrupted, "failed jobs interrupted by the last shutdown");
        }
        let uploads = Arc::new(FsUploadStore::open(settings.uploads_dir()).await?);

        let config = settings.insights.clone();
        let state = AppState::new(
            UploadGateway::new(config.clone(), store.clone(), uploads.clone()),
            Orchestrator::new(config, store, uploads),
        );

        let url = format!("http://{}:{}", settings.host, settings.port);
        println!();
        println!(
            "{} {}",
            "Starting insights server at".cyan().bold(),
            url.white().bold()
        );
        println!();
        println!("  Data: {}", settings.data_dir.display());
        println!();
        println!("Press {} to stop the server", "Ctrl+C".yellow().bold());
        println!();

        app::run_server(state, &settings.host, settings.port).await
    })
}
