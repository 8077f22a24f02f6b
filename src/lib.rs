pub mod api;
pub mod config;
pub mod crosscheck;
pub mod db;
pub mod models;
pub mod pipeline;
pub mod storage;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::pipeline::skills::reasoning::HttpReasoningClient;
use crate::pipeline::skills::SkillRegistry;
use crate::pipeline::IngestionPipeline;
use crate::storage::LocalBlobStore;

/// Wire the production pipeline from configuration.
pub fn build_pipeline(config: config::PipelineConfig) -> Arc<IngestionPipeline> {
    let reasoning = HttpReasoningClient::new(
        &config.reasoning_base_url,
        &config.reasoning_model,
        config.reasoning_timeout_secs,
    );
    let blobs = LocalBlobStore::new(config.blobs_dir());

    Arc::new(IngestionPipeline::new(
        config,
        Arc::new(SkillRegistry::builtin()),
        Arc::new(reasoning),
        Arc::new(blobs),
    ))
}

/// Entry point: init tracing, read configuration, serve the ingestion API.
pub fn run() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = config::PipelineConfig::from_env();
    let bind_addr = config.bind_addr.clone();
    let pipeline = build_pipeline(config);
    let ctx = api::ApiContext { pipeline };

    let runtime = tokio::runtime::Runtime::new().expect("Failed to start async runtime");
    if let Err(e) = runtime.block_on(api::serve(ctx, &bind_addr)) {
        tracing::error!(error = %e, "Ingestion API terminated");
    }
}
