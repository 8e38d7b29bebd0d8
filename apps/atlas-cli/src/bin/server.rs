use std::sync::Arc;

use atlas_assist::{Assistant, OpenAiChat};
use atlas_cli::{build_index, http, init_tracing};
use atlas_core::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Config::load().map_err(|e| {
        tracing::error!("Error loading config: {e}");
        e
    })?;
    let settings = config.settings()?;
    tracing::debug!(?settings, "configuration");

    let base = std::env::current_dir()?;
    let build_settings = settings.clone();
    let index = tokio::task::spawn_blocking(move || build_index(&build_settings, &base)).await?;

    let mut assistant = Assistant::new(Arc::new(index));
    if settings.llm.has_api_key() {
        assistant = assistant.with_chat_model(Arc::new(OpenAiChat::new(&settings.llm)?));
        tracing::info!(model = %settings.llm.model, "language model configured");
    } else {
        tracing::warn!("OPENAI_API_KEY is not set; /ask will answer 500");
    }

    let app = http::router(Arc::new(assistant));
    let listener = tokio::net::TcpListener::bind(&settings.server.bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind {}: {}", settings.server.bind, e))?;
    tracing::info!("Atlas API listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Received shutdown signal");
        })
        .await?;
    Ok(())
}
