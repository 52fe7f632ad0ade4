mod configuration;
mod error;
mod routes;
mod state;

use anyhow::Context;
use configuration::Settings;
use shopbot::{
    agent::Agent,
    context::assemble_system_prompt,
    notifier::PushoverNotifier,
    providers::openai::OpenAiProvider,
    tools::ToolRegistry,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let settings = Settings::new()?;

    let system_prompt = assemble_system_prompt(
        &settings.business.profile(),
        &settings.business.sources(),
    )
    .context("Failed to render the system prompt")?;

    let credentials = settings.notifier.credentials();
    if credentials.is_none() {
        info!("Pushover credentials not configured - notifications will only be logged");
    }
    let notifier = PushoverNotifier::new(settings.notifier.url.clone(), credentials)?;
    let registry = Arc::new(ToolRegistry::new(Arc::new(notifier)));

    let timeout = settings.provider.timeout();
    let model = settings.provider.model.clone();
    let provider = Arc::new(OpenAiProvider::new(settings.provider.into_config())?);

    let agent = Agent::new(provider, registry, system_prompt)
        .with_max_rounds(settings.agent.max_rounds)
        .with_request_timeout(timeout);
    info!(%model, max_rounds = settings.agent.max_rounds, "Agent ready");

    let app = routes::configure(state::AppState::new(agent));

    let listener = tokio::net::TcpListener::bind(settings.server.socket_addr()?).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
