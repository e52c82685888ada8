use clap::Parser;
use formrelay::adapters::api_handler::AppState;
use formrelay::adapters::health_handler::HealthHandler;
use formrelay::adapters::hubspot_client::HubSpotClient;
use formrelay::cli::Cli;
use formrelay::config::Settings;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("formrelay=info,tower_http=info")),
        )
        .init();

    // Load configuration (CLI > env vars > config file)
    let settings = Settings::new_with_cli(&cli)?;
    let host = settings.server.host.clone();
    let port = settings.server.port;

    info!(
        portal_id = %settings.hubspot.portal_id,
        form_id = %settings.hubspot.default_form_id,
        mode = ?settings.hubspot.submission_mode,
        "Starting formrelay on {}:{}",
        host,
        port
    );

    let settings = Arc::new(settings);
    let client = Arc::new(HubSpotClient::new(&settings.hubspot));
    let state = AppState::new(settings.clone(), client)?;
    let health_handler = Arc::new(HealthHandler::new(settings));

    let app = formrelay::create_app(state, health_handler);

    // Start server
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
