mod routes;
mod settings;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;
use turno_provider_google::GoogleCalendar;

use crate::settings::ServerConfig;
use crate::state::AppState;

#[derive(Parser)]
#[command(name = "turno-server")]
#[command(about = "Serve meeting availability and bookings backed by Google Calendar")]
struct Cli {
    /// Config file (defaults to ./turno.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on, overriding the config file
    #[arg(short, long)]
    bind: Option<SocketAddr>,
}

fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::availability::router())
        .merge(routes::bookings::router())
        .merge(routes::health::router())
        .with_state(state)
        .layer(cors)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = ServerConfig::load(cli.config.as_deref())?;

    let calendar = GoogleCalendar::new(&config.google)?;
    let state = AppState::new(config.booking.clone(), Arc::new(calendar))?;

    let addr = cli.bind.unwrap_or(config.bind);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!(
        %addr,
        calendar_id = %config.booking.calendar_id,
        timezone = %config.booking.timezone,
        "turno-server listening"
    );

    axum::serve(listener, router(state)).await?;

    Ok(())
}
