// LCR Simulator - Web Server
// REST API with Axum; one independent simulation per session

use anyhow::{Context, Result};
use clap::Parser;
use lcr_simulator::api::{router, AppState};
use lcr_simulator::logging::{self, Sink};
use lcr_simulator::{AppConfig, BaselineStore, SessionRegistry};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(name = "lcr-server", version, about = "HTTP API for the LCR simulator")]
struct Args {
    /// JSON config file
    #[arg(long, env = "LCR_SIM_CONFIG")]
    config: Option<PathBuf>,

    /// Overrides server.bind from the config
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = AppConfig::resolve(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }

    logging::init(&config.logging, Sink::Stdout)?;

    println!("🌐 LCR Simulator - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let store = Arc::new(BaselineStore::load(&config.baseline)?);
    println!(
        "✓ Baseline loaded: {} balance sheet entries, LCR {}%",
        store.balance_sheet().len(),
        store.baseline_metrics().lcr_percent
    );

    // Create shared state
    let limits = config.server.session_limits();
    let sessions = Arc::new(SessionRegistry::with_limits(store, limits));
    let state = AppState {
        sessions: sessions.clone(),
    };

    // Expire sessions whose page went away without closing them
    let sweep_every = (limits.idle_ttl / 4).max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_every);
        loop {
            ticker.tick().await;
            sessions.sweep_idle();
        }
    });

    let app = router(state, &config.server.static_dir);

    // Start server
    let addr = config.server.bind.as_str();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to address {}", addr))?;

    info!(%addr, "listening");
    println!("\n🚀 Server running on http://{}", addr);
    println!("   API: http://{}/api/sessions", addr);
    println!("   UI:  http://{}", addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .context("Failed to start server")?;

    Ok(())
}
