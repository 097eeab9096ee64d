use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use wayfarer::config::Settings;
use wayfarer::db::connector::MongoConnector;
use wayfarer::routes::build_router;
use wayfarer::state::AppState;

/// Travel catalog API server.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Path to a config file (defaults to ./wayfarer.{toml,yaml,json} when present)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Seed empty collections with the bundled demo catalog
    #[arg(long)]
    seed_demo: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let settings = Settings::load(args.config.as_deref())?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| settings.log.filter.clone().into()),
        )
        .init();

    tracing::info!("Starting Wayfarer server...");

    let connector = Arc::new(MongoConnector::new(
        settings.mongodb.connection_uri()?,
        settings.mongodb.database.clone(),
    ));
    let app_state = AppState::new(connector);

    // Repositories retry index creation on first use if this fails.
    match app_state.ensure_indexes().await {
        Ok(()) => tracing::info!(
            "Connected to MongoDB database '{}'",
            settings.mongodb.database
        ),
        Err(e) => tracing::warn!("Could not ensure indexes at startup: {}", e),
    }

    if args.seed_demo || settings.demo.seed {
        wayfarer::demo_seeder::seed_demo_data(&app_state).await;
    }

    let app = build_router(app_state);

    let addr = settings.server.addr();
    tracing::info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Wayfarer stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
