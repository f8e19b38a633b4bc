use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use driftnote::config::{AppConfig, PURGE_INTERVAL};
use driftnote::models::DEFAULT_WINDOWS;
use driftnote::reminders::dispatch::{select_delivery, Capability, LogSink, NotificationSink};
use driftnote::reminders::{PrefStore, ReminderEngine};
use driftnote::store::BackendKind;
use driftnote::{api, now_ms, purge, store};

#[derive(Parser)]
#[command(name = "driftnote")]
#[command(about = "Ephemeral geolocated micro-posts with posting reminders")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the driftnote server
    Serve {
        /// Port for HTTP API
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Storage backend for posts
        #[arg(short, long, default_value_t = BackendKind::File)]
        backend: BackendKind,

        /// Directory for persisted state (defaults to the platform data dir)
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Serve the client app from this directory, SPA-style
        #[arg(long)]
        assets: Option<PathBuf>,
    },
    /// Run one purge pass against the configured backend and exit
    Purge {
        /// Storage backend for posts
        #[arg(short, long, default_value_t = BackendKind::File)]
        backend: BackendKind,

        /// Directory for persisted state (defaults to the platform data dir)
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "driftnote=debug,tower_http=debug".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn serve(
    port: u16,
    backend: BackendKind,
    data_dir: Option<PathBuf>,
    assets: Option<PathBuf>,
) -> anyhow::Result<()> {
    let config = AppConfig::from_env();
    let store = store::open(backend, data_dir.clone(), config.ttl_ms)?;

    purge::spawn_purge_task(store.clone(), PURGE_INTERVAL);

    // Reminder state lives next to the post data, whatever the backend.
    let state_dir = store::resolve_data_dir(data_dir)?;
    std::fs::create_dir_all(&state_dir)?;
    let prefs = Arc::new(PrefStore::open(&state_dir));

    let sink: Arc<dyn NotificationSink> = Arc::new(LogSink);
    let capability = Capability::detect(sink.as_ref());
    let delivery = select_delivery(capability, sink, DEFAULT_WINDOWS.to_vec(), prefs.clone());
    let engine = ReminderEngine::new(delivery, prefs, DEFAULT_WINDOWS.to_vec());
    engine.resync(chrono::Utc::now(), &mut rand::thread_rng());

    let app = match assets {
        Some(dir) => api::create_router_with_assets(store, config, dir),
        None => api::create_router(store, config),
    };

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!("driftnote server listening on http://127.0.0.1:{}", port);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Some(Commands::Serve {
            port,
            backend,
            data_dir,
            assets,
        }) => {
            tracing::info!("Starting driftnote server on port {}", port);
            serve(port, backend, data_dir, assets).await?;
        }
        Some(Commands::Purge { backend, data_dir }) => {
            let config = AppConfig::from_env();
            let store = store::open(backend, data_dir, config.ttl_ms)?;
            match store.purge_expired(now_ms()) {
                Ok(n) => println!("Purged {} expired posts", n),
                Err(e) => anyhow::bail!("purge failed: {}", e),
            }
        }
        None => {
            // Default: start server with the file backend
            tracing::info!("Starting driftnote server on port 3000");
            serve(3000, BackendKind::File, None, None).await?;
        }
    }

    Ok(())
}
