mod api;
mod router;
mod state;

use std::sync::Arc;

use tracing::{info, warn};

use jobcast_connector::{FeedConnector, SourceConnector};
use jobcast_core::{BlockList, Config};
use jobcast_pipeline::{BroadcastHub, Coordinator, JsonlSink, NullSink, PersistenceSink};

use crate::state::AppState;

fn load_config() -> Config {
    jobcast_core::config::load_dotenv();
    Config::from_env()
}

async fn serve(config: Config) -> anyhow::Result<()> {
    config.log_summary();

    let connector: Arc<dyn SourceConnector> = Arc::new(FeedConnector::new(&config.feed)?);

    let sink: Arc<dyn PersistenceSink> = match &config.sink.path {
        Some(path) => {
            info!("Persisting ingested jobs to {}", path.display());
            Arc::new(JsonlSink::new(path.clone()))
        }
        None => Arc::new(NullSink),
    };

    let coordinator = Arc::new(Coordinator::new(
        connector,
        sink,
        Arc::new(BroadcastHub::new()),
        BlockList::from_config(&config.blocklist),
        config.watch.clone(),
    ));

    if config.server.autostart {
        match Arc::clone(&coordinator).start().await {
            Ok(()) => info!("Autostart: ingestion loop running"),
            Err(err) => warn!(error = %err, "autostart failed, bot stays stopped"),
        }
    }

    let state = Arc::new(AppState { coordinator });
    let app = router::build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://localhost:{}", config.server.port);
    axum::serve(listener, app).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    serve(load_config()).await
}
