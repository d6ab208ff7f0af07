use std::sync::Arc;
use std::time::Duration;

use obra_guias::service::realtime;
use obra_guias::{build_router, AppConfig, AppState, HttpBackend, WorkflowService};
use tracing::{info, warn};
use tracing_subscriber::fmt::time::ChronoLocal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Local time, same layout as the backend logs
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .init();

    let config = AppConfig::load()?;
    info!("Starting server with config: {:?}", config);

    let backend = Arc::new(HttpBackend::new(&config.backend)?);
    info!("Backend at {}", backend.base_url());

    let workflow = Arc::new(WorkflowService::new(
        backend,
        Duration::from_millis(config.workflow.refresh_delay_ms),
    ));
    if let Err(e) = workflow.refresh_originals().await {
        warn!("Initial waybill load failed, will retry on demand: {}", e);
    }

    let (events, rx) = realtime::channel();
    realtime::spawn_event_loop(workflow.clone(), rx);

    let app = build_router(AppState { workflow, events });

    let addr = config.listen_addr();
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  POST /api/guias/:id/duplicar  - open a duplicate batch");
    info!("  POST /api/lotes/:id/guardar   - save a batch");
    info!("  POST /api/eventos             - realtime completion events");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
