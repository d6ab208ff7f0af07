pub mod handlers;

pub use handlers::*;

use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tokio::sync::mpsc;
use tower::ServiceBuilder;

use crate::models::RealtimeEvent;
use crate::service::WorkflowService;

/// Shared state of the HTTP layer
#[derive(Clone)]
pub struct AppState {
    pub workflow: Arc<WorkflowService>,
    pub events: mpsc::Sender<RealtimeEvent>,
}

pub fn build_router(state: AppState) -> Router {
    let guias = Router::new()
        .route("/api/guias", get(list_guias))
        .route("/api/guias/refresh", post(refresh_guias))
        .route("/api/guias/:id/duplicar", post(duplicate));

    let lotes = Router::new()
        .route("/api/lotes", get(list_batches))
        .route("/api/lotes/:id", get(get_batch).delete(cancel_batch))
        .route("/api/lotes/:id/peso", put(set_gross_weight))
        .route("/api/lotes/:id/cadena", put(switch_chain))
        .route("/api/lotes/:id/seleccion", put(select_level))
        .route("/api/lotes/:id/opciones/:nivel/reintentar", post(retry_options))
        .route("/api/lotes/:id/duplicados/:index", delete(remove_duplicate))
        .route("/api/lotes/:id/guardar", post(submit_batch));

    Router::new()
        .route("/health", get(health_check))
        .merge(guias)
        .merge(lotes)
        .route("/api/eventos", post(push_event))
        .route("/api/ordenes/totales", post(order_totals))
        .route("/api/partes/exportar", post(export_field_report))
        .layer(ServiceBuilder::new())
        .with_state(state)
}
