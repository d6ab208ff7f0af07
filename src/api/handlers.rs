use axum::{
    extract::{Json, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::error::{AppResult, WorkflowError};
use crate::models::{ChainKind, DuplicateBatch, Guia, Level, Orden, ParteDiario, RealtimeEvent};
use crate::service::field_report::{export_field_report_bytes, export_file_name};
use crate::service::OrderEditor;

/// Response envelope
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(message: impl Into<String>, data: T) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
            data: Some(data),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct GuiasView {
    pub guias: Vec<Guia>,
    pub procesando: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct BatchView {
    #[serde(flatten)]
    pub batch: DuplicateBatch,
    pub expandido: bool,
}

#[derive(Debug, Deserialize)]
pub struct DuplicateRequest {
    pub cantidad: i64,
}

#[derive(Debug, Deserialize)]
pub struct GrossWeightRequest {
    pub peso_bruto_total: f64,
}

#[derive(Debug, Deserialize)]
pub struct ChainRequest {
    pub tipo: ChainKind,
}

#[derive(Debug, Deserialize)]
pub struct SelectionRequest {
    pub nivel: Level,
    #[serde(default)]
    pub id: Option<i64>,
}

/// Health check
pub async fn health_check() -> &'static str {
    "OK"
}

pub async fn list_guias(State(state): State<AppState>) -> Json<ApiResponse<GuiasView>> {
    let view = GuiasView {
        guias: state.workflow.originals().await,
        procesando: state.workflow.processing().await,
    };
    ApiResponse::ok(format!("{} waybills", view.guias.len()), view)
}

pub async fn refresh_guias(State(state): State<AppState>) -> AppResult<Json<ApiResponse<usize>>> {
    let count = state.workflow.refresh_originals().await?;
    Ok(ApiResponse::ok(format!("Loaded {} waybills", count), count))
}

async fn view(state: &AppState, batch: DuplicateBatch) -> BatchView {
    let expandido = state.workflow.is_expanded(batch.source_id).await;
    BatchView { batch, expandido }
}

pub async fn duplicate(
    State(state): State<AppState>,
    Path(source_id): Path<i64>,
    Json(req): Json<DuplicateRequest>,
) -> AppResult<Json<ApiResponse<BatchView>>> {
    let batch = state.workflow.duplicate(source_id, req.cantidad).await?;
    let message = format!("Created {} duplicates of waybill {}", batch.len(), source_id);
    Ok(ApiResponse::ok(message, view(&state, batch).await))
}

pub async fn list_batches(State(state): State<AppState>) -> Json<ApiResponse<Vec<DuplicateBatch>>> {
    let batches = state.workflow.batches().await;
    ApiResponse::ok(format!("{} batches", batches.len()), batches)
}

pub async fn get_batch(
    State(state): State<AppState>,
    Path(source_id): Path<i64>,
) -> AppResult<Json<ApiResponse<BatchView>>> {
    let batch = state.workflow.batch(source_id).await?;
    Ok(ApiResponse::ok("OK", view(&state, batch).await))
}

pub async fn set_gross_weight(
    State(state): State<AppState>,
    Path(source_id): Path<i64>,
    Json(req): Json<GrossWeightRequest>,
) -> AppResult<Json<ApiResponse<BatchView>>> {
    let batch = state
        .workflow
        .set_gross_weight(source_id, req.peso_bruto_total)
        .await?;
    Ok(ApiResponse::ok("Gross weight updated", view(&state, batch).await))
}

pub async fn switch_chain(
    State(state): State<AppState>,
    Path(source_id): Path<i64>,
    Json(req): Json<ChainRequest>,
) -> AppResult<Json<ApiResponse<BatchView>>> {
    let batch = state.workflow.switch_chain(source_id, req.tipo).await?;
    Ok(ApiResponse::ok("Chain updated", view(&state, batch).await))
}

pub async fn select_level(
    State(state): State<AppState>,
    Path(source_id): Path<i64>,
    Json(req): Json<SelectionRequest>,
) -> AppResult<Json<ApiResponse<BatchView>>> {
    let batch = state
        .workflow
        .select_level(source_id, req.nivel, req.id)
        .await?;
    Ok(ApiResponse::ok("Selection updated", view(&state, batch).await))
}

pub async fn retry_options(
    State(state): State<AppState>,
    Path((source_id, nivel)): Path<(i64, Level)>,
) -> AppResult<Json<ApiResponse<BatchView>>> {
    let batch = state.workflow.retry_options(source_id, nivel).await?;
    Ok(ApiResponse::ok("Options reloaded", view(&state, batch).await))
}

pub async fn remove_duplicate(
    State(state): State<AppState>,
    Path((source_id, index)): Path<(i64, usize)>,
) -> AppResult<Json<ApiResponse<BatchView>>> {
    match state.workflow.remove_duplicate(source_id, index).await? {
        Some(batch) => Ok(ApiResponse::ok("Duplicate removed", view(&state, batch).await)),
        None => Ok(Json(ApiResponse {
            success: true,
            message: format!("Last duplicate removed, batch {} closed", source_id),
            data: None,
        })),
    }
}

pub async fn cancel_batch(
    State(state): State<AppState>,
    Path(source_id): Path<i64>,
) -> AppResult<Json<ApiResponse<usize>>> {
    let discarded = state.workflow.cancel(source_id).await?;
    Ok(ApiResponse::ok(
        format!("Discarded {} duplicates", discarded),
        discarded,
    ))
}

pub async fn submit_batch(
    State(state): State<AppState>,
    Path(source_id): Path<i64>,
) -> AppResult<Json<ApiResponse<Vec<String>>>> {
    let created = state.workflow.submit(source_id).await?;
    Ok(ApiResponse::ok(
        format!("Saved {} waybills", created.len()),
        created,
    ))
}

pub async fn push_event(
    State(state): State<AppState>,
    Json(event): Json<RealtimeEvent>,
) -> AppResult<(StatusCode, Json<ApiResponse<String>>)> {
    let id = event.identifier().to_string();
    state
        .events
        .send(event)
        .await
        .map_err(|_| WorkflowError::ChannelClosed)?;
    Ok((StatusCode::ACCEPTED, ApiResponse::ok("Event queued", id)))
}

pub async fn order_totals(Json(orden): Json<Orden>) -> Json<ApiResponse<Orden>> {
    let orden = OrderEditor::new(orden).into_orden();
    ApiResponse::ok("Totals computed", orden)
}

pub async fn export_field_report(Json(report): Json<ParteDiario>) -> AppResult<Response> {
    let bytes = export_field_report_bytes(&report)?;
    let disposition = format!("attachment; filename=\"{}\"", export_file_name(&report));
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}
