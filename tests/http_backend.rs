mod common;

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use common::{node, source_waybill};
use obra_guias::config::BackendConfig;
use obra_guias::models::{ChainKind, Level, Orden, OrdenItem, OrderKind, Proveedor};
use obra_guias::{
    AppError, BackendError, GuiaBackend, HttpBackend, OrderEditor, OrderService, ResourceClient,
    ValidationError,
};

#[derive(Clone, Default)]
struct Mock {
    saved: Arc<Mutex<Vec<Value>>>,
    auth: Arc<Mutex<Option<String>>>,
    deleted: Arc<Mutex<Vec<i64>>>,
}

async fn originals(State(mock): State<Mock>, headers: HeaderMap) -> Json<Value> {
    *mock.auth.lock().await = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    // backend sends weights as strings
    let mut guia = serde_json::to_value(source_waybill()).unwrap();
    guia["peso_bruto_total"] = json!("12.00");
    guia["campo_nuevo"] = json!("kept");
    Json(json!([guia]))
}

async fn duplicar(Path(id): Path<i64>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if id != 42 {
        return (
            StatusCode::OK,
            Json(json!({ "success": false, "message": "La guía ya fue emitida" })),
        );
    }
    let count = body["cantidad"].as_u64().unwrap_or(0) as usize;
    let copies: Vec<Value> = (0..count)
        .map(|_| serde_json::to_value(source_waybill()).unwrap())
        .collect();
    (
        StatusCode::OK,
        Json(json!({ "success": true, "message": "ok", "duplicados": copies })),
    )
}

async fn duplicados(State(mock): State<Mock>, Json(body): Json<Value>) -> Json<Value> {
    let guias = body["guias"].as_array().cloned().unwrap_or_default();
    let created: Vec<Value> = (0..guias.len())
        .map(|i| json!({ "identificador_unico": format!("T001-{}", 500 + i) }))
        .collect();
    mock.saved.lock().await.extend(guias);
    Json(json!({ "guiasCreadas": created }))
}

async fn etapas(Query(q): Query<HashMap<String, i64>>) -> Json<Value> {
    match q.get("parent_id") {
        Some(1) => Json(json!([node(10, "Cimentación", None)])),
        _ => Json(json!([])),
    }
}

async fn sectores() -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "message": "sector table locked" })),
    )
}

async fn list_proveedores() -> Json<Value> {
    Json(json!([{ "id": 3, "razon_social": "Aceros del Sur", "ruc": "20123456789" }]))
}

async fn create_orden(Json(mut orden): Json<Value>) -> Json<Value> {
    orden["id"] = json!(77);
    Json(orden)
}

async fn update_orden(Path(id): Path<i64>, Json(mut orden): Json<Value>) -> Json<Value> {
    orden["id"] = json!(id);
    Json(orden)
}

async fn delete_orden(State(mock): State<Mock>, Path(id): Path<i64>) -> StatusCode {
    mock.deleted.lock().await.push(id);
    StatusCode::NO_CONTENT
}

async fn spawn_mock() -> (Mock, String) {
    let mock = Mock::default();
    let app = Router::new()
        .route("/api/guias/originales", get(originals))
        .route("/api/guias/:id/duplicar", post(duplicar))
        .route("/api/guias/duplicados", post(duplicados))
        .route("/api/etapas", get(etapas))
        .route("/api/sectores", get(sectores))
        .route("/api/proveedores", get(list_proveedores))
        .route("/api/ordenes", post(create_orden))
        .route("/api/ordenes/:id", put(update_orden).delete(delete_orden))
        .with_state(mock.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (mock, format!("http://{}/api/", addr))
}

fn backend(base_url: String, token: Option<&str>) -> HttpBackend {
    HttpBackend::new(&BackendConfig {
        base_url,
        timeout_secs: 5,
        api_token: token.map(str::to_string),
    })
    .unwrap()
}

#[tokio::test]
async fn originals_decode_lenient_numbers_and_keep_unknown_fields() {
    let (mock, url) = spawn_mock().await;
    let backend = backend(url, Some("secret"));
    assert!(!backend.base_url().ends_with('/'));

    let guias = backend.get_all_originals().await.unwrap();
    assert_eq!(guias.len(), 1);
    assert_eq!(guias[0].peso_bruto_total, Some(12.0));
    assert_eq!(guias[0].jerarquia.id_partida, Some(40));
    assert_eq!(guias[0].extra["campo_nuevo"], "kept");
    assert_eq!(mock.auth.lock().await.as_deref(), Some("Bearer secret"));
}

#[tokio::test]
async fn duplicate_and_save_round_trip() {
    let (mock, url) = spawn_mock().await;
    let backend = backend(url, None);

    let resp = backend.duplicate(42, 3).await.unwrap();
    assert_eq!(resp.duplicados.len(), 3);

    let created = backend
        .save_duplicates(&resp.duplicados)
        .await
        .unwrap()
        .identifiers();
    assert_eq!(created, vec!["T001-500", "T001-501", "T001-502"]);
    assert_eq!(mock.saved.lock().await.len(), 3);
}

#[tokio::test]
async fn unsuccessful_duplicate_is_rejected() {
    let (_, url) = spawn_mock().await;
    let backend = backend(url, None);

    match backend.duplicate(9, 1).await {
        Err(BackendError::Rejected(message)) => assert_eq!(message, "La guía ya fue emitida"),
        other => panic!("unexpected: {:?}", other.map(|r| r.duplicados.len())),
    }
}

#[tokio::test]
async fn levels_are_scoped_by_parent_and_errors_carry_message() {
    let (_, url) = spawn_mock().await;
    let backend = backend(url, None);

    let etapas = backend
        .list_level(ChainKind::Proyecto, Level::Etapa, Some(1))
        .await
        .unwrap();
    assert_eq!(etapas.len(), 1);
    assert_eq!(etapas[0].nombre, "Cimentación");

    let empty = backend
        .list_level(ChainKind::Proyecto, Level::Etapa, Some(2))
        .await
        .unwrap();
    assert!(empty.is_empty());

    match backend
        .list_level(ChainKind::Proyecto, Level::Sector, Some(10))
        .await
    {
        Err(BackendError::Server { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "sector table locked");
        }
        other => panic!("unexpected: {:?}", other),
    }

    assert!(matches!(
        backend.list_level(ChainKind::Subproyecto, Level::Root, None).await,
        Err(BackendError::Server { status: 404, .. })
    ));
}

#[tokio::test]
async fn resource_client_covers_master_data() {
    let (mock, url) = spawn_mock().await;
    let backend = Arc::new(backend(url, None));

    let proveedores = ResourceClient::<Proveedor>::new(backend.clone())
        .get_all()
        .await
        .unwrap();
    assert_eq!(proveedores[0].razon_social, "Aceros del Sur");

    ResourceClient::<Orden>::new(backend).delete(12).await.unwrap();
    assert_eq!(*mock.deleted.lock().await, vec![12]);
}

#[tokio::test]
async fn order_service_creates_then_updates() {
    let (_, url) = spawn_mock().await;
    let client = ResourceClient::<Orden>::new(Arc::new(backend(url, None)));
    let service = OrderService::new(client);

    let mut orden = Orden::new(
        OrderKind::Compra,
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
    );
    orden.proveedor_id = Some(3);
    let mut editor = OrderEditor::new(orden);

    let err = service.save(&editor).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(ValidationError::EmptyOrder)));

    editor.add_item(OrdenItem {
        codigo: "CEM-01".into(),
        descripcion: "Cemento".into(),
        cantidad_solicitada: 10.0,
        precio_unitario: 28.5,
        ..OrdenItem::default()
    });
    let created = service.save(&editor).await.unwrap();
    assert_eq!(created.id, Some(77));
    assert_eq!(created.totales.subtotal, 285.0);

    let mut editor = OrderEditor::new(created);
    editor.set_quantity(0, 20.0).unwrap();
    let updated = service.save(&editor).await.unwrap();
    assert_eq!(updated.id, Some(77));
    assert_eq!(updated.items[0].subtotal, 570.0);
}
