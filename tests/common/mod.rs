#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use obra_guias::models::{
    serialize_items, ChainKind, Guia, GuiaItem, HierarchyKeys, HierarchyNode, Level,
};
use obra_guias::{FakeBackend, WorkflowService};

pub fn node(id: i64, nombre: &str, codigo: Option<&str>) -> HierarchyNode {
    HierarchyNode {
        id,
        nombre: nombre.to_string(),
        codigo: codigo.map(str::to_string),
        unidad_de_medida: Some("M3".to_string()),
    }
}

/// Waybill 42, project chain resolved down to "Excavación" (EXC-001)
pub fn source_waybill() -> Guia {
    Guia {
        id: Some(42),
        identificador_unico: Some("T001-42".to_string()),
        cliente_denominacion: Some("Constructora Andina SAC".to_string()),
        transportista_placa_numero: Some("ABC-123".to_string()),
        items: serialize_items(&[GuiaItem {
            unidad_de_medida: "M3".to_string(),
            codigo: "EXC-001".to_string(),
            descripcion: "Excavación".to_string(),
            cantidad: 12.0,
        }])
        .unwrap(),
        peso_bruto_total: Some(12.0),
        observaciones: Some("Proyecto: Torre Norte".to_string()),
        jerarquia: HierarchyKeys::from_chain(
            ChainKind::Proyecto,
            [Some(1), Some(10), Some(20), Some(30), Some(40)],
        ),
        ..Guia::default()
    }
}

pub fn linked_waybill() -> Guia {
    let mut guia = source_waybill();
    guia.id = Some(7);
    guia.identificador_unico = Some("T001-7".to_string());
    guia.enlaces.enlace_del_pdf = Some("https://files/T001-7.pdf".to_string());
    guia
}

pub async fn seeded_backend() -> Arc<FakeBackend> {
    let backend = FakeBackend::new(vec![source_waybill(), linked_waybill()]);
    let p = ChainKind::Proyecto;
    backend
        .add_level(p, Level::Root, None, vec![node(1, "Torre Norte", None), node(2, "Torre Sur", None)])
        .await;
    backend
        .add_level(p, Level::Etapa, Some(1), vec![node(10, "Cimentación", None)])
        .await;
    backend
        .add_level(p, Level::Sector, Some(10), vec![node(20, "A1", None)])
        .await;
    backend
        .add_level(p, Level::Frente, Some(20), vec![node(30, "Norte-Este", None)])
        .await;
    backend
        .add_level(
            p,
            Level::Partida,
            Some(30),
            vec![
                node(40, "Excavación", Some("EXC-001")),
                node(41, "Relleno", Some("REL-002")),
            ],
        )
        .await;

    let s = ChainKind::Subproyecto;
    backend
        .add_level(s, Level::Root, None, vec![node(100, "Almacén Central", None)])
        .await;
    backend
        .add_level(s, Level::Etapa, Some(100), vec![node(110, "Obras Provisionales", None)])
        .await;
    Arc::new(backend)
}

pub async fn service(backend: Arc<FakeBackend>) -> Arc<WorkflowService> {
    let service = Arc::new(WorkflowService::new(backend, Duration::from_millis(10)));
    service.refresh_originals().await.unwrap();
    service
}

pub const EXPECTED_OBSERVATIONS: &str =
    "Proyecto: Torre Norte\nEtapa: Cimentación\nSector: A1\nFrente: Norte-Este\nPartida: Excavación";
