use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::waybill::de_lenient_f64;

pub const DEFAULT_IGV_RATE: f64 = 0.18;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderKind {
    Compra,
    Servicio,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Moneda {
    #[serde(rename = "PEN")]
    Soles,
    #[serde(rename = "USD")]
    Dolares,
}

/// Three-level cost center code, e.g. `01.02.003`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostCenterCode {
    pub nivel1: Option<String>,
    pub nivel2: Option<String>,
    pub nivel3: Option<String>,
}

impl CostCenterCode {
    pub fn is_complete(&self) -> bool {
        [&self.nivel1, &self.nivel2, &self.nivel3]
            .iter()
            .all(|n| n.as_deref().is_some_and(|s| !s.trim().is_empty()))
    }

    pub fn code(&self) -> String {
        [&self.nivel1, &self.nivel2, &self.nivel3]
            .iter()
            .filter_map(|n| n.as_deref())
            .collect::<Vec<_>>()
            .join(".")
    }
}

/// Withholding (retención) applied to the order total
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Withholding {
    pub aplica: bool,
    pub tasa: f64,
}

impl Default for Withholding {
    fn default() -> Self {
        Self {
            aplica: false,
            tasa: 0.03,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrdenItem {
    pub codigo: String,
    pub descripcion: String,
    #[serde(default)]
    pub unidad_de_medida: Option<String>,
    #[serde(deserialize_with = "de_lenient_f64")]
    pub cantidad_solicitada: f64,
    #[serde(deserialize_with = "de_lenient_f64")]
    pub precio_unitario: f64,
    /// Always `cantidad_solicitada * precio_unitario`
    #[serde(default)]
    pub subtotal: f64,
}

/// Aggregates derived from the line items; never edited directly
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: f64,
    pub igv: f64,
    pub total: f64,
    pub retencion: f64,
    pub neto_a_pagar: f64,
}

/// Purchase or service order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Orden {
    #[serde(default)]
    pub id: Option<i64>,
    pub tipo: OrderKind,
    pub proveedor_id: Option<i64>,
    pub moneda: Moneda,
    pub fecha_emision: NaiveDate,
    #[serde(default)]
    pub fecha_entrega: Option<NaiveDate>,
    #[serde(default)]
    pub centro_costo: CostCenterCode,
    #[serde(default)]
    pub vehiculo_id: Option<i64>,
    #[serde(default = "default_igv_rate")]
    pub tasa_igv: f64,
    #[serde(default)]
    pub retencion: Withholding,
    #[serde(default)]
    pub items: Vec<OrdenItem>,
    #[serde(default)]
    pub totales: OrderTotals,
}

fn default_igv_rate() -> f64 {
    DEFAULT_IGV_RATE
}

impl Orden {
    pub fn new(tipo: OrderKind, fecha_emision: NaiveDate) -> Self {
        Self {
            id: None,
            tipo,
            proveedor_id: None,
            moneda: Moneda::Soles,
            fecha_emision,
            fecha_entrega: None,
            centro_costo: CostCenterCode::default(),
            vehiculo_id: None,
            tasa_igv: DEFAULT_IGV_RATE,
            retencion: Withholding::default(),
            items: Vec::new(),
            totales: OrderTotals::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cost_center_code_joins_levels() {
        let cc = CostCenterCode {
            nivel1: Some("01".into()),
            nivel2: Some("02".into()),
            nivel3: None,
        };
        assert!(!cc.is_complete());
        assert_eq!(cc.code(), "01.02");
    }

    #[test]
    fn order_defaults_on_deserialize() {
        let orden: Orden = serde_json::from_value(serde_json::json!({
            "tipo": "servicio",
            "proveedor_id": 7,
            "moneda": "USD",
            "fecha_emision": "2024-03-01",
            "items": [{"codigo": "SRV-1", "descripcion": "Alquiler", "cantidad_solicitada": "2", "precio_unitario": 150}]
        }))
        .unwrap();
        assert_eq!(orden.tasa_igv, DEFAULT_IGV_RATE);
        assert!(!orden.retencion.aplica);
        assert_eq!(orden.items[0].cantidad_solicitada, 2.0);
        assert_eq!(orden.moneda, Moneda::Dolares);
    }
}
