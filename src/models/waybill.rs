use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::hierarchy::HierarchyKeys;

/// Links to the artifacts produced once the tax authority accepts a waybill
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactLinks {
    #[serde(default)]
    pub enlace_del_pdf: Option<String>,
    #[serde(default)]
    pub enlace_del_xml: Option<String>,
    #[serde(default)]
    pub enlace_del_cdr: Option<String>,
}

impl ArtifactLinks {
    /// Any link counts, an empty string does not
    pub fn any_present(&self) -> bool {
        [&self.enlace_del_pdf, &self.enlace_del_xml, &self.enlace_del_cdr]
            .iter()
            .any(|l| l.as_deref().is_some_and(|s| !s.trim().is_empty()))
    }
}

/// Waybill (guía de remisión) as exchanged with the backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Guia {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub identificador_unico: Option<String>,

    // Destinatario
    #[serde(default)]
    pub cliente_denominacion: Option<String>,
    #[serde(default)]
    pub cliente_numero_de_documento: Option<String>,
    #[serde(default)]
    pub cliente_direccion: Option<String>,

    // Transporte
    #[serde(default)]
    pub transportista_placa_numero: Option<String>,
    #[serde(default)]
    pub conductor_denominacion: Option<String>,
    #[serde(default)]
    pub conductor_documento_numero: Option<String>,
    #[serde(default)]
    pub conductor_numero_licencia: Option<String>,

    // Ruta
    #[serde(default)]
    pub punto_de_partida_ubigeo: Option<String>,
    #[serde(default)]
    pub punto_de_partida_direccion: Option<String>,
    #[serde(default)]
    pub punto_de_llegada_ubigeo: Option<String>,
    #[serde(default)]
    pub punto_de_llegada_direccion: Option<String>,

    /// Serialized JSON list of [`GuiaItem`]
    #[serde(default)]
    pub items: String,
    #[serde(default, deserialize_with = "de_opt_lenient_f64")]
    pub peso_bruto_total: Option<f64>,
    #[serde(default)]
    pub observaciones: Option<String>,

    #[serde(flatten)]
    pub jerarquia: HierarchyKeys,
    #[serde(flatten)]
    pub enlaces: ArtifactLinks,
    #[serde(default)]
    pub aceptada_por_sunat: Option<bool>,

    /// Backend-owned columns passed through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Guia {
    pub fn parsed_items(&self) -> Result<Vec<GuiaItem>, serde_json::Error> {
        parse_items(&self.items)
    }

    pub fn is_duplicable(&self) -> bool {
        !self.enlaces.any_present()
    }
}

/// Line item of a waybill
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuiaItem {
    #[serde(default)]
    pub unidad_de_medida: String,
    #[serde(default)]
    pub codigo: String,
    #[serde(default)]
    pub descripcion: String,
    #[serde(default, deserialize_with = "de_lenient_f64")]
    pub cantidad: f64,
}

/// Blank text parses as an empty list
pub fn parse_items(raw: &str) -> Result<Vec<GuiaItem>, serde_json::Error> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(raw)
}

pub fn serialize_items(items: &[GuiaItem]) -> Result<String, serde_json::Error> {
    serde_json::to_string(items)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

fn lenient(v: NumberOrText) -> Option<f64> {
    match v {
        NumberOrText::Number(n) => Some(n),
        NumberOrText::Text(s) => s.trim().parse().ok(),
    }
}

/// Decimal columns may arrive as JSON strings
pub(crate) fn de_lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<NumberOrText>::deserialize(deserializer)?;
    Ok(v.and_then(lenient).unwrap_or(0.0))
}

pub(crate) fn de_opt_lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<NumberOrText>::deserialize(deserializer)?;
    Ok(v.and_then(lenient))
}
