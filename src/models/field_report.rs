use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::waybill::de_lenient_f64;

/// Daily field report (parte diario)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParteDiario {
    #[serde(default)]
    pub id: Option<i64>,
    pub fecha: NaiveDate,
    pub proyecto: String,
    #[serde(default)]
    pub frente: Option<String>,
    pub responsable: String,
    #[serde(default)]
    pub clima: Option<String>,
    #[serde(default)]
    pub actividades: Vec<ActividadDiaria>,
}

/// One row of executed work in a field report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActividadDiaria {
    pub partida: String,
    pub descripcion: String,
    #[serde(default)]
    pub unidad_de_medida: String,
    #[serde(default, deserialize_with = "de_lenient_f64")]
    pub metrado: f64,
    #[serde(default)]
    pub personal: u32,
    #[serde(default, deserialize_with = "de_lenient_f64")]
    pub horas_maquina: f64,
    #[serde(default)]
    pub observaciones: Option<String>,
}

impl ParteDiario {
    pub fn total_metrado(&self) -> f64 {
        self.actividades.iter().map(|a| a.metrado).sum()
    }

    pub fn total_personal(&self) -> u32 {
        self.actividades.iter().map(|a| a.personal).sum()
    }
}
