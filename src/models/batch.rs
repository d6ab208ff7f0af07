use serde::{Deserialize, Serialize};

use super::hierarchy::{ChainKind, HierarchyKeys};
use super::waybill::{ArtifactLinks, Guia};
use crate::service::selector::CascadingSelector;

/// Unsaved copy of a source waybill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateRecord {
    pub guia: Guia,
    pub modificado: bool,
}

impl DuplicateRecord {
    /// Copies never inherit generated artifacts, processing status or business id
    pub fn from_copy(mut guia: Guia) -> Self {
        guia.enlaces = ArtifactLinks::default();
        guia.aceptada_por_sunat = None;
        guia.identificador_unico = None;
        Self {
            guia,
            modificado: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchPhase {
    Ready,
    Editing,
    Submitting,
}

/// Duplicates of one source waybill plus their shared selection state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateBatch {
    pub source_id: i64,
    pub duplicates: Vec<DuplicateRecord>,
    pub phase: BatchPhase,
    pub selector: CascadingSelector,
    pub peso_bruto_total: Option<f64>,
}

impl DuplicateBatch {
    pub fn chain_kind(&self) -> Option<ChainKind> {
        self.selector.kind()
    }

    pub fn first(&self) -> Option<&DuplicateRecord> {
        self.duplicates.first()
    }

    pub fn len(&self) -> usize {
        self.duplicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.duplicates.is_empty()
    }
}

/// Leaf product written onto the first line item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeafProduct {
    pub codigo: String,
    pub descripcion: String,
    pub unidad_de_medida: Option<String>,
}

/// Fields written identically onto every duplicate of a batch.
/// `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SharedPatch {
    pub peso_bruto_total: Option<f64>,
    pub jerarquia: Option<HierarchyKeys>,
    pub observaciones: Option<String>,
    /// `Some(None)` blanks the product code once the leaf is deselected
    pub leaf: Option<Option<LeafProduct>>,
}

impl SharedPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
