//! Gateway to the REST backend that owns waybills and master data.

pub mod fake;
pub mod http;
pub mod resource;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::BackendError;
use crate::models::{ChainKind, Guia, HierarchyNode, Level};

pub use fake::FakeBackend;
pub use http::HttpBackend;
pub use resource::ResourceClient;

/// Reply to `duplicate(sourceId, count)`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub duplicados: Vec<Guia>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedGuia {
    pub identificador_unico: String,
}

/// Reply to `saveDuplicates(records)`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveDuplicatesResponse {
    #[serde(rename = "guiasCreadas", default)]
    pub guias_creadas: Vec<CreatedGuia>,
}

impl SaveDuplicatesResponse {
    pub fn identifiers(self) -> Vec<String> {
        self.guias_creadas
            .into_iter()
            .map(|g| g.identificador_unico)
            .collect()
    }
}

#[async_trait]
pub trait GuiaBackend: Send + Sync + 'static {
    /// Source waybills eligible for duplication
    async fn get_all_originals(&self) -> Result<Vec<Guia>, BackendError>;

    async fn duplicate(&self, source_id: i64, count: u32) -> Result<DuplicateResponse, BackendError>;

    async fn save_duplicates(&self, records: &[Guia]) -> Result<SaveDuplicatesResponse, BackendError>;

    /// Options of one hierarchy level, scoped by the parent selection
    async fn list_level(
        &self,
        kind: ChainKind,
        level: Level,
        parent_id: Option<i64>,
    ) -> Result<Vec<HierarchyNode>, BackendError>;
}
