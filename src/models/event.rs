use serde::{Deserialize, Serialize};

use super::waybill::ArtifactLinks;

/// Channel name used by the backend for completed e-invoice processing
pub const WAYBILL_COMPLETED_CHANNEL: &str = "prog-tecnica-completada";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionPayload {
    pub identificador_unico: String,
    #[serde(default)]
    pub pdf_link: Option<String>,
    #[serde(default)]
    pub xml_link: Option<String>,
    #[serde(default)]
    pub cdr_link: Option<String>,
}

impl CompletionPayload {
    pub fn links(&self) -> ArtifactLinks {
        ArtifactLinks {
            enlace_del_pdf: self.pdf_link.clone(),
            enlace_del_xml: self.xml_link.clone(),
            enlace_del_cdr: self.cdr_link.clone(),
        }
    }
}

/// Push notification from the realtime channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum RealtimeEvent {
    #[serde(rename = "prog-tecnica-completada")]
    WaybillCompleted(CompletionPayload),
}

impl RealtimeEvent {
    pub fn identifier(&self) -> &str {
        match self {
            RealtimeEvent::WaybillCompleted(p) => &p.identificador_unico,
        }
    }
}
