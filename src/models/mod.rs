pub mod batch;
pub mod event;
pub mod field_report;
pub mod hierarchy;
pub mod master_data;
pub mod order;
pub mod waybill;

pub use batch::{BatchPhase, DuplicateBatch, DuplicateRecord, LeafProduct, SharedPatch};
pub use event::{CompletionPayload, RealtimeEvent, WAYBILL_COMPLETED_CHANNEL};
pub use field_report::{ActividadDiaria, ParteDiario};
pub use hierarchy::{ChainKind, HierarchyKeys, HierarchyNode, Level};
pub use master_data::{CentroCosto, CrudResource, ItemCatalogo, Proveedor, Vehiculo};
pub use order::{CostCenterCode, Moneda, Orden, OrdenItem, OrderKind, OrderTotals, Withholding};
pub use waybill::{parse_items, serialize_items, ArtifactLinks, Guia, GuiaItem};
