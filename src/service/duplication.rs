//! Bulk duplication workflow.
//!
//! Plain state, no IO: every network step is split into a `begin_*` that
//! checks guards and a `complete_*`/`fail_*` that applies the outcome, so
//! the async layer can release its lock while the backend call is running.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::error::{AppResult, WorkflowError};
use crate::models::{
    serialize_items, BatchPhase, ChainKind, DuplicateBatch, DuplicateRecord, Guia, GuiaItem,
    HierarchyNode, LeafProduct, Level, RealtimeEvent, SharedPatch,
};
use crate::service::processing::{ProcessingSet, RecordIndex};
use crate::service::selector::{CascadingSelector, FetchRequest};
use crate::service::sync::{derive_first_item_quantity, derive_observations};
use crate::service::validation::{validate_batch, validate_count};

/// Result of applying a realtime completion event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome", content = "row")]
pub enum EventOutcome {
    Patched(usize),
    NotFound,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "WorkflowSnapshot")]
pub struct DuplicationWorkflow {
    originals: Vec<Guia>,
    #[serde(skip)]
    index: RecordIndex,
    batches: IndexMap<i64, DuplicateBatch>,
    expanded: IndexSet<i64>,
    duplicating: IndexSet<i64>,
    processing: ProcessingSet,
}

/// Persisted form of [`DuplicationWorkflow`]. In-flight calls do not
/// survive a restore, and the identifier index is rebuilt from the rows.
#[derive(Deserialize)]
struct WorkflowSnapshot {
    #[serde(default)]
    originals: Vec<Guia>,
    #[serde(default)]
    batches: IndexMap<i64, DuplicateBatch>,
    #[serde(default)]
    expanded: IndexSet<i64>,
    #[serde(default)]
    processing: ProcessingSet,
}

impl From<WorkflowSnapshot> for DuplicationWorkflow {
    fn from(snapshot: WorkflowSnapshot) -> Self {
        let mut batches = snapshot.batches;
        for batch in batches.values_mut() {
            if batch.phase == BatchPhase::Submitting {
                settle_phase(batch);
            }
        }
        Self {
            index: RecordIndex::build(&snapshot.originals),
            originals: snapshot.originals,
            batches,
            expanded: snapshot.expanded,
            duplicating: IndexSet::new(),
            processing: snapshot.processing,
        }
    }
}

fn settle_phase(batch: &mut DuplicateBatch) {
    batch.phase = if batch.duplicates.iter().any(|d| d.modificado) {
        BatchPhase::Editing
    } else {
        BatchPhase::Ready
    };
}

/// Write the shared fields onto every duplicate, returning the new list
pub fn apply_shared_patch(records: &[DuplicateRecord], patch: &SharedPatch) -> Vec<DuplicateRecord> {
    records
        .iter()
        .map(|record| {
            let mut guia = record.guia.clone();

            if let Some(peso) = patch.peso_bruto_total {
                guia.peso_bruto_total = Some(peso);
            }
            if let Some(keys) = &patch.jerarquia {
                guia.jerarquia = keys.clone();
            }
            if let Some(obs) = &patch.observaciones {
                guia.observaciones = Some(obs.clone());
            }
            if patch.peso_bruto_total.is_some() || patch.leaf.is_some() {
                patch_first_item(&mut guia, patch);
            }

            DuplicateRecord {
                guia,
                modificado: record.modificado || !patch.is_empty(),
            }
        })
        .collect()
}

fn patch_first_item(guia: &mut Guia, patch: &SharedPatch) {
    let mut items = match guia.parsed_items() {
        Ok(items) => items,
        Err(e) => {
            tracing::warn!("Waybill {:?} has unreadable items, left untouched: {}", guia.id, e);
            return;
        }
    };

    if items.is_empty() {
        if let Some(Some(_)) = &patch.leaf {
            items.push(GuiaItem {
                cantidad: guia.peso_bruto_total.unwrap_or_default(),
                ..GuiaItem::default()
            });
        }
    }

    if let Some(leaf) = &patch.leaf {
        if let Some(first) = items.first_mut() {
            match leaf {
                Some(product) => {
                    first.codigo = product.codigo.clone();
                    first.descripcion = product.descripcion.clone();
                    if let Some(unit) = &product.unidad_de_medida {
                        first.unidad_de_medida = unit.clone();
                    }
                }
                None => first.codigo.clear(),
            }
        }
    }
    if let Some(peso) = patch.peso_bruto_total {
        derive_first_item_quantity(&mut items, peso);
    }

    match serialize_items(&items) {
        Ok(raw) => guia.items = raw,
        Err(e) => tracing::warn!("Failed to serialize items of waybill {:?}: {}", guia.id, e),
    }
}

/// A leaf without a code yields a blank code, which the submit gate rejects
fn leaf_product(node: &HierarchyNode) -> LeafProduct {
    LeafProduct {
        codigo: node.codigo.as_deref().map(str::trim).unwrap_or_default().to_string(),
        descripcion: node.nombre.clone(),
        unidad_de_medida: node.unidad_de_medida.clone(),
    }
}

/// Shared fields implied by the batch's current selection
fn selection_patch(selector: &CascadingSelector) -> SharedPatch {
    let Some(kind) = selector.kind() else {
        return SharedPatch::default();
    };
    // Seeded names still loading: the copies keep the source's text and product
    let leaf = match selector.leaf() {
        Some(_) if selector.is_pending(Level::Partida) => None,
        Some(node) => Some(Some(leaf_product(node))),
        None => Some(None),
    };
    let observaciones = match selector.unresolved() {
        Some(_) => None,
        None => Some(derive_observations(kind, &selector.names())),
    };
    SharedPatch {
        peso_bruto_total: None,
        jerarquia: Some(selector.keys()),
        observaciones,
        leaf,
    }
}

impl DuplicationWorkflow {
    pub fn new(originals: Vec<Guia>) -> Self {
        let mut wf = Self::default();
        wf.replace_originals(originals);
        wf
    }

    pub fn originals(&self) -> &[Guia] {
        &self.originals
    }

    pub fn batches(&self) -> impl Iterator<Item = &DuplicateBatch> {
        self.batches.values()
    }

    pub fn batch(&self, source_id: i64) -> Option<&DuplicateBatch> {
        self.batches.get(&source_id)
    }

    pub fn processing(&self) -> &ProcessingSet {
        &self.processing
    }

    pub fn is_expanded(&self, source_id: i64) -> bool {
        self.expanded.contains(&source_id)
    }

    /// Swap in a fresh list from the backend. Rows that already carry their
    /// documents are no longer processing.
    pub fn replace_originals(&mut self, originals: Vec<Guia>) {
        for guia in &originals {
            if let Some(id) = guia.identificador_unico.as_deref() {
                if guia.enlaces.any_present() {
                    self.processing.remove(id);
                }
            }
        }
        self.index = RecordIndex::build(&originals);
        self.originals = originals;
    }

    fn batch_mut(&mut self, source_id: i64) -> Result<&mut DuplicateBatch, WorkflowError> {
        self.batches
            .get_mut(&source_id)
            .ok_or(WorkflowError::BatchNotFound(source_id))
    }

    fn editable_batch(&mut self, source_id: i64) -> Result<&mut DuplicateBatch, WorkflowError> {
        let batch = self.batch_mut(source_id)?;
        if batch.phase == BatchPhase::Submitting {
            return Err(WorkflowError::SubmitInFlight(source_id));
        }
        Ok(batch)
    }

    /// NoBatch → Duplicating. Returns the validated count.
    pub fn begin_duplication(&mut self, source_id: i64, count: i64) -> AppResult<u32> {
        let count = validate_count(count)?;
        let source = self
            .originals
            .iter()
            .find(|g| g.id == Some(source_id))
            .ok_or(WorkflowError::SourceNotFound(source_id))?;
        if !source.is_duplicable() {
            return Err(WorkflowError::DuplicationRefused(source_id).into());
        }
        if self.batches.contains_key(&source_id) {
            return Err(WorkflowError::BatchExists(source_id).into());
        }
        if !self.duplicating.insert(source_id) {
            return Err(WorkflowError::DuplicationInFlight(source_id).into());
        }
        Ok(count)
    }

    /// Duplicating → BatchReady. The shared selection is seeded from the
    /// source's own chain; the returned fetches resolve its names.
    pub fn complete_duplication(
        &mut self,
        source_id: i64,
        copies: Vec<Guia>,
    ) -> Result<Vec<FetchRequest>, WorkflowError> {
        self.duplicating.shift_remove(&source_id);
        let source = self
            .originals
            .iter()
            .find(|g| g.id == Some(source_id))
            .ok_or(WorkflowError::SourceNotFound(source_id))?;

        if copies.is_empty() {
            tracing::warn!("Backend returned no copies for waybill {}", source_id);
            return Ok(Vec::new());
        }

        let mut selector = CascadingSelector::new();
        let requests = match source.jerarquia.active_kind() {
            Some(kind) => selector.seed(kind, source.jerarquia.chain(kind)),
            None => Vec::new(),
        };

        let batch = DuplicateBatch {
            source_id,
            duplicates: copies.into_iter().map(DuplicateRecord::from_copy).collect(),
            phase: BatchPhase::Ready,
            selector,
            peso_bruto_total: source.peso_bruto_total,
        };
        tracing::info!("Created batch of {} duplicates for waybill {}", batch.len(), source_id);
        self.batches.insert(source_id, batch);
        self.expanded.insert(source_id);
        Ok(requests)
    }

    /// Duplicating → NoBatch after a backend failure
    pub fn fail_duplication(&mut self, source_id: i64) {
        self.duplicating.shift_remove(&source_id);
    }

    fn broadcast(batch: &mut DuplicateBatch, patch: &SharedPatch) {
        if patch.is_empty() {
            return;
        }
        batch.duplicates = apply_shared_patch(&batch.duplicates, patch);
        batch.phase = BatchPhase::Editing;
    }

    fn resync_selection(batch: &mut DuplicateBatch) {
        let patch = selection_patch(&batch.selector);
        Self::broadcast(batch, &patch);
    }

    pub fn set_gross_weight(&mut self, source_id: i64, peso: f64) -> Result<(), WorkflowError> {
        let batch = self.editable_batch(source_id)?;
        batch.peso_bruto_total = Some(peso);
        let patch = SharedPatch {
            peso_bruto_total: Some(peso),
            ..SharedPatch::default()
        };
        Self::broadcast(batch, &patch);
        Ok(())
    }

    pub fn switch_chain(
        &mut self,
        source_id: i64,
        kind: ChainKind,
    ) -> Result<Option<FetchRequest>, WorkflowError> {
        let batch = self.editable_batch(source_id)?;
        let req = batch.selector.switch_kind(kind);
        Self::resync_selection(batch);
        Ok(req)
    }

    pub fn select_level(
        &mut self,
        source_id: i64,
        level: Level,
        id: Option<i64>,
    ) -> Result<Option<FetchRequest>, WorkflowError> {
        let batch = self.editable_batch(source_id)?;
        let req = batch.selector.select(level, id)?;
        Self::resync_selection(batch);
        Ok(req)
    }

    /// Feed a fetch result into the batch's selector. A batch that vanished
    /// meanwhile simply drops the result.
    pub fn load_options(
        &mut self,
        source_id: i64,
        req: FetchRequest,
        result: Result<Vec<HierarchyNode>, String>,
    ) -> bool {
        let Some(batch) = self.batches.get_mut(&source_id) else {
            return false;
        };
        let applied = batch.selector.load_options(req, result);
        if applied && batch.phase != BatchPhase::Submitting {
            // Loading options is not a user edit
            let phase = batch.phase;
            Self::resync_selection(batch);
            batch.phase = phase;
        }
        applied
    }

    pub fn retry_options(
        &mut self,
        source_id: i64,
        level: Level,
    ) -> Result<Option<FetchRequest>, WorkflowError> {
        let batch = self.editable_batch(source_id)?;
        Ok(batch.selector.retry(level))
    }

    /// Drop one duplicate. Returns `true` when it was the last one and the
    /// whole batch is gone.
    pub fn remove_duplicate(&mut self, source_id: i64, index: usize) -> Result<bool, WorkflowError> {
        let batch = self.editable_batch(source_id)?;
        if index >= batch.duplicates.len() {
            return Err(WorkflowError::DuplicateIndex { source_id, index });
        }
        batch.duplicates.remove(index);
        if batch.duplicates.is_empty() {
            self.batches.shift_remove(&source_id);
            self.expanded.shift_remove(&source_id);
            tracing::info!("Last duplicate of waybill {} removed, batch dropped", source_id);
            return Ok(true);
        }
        Ok(false)
    }

    /// BatchReady → Cancelled. Memory only.
    pub fn cancel(&mut self, source_id: i64) -> Result<DuplicateBatch, WorkflowError> {
        self.editable_batch(source_id)?;
        self.expanded.shift_remove(&source_id);
        let batch = self
            .batches
            .shift_remove(&source_id)
            .ok_or(WorkflowError::BatchNotFound(source_id))?;
        tracing::info!("Batch for waybill {} cancelled ({} duplicates discarded)", source_id, batch.len());
        Ok(batch)
    }

    /// BatchReady → Submitting. Validates and locks the batch, returning
    /// the records to persist.
    pub fn begin_submit(&mut self, source_id: i64) -> AppResult<Vec<Guia>> {
        let batch = self.editable_batch(source_id)?;
        validate_batch(batch)?;
        batch.phase = BatchPhase::Submitting;
        Ok(batch.duplicates.iter().map(|d| d.guia.clone()).collect())
    }

    /// Submitting → Submitted
    pub fn complete_submit(
        &mut self,
        source_id: i64,
        created: Vec<String>,
    ) -> Result<DuplicateBatch, WorkflowError> {
        self.expanded.shift_remove(&source_id);
        let batch = self
            .batches
            .shift_remove(&source_id)
            .ok_or(WorkflowError::BatchNotFound(source_id))?;
        for id in created {
            let id = id.trim();
            if !id.is_empty() {
                self.processing.insert(id);
            }
        }
        Ok(batch)
    }

    /// Submitting → BatchReady/Editing after a failed save; the batch is untouched
    pub fn abort_submit(&mut self, source_id: i64) {
        if let Some(batch) = self.batches.get_mut(&source_id) {
            settle_phase(batch);
        }
    }

    /// Patch the matching row with its documents. Safe to repeat and to
    /// receive for rows not loaded locally.
    pub fn apply_event(&mut self, event: &RealtimeEvent) -> EventOutcome {
        match event {
            RealtimeEvent::WaybillCompleted(payload) => {
                let id = payload.identificador_unico.trim();
                self.processing.remove(id);
                let Some(row) = self.index.position(id) else {
                    return EventOutcome::NotFound;
                };
                let Some(guia) = self.originals.get_mut(row) else {
                    return EventOutcome::NotFound;
                };
                guia.enlaces = payload.links();
                guia.aceptada_por_sunat = Some(true);
                EventOutcome::Patched(row)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, ValidationError};
    use crate::models::{CompletionPayload, HierarchyKeys};

    fn item_json(codigo: &str, cantidad: f64) -> String {
        serialize_items(&[GuiaItem {
            unidad_de_medida: "M3".into(),
            codigo: codigo.into(),
            descripcion: "Excavación".into(),
            cantidad,
        }])
        .unwrap()
    }

    fn source(id: i64) -> Guia {
        Guia {
            id: Some(id),
            identificador_unico: Some(format!("T001-{id}")),
            items: item_json("EXC-001", 10.0),
            peso_bruto_total: Some(10.0),
            observaciones: Some("manual".into()),
            jerarquia: HierarchyKeys::from_chain(
                ChainKind::Proyecto,
                [Some(1), Some(10), Some(20), Some(30), Some(40)],
            ),
            ..Guia::default()
        }
    }

    fn copies(src: &Guia, n: usize) -> Vec<Guia> {
        (0..n).map(|_| src.clone()).collect()
    }

    fn node(id: i64, nombre: &str, codigo: Option<&str>) -> HierarchyNode {
        HierarchyNode {
            id,
            nombre: nombre.into(),
            codigo: codigo.map(Into::into),
            unidad_de_medida: None,
        }
    }

    fn options_for(level: Level) -> Vec<HierarchyNode> {
        match level {
            Level::Root => vec![node(1, "Torre Norte", None), node(2, "Torre Sur", None)],
            Level::Etapa => vec![node(10, "Cimentación", None)],
            Level::Sector => vec![node(20, "A1", None)],
            Level::Frente => vec![node(30, "Norte-Este", None)],
            Level::Partida => vec![
                node(40, "Excavación", Some("EXC-001")),
                node(41, "Relleno", Some("REL-002")),
                node(43, "Limpieza", None),
            ],
        }
    }

    fn ready_batch(n: usize) -> DuplicationWorkflow {
        let src = source(42);
        let mut wf = DuplicationWorkflow::new(vec![src.clone()]);
        assert_eq!(wf.begin_duplication(42, n as i64).unwrap(), n as u32);
        let reqs = wf.complete_duplication(42, copies(&src, n)).unwrap();
        assert_eq!(reqs.len(), 5);
        for req in reqs {
            assert!(wf.load_options(42, req, Ok(options_for(req.level))));
        }
        wf
    }

    #[test]
    fn duplicates_never_carry_links() {
        let mut src = source(7);
        src.aceptada_por_sunat = Some(true);
        let mut wf = DuplicationWorkflow::new(vec![source(7)]);
        for n in [1usize, 17, 50] {
            wf.begin_duplication(7, n as i64).unwrap();
            let mut linked = src.clone();
            linked.enlaces.enlace_del_pdf = Some("pdf".into());
            wf.complete_duplication(7, copies(&linked, n)).unwrap();
            let batch = wf.batch(7).unwrap();
            assert_eq!(batch.len(), n);
            assert!(batch
                .duplicates
                .iter()
                .all(|d| !d.guia.enlaces.any_present() && d.guia.identificador_unico.is_none()));
            wf.cancel(7).unwrap();
        }
    }

    #[test]
    fn duplication_refused_for_linked_source() {
        for link in 0..3 {
            let mut src = source(5);
            match link {
                0 => src.enlaces.enlace_del_pdf = Some("p".into()),
                1 => src.enlaces.enlace_del_xml = Some("x".into()),
                _ => src.enlaces.enlace_del_cdr = Some("c".into()),
            }
            let mut wf = DuplicationWorkflow::new(vec![src]);
            let err = wf.begin_duplication(5, 3).unwrap_err();
            assert!(matches!(err, AppError::Workflow(WorkflowError::DuplicationRefused(5))));
            assert!(wf.batch(5).is_none());
        }
    }

    #[test]
    fn count_checked_before_anything_else() {
        let mut wf = DuplicationWorkflow::new(vec![source(1)]);
        let err = wf.begin_duplication(1, 51).unwrap_err();
        assert!(matches!(
            err,
            AppError::Validation(ValidationError::CountOutOfRange { got: 51, .. })
        ));
        assert!(wf.begin_duplication(1, 2).is_ok());
        assert!(matches!(
            wf.begin_duplication(1, 2).unwrap_err(),
            AppError::Workflow(WorkflowError::DuplicationInFlight(1))
        ));
        wf.fail_duplication(1);
        assert!(wf.begin_duplication(1, 2).is_ok());
    }

    #[test]
    fn one_batch_per_source() {
        let mut wf = ready_batch(2);
        assert!(matches!(
            wf.begin_duplication(42, 1).unwrap_err(),
            AppError::Workflow(WorkflowError::BatchExists(42))
        ));
    }

    #[test]
    fn seeding_resolves_observations_from_source_chain() {
        let wf = ready_batch(3);
        let batch = wf.batch(42).unwrap();
        assert!(wf.is_expanded(42));
        assert!(batch.selector.is_resolved());
        for d in &batch.duplicates {
            assert_eq!(
                d.guia.observaciones.as_deref(),
                Some("Proyecto: Torre Norte\nEtapa: Cimentación\nSector: A1\nFrente: Norte-Este\nPartida: Excavación")
            );
        }
    }

    #[test]
    fn broadcast_weight_and_hierarchy() {
        let mut wf = ready_batch(3);
        wf.set_gross_weight(42, 25.5).unwrap();
        let req = wf.select_level(42, Level::Frente, Some(30)).unwrap().unwrap();
        assert!(wf.load_options(42, req, Ok(options_for(Level::Partida))));
        wf.select_level(42, Level::Partida, Some(41)).unwrap();

        let batch = wf.batch(42).unwrap();
        assert_eq!(batch.phase, BatchPhase::Editing);
        let first = &batch.duplicates[0].guia;
        for d in &batch.duplicates {
            assert!(d.modificado);
            assert_eq!(d.guia.peso_bruto_total, Some(25.5));
            assert_eq!(d.guia.jerarquia, first.jerarquia);
            assert_eq!(d.guia.observaciones, first.observaciones);
            let items = d.guia.parsed_items().unwrap();
            assert_eq!(items[0].cantidad, 25.5);
            assert_eq!(items[0].codigo, "REL-002");
        }
        assert_eq!(first.jerarquia.id_partida, Some(41));
    }

    #[test]
    fn clearing_a_level_blanks_code_and_blocks_submit() {
        let mut wf = ready_batch(2);
        wf.select_level(42, Level::Sector, Some(20)).unwrap();
        let batch = wf.batch(42).unwrap();
        let g = &batch.duplicates[1].guia;
        assert_eq!(g.jerarquia.id_frente, None);
        assert_eq!(g.jerarquia.id_partida, None);
        assert_eq!(g.parsed_items().unwrap()[0].codigo, "");
        assert_eq!(
            g.observaciones.as_deref(),
            Some("Proyecto: Torre Norte\nEtapa: Cimentación\nSector: A1")
        );
        assert!(matches!(
            wf.begin_submit(42).unwrap_err(),
            AppError::Validation(ValidationError::MissingLeaf { label: "Partida" })
        ));
        assert_eq!(wf.batch(42).unwrap().phase, BatchPhase::Editing);
    }

    #[test]
    fn leaf_without_code_blanks_the_product() {
        let mut wf = ready_batch(2);
        wf.select_level(42, Level::Partida, Some(43)).unwrap();

        let batch = wf.batch(42).unwrap();
        for d in &batch.duplicates {
            assert_eq!(d.guia.jerarquia.id_partida, Some(43));
            let items = d.guia.parsed_items().unwrap();
            assert_eq!(items[0].codigo, "");
            assert_eq!(items[0].descripcion, "Limpieza");
            assert!(d.guia.observaciones.as_deref().unwrap().ends_with("Partida: Limpieza"));
        }
        assert!(matches!(
            wf.begin_submit(42).unwrap_err(),
            AppError::Validation(ValidationError::BlankProductCode)
        ));

        wf.select_level(42, Level::Partida, Some(40)).unwrap();
        let items = wf.batch(42).unwrap().duplicates[0].guia.parsed_items().unwrap();
        assert_eq!(items[0].codigo, "EXC-001");
        assert!(wf.begin_submit(42).is_ok());
    }

    #[test]
    fn failed_seeded_level_keeps_source_text_and_blocks_submit() {
        let src = source(42);
        let mut wf = DuplicationWorkflow::new(vec![src.clone()]);
        wf.begin_duplication(42, 2).unwrap();
        let reqs = wf.complete_duplication(42, copies(&src, 2)).unwrap();
        for req in &reqs {
            let result = match req.level {
                Level::Sector => Err("sectores unavailable".to_string()),
                level => Ok(options_for(level)),
            };
            assert!(wf.load_options(42, *req, result));
        }

        let batch = wf.batch(42).unwrap();
        for d in &batch.duplicates {
            assert_eq!(d.guia.observaciones.as_deref(), Some("manual"));
            assert_eq!(d.guia.parsed_items().unwrap()[0].codigo, "EXC-001");
            assert_eq!(d.guia.jerarquia.id_sector, Some(20));
        }
        assert!(matches!(
            wf.begin_submit(42).unwrap_err(),
            AppError::Validation(ValidationError::UnresolvedLevel { label: "Sector" })
        ));

        let retry = wf.retry_options(42, Level::Sector).unwrap().unwrap();
        assert!(wf.load_options(42, retry, Ok(options_for(Level::Sector))));
        let first = &wf.batch(42).unwrap().duplicates[0].guia;
        assert_eq!(
            first.observaciones.as_deref(),
            Some("Proyecto: Torre Norte\nEtapa: Cimentación\nSector: A1\nFrente: Norte-Este\nPartida: Excavación")
        );
        assert!(wf.begin_submit(42).is_ok());
    }

    #[test]
    fn restored_state_still_patches_rows() {
        let mut wf = ready_batch(2);
        wf.begin_submit(42).unwrap();
        let json = serde_json::to_string(&wf).unwrap();

        let mut restored: DuplicationWorkflow = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.batch(42).unwrap().len(), 2);
        assert_ne!(restored.batch(42).unwrap().phase, BatchPhase::Submitting);
        assert!(restored.begin_duplication(42, 1).is_err());

        let event = RealtimeEvent::WaybillCompleted(CompletionPayload {
            identificador_unico: "T001-42".into(),
            pdf_link: Some("pdf".into()),
            xml_link: None,
            cdr_link: None,
        });
        assert_eq!(restored.apply_event(&event), EventOutcome::Patched(0));
        assert!(restored.originals()[0].enlaces.any_present());
    }

    #[test]
    fn switching_chain_clears_project_keys() {
        let mut wf = ready_batch(2);
        let req = wf.switch_chain(42, ChainKind::Subproyecto).unwrap().unwrap();
        assert_eq!(req.kind, ChainKind::Subproyecto);
        for d in &wf.batch(42).unwrap().duplicates {
            assert_eq!(d.guia.jerarquia, HierarchyKeys::default());
            assert_eq!(d.guia.observaciones.as_deref(), Some(""));
        }
    }

    #[test]
    fn removing_last_duplicate_drops_batch() {
        let mut wf = ready_batch(2);
        assert!(matches!(
            wf.remove_duplicate(42, 5),
            Err(WorkflowError::DuplicateIndex { index: 5, .. })
        ));
        assert_eq!(wf.remove_duplicate(42, 0), Ok(false));
        assert_eq!(wf.batch(42).unwrap().len(), 1);
        assert_eq!(wf.remove_duplicate(42, 0), Ok(true));
        assert!(wf.batch(42).is_none());
        assert!(!wf.is_expanded(42));
    }

    #[test]
    fn submit_lifecycle_with_in_flight_guard() {
        let mut wf = ready_batch(3);
        wf.set_gross_weight(42, 25.5).unwrap();
        let records = wf.begin_submit(42).unwrap();
        assert_eq!(records.len(), 3);

        assert!(matches!(
            wf.begin_submit(42).unwrap_err(),
            AppError::Workflow(WorkflowError::SubmitInFlight(42))
        ));
        assert_eq!(wf.cancel(42).unwrap_err(), WorkflowError::SubmitInFlight(42));
        assert_eq!(wf.set_gross_weight(42, 1.0), Err(WorkflowError::SubmitInFlight(42)));

        wf.abort_submit(42);
        assert_eq!(wf.batch(42).unwrap().phase, BatchPhase::Editing);
        wf.begin_submit(42).unwrap();

        let done = wf
            .complete_submit(42, vec!["T001-100".into(), "T001-101".into(), " ".into()])
            .unwrap();
        assert_eq!(done.len(), 3);
        assert!(wf.batch(42).is_none());
        assert!(!wf.is_expanded(42));
        assert_eq!(wf.processing().len(), 2);
    }

    #[test]
    fn cancel_removes_batch_and_expansion() {
        let mut wf = ready_batch(4);
        let batch = wf.cancel(42).unwrap();
        assert_eq!(batch.len(), 4);
        assert!(wf.batch(42).is_none());
        assert!(!wf.is_expanded(42));
        assert_eq!(wf.cancel(42).unwrap_err(), WorkflowError::BatchNotFound(42));
    }

    #[test]
    fn completion_event_is_idempotent() {
        let mut wf = DuplicationWorkflow::new(vec![source(1), source(2)]);
        wf.processing.insert("T001-2");
        let event = RealtimeEvent::WaybillCompleted(CompletionPayload {
            identificador_unico: "T001-2".into(),
            pdf_link: Some("pdf".into()),
            xml_link: Some("xml".into()),
            cdr_link: Some("cdr".into()),
        });

        assert_eq!(wf.apply_event(&event), EventOutcome::Patched(1));
        let once = wf.originals().to_vec();
        assert_eq!(wf.apply_event(&event), EventOutcome::Patched(1));
        assert_eq!(wf.originals(), once.as_slice());
        assert!(wf.processing().is_empty());
        assert_eq!(wf.originals()[1].enlaces.enlace_del_cdr.as_deref(), Some("cdr"));
        assert_eq!(wf.originals()[1].aceptada_por_sunat, Some(true));
        assert!(!wf.originals()[0].enlaces.any_present());
    }

    #[test]
    fn event_for_unknown_row_is_a_noop() {
        let mut wf = DuplicationWorkflow::new(vec![source(1)]);
        wf.processing.insert("T001-99");
        let event = RealtimeEvent::WaybillCompleted(CompletionPayload {
            identificador_unico: "T001-99".into(),
            pdf_link: None,
            xml_link: None,
            cdr_link: None,
        });
        assert_eq!(wf.apply_event(&event), EventOutcome::NotFound);
        assert!(wf.processing().is_empty());
    }

    #[test]
    fn refresh_clears_completed_processing_ids() {
        let mut wf = DuplicationWorkflow::new(vec![]);
        wf.processing.insert("T001-5");
        wf.processing.insert("T001-6");
        let mut done = source(5);
        done.enlaces.enlace_del_pdf = Some("pdf".into());
        wf.replace_originals(vec![done, source(6)]);
        assert!(!wf.processing().contains("T001-5"));
        assert!(wf.processing().contains("T001-6"));
    }
}
