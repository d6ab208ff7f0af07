//! In-memory backend with call counters and injectable failures.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{CreatedGuia, DuplicateResponse, GuiaBackend, SaveDuplicatesResponse};
use crate::error::BackendError;
use crate::models::{ChainKind, Guia, HierarchyNode, Level};

type LevelKey = (ChainKind, Level, Option<i64>);

#[derive(Default)]
struct FakeState {
    originals: Vec<Guia>,
    tree: HashMap<LevelKey, Vec<HierarchyNode>>,
    failing_levels: HashSet<(ChainKind, Level)>,
    saved: Vec<Guia>,
    next_number: u64,
}

#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<FakeState>,
    fail_duplicate: AtomicBool,
    fail_save: AtomicBool,
    save_delay: Mutex<Option<Duration>>,
    pub originals_calls: AtomicUsize,
    pub duplicate_calls: AtomicUsize,
    pub save_calls: AtomicUsize,
    pub list_calls: AtomicUsize,
}

impl FakeBackend {
    pub fn new(originals: Vec<Guia>) -> Self {
        Self {
            state: Mutex::new(FakeState {
                originals,
                next_number: 100,
                ..FakeState::default()
            }),
            ..Self::default()
        }
    }

    pub async fn add_level(
        &self,
        kind: ChainKind,
        level: Level,
        parent_id: Option<i64>,
        nodes: Vec<HierarchyNode>,
    ) {
        self.state.lock().await.tree.insert((kind, level, parent_id), nodes);
    }

    pub async fn fail_level(&self, kind: ChainKind, level: Level, fail: bool) {
        let mut state = self.state.lock().await;
        if fail {
            state.failing_levels.insert((kind, level));
        } else {
            state.failing_levels.remove(&(kind, level));
        }
    }

    pub fn fail_duplicate(&self, fail: bool) {
        self.fail_duplicate.store(fail, Ordering::SeqCst);
    }

    pub fn fail_save(&self, fail: bool) {
        self.fail_save.store(fail, Ordering::SeqCst);
    }

    pub async fn set_save_delay(&self, delay: Duration) {
        *self.save_delay.lock().await = Some(delay);
    }

    /// Records persisted through `save_duplicates`, in order
    pub async fn saved(&self) -> Vec<Guia> {
        self.state.lock().await.saved.clone()
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    fn unavailable(what: &str) -> BackendError {
        BackendError::Server {
            status: 503,
            message: format!("{} unavailable", what),
        }
    }
}

#[async_trait]
impl GuiaBackend for FakeBackend {
    async fn get_all_originals(&self) -> Result<Vec<Guia>, BackendError> {
        self.originals_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.state.lock().await.originals.clone())
    }

    async fn duplicate(&self, source_id: i64, count: u32) -> Result<DuplicateResponse, BackendError> {
        self.duplicate_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_duplicate.load(Ordering::SeqCst) {
            return Err(Self::unavailable("duplicate"));
        }
        let state = self.state.lock().await;
        let source = state
            .originals
            .iter()
            .find(|g| g.id == Some(source_id))
            .ok_or_else(|| BackendError::Rejected(format!("waybill {} not found", source_id)))?;
        Ok(DuplicateResponse {
            success: true,
            message: format!("{} copies created", count),
            duplicados: (0..count).map(|_| source.clone()).collect(),
        })
    }

    async fn save_duplicates(&self, records: &[Guia]) -> Result<SaveDuplicatesResponse, BackendError> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.save_delay.lock().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_save.load(Ordering::SeqCst) {
            return Err(Self::unavailable("save"));
        }

        let mut state = self.state.lock().await;
        let mut created = Vec::with_capacity(records.len());
        for record in records {
            state.next_number += 1;
            let identificador_unico = format!("T001-{}", state.next_number);
            let mut stored = record.clone();
            stored.id = Some(state.next_number as i64);
            stored.identificador_unico = Some(identificador_unico.clone());
            state.saved.push(stored.clone());
            state.originals.push(stored);
            created.push(CreatedGuia { identificador_unico });
        }
        Ok(SaveDuplicatesResponse {
            guias_creadas: created,
        })
    }

    async fn list_level(
        &self,
        kind: ChainKind,
        level: Level,
        parent_id: Option<i64>,
    ) -> Result<Vec<HierarchyNode>, BackendError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().await;
        if state.failing_levels.contains(&(kind, level)) {
            return Err(Self::unavailable(level.resource_path(kind)));
        }
        Ok(state
            .tree
            .get(&(kind, level, parent_id))
            .cloned()
            .unwrap_or_default())
    }
}
