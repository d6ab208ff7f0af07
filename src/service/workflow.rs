use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::client::GuiaBackend;
use crate::error::{AppResult, BackendError, WorkflowError};
use crate::models::{ChainKind, DuplicateBatch, Guia, Level, RealtimeEvent};
use crate::service::duplication::{DuplicationWorkflow, EventOutcome};
use crate::service::selector::FetchRequest;

/// Async driver of the duplication workflow.
///
/// The state lock is never held across a backend call: guards are taken
/// under the lock, the call runs unlocked, and the outcome is applied
/// under the lock again.
pub struct WorkflowService {
    backend: Arc<dyn GuiaBackend>,
    state: Arc<Mutex<DuplicationWorkflow>>,
    refresh_delay: Duration,
}

impl WorkflowService {
    pub fn new(backend: Arc<dyn GuiaBackend>, refresh_delay: Duration) -> Self {
        Self {
            backend,
            state: Arc::new(Mutex::new(DuplicationWorkflow::default())),
            refresh_delay,
        }
    }

    pub async fn refresh_originals(&self) -> Result<usize, BackendError> {
        let originals = self.backend.get_all_originals().await?;
        let count = originals.len();
        self.state.lock().await.replace_originals(originals);
        tracing::info!("Loaded {} source waybills", count);
        Ok(count)
    }

    pub async fn originals(&self) -> Vec<Guia> {
        self.state.lock().await.originals().to_vec()
    }

    pub async fn batches(&self) -> Vec<DuplicateBatch> {
        self.state.lock().await.batches().cloned().collect()
    }

    pub async fn batch(&self, source_id: i64) -> Result<DuplicateBatch, WorkflowError> {
        self.state
            .lock()
            .await
            .batch(source_id)
            .cloned()
            .ok_or(WorkflowError::BatchNotFound(source_id))
    }

    pub async fn processing(&self) -> Vec<String> {
        self.state
            .lock()
            .await
            .processing()
            .iter()
            .map(str::to_string)
            .collect()
    }

    pub async fn is_expanded(&self, source_id: i64) -> bool {
        self.state.lock().await.is_expanded(source_id)
    }

    /// Ask the backend for `count` copies and open a batch with them
    pub async fn duplicate(&self, source_id: i64, count: i64) -> AppResult<DuplicateBatch> {
        let count = self.state.lock().await.begin_duplication(source_id, count)?;

        let copies = match self.backend.duplicate(source_id, count).await {
            Ok(resp) => resp.duplicados,
            Err(e) => {
                tracing::error!("Duplicating waybill {} failed: {}", source_id, e);
                self.state.lock().await.fail_duplication(source_id);
                return Err(e.into());
            }
        };

        let requests = self
            .state
            .lock()
            .await
            .complete_duplication(source_id, copies)?;
        self.hydrate(source_id, requests).await;

        match self.batch(source_id).await {
            Ok(batch) => Ok(batch),
            Err(_) => Err(BackendError::Rejected(format!(
                "no copies returned for waybill {}",
                source_id
            ))
            .into()),
        }
    }

    /// Resolve the seeded selection; every level is scoped by an id already
    /// known from the source, so all fetches run at once.
    async fn hydrate(&self, source_id: i64, requests: Vec<FetchRequest>) {
        let fetches = requests.iter().map(|req| {
            self.backend
                .list_level(req.kind, req.level, req.parent_id)
        });
        let results = join_all(fetches).await;

        let mut state = self.state.lock().await;
        for (req, result) in requests.into_iter().zip(results) {
            let result = result.map_err(|e| {
                tracing::warn!(
                    "Loading {} options for batch {} failed: {}",
                    req.level.resource_path(req.kind),
                    source_id,
                    e
                );
                e.to_string()
            });
            state.load_options(source_id, req, result);
        }
    }

    async fn fetch_options(&self, source_id: i64, req: Option<FetchRequest>) {
        let Some(req) = req else { return };
        let result = self
            .backend
            .list_level(req.kind, req.level, req.parent_id)
            .await
            .map_err(|e| {
                tracing::warn!(
                    "Loading {} options for batch {} failed: {}",
                    req.level.resource_path(req.kind),
                    source_id,
                    e
                );
                e.to_string()
            });
        self.state.lock().await.load_options(source_id, req, result);
    }

    pub async fn set_gross_weight(&self, source_id: i64, peso: f64) -> AppResult<DuplicateBatch> {
        self.state.lock().await.set_gross_weight(source_id, peso)?;
        Ok(self.batch(source_id).await?)
    }

    pub async fn switch_chain(&self, source_id: i64, kind: ChainKind) -> AppResult<DuplicateBatch> {
        let req = self.state.lock().await.switch_chain(source_id, kind)?;
        self.fetch_options(source_id, req).await;
        Ok(self.batch(source_id).await?)
    }

    pub async fn select_level(
        &self,
        source_id: i64,
        level: Level,
        id: Option<i64>,
    ) -> AppResult<DuplicateBatch> {
        let req = self.state.lock().await.select_level(source_id, level, id)?;
        self.fetch_options(source_id, req).await;
        Ok(self.batch(source_id).await?)
    }

    pub async fn retry_options(&self, source_id: i64, level: Level) -> AppResult<DuplicateBatch> {
        let req = self.state.lock().await.retry_options(source_id, level)?;
        self.fetch_options(source_id, req).await;
        Ok(self.batch(source_id).await?)
    }

    /// `None` once the last duplicate is gone
    pub async fn remove_duplicate(
        &self,
        source_id: i64,
        index: usize,
    ) -> AppResult<Option<DuplicateBatch>> {
        let mut state = self.state.lock().await;
        if state.remove_duplicate(source_id, index)? {
            return Ok(None);
        }
        Ok(state.batch(source_id).cloned())
    }

    /// Discard the batch; nothing is sent to the backend
    pub async fn cancel(&self, source_id: i64) -> AppResult<usize> {
        let batch = self.state.lock().await.cancel(source_id)?;
        Ok(batch.len())
    }

    /// Persist every duplicate in one call. Returns the new business ids.
    pub async fn submit(&self, source_id: i64) -> AppResult<Vec<String>> {
        let records = self.state.lock().await.begin_submit(source_id)?;
        tracing::info!("Saving {} duplicates of waybill {}", records.len(), source_id);

        let created = match self.backend.save_duplicates(&records).await {
            Ok(resp) => resp.identifiers(),
            Err(e) => {
                tracing::error!("Saving duplicates of waybill {} failed: {}", source_id, e);
                self.state.lock().await.abort_submit(source_id);
                return Err(e.into());
            }
        };

        self.state
            .lock()
            .await
            .complete_submit(source_id, created.clone())?;
        tracing::info!(
            "Batch for waybill {} saved, {} waybills processing",
            source_id,
            created.len()
        );
        self.schedule_refresh();
        Ok(created)
    }

    /// Reload the list after the configured delay. Failures are only logged.
    pub fn schedule_refresh(&self) -> JoinHandle<()> {
        let backend = self.backend.clone();
        let state = self.state.clone();
        let delay = self.refresh_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match backend.get_all_originals().await {
                Ok(originals) => state.lock().await.replace_originals(originals),
                Err(e) => tracing::warn!("Refreshing waybill list failed: {}", e),
            }
        })
    }

    pub async fn apply_event(&self, event: &RealtimeEvent) -> EventOutcome {
        self.state.lock().await.apply_event(event)
    }
}
