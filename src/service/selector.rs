//! Cascading selector chain.
//!
//! Holds the selection of one hierarchy chain (Proyecto → … → Partida or
//! the Subproyecto mirror) together with the option list of each level.
//! Selecting at level k clears everything below it and asks the caller
//! to fetch the options of level k+1; the selector itself never does IO,
//! it only hands out [`FetchRequest`]s and accepts their results.

use serde::{Deserialize, Serialize};

use crate::error::WorkflowError;
use crate::models::{ChainKind, HierarchyKeys, HierarchyNode, Level};

const LEVELS: usize = Level::ALL.len();

/// Option list state of one selector
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum LevelOptions {
    #[default]
    Disabled,
    Loading,
    Ready(Vec<HierarchyNode>),
    Failed(String),
}

impl LevelOptions {
    pub fn find(&self, id: i64) -> Option<&HierarchyNode> {
        match self {
            LevelOptions::Ready(nodes) => nodes.iter().find(|n| n.id == id),
            _ => None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, LevelOptions::Ready(_))
    }
}

/// Options the caller must load for a level, scoped by the parent selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchRequest {
    pub kind: ChainKind,
    pub level: Level,
    pub parent_id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CascadingSelector {
    kind: Option<ChainKind>,
    selected: [Option<HierarchyNode>; LEVELS],
    options: [LevelOptions; LEVELS],
}

impl CascadingSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(&self) -> Option<ChainKind> {
        self.kind
    }

    pub fn selected(&self, level: Level) -> Option<&HierarchyNode> {
        self.selected[level.index()].as_ref()
    }

    pub fn options(&self, level: Level) -> &LevelOptions {
        &self.options[level.index()]
    }

    pub fn leaf(&self) -> Option<&HierarchyNode> {
        self.selected(Level::Partida)
    }

    /// Chain resolved down to its leaf, every name loaded
    pub fn is_resolved(&self) -> bool {
        self.kind.is_some()
            && self.selected.iter().all(Option::is_some)
            && self.unresolved().is_none()
    }

    /// Selected by id through [`Self::seed`] but not yet matched against
    /// loaded options, so its name and code are still unknown.
    pub fn is_pending(&self, level: Level) -> bool {
        match self.selected(level) {
            Some(node) => self.options(level).find(node.id).is_none(),
            None => false,
        }
    }

    /// Topmost pending level
    pub fn unresolved(&self) -> Option<Level> {
        Level::ALL.into_iter().find(|&level| self.is_pending(level))
    }

    /// Selected names top-down; `None` where the level is empty
    pub fn names(&self) -> [Option<&str>; LEVELS] {
        std::array::from_fn(|i| self.selected[i].as_ref().map(|n| n.nombre.as_str()))
    }

    /// Foreign keys for the active chain, the other chain always empty
    pub fn keys(&self) -> HierarchyKeys {
        match self.kind {
            Some(kind) => {
                HierarchyKeys::from_chain(kind, std::array::from_fn(|i| self.selected[i].as_ref().map(|n| n.id)))
            }
            None => HierarchyKeys::default(),
        }
    }

    fn request(&self, level: Level) -> Option<FetchRequest> {
        let kind = self.kind?;
        let parent_id = match level.parent() {
            Some(parent) => Some(self.selected(parent)?.id),
            None => None,
        };
        Some(FetchRequest {
            kind,
            level,
            parent_id,
        })
    }

    fn clear_below(&mut self, level: Level) {
        for i in level.index() + 1..LEVELS {
            self.selected[i] = None;
            self.options[i] = LevelOptions::Disabled;
        }
    }

    /// Activate a chain. Switching clears every selection of the previous one;
    /// re-activating the current chain is a no-op.
    pub fn switch_kind(&mut self, kind: ChainKind) -> Option<FetchRequest> {
        if self.kind == Some(kind) {
            return None;
        }
        *self = Self {
            kind: Some(kind),
            ..Self::default()
        };
        self.options[Level::Root.index()] = LevelOptions::Loading;
        self.request(Level::Root)
    }

    /// Select (or with `None`, clear) the value at `level`.
    pub fn select(
        &mut self,
        level: Level,
        id: Option<i64>,
    ) -> Result<Option<FetchRequest>, WorkflowError> {
        if self.kind.is_none() {
            return Err(WorkflowError::NoChainSelected);
        }
        if let Some(parent) = level.parent() {
            if self.selected(parent).is_none() {
                return Err(WorkflowError::ParentNotSelected(level));
            }
        }

        let Some(id) = id else {
            self.selected[level.index()] = None;
            self.clear_below(level);
            return Ok(None);
        };

        let node = self
            .options(level)
            .find(id)
            .cloned()
            .ok_or(WorkflowError::UnknownOption { id })?;
        self.selected[level.index()] = Some(node);
        self.clear_below(level);

        match level.next() {
            Some(next) => {
                self.options[next.index()] = LevelOptions::Loading;
                Ok(self.request(next))
            }
            None => Ok(None),
        }
    }

    /// Apply the outcome of a fetch. Responses that no longer match the
    /// current selection are dropped; returns whether it was applied.
    pub fn load_options(
        &mut self,
        req: FetchRequest,
        result: Result<Vec<HierarchyNode>, String>,
    ) -> bool {
        if self.request(req.level) != Some(req) {
            return false;
        }
        if self.options(req.level) != &LevelOptions::Loading {
            return false;
        }

        let idx = req.level.index();
        match result {
            Ok(nodes) => {
                // Placeholders from seeding pick up their real names here
                if let Some(current) = &self.selected[idx] {
                    if let Some(full) = nodes.iter().find(|n| n.id == current.id) {
                        self.selected[idx] = Some(full.clone());
                    }
                }
                self.options[idx] = LevelOptions::Ready(nodes);
            }
            Err(message) => {
                self.options[idx] = LevelOptions::Failed(message);
            }
        }
        true
    }

    /// Reopen a selector whose options failed to load
    pub fn retry(&mut self, level: Level) -> Option<FetchRequest> {
        if !matches!(self.options(level), LevelOptions::Failed(_)) {
            return None;
        }
        let req = self.request(level)?;
        self.options[level.index()] = LevelOptions::Loading;
        Some(req)
    }

    /// Pre-select an existing chain by id. Names are unknown until the
    /// returned fetches complete through [`Self::load_options`].
    pub fn seed(&mut self, kind: ChainKind, ids: [Option<i64>; LEVELS]) -> Vec<FetchRequest> {
        *self = Self {
            kind: Some(kind),
            ..Self::default()
        };

        for (i, id) in ids.iter().enumerate() {
            let Some(id) = id else { break };
            self.selected[i] = Some(HierarchyNode {
                id: *id,
                nombre: String::new(),
                codigo: None,
                unidad_de_medida: None,
            });
        }

        let mut requests = Vec::new();
        for level in Level::ALL {
            let parent_ready = match level.parent() {
                Some(parent) => self.selected(parent).is_some(),
                None => true,
            };
            if !parent_ready {
                break;
            }
            self.options[level.index()] = LevelOptions::Loading;
            if let Some(req) = self.request(level) {
                requests.push(req);
            }
        }
        requests
    }
}
