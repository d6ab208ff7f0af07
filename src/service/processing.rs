use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::models::Guia;

/// Business identifiers submitted and still waiting for the tax authority
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessingSet {
    ids: IndexSet<String>,
}

impl ProcessingSet {
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        self.ids.insert(id.into())
    }

    pub fn remove(&mut self, id: &str) -> bool {
        self.ids.shift_remove(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }
}

/// Business identifier → row position in the waybill list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordIndex {
    rows: IndexMap<String, usize>,
}

impl RecordIndex {
    pub fn build(records: &[Guia]) -> Self {
        let rows = records
            .iter()
            .enumerate()
            .filter_map(|(pos, g)| {
                let id = g.identificador_unico.as_deref()?.trim();
                (!id.is_empty()).then(|| (id.to_string(), pos))
            })
            .collect();
        Self { rows }
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.rows.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
