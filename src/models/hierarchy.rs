use serde::{Deserialize, Serialize};

/// Which of the two parallel classification trees a record is tagged with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainKind {
    Proyecto,
    Subproyecto,
}

impl ChainKind {
    pub fn other(self) -> Self {
        match self {
            ChainKind::Proyecto => ChainKind::Subproyecto,
            ChainKind::Subproyecto => ChainKind::Proyecto,
        }
    }
}

/// Selector position inside a chain, top-down
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    #[serde(alias = "proyecto", alias = "subproyecto")]
    Root,
    Etapa,
    Sector,
    Frente,
    Partida,
}

impl Level {
    pub const ALL: [Level; 5] = [
        Level::Root,
        Level::Etapa,
        Level::Sector,
        Level::Frente,
        Level::Partida,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(idx: usize) -> Option<Self> {
        Self::ALL.get(idx).copied()
    }

    pub fn next(self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    pub fn parent(self) -> Option<Self> {
        self.index().checked_sub(1).and_then(Self::from_index)
    }

    pub fn is_leaf(self) -> bool {
        self == Level::Partida
    }

    /// Label used in observations text and user messages
    pub fn label(self, kind: ChainKind) -> &'static str {
        match (kind, self) {
            (ChainKind::Proyecto, Level::Root) => "Proyecto",
            (ChainKind::Proyecto, Level::Etapa) => "Etapa",
            (ChainKind::Proyecto, Level::Sector) => "Sector",
            (ChainKind::Proyecto, Level::Frente) => "Frente",
            (ChainKind::Proyecto, Level::Partida) => "Partida",
            (ChainKind::Subproyecto, Level::Root) => "Subproyecto",
            (ChainKind::Subproyecto, Level::Etapa) => "Subetapa",
            (ChainKind::Subproyecto, Level::Sector) => "Subsector",
            (ChainKind::Subproyecto, Level::Frente) => "Subfrente",
            (ChainKind::Subproyecto, Level::Partida) => "Subpartida",
        }
    }

    /// REST collection backing this level
    pub fn resource_path(self, kind: ChainKind) -> &'static str {
        match (kind, self) {
            (ChainKind::Proyecto, Level::Root) => "proyectos",
            (ChainKind::Proyecto, Level::Etapa) => "etapas",
            (ChainKind::Proyecto, Level::Sector) => "sectores",
            (ChainKind::Proyecto, Level::Frente) => "frentes",
            (ChainKind::Proyecto, Level::Partida) => "partidas",
            (ChainKind::Subproyecto, Level::Root) => "subproyectos",
            (ChainKind::Subproyecto, Level::Etapa) => "subetapas",
            (ChainKind::Subproyecto, Level::Sector) => "subsectores",
            (ChainKind::Subproyecto, Level::Frente) => "subfrentes",
            (ChainKind::Subproyecto, Level::Partida) => "subpartidas",
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Level::Root => "root",
            Level::Etapa => "etapa",
            Level::Sector => "sector",
            Level::Frente => "frente",
            Level::Partida => "partida",
        };
        f.write_str(name)
    }
}

/// One selectable entry at any level of either chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyNode {
    pub id: i64,
    pub nombre: String,
    /// Product code, only meaningful on leaf nodes
    #[serde(default)]
    pub codigo: Option<String>,
    #[serde(default)]
    pub unidad_de_medida: Option<String>,
}

/// Foreign keys of both chains as stored on a waybill.
/// At most one chain is populated at a time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HierarchyKeys {
    #[serde(default)]
    pub id_proyecto: Option<i64>,
    #[serde(default)]
    pub id_etapa: Option<i64>,
    #[serde(default)]
    pub id_sector: Option<i64>,
    #[serde(default)]
    pub id_frente: Option<i64>,
    #[serde(default)]
    pub id_partida: Option<i64>,
    #[serde(default)]
    pub id_subproyecto: Option<i64>,
    #[serde(default)]
    pub id_subetapa: Option<i64>,
    #[serde(default)]
    pub id_subsector: Option<i64>,
    #[serde(default)]
    pub id_subfrente: Option<i64>,
    #[serde(default)]
    pub id_subpartida: Option<i64>,
}

impl HierarchyKeys {
    pub fn chain(&self, kind: ChainKind) -> [Option<i64>; 5] {
        match kind {
            ChainKind::Proyecto => [
                self.id_proyecto,
                self.id_etapa,
                self.id_sector,
                self.id_frente,
                self.id_partida,
            ],
            ChainKind::Subproyecto => [
                self.id_subproyecto,
                self.id_subetapa,
                self.id_subsector,
                self.id_subfrente,
                self.id_subpartida,
            ],
        }
    }

    /// Keys with only `kind` populated from `ids`; the other chain is emptied
    pub fn from_chain(kind: ChainKind, ids: [Option<i64>; 5]) -> Self {
        let [a, b, c, d, e] = ids;
        match kind {
            ChainKind::Proyecto => Self {
                id_proyecto: a,
                id_etapa: b,
                id_sector: c,
                id_frente: d,
                id_partida: e,
                ..Self::default()
            },
            ChainKind::Subproyecto => Self {
                id_subproyecto: a,
                id_subetapa: b,
                id_subsector: c,
                id_subfrente: d,
                id_subpartida: e,
                ..Self::default()
            },
        }
    }

    pub fn get(&self, kind: ChainKind, level: Level) -> Option<i64> {
        self.chain(kind)[level.index()]
    }

    fn has_any(&self, kind: ChainKind) -> bool {
        self.chain(kind).iter().any(Option::is_some)
    }

    /// The populated chain, preferring the project chain if the record is malformed
    pub fn active_kind(&self) -> Option<ChainKind> {
        if self.has_any(ChainKind::Proyecto) {
            Some(ChainKind::Proyecto)
        } else if self.has_any(ChainKind::Subproyecto) {
            Some(ChainKind::Subproyecto)
        } else {
            None
        }
    }

    pub fn is_exclusive(&self) -> bool {
        !(self.has_any(ChainKind::Proyecto) && self.has_any(ChainKind::Subproyecto))
    }
}
