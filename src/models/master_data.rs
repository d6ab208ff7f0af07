use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::field_report::ParteDiario;
use super::order::Orden;

/// Entity served by a uniform `getAll / create / update / delete` collection
pub trait CrudResource: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Collection path relative to the backend base URL
    const PATH: &'static str;

    fn id(&self) -> Option<i64>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proveedor {
    #[serde(default)]
    pub id: Option<i64>,
    pub razon_social: String,
    pub ruc: String,
    #[serde(default)]
    pub direccion: Option<String>,
    #[serde(default)]
    pub telefono: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemCatalogo {
    #[serde(default)]
    pub id: Option<i64>,
    pub codigo: String,
    pub descripcion: String,
    #[serde(default)]
    pub unidad_de_medida: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CentroCosto {
    #[serde(default)]
    pub id: Option<i64>,
    pub codigo: String,
    pub nombre: String,
    /// 1, 2 or 3
    pub nivel: u8,
    #[serde(default)]
    pub padre_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehiculo {
    #[serde(default)]
    pub id: Option<i64>,
    pub placa: String,
    #[serde(default)]
    pub marca: Option<String>,
    #[serde(default)]
    pub conductor: Option<String>,
}

/// Any level of either hierarchy chain, as stored by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyEntity<const K: u8> {
    #[serde(default)]
    pub id: Option<i64>,
    pub nombre: String,
    #[serde(default)]
    pub codigo: Option<String>,
    #[serde(default)]
    pub parent_id: Option<i64>,
}

macro_rules! crud_resource {
    ($ty:ty, $path:literal) => {
        impl CrudResource for $ty {
            const PATH: &'static str = $path;

            fn id(&self) -> Option<i64> {
                self.id
            }
        }
    };
}

crud_resource!(Proveedor, "proveedores");
crud_resource!(ItemCatalogo, "items");
crud_resource!(CentroCosto, "centros-costo");
crud_resource!(Vehiculo, "vehiculos");
crud_resource!(Orden, "ordenes");
crud_resource!(ParteDiario, "partes-diarios");

pub type Proyecto = HierarchyEntity<0>;
pub type Etapa = HierarchyEntity<1>;
pub type Sector = HierarchyEntity<2>;
pub type Frente = HierarchyEntity<3>;
pub type Partida = HierarchyEntity<4>;
pub type Subproyecto = HierarchyEntity<5>;
pub type Subetapa = HierarchyEntity<6>;
pub type Subsector = HierarchyEntity<7>;
pub type Subfrente = HierarchyEntity<8>;
pub type Subpartida = HierarchyEntity<9>;

crud_resource!(Proyecto, "proyectos");
crud_resource!(Etapa, "etapas");
crud_resource!(Sector, "sectores");
crud_resource!(Frente, "frentes");
crud_resource!(Partida, "partidas");
crud_resource!(Subproyecto, "subproyectos");
crud_resource!(Subetapa, "subetapas");
crud_resource!(Subsector, "subsectores");
crud_resource!(Subfrente, "subfrentes");
crud_resource!(Subpartida, "subpartidas");
