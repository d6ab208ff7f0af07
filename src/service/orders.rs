use crate::client::ResourceClient;
use crate::error::{AppResult, WorkflowError};
use crate::models::{Orden, OrdenItem, OrderTotals};
use crate::service::sync::{compute_totals, line_subtotal};
use crate::service::validation::validate_order;

/// Editable purchase/service order; totals are recomputed after every mutation
#[derive(Debug, Clone)]
pub struct OrderEditor {
    orden: Orden,
}

impl OrderEditor {
    pub fn new(orden: Orden) -> Self {
        let mut editor = Self { orden };
        editor.recompute();
        editor
    }

    pub fn orden(&self) -> &Orden {
        &self.orden
    }

    pub fn into_orden(self) -> Orden {
        self.orden
    }

    pub fn totals(&self) -> OrderTotals {
        self.orden.totales
    }

    fn recompute(&mut self) {
        for item in &mut self.orden.items {
            item.subtotal = line_subtotal(item);
        }
        self.orden.totales = compute_totals(
            &self.orden.items,
            self.orden.tasa_igv,
            self.orden.retencion,
        );
    }

    fn item_mut(&mut self, line: usize) -> Result<&mut OrdenItem, WorkflowError> {
        self.orden
            .items
            .get_mut(line)
            .ok_or(WorkflowError::LineIndex(line))
    }

    pub fn add_item(&mut self, item: OrdenItem) {
        self.orden.items.push(item);
        self.recompute();
    }

    pub fn remove_item(&mut self, line: usize) -> Result<OrdenItem, WorkflowError> {
        self.item_mut(line)?;
        let removed = self.orden.items.remove(line);
        self.recompute();
        Ok(removed)
    }

    pub fn set_quantity(&mut self, line: usize, cantidad: f64) -> Result<(), WorkflowError> {
        self.item_mut(line)?.cantidad_solicitada = cantidad;
        self.recompute();
        Ok(())
    }

    pub fn set_unit_price(&mut self, line: usize, precio: f64) -> Result<(), WorkflowError> {
        self.item_mut(line)?.precio_unitario = precio;
        self.recompute();
        Ok(())
    }

    pub fn set_tax_rate(&mut self, tasa: f64) {
        self.orden.tasa_igv = tasa;
        self.recompute();
    }

    pub fn set_withholding(&mut self, aplica: bool, tasa: Option<f64>) {
        self.orden.retencion.aplica = aplica;
        if let Some(tasa) = tasa {
            self.orden.retencion.tasa = tasa;
        }
        self.recompute();
    }
}

/// Validate then persist orders through the backend
pub struct OrderService {
    client: ResourceClient<Orden>,
}

impl OrderService {
    pub fn new(client: ResourceClient<Orden>) -> Self {
        Self { client }
    }

    pub async fn save(&self, editor: &OrderEditor) -> AppResult<Orden> {
        let orden = editor.orden();
        validate_order(orden)?;
        let saved = match orden.id {
            Some(id) => self.client.update(id, orden).await?,
            None => self.client.create(orden).await?,
        };
        tracing::info!("Order {:?} saved, total {:.2}", saved.id, saved.totales.total);
        Ok(saved)
    }
}
