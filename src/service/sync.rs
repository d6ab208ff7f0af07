//! Derived-field rules, applied explicitly after each mutation.

use crate::models::{ChainKind, GuiaItem, Level, OrdenItem, OrderTotals, Withholding};

/// One `Label: value` line per populated level, top-down
pub fn derive_observations(kind: ChainKind, names: &[Option<&str>]) -> String {
    let lines: Vec<String> = Level::ALL
        .iter()
        .zip(names)
        .filter_map(|(level, name)| {
            let name = name.map(str::trim).filter(|n| !n.is_empty())?;
            Some(format!("{}: {}", level.label(kind), name))
        })
        .collect();
    lines.join("\n").trim_end().to_string()
}

/// Overwrite the first line item's quantity with the gross weight.
/// Returns `false` when nothing changed.
pub fn derive_first_item_quantity(items: &mut [GuiaItem], peso_bruto_total: f64) -> bool {
    match items.first_mut() {
        Some(first) if first.cantidad != peso_bruto_total => {
            first.cantidad = peso_bruto_total;
            true
        }
        _ => false,
    }
}

pub fn line_subtotal(item: &OrdenItem) -> f64 {
    item.cantidad_solicitada * item.precio_unitario
}

/// Totals from line items and rates. Item subtotals are taken as stored,
/// refresh them with [`line_subtotal`] first.
pub fn compute_totals(items: &[OrdenItem], tasa_igv: f64, retencion: Withholding) -> OrderTotals {
    let subtotal: f64 = items.iter().map(|i| i.subtotal).sum();
    let igv = subtotal * tasa_igv;
    let total = subtotal + igv;
    let retencion = if retencion.aplica {
        total * retencion.tasa
    } else {
        0.0
    };
    OrderTotals {
        subtotal,
        igv,
        total,
        retencion,
        neto_a_pagar: total - retencion,
    }
}

/// Display formatting, 2 decimal places
pub fn format_amount(value: f64) -> String {
    format!("{:.2}", value)
}
