use crate::error::ValidationError;
use crate::models::{DuplicateBatch, Level, Orden};

pub const MIN_DUPLICATES: u32 = 1;
pub const MAX_DUPLICATES: u32 = 50;

/// Duplicate count must lie in [1, 50]
pub fn validate_count(count: i64) -> Result<u32, ValidationError> {
    if count < MIN_DUPLICATES as i64 || count > MAX_DUPLICATES as i64 {
        return Err(ValidationError::CountOutOfRange {
            got: count,
            min: MIN_DUPLICATES,
            max: MAX_DUPLICATES,
        });
    }
    Ok(count as u32)
}

/// Pre-submit gate. Only the first duplicate is inspected since shared
/// fields are broadcast to every duplicate of the batch.
pub fn validate_batch(batch: &DuplicateBatch) -> Result<(), ValidationError> {
    let Some(first) = batch.first() else {
        return Err(ValidationError::NoItems);
    };
    let guia = &first.guia;

    let kind = batch.chain_kind().ok_or(ValidationError::MissingChain)?;
    if guia.jerarquia.get(kind, Level::Partida).is_none() {
        return Err(ValidationError::MissingLeaf {
            label: Level::Partida.label(kind),
        });
    }
    if let Some(level) = batch.selector.unresolved() {
        return Err(ValidationError::UnresolvedLevel {
            label: level.label(kind),
        });
    }

    let items = guia
        .parsed_items()
        .map_err(|e| ValidationError::UnreadableItems(e.to_string()))?;
    let first_item = items.first().ok_or(ValidationError::NoItems)?;
    if first_item.codigo.trim().is_empty() {
        return Err(ValidationError::BlankProductCode);
    }

    match guia.peso_bruto_total {
        Some(peso) if peso > 0.0 && peso.is_finite() => Ok(()),
        _ => Err(ValidationError::NonPositiveWeight),
    }
}

pub fn validate_order(orden: &Orden) -> Result<(), ValidationError> {
    if orden.proveedor_id.is_none() {
        return Err(ValidationError::MissingSupplier);
    }
    if orden.items.is_empty() {
        return Err(ValidationError::EmptyOrder);
    }
    if !(0.0..=1.0).contains(&orden.tasa_igv) {
        return Err(ValidationError::InvalidRate(orden.tasa_igv));
    }
    if orden.retencion.aplica && !(0.0..=1.0).contains(&orden.retencion.tasa) {
        return Err(ValidationError::InvalidRate(orden.retencion.tasa));
    }
    for (idx, item) in orden.items.iter().enumerate() {
        if item.cantidad_solicitada <= 0.0 || item.precio_unitario <= 0.0 {
            return Err(ValidationError::InvalidOrderLine { line: idx + 1 });
        }
    }
    Ok(())
}
