//! Generadores de códigos y numeración.
//!
//! Todos los valores se derivan del contenido actual de la colección en cada
//! llamada; no existe un contador persistido. Dos sesiones que crean un
//! registro al mismo tiempo pueden obtener el mismo código.
use crate::finance::Invoice;
use crate::operations::{Material, MaterialKind, Proposal};
use crate::record::Entity;

/// Mayor sufijo numérico entre los valores que empiezan por `prefix`.
fn max_suffix<'a>(values: impl Iterator<Item = &'a str>, prefix: &str) -> u64 {
  values.filter_map(|v| v.strip_prefix(prefix))
        .filter_map(|rest| rest.trim().parse::<u64>().ok())
        .max()
        .unwrap_or(0)
}

/// Próximo código de catálogo: prefijo del tipo + 6 dígitos (`M000001`).
pub fn next_material_code(materials: &[Material], kind: &MaterialKind) -> String {
  let prefix = kind.code_prefix().to_string();
  let last = max_suffix(materials.iter().map(|m| m.code.as_str()), &prefix);
  format!("{}{:06}", prefix, last.saturating_add(1))
}

/// Próximo número de factura en la serie y año dados (`FT 2026/0001`).
pub fn next_invoice_number(invoices: &[Invoice], series: &str, year: i32) -> String {
  let prefix = format!("{} {}/", series, year);
  let last = max_suffix(invoices.iter().map(|i| i.number.as_str()), &prefix);
  format!("{}{:04}", prefix, last.saturating_add(1))
}

/// Próximo número de propuesta del año (`PROP-2026-001`).
pub fn next_proposal_number(proposals: &[Proposal], year: i32) -> String {
  let prefix = format!("PROP-{}-", year);
  let last = max_suffix(proposals.iter().map(|p| p.number.as_str()), &prefix);
  format!("{}{:03}", prefix, last.saturating_add(1))
}

/// Próximo id numérico (máximo + 1) para colecciones con ids enteros.
pub fn next_numeric_id<T: Entity>(records: &[T]) -> i64 {
  records.iter().filter_map(|r| r.id().as_number()).max().unwrap_or(0).saturating_add(1)
}
