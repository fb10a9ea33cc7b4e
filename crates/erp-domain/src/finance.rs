// finance.rs
use crate::record::{null_as_default, RecordId, RecordMeta};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;

/// Movimiento de caja (receita o despesa).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Transaction {
  #[serde(deserialize_with = "null_as_default")]
  pub id: RecordId,
  #[serde(deserialize_with = "null_as_default")]
  pub date: String,
  #[serde(deserialize_with = "null_as_default")]
  pub description: String,
  pub category_id: Option<RecordId>,
  #[serde(deserialize_with = "null_as_default")]
  pub income: f64,
  #[serde(deserialize_with = "null_as_default")]
  pub expense: f64,
  #[serde(flatten)]
  pub meta: RecordMeta,
  #[serde(flatten)]
  pub extra: Map<String, JsonValue>,
}

impl_entity!(Transaction);

/// Línea de extracto bancario importada para conciliación.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BankTransaction {
  #[serde(deserialize_with = "null_as_default")]
  pub id: RecordId,
  #[serde(deserialize_with = "null_as_default")]
  pub date: String,
  #[serde(deserialize_with = "null_as_default")]
  pub description: String,
  #[serde(deserialize_with = "null_as_default")]
  pub amount: f64,
  #[serde(deserialize_with = "null_as_default")]
  pub reconciled: bool,
  pub transaction_id: Option<RecordId>,
  #[serde(flatten)]
  pub meta: RecordMeta,
  #[serde(flatten)]
  pub extra: Map<String, JsonValue>,
}

impl_entity!(BankTransaction);

/// Línea de factura o de propuesta.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LineItem {
  #[serde(deserialize_with = "null_as_default")]
  pub description: String,
  #[serde(deserialize_with = "null_as_default")]
  pub quantity: f64,
  #[serde(deserialize_with = "null_as_default")]
  pub unit_price: f64,
  #[serde(deserialize_with = "null_as_default")]
  pub tax_rate: f64,
  #[serde(deserialize_with = "null_as_default")]
  pub total: f64,
  #[serde(flatten)]
  pub extra: Map<String, JsonValue>,
}

/// Estado de una factura. Se serializa con los nombres del documento
/// (`Rascunho`, `Emitida`, `Paga`, `Anulada`); cualquier otro valor se
/// conserva tal cual.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InvoiceStatus {
  #[default]
  Draft,
  Issued,
  Paid,
  Cancelled,
  Other(String),
}

impl InvoiceStatus {
  /// Estados cuyo contenido financiero ya no puede cambiar.
  pub fn is_protected(&self) -> bool {
    matches!(self, InvoiceStatus::Issued | InvoiceStatus::Paid | InvoiceStatus::Cancelled)
  }

  pub fn as_str(&self) -> &str {
    match self {
      InvoiceStatus::Draft => "Rascunho",
      InvoiceStatus::Issued => "Emitida",
      InvoiceStatus::Paid => "Paga",
      InvoiceStatus::Cancelled => "Anulada",
      InvoiceStatus::Other(s) => s,
    }
  }
}

impl From<String> for InvoiceStatus {
  fn from(s: String) -> Self {
    match s.as_str() {
      "Rascunho" => InvoiceStatus::Draft,
      "Emitida" => InvoiceStatus::Issued,
      "Paga" => InvoiceStatus::Paid,
      "Anulada" => InvoiceStatus::Cancelled,
      _ => InvoiceStatus::Other(s),
    }
  }
}

impl From<InvoiceStatus> for String {
  fn from(s: InvoiceStatus) -> Self {
    s.as_str().to_string()
  }
}

impl fmt::Display for InvoiceStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Invoice {
  #[serde(deserialize_with = "null_as_default")]
  pub id: RecordId,
  #[serde(deserialize_with = "null_as_default")]
  pub number: String,
  pub client_id: Option<RecordId>,
  #[serde(deserialize_with = "null_as_default")]
  pub client_name: String,
  #[serde(deserialize_with = "null_as_default")]
  pub client_nif: String,
  #[serde(deserialize_with = "null_as_default")]
  pub date: String,
  #[serde(deserialize_with = "null_as_default")]
  pub due_date: String,
  #[serde(deserialize_with = "null_as_default")]
  pub items: Vec<LineItem>,
  #[serde(deserialize_with = "null_as_default")]
  pub subtotal: f64,
  #[serde(deserialize_with = "null_as_default")]
  pub tax: f64,
  #[serde(deserialize_with = "null_as_default")]
  pub total: f64,
  #[serde(deserialize_with = "null_as_default")]
  pub status: InvoiceStatus,
  #[serde(deserialize_with = "null_as_default")]
  pub notes: String,
  #[serde(flatten)]
  pub meta: RecordMeta,
  #[serde(flatten)]
  pub extra: Map<String, JsonValue>,
}

impl_entity!(Invoice, {
  fn label(&self) -> String {
    if self.number.is_empty() {
      format!("fatura {}", self.id)
    } else {
      format!("fatura {}", self.number)
    }
  }

  fn is_locked(&self) -> bool {
    self.status.is_protected()
  }

  /// Una factura protegida tampoco puede volver a un estado editable.
  fn locked_content_differs(&self, other: &Self) -> bool {
    !other.status.is_protected()
      || self.items != other.items
      || self.total != other.total
      || self.client_nif != other.client_nif
  }
});

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Purchase {
  #[serde(deserialize_with = "null_as_default")]
  pub id: RecordId,
  #[serde(deserialize_with = "null_as_default")]
  pub date: String,
  #[serde(deserialize_with = "null_as_default")]
  pub supplier: String,
  #[serde(deserialize_with = "null_as_default")]
  pub description: String,
  pub category_id: Option<RecordId>,
  #[serde(deserialize_with = "null_as_default")]
  pub total: f64,
  #[serde(deserialize_with = "null_as_default")]
  pub paid: bool,
  #[serde(flatten)]
  pub meta: RecordMeta,
  #[serde(flatten)]
  pub extra: Map<String, JsonValue>,
}

impl_entity!(Purchase);

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecurringPurchase {
  #[serde(deserialize_with = "null_as_default")]
  pub id: RecordId,
  #[serde(deserialize_with = "null_as_default")]
  pub supplier: String,
  #[serde(deserialize_with = "null_as_default")]
  pub description: String,
  #[serde(deserialize_with = "null_as_default")]
  pub amount: f64,
  #[serde(deserialize_with = "null_as_default")]
  pub frequency: String,
  #[serde(deserialize_with = "null_as_default")]
  pub next_date: String,
  #[serde(deserialize_with = "null_as_default")]
  pub active: bool,
  #[serde(flatten)]
  pub meta: RecordMeta,
  #[serde(flatten)]
  pub extra: Map<String, JsonValue>,
}

impl_entity!(RecurringPurchase);

/// Contrato de servicio facturado periódicamente.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecurringContract {
  #[serde(deserialize_with = "null_as_default")]
  pub id: RecordId,
  pub client_id: Option<RecordId>,
  #[serde(deserialize_with = "null_as_default")]
  pub description: String,
  #[serde(deserialize_with = "null_as_default")]
  pub amount: f64,
  #[serde(deserialize_with = "null_as_default")]
  pub frequency: String,
  #[serde(deserialize_with = "null_as_default")]
  pub next_date: String,
  #[serde(deserialize_with = "null_as_default")]
  pub active: bool,
  #[serde(flatten)]
  pub meta: RecordMeta,
  #[serde(flatten)]
  pub extra: Map<String, JsonValue>,
}

impl_entity!(RecurringContract);
