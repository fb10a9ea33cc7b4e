// config.rs
use crate::record::{null_as_default, RecordId, RecordMeta};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Configuración del sistema: un único objeto (no una lista).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
  pub company_name: String,
  pub nif: String,
  pub address: String,
  pub phone: String,
  pub email: String,
  pub currency: String,
  /// Tasa de IVA por defecto, en porcentaje.
  pub vat_rate: f64,
  pub invoice_series: String,
  pub language: String,
  pub payment_terms_days: u32,
  #[serde(flatten)]
  pub meta: RecordMeta,
  #[serde(flatten)]
  pub extra: Map<String, JsonValue>,
}

impl Default for Settings {
  fn default() -> Self {
    Self { company_name: String::new(),
           nif: String::new(),
           address: String::new(),
           phone: String::new(),
           email: String::new(),
           currency: "CVE".to_string(),
           vat_rate: 15.0,
           invoice_series: "FT".to_string(),
           language: "pt".to_string(),
           payment_terms_days: 30,
           meta: RecordMeta::default(),
           extra: Map::new() }
  }
}

impl Settings {
  /// Igualdad profunda ignorando los sellos de tiempo.
  pub fn same_content(&self, other: &Settings) -> bool {
    let mut candidate = other.clone();
    candidate.meta.updated_at = self.meta.updated_at;
    candidate.meta.created_at = self.meta.created_at;
    *self == candidate
  }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
  #[serde(deserialize_with = "null_as_default")]
  pub id: RecordId,
  #[serde(deserialize_with = "null_as_default")]
  pub email: String,
  #[serde(deserialize_with = "null_as_default")]
  pub name: String,
  #[serde(deserialize_with = "null_as_default")]
  pub role: String,
  #[serde(deserialize_with = "null_as_default")]
  pub active: bool,
  #[serde(flatten)]
  pub meta: RecordMeta,
  #[serde(flatten)]
  pub extra: Map<String, JsonValue>,
}

impl_entity!(User, {
  fn label(&self) -> String {
    self.email.clone()
  }
});

/// Naturaleza de una cuenta del plan de cuentas (`Receita` / `Despesa`);
/// cualquier otro valor se conserva tal cual.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CategoryKind {
  #[default]
  Income,
  Expense,
  Other(String),
}

impl CategoryKind {
  pub fn as_str(&self) -> &str {
    match self {
      CategoryKind::Income => "Receita",
      CategoryKind::Expense => "Despesa",
      CategoryKind::Other(s) => s,
    }
  }
}

impl From<String> for CategoryKind {
  fn from(s: String) -> Self {
    match s.as_str() {
      "Receita" => CategoryKind::Income,
      "Despesa" => CategoryKind::Expense,
      _ => CategoryKind::Other(s),
    }
  }
}

impl From<CategoryKind> for String {
  fn from(k: CategoryKind) -> Self {
    k.as_str().to_string()
  }
}

/// Cuenta del plan de cuentas (categoría de movimientos).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Category {
  #[serde(deserialize_with = "null_as_default")]
  pub id: RecordId,
  #[serde(deserialize_with = "null_as_default")]
  pub code: String,
  #[serde(deserialize_with = "null_as_default")]
  pub name: String,
  #[serde(rename = "type")]
  #[serde(deserialize_with = "null_as_default")]
  pub kind: CategoryKind,
  #[serde(flatten)]
  pub meta: RecordMeta,
  #[serde(flatten)]
  pub extra: Map<String, JsonValue>,
}

impl_entity!(Category, {
  fn label(&self) -> String {
    format!("{} {}", self.code, self.name)
  }
});

/// Plantilla de documento (propuestas, contratos, correos).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Template {
  #[serde(deserialize_with = "null_as_default")]
  pub id: RecordId,
  #[serde(deserialize_with = "null_as_default")]
  pub name: String,
  #[serde(rename = "type")]
  #[serde(deserialize_with = "null_as_default")]
  pub kind: String,
  #[serde(deserialize_with = "null_as_default")]
  pub content: String,
  #[serde(flatten)]
  pub meta: RecordMeta,
  #[serde(flatten)]
  pub extra: Map<String, JsonValue>,
}

impl_entity!(Template);

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DevNote {
  #[serde(deserialize_with = "null_as_default")]
  pub id: RecordId,
  #[serde(deserialize_with = "null_as_default")]
  pub title: String,
  #[serde(deserialize_with = "null_as_default")]
  pub body: String,
  #[serde(deserialize_with = "null_as_default")]
  pub done: bool,
  #[serde(flatten)]
  pub meta: RecordMeta,
  #[serde(flatten)]
  pub extra: Map<String, JsonValue>,
}

impl_entity!(DevNote);
