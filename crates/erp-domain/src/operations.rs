// operations.rs
use crate::finance::LineItem;
use crate::record::{null_as_default, RecordId, RecordMeta};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Proposal {
  #[serde(deserialize_with = "null_as_default")]
  pub id: RecordId,
  #[serde(deserialize_with = "null_as_default")]
  pub number: String,
  pub client_id: Option<RecordId>,
  #[serde(deserialize_with = "null_as_default")]
  pub client_name: String,
  #[serde(deserialize_with = "null_as_default")]
  pub date: String,
  #[serde(deserialize_with = "null_as_default")]
  pub valid_until: String,
  #[serde(deserialize_with = "null_as_default")]
  pub items: Vec<LineItem>,
  #[serde(deserialize_with = "null_as_default")]
  pub total: f64,
  #[serde(deserialize_with = "null_as_default")]
  pub status: String,
  #[serde(flatten)]
  pub meta: RecordMeta,
  #[serde(flatten)]
  pub extra: Map<String, JsonValue>,
}

impl_entity!(Proposal, {
  fn label(&self) -> String {
    format!("proposta {}", self.number)
  }
});

/// Tipo de artículo del catálogo. Determina el prefijo del código
/// (`M` materiales, `S` servicios).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MaterialKind {
  #[default]
  Material,
  Service,
  Other(String),
}

impl MaterialKind {
  pub fn as_str(&self) -> &str {
    match self {
      MaterialKind::Material => "Material",
      MaterialKind::Service => "Serviço",
      MaterialKind::Other(s) => s,
    }
  }

  /// Prefijo de una letra usado en los códigos de catálogo.
  pub fn code_prefix(&self) -> char {
    match self {
      MaterialKind::Material => 'M',
      MaterialKind::Service => 'S',
      MaterialKind::Other(s) => s.chars().find(|c| c.is_alphabetic()).map(|c| c.to_ascii_uppercase()).unwrap_or('X'),
    }
  }
}

impl From<String> for MaterialKind {
  fn from(s: String) -> Self {
    match s.as_str() {
      "Material" => MaterialKind::Material,
      "Serviço" | "Servico" => MaterialKind::Service,
      _ => MaterialKind::Other(s),
    }
  }
}

impl From<&str> for MaterialKind {
  fn from(s: &str) -> Self {
    MaterialKind::from(s.to_string())
  }
}

impl From<MaterialKind> for String {
  fn from(k: MaterialKind) -> Self {
    k.as_str().to_string()
  }
}

/// Artículo del catálogo (material en stock o servicio).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Material {
  #[serde(deserialize_with = "null_as_default")]
  pub id: RecordId,
  #[serde(deserialize_with = "null_as_default")]
  pub code: String,
  #[serde(deserialize_with = "null_as_default")]
  pub name: String,
  #[serde(rename = "type")]
  #[serde(deserialize_with = "null_as_default")]
  pub kind: MaterialKind,
  #[serde(deserialize_with = "null_as_default")]
  pub unit: String,
  #[serde(deserialize_with = "null_as_default")]
  pub price: f64,
  #[serde(deserialize_with = "null_as_default")]
  pub cost: f64,
  #[serde(deserialize_with = "null_as_default")]
  pub stock: f64,
  #[serde(deserialize_with = "null_as_default")]
  pub min_stock: f64,
  #[serde(flatten)]
  pub meta: RecordMeta,
  #[serde(flatten)]
  pub extra: Map<String, JsonValue>,
}

impl_entity!(Material, {
  fn label(&self) -> String {
    format!("{} {}", self.code, self.name)
  }
});

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StockMovement {
  #[serde(deserialize_with = "null_as_default")]
  pub id: RecordId,
  pub material_id: Option<RecordId>,
  #[serde(deserialize_with = "null_as_default")]
  pub date: String,
  /// `entrada` o `saida`.
  #[serde(rename = "type")]
  #[serde(deserialize_with = "null_as_default")]
  pub kind: String,
  #[serde(deserialize_with = "null_as_default")]
  pub quantity: f64,
  #[serde(deserialize_with = "null_as_default")]
  pub reference: String,
  #[serde(flatten)]
  pub meta: RecordMeta,
  #[serde(flatten)]
  pub extra: Map<String, JsonValue>,
}

impl_entity!(StockMovement);

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Appointment {
  #[serde(deserialize_with = "null_as_default")]
  pub id: RecordId,
  #[serde(deserialize_with = "null_as_default")]
  pub title: String,
  pub client_id: Option<RecordId>,
  pub employee_id: Option<RecordId>,
  #[serde(deserialize_with = "null_as_default")]
  pub start: String,
  #[serde(deserialize_with = "null_as_default")]
  pub end: String,
  #[serde(deserialize_with = "null_as_default")]
  pub notes: String,
  #[serde(flatten)]
  pub meta: RecordMeta,
  #[serde(flatten)]
  pub extra: Map<String, JsonValue>,
}

impl_entity!(Appointment);

/// Documento generado (PDF de factura, contrato, relatorio).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Document {
  #[serde(deserialize_with = "null_as_default")]
  pub id: RecordId,
  #[serde(deserialize_with = "null_as_default")]
  pub name: String,
  #[serde(rename = "type")]
  #[serde(deserialize_with = "null_as_default")]
  pub kind: String,
  pub reference_id: Option<RecordId>,
  #[serde(deserialize_with = "null_as_default")]
  pub url: String,
  #[serde(flatten)]
  pub meta: RecordMeta,
  #[serde(flatten)]
  pub extra: Map<String, JsonValue>,
}

impl_entity!(Document);
