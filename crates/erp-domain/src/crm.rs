// crm.rs
use crate::record::{null_as_default, RecordId, RecordMeta};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Client {
  #[serde(deserialize_with = "null_as_default")]
  pub id: RecordId,
  #[serde(deserialize_with = "null_as_default")]
  pub name: String,
  #[serde(deserialize_with = "null_as_default")]
  pub nif: String,
  #[serde(deserialize_with = "null_as_default")]
  pub email: String,
  #[serde(deserialize_with = "null_as_default")]
  pub phone: String,
  #[serde(deserialize_with = "null_as_default")]
  pub address: String,
  #[serde(flatten)]
  pub meta: RecordMeta,
  #[serde(flatten)]
  pub extra: Map<String, JsonValue>,
}

impl_entity!(Client, {
  fn label(&self) -> String {
    self.name.clone()
  }
});

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Employee {
  #[serde(deserialize_with = "null_as_default")]
  pub id: RecordId,
  #[serde(deserialize_with = "null_as_default")]
  pub name: String,
  #[serde(deserialize_with = "null_as_default")]
  pub nif: String,
  #[serde(deserialize_with = "null_as_default")]
  pub position: String,
  #[serde(deserialize_with = "null_as_default")]
  pub salary: f64,
  #[serde(deserialize_with = "null_as_default")]
  pub active: bool,
  #[serde(flatten)]
  pub meta: RecordMeta,
  #[serde(flatten)]
  pub extra: Map<String, JsonValue>,
}

impl_entity!(Employee, {
  fn label(&self) -> String {
    self.name.clone()
  }
});
