// record.rs
use crate::DomainError;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Identificador de un registro: los documentos heredados mezclan ids
/// numéricos (`Date.now()`, contadores) y de texto (`"M000001"`, uuids).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
  Number(i64),
  Text(String),
}

impl RecordId {
  pub fn as_number(&self) -> Option<i64> {
    match self {
      RecordId::Number(n) => Some(*n),
      RecordId::Text(s) => s.parse().ok(),
    }
  }
}

impl Default for RecordId {
  fn default() -> Self {
    RecordId::Text(String::new())
  }
}

impl fmt::Display for RecordId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RecordId::Number(n) => write!(f, "{}", n),
      RecordId::Text(s) => write!(f, "{}", s),
    }
  }
}

impl From<i64> for RecordId {
  fn from(n: i64) -> Self {
    RecordId::Number(n)
  }
}

impl From<&str> for RecordId {
  fn from(s: &str) -> Self {
    RecordId::Text(s.to_string())
  }
}

impl From<String> for RecordId {
  fn from(s: String) -> Self {
    RecordId::Text(s)
  }
}

fn is_false(b: &bool) -> bool {
  !*b
}

/// Lee un campo admitiendo `null` como su valor vacío. Los documentos
/// escritos por clientes web guardan `null` en campos que nunca se rellenaron.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
  where D: Deserializer<'de>,
        T: Default + Deserialize<'de>
{
  Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Campos de contabilidad comunes a todos los registros.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordMeta {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub created_at: Option<DateTime<Utc>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub updated_at: Option<DateTime<Utc>>,
  /// Borrado lógico.
  #[serde(rename = "_deleted", default, skip_serializing_if = "is_false", deserialize_with = "null_as_default")]
  pub deleted: bool,
}

/// Registro tipado de una colección.
///
/// Los métodos `is_locked` / `locked_content_differs` permiten a una
/// entidad declarar contenido inmutable (facturas emitidas); por defecto
/// ningún registro está bloqueado.
pub trait Entity: Clone + PartialEq + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
  fn id(&self) -> &RecordId;
  fn meta(&self) -> &RecordMeta;
  fn meta_mut(&mut self) -> &mut RecordMeta;

  fn is_deleted(&self) -> bool {
    self.meta().deleted
  }

  /// Nombre legible para avisos al usuario.
  fn label(&self) -> String {
    self.id().to_string()
  }

  fn is_locked(&self) -> bool {
    false
  }

  fn locked_content_differs(&self, _other: &Self) -> bool {
    false
  }

  /// Igualdad profunda ignorando los sellos `createdAt`/`updatedAt`.
  fn same_content(&self, other: &Self) -> bool {
    let (a, b) = (self.meta(), other.meta());
    if a.updated_at == b.updated_at && a.created_at == b.created_at {
      return self == other;
    }
    let mut candidate = other.clone();
    let meta = candidate.meta_mut();
    meta.updated_at = a.updated_at;
    meta.created_at = a.created_at;
    *self == candidate
  }
}

macro_rules! impl_entity {
  ($ty:ty) => {
    impl_entity!($ty, {});
  };
  ($ty:ty, { $($body:tt)* }) => {
    impl $crate::record::Entity for $ty {
      fn id(&self) -> &$crate::record::RecordId {
        &self.id
      }
      fn meta(&self) -> &$crate::record::RecordMeta {
        &self.meta
      }
      fn meta_mut(&mut self) -> &mut $crate::record::RecordMeta {
        &mut self.meta
      }
      $($body)*
    }
  };
}

/// Verifica que los identificadores de una colección sean únicos.
pub fn ensure_unique_ids<T: Entity>(collection: &str, records: &[T]) -> Result<(), DomainError> {
  let mut seen = HashSet::with_capacity(records.len());
  for r in records {
    if !seen.insert(r.id()) {
      return Err(DomainError::ValidationError(format!("id duplicado {} en {}", r.id(), collection)));
    }
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::Client;
  use serde_json::json;

  #[test]
  fn record_id_accepts_numbers_and_strings() {
    let n: RecordId = serde_json::from_value(json!(1700000000000i64)).unwrap();
    let s: RecordId = serde_json::from_value(json!("M000001")).unwrap();
    assert_eq!(n, RecordId::Number(1700000000000));
    assert_eq!(s, RecordId::Text("M000001".into()));
    assert_eq!(RecordId::Text("42".into()).as_number(), Some(42));
    assert_eq!(serde_json::to_value(&n).unwrap(), json!(1700000000000i64));
  }

  #[test]
  fn same_content_ignores_timestamps_only() {
    let a: Client = serde_json::from_value(json!({"id": 1, "name": "Ana", "updatedAt": "2024-01-01T00:00:00Z"})).unwrap();
    let b: Client = serde_json::from_value(json!({"id": 1, "name": "Ana", "updatedAt": "2025-01-01T00:00:00Z"})).unwrap();
    let c: Client = serde_json::from_value(json!({"id": 1, "name": "Ana Maria"})).unwrap();
    let fresh: Client = serde_json::from_value(json!({"id": 1, "name": "Ana"})).unwrap();
    assert!(a.same_content(&b));
    assert!(fresh.same_content(&a));
    assert!(!a.same_content(&c));
  }

  #[test]
  fn duplicate_ids_are_rejected() {
    let a: Client = serde_json::from_value(json!({"id": 1, "name": "A"})).unwrap();
    let b: Client = serde_json::from_value(json!({"id": 1, "name": "B"})).unwrap();
    assert!(ensure_unique_ids("clients", &[a.clone()]).is_ok());
    assert!(matches!(ensure_unique_ids("clients", &[a, b]), Err(DomainError::ValidationError(_))));
  }

  #[test]
  fn deleted_flag_round_trips_with_underscore_name() {
    let c: Client = serde_json::from_value(json!({"id": "c1", "name": "X", "_deleted": true})).unwrap();
    assert!(c.is_deleted());
    let v = serde_json::to_value(&c).unwrap();
    assert_eq!(v["_deleted"], json!(true));
  }
}
