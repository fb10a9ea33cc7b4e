// Archivo: migration.rs
// Propósito: reparto del documento monolítico heredado en los cuatro
// documentos de partición.
use crate::documents::PartitionDocument;
use crate::errors::SyncError;
use crate::partition::{Collection, Partition};
use indexmap::IndexMap;
use log::debug;
use serde_json::{Map, Value as JsonValue};

/// Campo de marca temporal presente en todos los documentos.
const LAST_SYNC: &str = "lastSync";

/// Reparte los campos de primer nivel del documento heredado por partición.
///
/// `lastSync` se copia en las cuatro; los campos que no son una colección
/// conocida van a Config para no perderlos.
pub fn split_legacy(legacy: JsonValue) -> Result<IndexMap<Partition, PartitionDocument>, SyncError> {
  let JsonValue::Object(fields) = legacy else {
    return Err(SyncError::Migration("el documento heredado no es un objeto JSON".into()));
  };

  let mut buckets: IndexMap<Partition, Map<String, JsonValue>> =
    Partition::ALL.into_iter().map(|p| (p, Map::new())).collect();

  for (key, value) in fields {
    if key == LAST_SYNC {
      for bucket in buckets.values_mut() {
        bucket.insert(key.clone(), value.clone());
      }
      continue;
    }
    let partition = match Collection::from_field_name(&key) {
      Some(c) => c.partition(),
      None => {
        debug!("campo heredado sin colección '{}': se conserva en config", key);
        Partition::Config
      }
    };
    if let Some(bucket) = buckets.get_mut(&partition) {
      bucket.insert(key, value);
    }
  }

  let mut out = IndexMap::with_capacity(buckets.len());
  for (partition, map) in buckets {
    let doc = PartitionDocument::from_json(partition, JsonValue::Object(map))
      .map_err(|e| SyncError::Migration(format!("partición {}: {}", partition, e)))?;
    out.insert(partition, doc);
  }
  Ok(out)
}

/// Nombre con el que se pone en cuarentena el archivo heredado.
pub fn migrated_name(legacy_name: &str, date: &str) -> String {
  format!("{}.migrated-{}.bak", legacy_name, date)
}
