// Archivo: documents.rs
// Propósito: forma tipada de los cuatro documentos remotos y del agregado
// en memoria que los reúne.
//
// Cada documento conserva en `extra` los campos que no reconoce, de modo
// que reescribir un documento producido por otro cliente no pierde nada.
use crate::partition::Partition;
use chrono::{DateTime, Utc};
use erp_domain::defaults::{default_categories, default_settings};
use erp_domain::{null_as_default, Appointment, BankTransaction, Category, Client, DevNote, Document, Employee,
                 Invoice, Material, Proposal, Purchase, RecurringContract, RecurringPurchase, Settings,
                 StockMovement, Template, Transaction, User};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value as JsonValue};

/// La configuración es un objeto único: un campo `null` toma el valor por
/// defecto de `Settings` (moneda, IVA, serie) y no el vacío del tipo.
fn settings_without_nulls<'de, D>(deserializer: D) -> Result<Settings, D::Error>
  where D: Deserializer<'de>
{
  let mut map = Option::<Map<String, JsonValue>>::deserialize(deserializer)?.unwrap_or_default();
  map.retain(|_, v| !v.is_null());
  serde_json::from_value(JsonValue::Object(map)).map_err(D::Error::custom)
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigDocument {
  #[serde(deserialize_with = "settings_without_nulls")]
  pub settings: Settings,
  #[serde(deserialize_with = "null_as_default")]
  pub users: Vec<User>,
  #[serde(deserialize_with = "null_as_default")]
  pub categories: Vec<Category>,
  #[serde(deserialize_with = "null_as_default")]
  pub templates: Vec<Template>,
  #[serde(deserialize_with = "null_as_default")]
  pub dev_notes: Vec<DevNote>,
  /// Época en milisegundos de la última escritura.
  #[serde(deserialize_with = "null_as_default")]
  pub last_sync: i64,
  #[serde(flatten)]
  pub extra: Map<String, JsonValue>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CrmDocument {
  #[serde(deserialize_with = "null_as_default")]
  pub clients: Vec<Client>,
  #[serde(deserialize_with = "null_as_default")]
  pub employees: Vec<Employee>,
  #[serde(deserialize_with = "null_as_default")]
  pub last_sync: i64,
  #[serde(flatten)]
  pub extra: Map<String, JsonValue>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FinanceDocument {
  #[serde(deserialize_with = "null_as_default")]
  pub transactions: Vec<Transaction>,
  #[serde(deserialize_with = "null_as_default")]
  pub bank_transactions: Vec<BankTransaction>,
  #[serde(deserialize_with = "null_as_default")]
  pub invoices: Vec<Invoice>,
  #[serde(deserialize_with = "null_as_default")]
  pub purchases: Vec<Purchase>,
  #[serde(deserialize_with = "null_as_default")]
  pub recurring_purchases: Vec<RecurringPurchase>,
  #[serde(deserialize_with = "null_as_default")]
  pub recurring_contracts: Vec<RecurringContract>,
  #[serde(deserialize_with = "null_as_default")]
  pub last_sync: i64,
  #[serde(flatten)]
  pub extra: Map<String, JsonValue>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OperationsDocument {
  #[serde(deserialize_with = "null_as_default")]
  pub proposals: Vec<Proposal>,
  #[serde(deserialize_with = "null_as_default")]
  pub materials: Vec<Material>,
  #[serde(deserialize_with = "null_as_default")]
  pub stock_movements: Vec<StockMovement>,
  #[serde(deserialize_with = "null_as_default")]
  pub appointments: Vec<Appointment>,
  #[serde(deserialize_with = "null_as_default")]
  pub documents: Vec<Document>,
  #[serde(deserialize_with = "null_as_default")]
  pub last_sync: i64,
  #[serde(flatten)]
  pub extra: Map<String, JsonValue>,
}

/// Documento de una partición cualquiera.
#[derive(Debug, Clone, PartialEq)]
pub enum PartitionDocument {
  Config(ConfigDocument),
  Crm(CrmDocument),
  Finance(FinanceDocument),
  Operations(OperationsDocument),
}

impl PartitionDocument {
  pub fn partition(&self) -> Partition {
    match self {
      PartitionDocument::Config(_) => Partition::Config,
      PartitionDocument::Crm(_) => Partition::Crm,
      PartitionDocument::Finance(_) => Partition::Finance,
      PartitionDocument::Operations(_) => Partition::Operations,
    }
  }

  /// Interpreta `value` como el documento de `partition`. Los campos ausentes
  /// toman su valor vacío; un `null` equivale a un documento vacío.
  pub fn from_json(partition: Partition, value: JsonValue) -> Result<Self, serde_json::Error> {
    let value = if value.is_null() { JsonValue::Object(Map::new()) } else { value };
    Ok(match partition {
      Partition::Config => PartitionDocument::Config(serde_json::from_value(value)?),
      Partition::Crm => PartitionDocument::Crm(serde_json::from_value(value)?),
      Partition::Finance => PartitionDocument::Finance(serde_json::from_value(value)?),
      Partition::Operations => PartitionDocument::Operations(serde_json::from_value(value)?),
    })
  }

  pub fn to_json(&self) -> Result<JsonValue, serde_json::Error> {
    match self {
      PartitionDocument::Config(d) => serde_json::to_value(d),
      PartitionDocument::Crm(d) => serde_json::to_value(d),
      PartitionDocument::Finance(d) => serde_json::to_value(d),
      PartitionDocument::Operations(d) => serde_json::to_value(d),
    }
  }

  /// Contenido inicial de una partición recién creada: configuración con
  /// moneda `CVE` y plan de cuentas predefinido, el resto vacío.
  pub fn defaults(partition: Partition) -> Self {
    match partition {
      Partition::Config => PartitionDocument::Config(ConfigDocument { settings: default_settings(),
                                                                      categories: default_categories(),
                                                                      ..Default::default() }),
      Partition::Crm => PartitionDocument::Crm(CrmDocument::default()),
      Partition::Finance => PartitionDocument::Finance(FinanceDocument::default()),
      Partition::Operations => PartitionDocument::Operations(OperationsDocument::default()),
    }
  }

  pub fn last_sync(&self) -> i64 {
    match self {
      PartitionDocument::Config(d) => d.last_sync,
      PartitionDocument::Crm(d) => d.last_sync,
      PartitionDocument::Finance(d) => d.last_sync,
      PartitionDocument::Operations(d) => d.last_sync,
    }
  }

  pub fn set_last_sync(&mut self, ms: i64) {
    match self {
      PartitionDocument::Config(d) => d.last_sync = ms,
      PartitionDocument::Crm(d) => d.last_sync = ms,
      PartitionDocument::Finance(d) => d.last_sync = ms,
      PartitionDocument::Operations(d) => d.last_sync = ms,
    }
  }
}

/// Estado en memoria de todas las colecciones.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Aggregate {
  pub config: ConfigDocument,
  pub crm: CrmDocument,
  pub finance: FinanceDocument,
  pub operations: OperationsDocument,
  pub last_sync: Option<DateTime<Utc>>,
}

impl Aggregate {
  /// Copia del documento de `partition` tal como se escribiría ahora.
  pub fn snapshot(&self, partition: Partition, last_sync_ms: i64) -> PartitionDocument {
    let mut doc = match partition {
      Partition::Config => PartitionDocument::Config(self.config.clone()),
      Partition::Crm => PartitionDocument::Crm(self.crm.clone()),
      Partition::Finance => PartitionDocument::Finance(self.finance.clone()),
      Partition::Operations => PartitionDocument::Operations(self.operations.clone()),
    };
    doc.set_last_sync(last_sync_ms);
    doc
  }

  /// Registra una escritura correcta de `partition` en `at`.
  pub fn mark_synced(&mut self, partition: Partition, at: DateTime<Utc>) {
    let ms = at.timestamp_millis();
    match partition {
      Partition::Config => self.config.last_sync = ms,
      Partition::Crm => self.crm.last_sync = ms,
      Partition::Finance => self.finance.last_sync = ms,
      Partition::Operations => self.operations.last_sync = ms,
    }
    self.last_sync = Some(at);
  }

  /// Sustituye el documento de su partición.
  pub fn install(&mut self, doc: PartitionDocument) {
    let ms = doc.last_sync();
    match doc {
      PartitionDocument::Config(d) => self.config = d,
      PartitionDocument::Crm(d) => self.crm = d,
      PartitionDocument::Finance(d) => self.finance = d,
      PartitionDocument::Operations(d) => self.operations = d,
    }
    if let Some(at) = DateTime::<Utc>::from_timestamp_millis(ms).filter(|_| ms > 0) {
      if self.last_sync.map_or(true, |prev| at > prev) {
        self.last_sync = Some(at);
      }
    }
  }
}
