// Archivo: config.rs
// Propósito: nombres de carpetas/archivos y tiempos del motor.
use crate::errors::SyncError;
use crate::partition::Partition;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
  /// Carpeta raíz de la aplicación en el almacén.
  pub app_folder: String,
  pub backups_folder: String,
  /// Documento monolítico de versiones anteriores.
  pub legacy_file_name: String,
  pub config_file: String,
  pub crm_file: String,
  pub finance_file: String,
  pub operations_file: String,
  pub debounce_ms: u64,
  pub backups_enabled: bool,
  pub session_timeout_ms: u64,
}

impl Default for SyncConfig {
  fn default() -> Self {
    Self { app_folder:         "ERP_Data".into(),
           backups_folder:     "Backups".into(),
           legacy_file_name:   "erp_database.json".into(),
           config_file:        "erp_config.json".into(),
           crm_file:           "erp_crm.json".into(),
           finance_file:       "erp_finance.json".into(),
           operations_file:    "erp_operations.json".into(),
           debounce_ms:        2000,
           backups_enabled:    true,
           session_timeout_ms: 5000 }
  }
}

impl SyncConfig {
  /// Nombre del archivo remoto de una partición.
  pub fn file_name(&self, partition: Partition) -> &str {
    match partition {
      Partition::Config => &self.config_file,
      Partition::Crm => &self.crm_file,
      Partition::Finance => &self.finance_file,
      Partition::Operations => &self.operations_file,
    }
  }

  /// Partición cuyo archivo se llama `name`, si alguna.
  pub fn partition_for_file(&self, name: &str) -> Option<Partition> {
    Partition::ALL.into_iter().find(|p| self.file_name(*p) == name)
  }

  pub fn debounce(&self) -> Duration {
    Duration::from_millis(self.debounce_ms)
  }

  pub fn session_timeout(&self) -> Duration {
    Duration::from_millis(self.session_timeout_ms)
  }

  pub fn with_debounce_ms(mut self, ms: u64) -> Self {
    self.debounce_ms = ms;
    self
  }

  pub fn without_backups(mut self) -> Self {
    self.backups_enabled = false;
    self
  }

  /// Carga `.env` (si existe) y aplica las variables `ERP_APP_FOLDER`,
  /// `ERP_DEBOUNCE_MS`, `ERP_BACKUPS` y `ERP_SESSION_TIMEOUT_MS` sobre los
  /// valores por defecto.
  pub fn from_env() -> Result<Self, SyncError> {
    dotenvy::dotenv().ok();
    Self::from_lookup(|key| std::env::var(key).ok())
  }

  pub(crate) fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, SyncError> {
    let mut cfg = SyncConfig::default();
    if let Some(folder) = get("ERP_APP_FOLDER") {
      let folder = folder.trim();
      if folder.is_empty() || folder.contains('/') {
        return Err(SyncError::Config(format!("ERP_APP_FOLDER inválido: {:?}", folder)));
      }
      cfg.app_folder = folder.to_string();
    }
    if let Some(ms) = get("ERP_DEBOUNCE_MS") {
      cfg.debounce_ms = parse_ms("ERP_DEBOUNCE_MS", &ms)?;
    }
    if let Some(ms) = get("ERP_SESSION_TIMEOUT_MS") {
      cfg.session_timeout_ms = parse_ms("ERP_SESSION_TIMEOUT_MS", &ms)?;
    }
    if let Some(flag) = get("ERP_BACKUPS") {
      cfg.backups_enabled = match flag.trim().to_ascii_lowercase().as_str() {
        "0" | "false" | "no" | "off" => false,
        "1" | "true" | "yes" | "on" | "" => true,
        other => return Err(SyncError::Config(format!("ERP_BACKUPS inválido: {:?}", other))),
      };
    }
    Ok(cfg)
  }
}

fn parse_ms(key: &str, raw: &str) -> Result<u64, SyncError> {
  raw.trim()
     .parse::<u64>()
     .map_err(|e| SyncError::Config(format!("{} inválido ({:?}): {}", key, raw, e)))
}
