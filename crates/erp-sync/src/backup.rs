// Archivo: backup.rs
// Propósito: copia de seguridad diaria de las particiones en `Backups/`.
//
// Cada día se copian los cuatro documentos como `<stem>_<fecha>.json` y se
// escribe un manifiesto `backup_<fecha>.manifest.json` con el SHA-256 de
// cada copia. El manifiesto es la marca de "backup hecho hoy": si una
// ejecución anterior se interrumpió, las copias ya presentes se reutilizan.
use crate::engine::SyncEngine;
use crate::errors::SyncError;
use crate::partition::Partition;
use chrono::{DateTime, Utc};
use docstore::file_stem;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupEntry {
  pub partition: Partition,
  pub name: String,
  pub sha256: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupManifest {
  pub date: String,
  pub created_at: DateTime<Utc>,
  pub files: Vec<BackupEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BackupOutcome {
  Created(BackupManifest),
  /// Ya existía el manifiesto de hoy.
  AlreadyPresent,
}

pub fn manifest_name(date: &str) -> String {
  format!("backup_{}.manifest.json", date)
}

/// `erp_finance.json` + `2026-10-19` -> `erp_finance_2026-10-19.json`.
pub fn dated_name(file_name: &str, date: &str) -> String {
  format!("{}_{}.json", file_stem(file_name), date)
}

fn sha256_hex(bytes: &[u8]) -> String {
  format!("{:x}", Sha256::digest(bytes))
}

impl SyncEngine {
  /// Ejecuta la copia de seguridad del día si aún no existe.
  pub async fn backup_now(&self) -> Result<BackupOutcome, SyncError> {
    let root = self.root_folder()?;
    let handles = self.file_handles();
    let store = &self.inner.store;
    let cfg = &self.inner.config;
    let date = self.inner.clock.today();

    let folder = match store.find_folder(&cfg.backups_folder, Some(&root)).await? {
      Some(id) => id,
      None => store.create_folder(&cfg.backups_folder, Some(&root)).await?,
    };
    let listing = store.list_files_in_folder(&folder).await?;
    let marker = manifest_name(&date);
    if listing.iter().any(|f| f.name == marker) {
      debug!("backup de {} ya presente", date);
      return Ok(BackupOutcome::AlreadyPresent);
    }

    let mut files = Vec::with_capacity(handles.len());
    for (partition, id) in handles {
      let name = dated_name(cfg.file_name(partition), &date);
      let copy = match listing.iter().find(|f| f.name == name) {
        Some(existing) => existing.id.clone(),
        None => store.copy_file(&id, &folder, &name).await?.id,
      };
      let content = store.read_file(&copy).await?;
      let sha256 = sha256_hex(&serde_json::to_vec(&content)?);
      files.push(BackupEntry { partition, name, sha256 });
    }

    let manifest = BackupManifest { date,
                                    created_at: self.inner.clock.now(),
                                    files };
    store.create_file(&folder, &serde_json::to_value(&manifest)?, &marker).await?;
    info!("backup diario creado ({} archivos)", manifest.files.len());
    Ok(BackupOutcome::Created(manifest))
  }
}
