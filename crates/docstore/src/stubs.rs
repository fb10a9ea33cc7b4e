// Archivo: stubs.rs
// Propósito: implementación en memoria del almacén para pruebas y demos.
//
// `InMemoryDocumentStore` no es durable. Registra cada operación, cuenta las
// escrituras por archivo y permite inyectar fallos (lecturas, escrituras,
// creaciones) o simular un cliente sin sesión.
use crate::domain::{FileDescriptor, FileId};
use crate::errors::{Result, StoreError};
use crate::repository::DocumentStore;
use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use uuid::Uuid;

/// Operación observada por el almacén en memoria.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreOp {
    FindFolder { name: String },
    CreateFolder { name: String },
    List { folder: FileId },
    Create { folder: FileId, name: String },
    Read { id: FileId },
    Update { id: FileId },
    Copy { id: FileId, dest_folder: FileId, new_name: String },
    Rename { id: FileId, new_name: String },
}

#[derive(Debug, Clone)]
struct StoredEntry {
    descriptor: FileDescriptor,
    /// `None` para carpetas.
    content: Option<JsonValue>,
}

#[derive(Debug, Default)]
struct Faults {
    fail_updates: bool,
    fail_reads: bool,
    fail_creates: bool,
    unauthenticated: bool,
    update_delay: Option<Duration>,
}

/// Almacén de documentos en memoria (no durable).
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    entries: Mutex<HashMap<FileId, StoredEntry>>,
    ops: Mutex<Vec<StoreOp>>,
    writes: Mutex<Vec<(FileId, JsonValue)>>,
    faults: Mutex<Faults>,
}

impl InMemoryDocumentStore {
    /// Crea un almacén vacío y autenticado.
    pub fn new() -> Self {
        Self::default()
    }

    /// Helper para mapear `Mutex::lock()` en un `Result` con
    /// `StoreError::Other`.
    fn lock<'a, T>(&'a self, m: &'a Mutex<T>) -> std::result::Result<MutexGuard<'a, T>, StoreError> {
        m.lock().map_err(|e| StoreError::Other(format!("mutex poisoned: {:?}", e)))
    }

    fn faults(&self) -> MutexGuard<'_, Faults> {
        self.faults.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, op: StoreOp) {
        self.ops.lock().unwrap_or_else(|e| e.into_inner()).push(op);
    }

    fn ensure_authenticated(&self) -> Result<()> {
        if self.faults().unauthenticated {
            return Err(injected(StoreError::Unauthenticated("sesión no iniciada".into())));
        }
        Ok(())
    }

    fn insert(&self, name: &str, parent: Option<&FileId>, content: Option<JsonValue>) -> Result<FileDescriptor> {
        let descriptor = FileDescriptor { id: FileId::new(Uuid::new_v4().simple().to_string()),
                                          name: name.to_string(),
                                          parent: parent.cloned(),
                                          is_folder: content.is_none(),
                                          modified_at: Utc::now() };
        self.lock(&self.entries)?
            .insert(descriptor.id.clone(), StoredEntry { descriptor: descriptor.clone(), content });
        Ok(descriptor)
    }

    // --- Inyección de fallos -------------------------------------------------

    /// Hace fallar (con `StoreError::Network`) todas las llamadas a
    /// `update_file` mientras esté activo.
    pub fn set_fail_updates(&self, fail: bool) {
        self.faults().fail_updates = fail;
    }

    /// Hace fallar todas las llamadas a `read_file`.
    pub fn set_fail_reads(&self, fail: bool) {
        self.faults().fail_reads = fail;
    }

    /// Hace fallar las creaciones de archivos y carpetas.
    pub fn set_fail_creates(&self, fail: bool) {
        self.faults().fail_creates = fail;
    }

    /// Simula un cliente sin sesión: `find_folder` devuelve `None` y el resto
    /// de operaciones `StoreError::Unauthenticated`.
    pub fn set_authenticated(&self, authenticated: bool) {
        self.faults().unauthenticated = !authenticated;
    }

    /// Retrasa cada `update_file` (útil para observar escrituras en curso).
    pub fn set_update_delay(&self, delay: Option<Duration>) {
        self.faults().update_delay = delay;
    }

    // --- Inspección para pruebas ---------------------------------------------

    /// Crea una carpeta sin registrar la operación.
    pub fn seed_folder(&self, name: &str, parent: Option<&FileId>) -> Result<FileId> {
        Ok(self.insert(name, parent, None)?.id)
    }

    /// Crea un archivo con contenido sin registrar la operación.
    pub fn seed_file(&self, folder: &FileId, name: &str, content: JsonValue) -> Result<FileId> {
        Ok(self.insert(name, Some(folder), Some(content))?.id)
    }

    /// Lista de operaciones observadas, en orden.
    pub fn operations(&self) -> Vec<StoreOp> {
        self.ops.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Olvida las operaciones y escrituras registradas hasta ahora.
    pub fn clear_log(&self) {
        self.ops.lock().unwrap_or_else(|e| e.into_inner()).clear();
        self.writes.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    /// Escrituras (`update_file`) completadas con éxito, en orden.
    pub fn writes(&self) -> Vec<(FileId, JsonValue)> {
        self.writes.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Número de escrituras completadas sobre un archivo.
    pub fn write_count(&self, id: &FileId) -> usize {
        self.writes().iter().filter(|(w, _)| w == id).count()
    }

    /// Número de intentos de `update_file` (exitosos o no) sobre un archivo.
    pub fn update_attempts(&self, id: &FileId) -> usize {
        self.operations()
            .iter()
            .filter(|op| matches!(op, StoreOp::Update { id: u } if u == id))
            .count()
    }

    /// Contenido actual de un archivo.
    pub fn content(&self, id: &FileId) -> Option<JsonValue> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .and_then(|e| e.content.clone())
    }

    /// Busca un elemento por nombre dentro de `folder`.
    pub fn find_by_name(&self, folder: &FileId, name: &str) -> Option<FileDescriptor> {
        self.children(folder).into_iter().find(|d| d.name == name)
    }

    /// Hijos directos de una carpeta, ordenados por nombre.
    pub fn children(&self, folder: &FileId) -> Vec<FileDescriptor> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let mut out: Vec<FileDescriptor> = entries.values()
                                                  .filter(|e| e.descriptor.parent.as_ref() == Some(folder))
                                                  .map(|e| e.descriptor.clone())
                                                  .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }

    /// Carpeta de primer nivel con el nombre dado.
    pub fn root_folder(&self, name: &str) -> Option<FileId> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.values()
               .find(|e| e.descriptor.is_folder && e.descriptor.parent.is_none() && e.descriptor.name == name)
               .map(|e| e.descriptor.id.clone())
    }
}

/// Fallo provocado desde las pruebas.
fn injected(err: StoreError) -> StoreError {
    debug!("fallo inyectado: {}", err);
    err
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn find_folder(&self, name: &str, parent: Option<&FileId>) -> Result<Option<FileId>> {
        self.record(StoreOp::FindFolder { name: name.to_string() });
        if self.faults().unauthenticated {
            return Ok(None);
        }
        let entries = self.lock(&self.entries)?;
        Ok(entries.values()
                  .find(|e| e.descriptor.is_folder && e.descriptor.name == name && e.descriptor.parent.as_ref() == parent)
                  .map(|e| e.descriptor.id.clone()))
    }

    async fn create_folder(&self, name: &str, parent: Option<&FileId>) -> Result<FileId> {
        self.record(StoreOp::CreateFolder { name: name.to_string() });
        self.ensure_authenticated()?;
        if self.faults().fail_creates {
            return Err(injected(StoreError::Network(format!("no se pudo crear la carpeta {}", name))));
        }
        Ok(self.insert(name, parent, None)?.id)
    }

    async fn list_files_in_folder(&self, folder: &FileId) -> Result<Vec<FileDescriptor>> {
        self.record(StoreOp::List { folder: folder.clone() });
        self.ensure_authenticated()?;
        if !self.lock(&self.entries)?.contains_key(folder) {
            return Err(StoreError::NotFound(format!("carpeta {}", folder)));
        }
        Ok(self.children(folder))
    }

    async fn create_file(&self, folder: &FileId, content: &JsonValue, name: &str) -> Result<FileDescriptor> {
        self.record(StoreOp::Create { folder: folder.clone(),
                                      name: name.to_string() });
        self.ensure_authenticated()?;
        if self.faults().fail_creates {
            return Err(injected(StoreError::Network(format!("no se pudo crear {}", name))));
        }
        self.insert(name, Some(folder), Some(content.clone()))
    }

    async fn read_file(&self, id: &FileId) -> Result<JsonValue> {
        self.record(StoreOp::Read { id: id.clone() });
        self.ensure_authenticated()?;
        if self.faults().fail_reads {
            return Err(injected(StoreError::Network(format!("lectura de {} interrumpida", id))));
        }
        let entries = self.lock(&self.entries)?;
        entries.get(id)
               .and_then(|e| e.content.clone())
               .ok_or(StoreError::NotFound(format!("archivo {}", id)))
    }

    async fn update_file(&self, id: &FileId, content: &JsonValue) -> Result<()> {
        self.record(StoreOp::Update { id: id.clone() });
        self.ensure_authenticated()?;
        let (fail, delay) = {
            let faults = self.faults();
            (faults.fail_updates, faults.update_delay)
        };
        if let Some(delay) = delay {
            debug!("update_file({}) retrasado {:?}", id, delay);
            tokio::time::sleep(delay).await;
        }
        if fail {
            return Err(injected(StoreError::Network(format!("escritura de {} interrumpida", id))));
        }
        {
            let mut entries = self.lock(&self.entries)?;
            let entry = entries.get_mut(id)
                               .filter(|e| !e.descriptor.is_folder)
                               .ok_or(StoreError::NotFound(format!("archivo {}", id)))?;
            entry.content = Some(content.clone());
            entry.descriptor.modified_at = Utc::now();
        }
        self.lock(&self.writes)?.push((id.clone(), content.clone()));
        Ok(())
    }

    async fn copy_file(&self, id: &FileId, dest_folder: &FileId, new_name: &str) -> Result<FileDescriptor> {
        self.record(StoreOp::Copy { id: id.clone(),
                                    dest_folder: dest_folder.clone(),
                                    new_name: new_name.to_string() });
        self.ensure_authenticated()?;
        let content = {
            let entries = self.lock(&self.entries)?;
            if !entries.contains_key(dest_folder) {
                return Err(StoreError::NotFound(format!("carpeta {}", dest_folder)));
            }
            entries.get(id)
                   .and_then(|e| e.content.clone())
                   .ok_or(StoreError::NotFound(format!("archivo {}", id)))?
        };
        self.insert(new_name, Some(dest_folder), Some(content))
    }

    async fn rename_file(&self, id: &FileId, new_name: &str) -> Result<()> {
        self.record(StoreOp::Rename { id: id.clone(),
                                      new_name: new_name.to_string() });
        self.ensure_authenticated()?;
        let mut entries = self.lock(&self.entries)?;
        let entry = entries.get_mut(id).ok_or(StoreError::NotFound(format!("archivo {}", id)))?;
        entry.descriptor.name = new_name.to_string();
        entry.descriptor.modified_at = Utc::now();
        Ok(())
    }
}
