// Archivo: repository.rs
// Propósito: definir el trait `DocumentStore`, el contrato que deben
// implementar los backends de archivos (nube, disco, memoria).
use crate::domain::{FileDescriptor, FileId};
use crate::errors::Result;
use async_trait::async_trait;
use serde_json::Value as JsonValue;

/// Contrato mínimo de un almacén remoto de documentos JSON.
///
/// Todas las operaciones son E/S de red y pueden fallar por conectividad o
/// autorización. Ninguna reintenta: el llamador maneja el fallo.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Localiza una carpeta por nombre dentro de `parent` (o en la raíz).
    /// Devuelve `Ok(None)` si no existe o si el cliente no está autenticado
    /// o configurado.
    async fn find_folder(&self, name: &str, parent: Option<&FileId>) -> Result<Option<FileId>>;

    /// Crea una carpeta y devuelve su handle.
    async fn create_folder(&self, name: &str, parent: Option<&FileId>) -> Result<FileId>;

    /// Enumera los hijos directos de una carpeta.
    async fn list_files_in_folder(&self, folder: &FileId) -> Result<Vec<FileDescriptor>>;

    /// Serializa `content` como documento y lo sube como archivo nuevo
    /// llamado `name` dentro de `folder`.
    async fn create_file(&self, folder: &FileId, content: &JsonValue, name: &str) -> Result<FileDescriptor>;

    /// Descarga y deserializa el contenido de un archivo.
    async fn read_file(&self, id: &FileId) -> Result<JsonValue>;

    /// Sobrescribe el contenido de un archivo existente.
    async fn update_file(&self, id: &FileId, content: &JsonValue) -> Result<()>;

    /// Duplica un archivo en otra carpeta con un nombre nuevo (backups).
    async fn copy_file(&self, id: &FileId, dest_folder: &FileId, new_name: &str) -> Result<FileDescriptor>;

    /// Renombra un archivo en su misma carpeta.
    async fn rename_file(&self, id: &FileId, new_name: &str) -> Result<()>;
}
