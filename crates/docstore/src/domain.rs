// Archivo: domain.rs
// Propósito: tipos de valor compartidos por todos los backends: el handle
// opaco de archivo (`FileId`) y la descripción de un archivo (`FileDescriptor`).
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identificador opaco emitido por el almacén para un archivo o carpeta.
///
/// El llamador nunca interpreta su contenido: sólo lo guarda y lo devuelve en
/// operaciones posteriores.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(String);

impl FileId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for FileId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Descripción ligera de un hijo de una carpeta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub id: FileId,
    pub name: String,
    /// Carpeta contenedora, `None` para elementos en la raíz del almacén.
    pub parent: Option<FileId>,
    pub is_folder: bool,
    pub modified_at: DateTime<Utc>,
}

/// Nombre sin la extensión final (`erp_config.json` -> `erp_config`).
pub fn file_stem(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}
