// Archivo: errors.rs
// Propósito: definir los errores del almacén remoto y el alias Result<T>
// usado por las APIs del crate.
use thiserror::Error;
/// Errores comunes de un almacén de documentos.
///
/// - `NotFound`: archivo o carpeta inexistente.
/// - `Unauthenticated`: el cliente no tiene sesión o no está configurado.
/// - `Network`: fallo de conectividad con el backend.
/// - `Serialization`: el contenido no es JSON válido.
/// - `Io`: error de E/S local (backends de disco).
/// - `Other`: cualquier otro error.
#[derive(Error, Debug)]
pub enum StoreError {
  /// Archivo o carpeta no encontrada.
  #[error("No encontrado: {0}")]
  NotFound(String),
  /// Cliente sin autenticar o sin configurar.
  #[error("No autenticado: {0}")]
  Unauthenticated(String),
  /// Error de conectividad con el backend remoto.
  #[error("Error de red: {0}")]
  Network(String),
  /// Contenido ilegible como documento JSON.
  #[error("Error de serialización: {0}")]
  Serialization(String),
  /// Error de E/S local.
  #[error("Error de E/S: {0}")]
  Io(String),
  /// Otro tipo de error.
  #[error("Otro: {0}")]
  Other(String),
}

impl From<serde_json::Error> for StoreError {
  fn from(e: serde_json::Error) -> Self {
    Self::Serialization(e.to_string())
  }
}

impl From<std::io::Error> for StoreError {
  fn from(e: std::io::Error) -> Self {
    match e.kind() {
      std::io::ErrorKind::NotFound => Self::NotFound(e.to_string()),
      _ => Self::Io(e.to_string()),
    }
  }
}

/// Alias de resultado usado por las APIs del crate.
pub type Result<T> = std::result::Result<T, StoreError>;
