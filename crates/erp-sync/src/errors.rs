use crate::partition::Partition;
use docstore::StoreError;
use thiserror::Error;

// Errores del motor de sincronización.
//
// Los errores de bajo nivel del almacén (`StoreError`) nunca llegan tal cual
// a los consumidores: se traducen aquí a arranque, lectura o escritura.
#[derive(Error, Debug)]
pub enum SyncError {
  /// Fallo al descubrir/crear carpetas o archivos durante `init` (incluye
  /// migraciones fallidas). Fatal para la sesión.
  #[error("Error de arranque ({stage}): {message}")]
  Bootstrap { stage: &'static str, message: String },

  /// El documento heredado no se pudo repartir en particiones.
  #[error("Error de migración: {0}")]
  Migration(String),

  /// Lectura fallida durante una resincronización forzada.
  #[error("Error de lectura en {partition}: {source}")]
  Read {
    partition: Partition,
    #[source]
    source: StoreError,
  },

  /// Escritura fallida de una partición.
  #[error("Error de escritura en {partition}: {source}")]
  Write {
    partition: Partition,
    #[source]
    source: StoreError,
  },

  /// Fallo del almacén fuera del arranque y de las escrituras (backups).
  #[error("Error del almacén: {0}")]
  Store(#[from] StoreError),

  /// Se usó un accesor antes de que `init` terminara con éxito.
  #[error("El motor no está inicializado")]
  NotReady,

  /// Errores de validación del dominio (ids duplicados).
  #[error("Error de dominio: {0}")]
  Domain(#[from] erp_domain::DomainError),

  #[error("Error de serialización: {0}")]
  Serialization(#[from] serde_json::Error),

  /// Variables de entorno con valores inválidos.
  #[error("Error de configuración: {0}")]
  Config(String),

  #[error("Estado interno inconsistente: {0}")]
  Poisoned(String),
}

impl SyncError {
  pub(crate) fn bootstrap(stage: &'static str) -> impl FnOnce(StoreError) -> SyncError {
    move |e| SyncError::Bootstrap { stage,
                                    message: e.to_string() }
  }
}
