//! Implementación de `docstore::DocumentStore` sobre el sistema de archivos.
//! Las carpetas son directorios y los documentos archivos JSON; el handle de
//! cada elemento es su ruta relativa a la raíz del almacén. La
//! implementación detallada está en `fs_store.rs`.

mod fs_store;

pub use fs_store::{new_from_env, FsDocumentStore};
