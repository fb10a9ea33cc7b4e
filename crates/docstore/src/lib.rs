//! Crate `docstore` - contrato del almacén remoto de documentos
//!
//! Define los tipos básicos (`FileId`, `FileDescriptor`), el contrato
//! asíncrono `DocumentStore` que deben implementar los backends de archivos en
//! la nube y una implementación en memoria (`InMemoryDocumentStore`) útil para
//! pruebas y demos.
//!
//! Diseño resumido:
//! - Operaciones primitivas y agnósticas de partición: carpetas, archivos JSON,
//!   copias (backups) y renombrado (cuarentena de archivos heredados).
//! - Sin reintentos: cada operación puede fallar por red o autorización y el
//!   llamador decide qué hacer con el error.
//! - `find_folder` no falla si la carpeta no existe o si el cliente no está
//!   autenticado: devuelve `Ok(None)`.
//!
//! Ejemplo rápido:
//! ```rust
//! use docstore::{DocumentStore, InMemoryDocumentStore};
//! # tokio_test::block_on(async {
//! let store = InMemoryDocumentStore::new();
//! let root = store.create_folder("ERP_Data", None).await.unwrap();
//! let file = store.create_file(&root, &serde_json::json!({"a": 1}), "a.json").await.unwrap();
//! assert_eq!(store.read_file(&file.id).await.unwrap()["a"], 1);
//! # });
//! ```
pub mod domain;
pub mod errors;
pub mod repository;
pub mod stubs;

pub use domain::*;
pub use errors::*;
pub use repository::*;
pub use stubs::*;
