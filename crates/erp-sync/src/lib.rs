//! erp-sync: persistencia fragmentada y sincronización de documentos
//!
//! Mantiene en memoria todas las colecciones del ERP, repartidas en cuatro
//! particiones (Config, CRM, Finance, Operations) que se guardan como cuatro
//! documentos JSON en un `docstore::DocumentStore`. Las escrituras se
//! agrupan por partición con un debounce, las facturas emitidas no pueden
//! cambiar su contenido financiero y un documento monolítico heredado se
//! migra automáticamente al arrancar.

pub mod backup;
pub mod clock;
pub mod collections;
pub mod config;
pub mod documents;
pub mod engine;
pub mod errors;
pub mod migration;
pub mod partition;
pub mod scheduler;
pub mod session;
pub mod status;

pub use backup::{BackupEntry, BackupManifest, BackupOutcome};
pub use clock::{Clock, ManualClock, SystemClock};
pub use collections::{keys, CollectionHandle, CollectionKey, SettingsHandle};
pub use config::SyncConfig;
pub use documents::{Aggregate, ConfigDocument, CrmDocument, FinanceDocument, OperationsDocument, PartitionDocument};
pub use engine::{PartitionPhase, SyncEngine, WriteState};
pub use errors::SyncError;
pub use partition::{Collection, Partition};
pub use session::{resolve_session, IdentityError, IdentityProvider, Session, UserProfile};
pub use status::{Notice, NoticeLevel, Notifier, StatusListener, SyncStatus};
