// Archivo: engine.rs
// Propósito: motor de sincronización. Mantiene el agregado en memoria,
// descubre/crea/migra los documentos al arrancar y programa las
// escrituras diferidas por partición.
//
// Orden de candados: agregado antes que la ranura de partición. Ningún
// candado síncrono (ni referencia del DashMap) se mantiene a través de un
// `.await`; los callbacks se invocan con todos los candados liberados.
use crate::clock::{Clock, SystemClock};
use crate::collections::CollectionKey;
use crate::config::SyncConfig;
use crate::documents::{Aggregate, PartitionDocument};
use crate::errors::SyncError;
use crate::migration::{migrated_name, split_legacy};
use crate::partition::Partition;
use crate::scheduler::Debouncer;
use crate::status::{Notice, StatusHub, SyncStatus};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use docstore::{DocumentStore, FileId, StoreError};
use erp_domain::{ensure_unique_ids, Entity, RecordId, Settings};
use indexmap::IndexMap;
use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;

/// Fase de carga de una partición.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PartitionPhase {
  #[default]
  Uninitialized,
  Loading,
  Ready,
}

/// Sub-estado de escritura de una partición.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteState {
  Idle,
  Pending,
  Writing,
  WriteError,
}

#[derive(Debug, Default)]
struct PartitionSlot {
  handle: Option<FileId>,
  phase: PartitionPhase,
  pending: bool,
  writing: bool,
  error: Option<String>,
  /// Se incrementa con cada mutación; una escritura sólo limpia `pending`
  /// si su instantánea corresponde a la última revisión.
  revision: u64,
}

impl PartitionSlot {
  fn write_state(&self) -> WriteState {
    if self.writing {
      WriteState::Writing
    } else if self.error.is_some() {
      WriteState::WriteError
    } else if self.pending {
      WriteState::Pending
    } else {
      WriteState::Idle
    }
  }
}

pub(crate) struct EngineInner {
  pub(crate) store: Arc<dyn DocumentStore>,
  pub(crate) config: SyncConfig,
  pub(crate) clock: Arc<dyn Clock>,
  aggregate: Mutex<Aggregate>,
  pub(crate) root: Mutex<Option<FileId>>,
  ready: AtomicBool,
  slots: DashMap<Partition, PartitionSlot>,
  debouncers: HashMap<Partition, Debouncer>,
  write_locks: HashMap<Partition, tokio::sync::Mutex<()>>,
  init_lock: tokio::sync::Mutex<()>,
  pub(crate) status: StatusHub,
}

/// Resultado puro de fusionar una lista entrante con la almacenada.
#[derive(Debug)]
pub(crate) struct MergeOutcome<T> {
  pub(crate) records: Vec<T>,
  /// Etiquetas de los registros protegidos cuya modificación se rechazó.
  pub(crate) rejected: Vec<String>,
}

/// Fusiona `incoming` sobre `stored`:
/// - registro bloqueado con contenido protegido distinto: se conserva el
///   almacenado y se rechaza;
/// - mismo contenido (ignorando `updatedAt`): se conserva el almacenado;
/// - nuevo o modificado: se sella `updatedAt` (y `createdAt` si falta).
///
/// Los registros bloqueados ausentes de `incoming` se conservan al final.
pub(crate) fn merge_records<T: Entity>(stored: &[T], incoming: Vec<T>, now: DateTime<Utc>) -> MergeOutcome<T> {
  let by_id: HashMap<&RecordId, &T> = stored.iter().map(|r| (r.id(), r)).collect();
  let incoming_ids: HashSet<RecordId> = incoming.iter().map(|r| r.id().clone()).collect();
  let mut records = Vec::with_capacity(incoming.len());
  let mut rejected = Vec::new();

  for mut rec in incoming {
    match by_id.get(rec.id()) {
      Some(prev) if prev.is_locked() && prev.locked_content_differs(&rec) => {
        rejected.push(prev.label());
        records.push((*prev).clone());
      }
      Some(prev) if prev.same_content(&rec) => records.push((*prev).clone()),
      prev => {
        let meta = rec.meta_mut();
        meta.updated_at = Some(now);
        if meta.created_at.is_none() {
          meta.created_at = prev.and_then(|p| p.meta().created_at).or(Some(now));
        }
        records.push(rec);
      }
    }
  }

  for prev in stored {
    if prev.is_locked() && !incoming_ids.contains(prev.id()) {
      rejected.push(prev.label());
      records.push(prev.clone());
    }
  }
  MergeOutcome { records, rejected }
}

/// Motor de sincronización. Clonar es barato: todas las copias comparten
/// el mismo estado.
#[derive(Clone)]
pub struct SyncEngine {
  pub(crate) inner: Arc<EngineInner>,
}

impl SyncEngine {
  pub fn new(store: Arc<dyn DocumentStore>, config: SyncConfig) -> Self {
    Self::with_clock(store, config, Arc::new(SystemClock))
  }

  pub fn with_clock(store: Arc<dyn DocumentStore>, config: SyncConfig, clock: Arc<dyn Clock>) -> Self {
    let slots = DashMap::new();
    let mut debouncers = HashMap::new();
    let mut write_locks = HashMap::new();
    for p in Partition::ALL {
      slots.insert(p, PartitionSlot::default());
      debouncers.insert(p, Debouncer::new(config.debounce()));
      write_locks.insert(p, tokio::sync::Mutex::new(()));
    }
    let inner = EngineInner { store,
                              config,
                              clock,
                              aggregate: Mutex::new(Aggregate::default()),
                              root: Mutex::new(None),
                              ready: AtomicBool::new(false),
                              slots,
                              debouncers,
                              write_locks,
                              init_lock: tokio::sync::Mutex::new(()),
                              status: StatusHub::new() };
    Self { inner: Arc::new(inner) }
  }

  pub fn config(&self) -> &SyncConfig {
    &self.inner.config
  }

  pub fn is_ready(&self) -> bool {
    self.inner.ready.load(Ordering::SeqCst)
  }

  // --- Callbacks y estado ----------------------------------------------------

  /// Registra el receptor de avisos al usuario (sustituye al anterior).
  pub fn set_notifier(&self, notifier: impl Fn(&Notice) + Send + Sync + 'static) {
    self.inner.status.set_notifier(Arc::new(notifier));
  }

  /// Registra un observador de transiciones del estado de sincronización.
  pub fn on_sync_change(&self, listener: impl Fn(SyncStatus) + Send + Sync + 'static) {
    self.inner.status.add_listener(Arc::new(listener));
  }

  pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
    self.inner.status.subscribe()
  }

  pub fn status(&self) -> SyncStatus {
    self.inner.status.current()
  }

  /// Última carga o escritura correcta.
  pub fn last_sync(&self) -> Option<DateTime<Utc>> {
    self.lock_aggregate().ok().and_then(|agg| agg.last_sync)
  }

  pub fn partition_state(&self, partition: Partition) -> (PartitionPhase, WriteState) {
    self.inner
        .slots
        .get(&partition)
        .map(|s| (s.phase, s.write_state()))
        .unwrap_or((PartitionPhase::Uninitialized, WriteState::Idle))
  }

  /// Particiones con mutaciones aún no escritas.
  pub fn pending_partitions(&self) -> Vec<Partition> {
    Partition::ALL.into_iter()
                  .filter(|p| self.inner.slots.get(p).map(|s| s.pending).unwrap_or(false))
                  .collect()
  }

  fn refresh_status(&self) {
    let mut any_error = false;
    let mut any_pending = false;
    for slot in self.inner.slots.iter() {
      any_error |= slot.error.is_some();
      any_pending |= slot.pending || slot.writing;
    }
    let status = if any_error {
      SyncStatus::Error
    } else if any_pending {
      SyncStatus::Saving
    } else {
      SyncStatus::Saved
    };
    self.inner.status.publish(status);
  }

  fn set_phase_all(&self, phase: PartitionPhase) {
    for mut slot in self.inner.slots.iter_mut() {
      slot.phase = phase;
    }
  }

  // --- Acceso al agregado ----------------------------------------------------

  fn lock_aggregate(&self) -> Result<MutexGuard<'_, Aggregate>, SyncError> {
    self.inner
        .aggregate
        .lock()
        .map_err(|e| SyncError::Poisoned(format!("agregado: {}", e)))
  }

  fn ensure_ready(&self) -> Result<(), SyncError> {
    if self.is_ready() {
      Ok(())
    } else {
      Err(SyncError::NotReady)
    }
  }

  /// Ejecuta `f` sobre el agregado (sin E/S).
  pub(crate) fn read<R>(&self, f: impl FnOnce(&Aggregate) -> R) -> Result<R, SyncError> {
    self.ensure_ready()?;
    let agg = self.lock_aggregate()?;
    Ok(f(&agg))
  }

  pub(crate) fn root_folder(&self) -> Result<FileId, SyncError> {
    self.inner
        .root
        .lock()
        .map_err(|e| SyncError::Poisoned(format!("raíz: {}", e)))?
        .clone()
        .ok_or(SyncError::NotReady)
  }

  pub(crate) fn file_handles(&self) -> Vec<(Partition, FileId)> {
    Partition::ALL.into_iter()
                  .filter_map(|p| self.inner.slots.get(&p).and_then(|s| s.handle.clone()).map(|h| (p, h)))
                  .collect()
  }

  /// Marca la partición como sucia. Debe llamarse con el agregado bloqueado.
  fn mark_dirty(&self, partition: Partition) {
    if let Some(mut slot) = self.inner.slots.get_mut(&partition) {
      slot.revision += 1;
      slot.pending = true;
      slot.error = None;
    }
  }

  /// Sustituye la colección `K` y programa la escritura de su partición.
  pub(crate) fn save_collection<K: CollectionKey>(&self, incoming: Vec<K::Record>) -> Result<Vec<K::Record>, SyncError> {
    self.ensure_ready()?;
    let collection = K::COLLECTION;
    ensure_unique_ids(collection.field_name(), &incoming)?;
    let partition = collection.partition();
    let now = self.inner.clock.now();

    let outcome = {
      let mut agg = self.lock_aggregate()?;
      let outcome = merge_records(K::list(&agg), incoming, now);
      *K::list_mut(&mut agg) = outcome.records.clone();
      self.mark_dirty(partition);
      outcome
    };
    debug!("{} guardada ({} registros)", collection, outcome.records.len());

    for label in &outcome.rejected {
      self.inner
          .status
          .notify(Notice::warning(format!("{} está protegida: se conserva la versión emitida", label))
                    .for_partition(partition));
    }
    self.schedule_write(partition);
    self.refresh_status();
    Ok(outcome.records)
  }

  pub(crate) fn save_settings(&self, incoming: Settings) -> Result<Settings, SyncError> {
    self.ensure_ready()?;
    let now = self.inner.clock.now();
    let saved = {
      let mut agg = self.lock_aggregate()?;
      let stored = &agg.config.settings;
      if stored.same_content(&incoming) {
        return Ok(stored.clone());
      }
      let mut next = incoming;
      next.meta.updated_at = Some(now);
      if next.meta.created_at.is_none() {
        next.meta.created_at = stored.meta.created_at.or(Some(now));
      }
      agg.config.settings = next.clone();
      self.mark_dirty(Partition::Config);
      next
    };
    self.schedule_write(Partition::Config);
    self.refresh_status();
    Ok(saved)
  }

  // --- Escrituras --------------------------------------------------------------

  fn schedule_write(&self, partition: Partition) {
    let Some(debouncer) = self.inner.debouncers.get(&partition) else { return };
    let weak = Arc::downgrade(&self.inner);
    let armed = debouncer.schedule(move || async move {
                                     if let Some(inner) = weak.upgrade() {
                                       let engine = SyncEngine { inner };
                                       // el fallo ya se notificó y quedó en el estado
                                       let _ = engine.write_partition(partition).await;
                                     }
                                   });
    if armed {
      debug!("escritura de {} programada en {:?}", partition, debouncer.delay());
    }
  }

  /// Escribe la partición si tiene cambios pendientes.
  pub(crate) async fn write_partition(&self, partition: Partition) -> Result<(), SyncError> {
    let Some(write_lock) = self.inner.write_locks.get(&partition) else {
      return Ok(());
    };
    let _guard = write_lock.lock().await;
    let now = self.inner.clock.now();

    let (id, content, revision) = {
      let agg = self.lock_aggregate()?;
      let Some(mut slot) = self.inner.slots.get_mut(&partition) else {
        return Ok(());
      };
      if !slot.pending {
        return Ok(());
      }
      let Some(id) = slot.handle.clone() else {
        return Err(SyncError::NotReady);
      };
      let content = agg.snapshot(partition, now.timestamp_millis()).to_json()?;
      slot.writing = true;
      (id, content, slot.revision)
    };
    self.refresh_status();

    match self.inner.store.update_file(&id, &content).await {
      Ok(()) => {
        {
          let mut agg = self.lock_aggregate()?;
          agg.mark_synced(partition, now);
          if let Some(mut slot) = self.inner.slots.get_mut(&partition) {
            slot.writing = false;
            slot.error = None;
            if slot.revision == revision {
              slot.pending = false;
            }
          }
        }
        info!("partición {} guardada", partition);
        self.refresh_status();
        Ok(())
      }
      Err(e) => {
        if let Some(mut slot) = self.inner.slots.get_mut(&partition) {
          slot.writing = false;
          slot.error = Some(e.to_string());
        }
        self.refresh_status();
        self.inner
            .status
            .notify(Notice::error(format!("No se pudieron guardar los datos de {}: {}", partition, e))
                      .for_partition(partition));
        Err(SyncError::Write { partition, source: e })
      }
    }
  }

  /// Escribe ya todas las particiones pendientes (antes de salir). Devuelve
  /// el primer error tras intentarlas todas.
  pub async fn flush(&self) -> Result<(), SyncError> {
    self.ensure_ready()?;
    let mut first_err = None;
    for p in Partition::ALL {
      if let Some(d) = self.inner.debouncers.get(&p) {
        d.cancel();
      }
      if let Err(e) = self.write_partition(p).await {
        first_err.get_or_insert(e);
      }
    }
    match first_err {
      Some(e) => Err(e),
      None => Ok(()),
    }
  }

  // --- Arranque ----------------------------------------------------------------

  /// Descubre, migra o crea los cuatro documentos y los carga en memoria.
  /// Idempotente mientras el motor esté listo.
  pub async fn init(&self) -> Result<(), SyncError> {
    let _init = self.inner.init_lock.lock().await;
    if self.is_ready() {
      debug!("init: el motor ya está listo");
      return Ok(());
    }
    self.set_phase_all(PartitionPhase::Loading);
    if let Err(e) = self.bootstrap().await {
      self.set_phase_all(PartitionPhase::Uninitialized);
      self.inner
          .status
          .notify(Notice::error(format!("No se pudo iniciar la base de datos: {}", e)));
      return Err(e);
    }
    self.inner.ready.store(true, Ordering::SeqCst);
    self.set_phase_all(PartitionPhase::Ready);
    self.refresh_status();
    info!("motor listo");

    if self.inner.config.backups_enabled {
      if let Err(e) = self.backup_now().await {
        self.inner
            .status
            .notify(Notice::warning(format!("No se pudo crear la copia de seguridad diaria: {}", e)));
      }
    }
    Ok(())
  }

  async fn bootstrap(&self) -> Result<(), SyncError> {
    let store = &self.inner.store;
    let cfg = &self.inner.config;

    let root = match store.find_folder(&cfg.app_folder, None)
                          .await
                          .map_err(SyncError::bootstrap("buscar carpeta raíz"))?
    {
      Some(id) => id,
      None => {
        info!("creando carpeta {}", cfg.app_folder);
        store.create_folder(&cfg.app_folder, None)
             .await
             .map_err(SyncError::bootstrap("crear carpeta raíz"))?
      }
    };

    let listing = store.list_files_in_folder(&root)
                       .await
                       .map_err(SyncError::bootstrap("listar carpeta raíz"))?;
    let mut handles: IndexMap<Partition, FileId> = IndexMap::new();
    let mut legacy = None;
    for f in listing.into_iter().filter(|f| !f.is_folder) {
      if let Some(p) = cfg.partition_for_file(&f.name) {
        handles.insert(p, f.id);
      } else if f.name == cfg.legacy_file_name {
        legacy = Some(f.id);
      }
    }

    let docs = match legacy {
      Some(legacy_id) if handles.len() < Partition::ALL.len() => self.migrate(&root, legacy_id, &handles).await?,
      Some(_) => {
        warn!("{} sigue presente junto a las cuatro particiones: se ignora", cfg.legacy_file_name);
        self.load_or_create(&root, &handles).await?
      }
      None => self.load_or_create(&root, &handles).await?,
    };

    {
      let mut agg = self.lock_aggregate()?;
      *agg = Aggregate::default();
      for (p, id, doc) in docs {
        agg.install(doc);
        if let Some(mut slot) = self.inner.slots.get_mut(&p) {
          slot.handle = Some(id);
          slot.pending = false;
          slot.error = None;
        }
      }
    }
    *self.inner
         .root
         .lock()
         .map_err(|e| SyncError::Poisoned(format!("raíz: {}", e)))? = Some(root);
    Ok(())
  }

  async fn read_partition(&self, partition: Partition, id: &FileId) -> Result<PartitionDocument, StoreError> {
    let value = self.inner.store.read_file(id).await?;
    PartitionDocument::from_json(partition, value).map_err(|e| StoreError::Serialization(format!("{}: {}", partition, e)))
  }

  async fn create_partition(&self, root: &FileId, doc: &PartitionDocument) -> Result<FileId, SyncError> {
    let p = doc.partition();
    let content = doc.to_json().map_err(|e| SyncError::Bootstrap { stage: "crear partición",
                                                                    message: e.to_string() })?;
    let created = self.inner
                      .store
                      .create_file(root, &content, self.inner.config.file_name(p))
                      .await
                      .map_err(SyncError::bootstrap("crear partición"))?;
    info!("partición {} creada", p);
    Ok(created.id)
  }

  async fn load_or_create(&self,
                          root: &FileId,
                          handles: &IndexMap<Partition, FileId>)
                          -> Result<Vec<(Partition, FileId, PartitionDocument)>, SyncError> {
    let mut out = Vec::with_capacity(Partition::ALL.len());
    for p in Partition::ALL {
      match handles.get(&p) {
        Some(id) => {
          let doc = self.read_partition(p, id)
                        .await
                        .map_err(SyncError::bootstrap("leer partición"))?;
          debug!("partición {} cargada", p);
          out.push((p, id.clone(), doc));
        }
        None => {
          let doc = PartitionDocument::defaults(p);
          let id = self.create_partition(root, &doc).await?;
          out.push((p, id, doc));
        }
      }
    }
    Ok(out)
  }

  /// Reparte el documento heredado. Las particiones que ya existen (una
  /// migración interrumpida) se leen tal cual; sólo se crean las que faltan.
  async fn migrate(&self,
                   root: &FileId,
                   legacy_id: FileId,
                   handles: &IndexMap<Partition, FileId>)
                   -> Result<Vec<(Partition, FileId, PartitionDocument)>, SyncError> {
    let cfg = &self.inner.config;
    info!("migrando {} al formato por particiones", cfg.legacy_file_name);
    let legacy = self.inner
                     .store
                     .read_file(&legacy_id)
                     .await
                     .map_err(SyncError::bootstrap("leer documento heredado"))?;
    let split = split_legacy(legacy).map_err(|e| SyncError::Bootstrap { stage: "migración",
                                                                        message: e.to_string() })?;

    let mut out = Vec::with_capacity(split.len());
    for (p, doc) in split {
      match handles.get(&p) {
        Some(id) => {
          warn!("partición {} ya existía: se conserva", p);
          let existing = self.read_partition(p, id)
                             .await
                             .map_err(SyncError::bootstrap("leer partición"))?;
          out.push((p, id.clone(), existing));
        }
        None => {
          let id = self.create_partition(root, &doc).await?;
          out.push((p, id, doc));
        }
      }
    }

    let quarantine = migrated_name(&cfg.legacy_file_name, &self.inner.clock.today());
    self.inner
        .store
        .rename_file(&legacy_id, &quarantine)
        .await
        .map_err(SyncError::bootstrap("renombrar documento heredado"))?;
    self.inner
        .status
        .notify(Notice::info(format!("Datos migrados a cuatro archivos; el original quedó como {}", quarantine)));
    Ok(out)
  }

  // --- Resincronización y reinicio ------------------------------------------

  /// Relee las cuatro particiones y sustituye el agregado. Desarma los
  /// temporizadores y descarta las mutaciones pendientes; si alguna lectura
  /// falla el agregado no cambia y los temporizadores se rearman.
  pub async fn force_sync(&self) -> Result<(), SyncError> {
    self.ensure_ready()?;
    for d in self.inner.debouncers.values() {
      d.cancel();
    }
    let mut guards = Vec::with_capacity(Partition::ALL.len());
    for p in Partition::ALL {
      if let Some(l) = self.inner.write_locks.get(&p) {
        guards.push(l.lock().await);
      }
    }

    let mut docs = Vec::with_capacity(Partition::ALL.len());
    for (p, id) in self.file_handles() {
      match self.read_partition(p, &id).await {
        Ok(doc) => docs.push(doc),
        Err(source) => {
          drop(guards);
          for pending in self.pending_partitions() {
            self.schedule_write(pending);
          }
          self.inner
              .status
              .notify(Notice::error(format!("No se pudo resincronizar {}: {}", p, source)).for_partition(p));
          return Err(SyncError::Read { partition: p, source });
        }
      }
    }

    {
      let mut agg = self.lock_aggregate()?;
      for doc in docs {
        let p = doc.partition();
        agg.install(doc);
        if let Some(mut slot) = self.inner.slots.get_mut(&p) {
          slot.revision += 1;
          slot.pending = false;
          slot.error = None;
        }
      }
    }
    drop(guards);
    info!("resincronización completa");
    self.refresh_status();
    Ok(())
  }

  /// Fin de sesión: desarma temporizadores, vacía el agregado y olvida los
  /// handles. Los accesores devuelven `NotReady` hasta el próximo `init`.
  pub fn reset(&self) {
    for d in self.inner.debouncers.values() {
      d.cancel();
    }
    self.inner.ready.store(false, Ordering::SeqCst);
    match self.inner.aggregate.lock() {
      Ok(mut agg) => *agg = Aggregate::default(),
      Err(poisoned) => *poisoned.into_inner() = Aggregate::default(),
    }
    match self.inner.root.lock() {
      Ok(mut root) => *root = None,
      Err(poisoned) => *poisoned.into_inner() = None,
    }
    for mut slot in self.inner.slots.iter_mut() {
      let revision = slot.revision + 1;
      *slot = PartitionSlot { revision,
                              ..PartitionSlot::default() };
    }
    self.refresh_status();
    info!("sesión reiniciada");
  }
}
