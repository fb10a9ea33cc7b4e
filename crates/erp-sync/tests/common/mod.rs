#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use docstore::{FileId, InMemoryDocumentStore};
use erp_sync::{ManualClock, Notice, SyncConfig, SyncEngine, SyncStatus};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const ROOT: &str = "ERP_Data";

pub struct Harness {
  pub store: Arc<InMemoryDocumentStore>,
  pub clock: Arc<ManualClock>,
  pub engine: SyncEngine,
  pub notices: Arc<Mutex<Vec<Notice>>>,
  pub statuses: Arc<Mutex<Vec<SyncStatus>>>,
}

impl Harness {
  pub fn new() -> Self {
    Self::with_store(Arc::new(InMemoryDocumentStore::new()), SyncConfig::default())
  }

  pub fn without_backups() -> Self {
    Self::with_store(Arc::new(InMemoryDocumentStore::new()), SyncConfig::default().without_backups())
  }

  pub fn with_store(store: Arc<InMemoryDocumentStore>, config: SyncConfig) -> Self {
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap()));
    let engine = SyncEngine::with_clock(store.clone(), config, clock.clone());
    let notices = Arc::new(Mutex::new(Vec::new()));
    let statuses = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&notices);
    engine.set_notifier(move |n: &Notice| sink.lock().unwrap().push(n.clone()));
    let sink = Arc::clone(&statuses);
    engine.on_sync_change(move |s| sink.lock().unwrap().push(s));
    Self { store,
           clock,
           engine,
           notices,
           statuses }
  }

  pub fn root(&self) -> FileId {
    self.store.root_folder(ROOT).expect("root folder")
  }

  pub fn file(&self, name: &str) -> FileId {
    self.store.find_by_name(&self.root(), name).expect(name).id
  }

  pub fn notices(&self) -> Vec<Notice> {
    self.notices.lock().unwrap().clone()
  }

  pub fn statuses(&self) -> Vec<SyncStatus> {
    self.statuses.lock().unwrap().clone()
  }
}

/// Deja pasar la ventana de debounce (reloj de tokio en pausa).
pub async fn settle() {
  tokio::time::sleep(Duration::from_millis(2_100)).await;
}
