// Archivo: status.rs
// Propósito: estado de sincronización observable y avisos al usuario.
use crate::partition::Partition;
use log::{error, info, warn};
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

/// Estado global de sincronización, derivado del estado de las particiones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
  #[default]
  Saved,
  Saving,
  Error,
}

impl fmt::Display for SyncStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      SyncStatus::Saved => "saved",
      SyncStatus::Saving => "saving",
      SyncStatus::Error => "error",
    };
    write!(f, "{}", s)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
  Info,
  Warning,
  Error,
}

/// Mensaje para el usuario (toast, diálogo, línea de consola).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
  pub level: NoticeLevel,
  pub message: String,
  pub partition: Option<Partition>,
}

impl Notice {
  pub fn info(message: impl Into<String>) -> Self {
    Self { level: NoticeLevel::Info,
           message: message.into(),
           partition: None }
  }

  pub fn warning(message: impl Into<String>) -> Self {
    Self { level: NoticeLevel::Warning,
           message: message.into(),
           partition: None }
  }

  pub fn error(message: impl Into<String>) -> Self {
    Self { level: NoticeLevel::Error,
           message: message.into(),
           partition: None }
  }

  pub fn for_partition(mut self, partition: Partition) -> Self {
    self.partition = Some(partition);
    self
  }
}

pub type Notifier = Arc<dyn Fn(&Notice) + Send + Sync>;
pub type StatusListener = Arc<dyn Fn(SyncStatus) + Send + Sync>;

/// Difusión de estado y avisos. Los callbacks se invocan siempre fuera de
/// los candados internos.
pub(crate) struct StatusHub {
  tx: watch::Sender<SyncStatus>,
  notifier: Mutex<Option<Notifier>>,
  listeners: Mutex<Vec<StatusListener>>,
}

impl StatusHub {
  pub(crate) fn new() -> Self {
    let (tx, _rx) = watch::channel(SyncStatus::Saved);
    Self { tx,
           notifier: Mutex::new(None),
           listeners: Mutex::new(Vec::new()) }
  }

  pub(crate) fn set_notifier(&self, notifier: Notifier) {
    *self.notifier.lock().unwrap_or_else(|e| e.into_inner()) = Some(notifier);
  }

  pub(crate) fn add_listener(&self, listener: StatusListener) {
    self.listeners.lock().unwrap_or_else(|e| e.into_inner()).push(listener);
  }

  pub(crate) fn subscribe(&self) -> watch::Receiver<SyncStatus> {
    self.tx.subscribe()
  }

  pub(crate) fn current(&self) -> SyncStatus {
    *self.tx.borrow()
  }

  /// Publica `status` si difiere del actual. Devuelve si hubo transición.
  pub(crate) fn publish(&self, status: SyncStatus) -> bool {
    let changed = self.tx.send_if_modified(|cur| {
                           if *cur == status {
                             false
                           } else {
                             *cur = status;
                             true
                           }
                         });
    if changed {
      let listeners = self.listeners.lock().unwrap_or_else(|e| e.into_inner()).clone();
      for l in listeners {
        l(status);
      }
    }
    changed
  }

  pub(crate) fn notify(&self, notice: Notice) {
    match notice.level {
      NoticeLevel::Info => info!("{}", notice.message),
      NoticeLevel::Warning => warn!("{}", notice.message),
      NoticeLevel::Error => error!("{}", notice.message),
    }
    let notifier = self.notifier.lock().unwrap_or_else(|e| e.into_inner()).clone();
    if let Some(n) = notifier {
      n(&notice);
    }
  }
}
