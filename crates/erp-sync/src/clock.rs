// Archivo: clock.rs
// Propósito: fuente de tiempo inyectable para sellar `updatedAt`,
// `lastSync` y la fecha de los backups.
use chrono::{DateTime, Utc};
use std::sync::Mutex;

pub trait Clock: Send + Sync {
  fn now(&self) -> DateTime<Utc>;

  /// Fecha del día en formato `YYYY-MM-DD`.
  fn today(&self) -> String {
    self.now().format("%Y-%m-%d").to_string()
  }
}

/// Reloj del sistema.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> {
    Utc::now()
  }
}

/// Reloj controlado manualmente (pruebas y demos deterministas).
#[derive(Debug)]
pub struct ManualClock {
  now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
  pub fn new(at: DateTime<Utc>) -> Self {
    Self { now: Mutex::new(at) }
  }

  pub fn set(&self, at: DateTime<Utc>) {
    *self.now.lock().unwrap_or_else(|e| e.into_inner()) = at;
  }

  pub fn advance(&self, by: chrono::Duration) {
    let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
    *now += by;
  }
}

impl Clock for ManualClock {
  fn now(&self) -> DateTime<Utc> {
    *self.now.lock().unwrap_or_else(|e| e.into_inner())
  }
}
