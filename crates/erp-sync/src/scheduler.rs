// Archivo: scheduler.rs
// Propósito: temporizador con semántica cancelar-y-reprogramar.
//
// Cada `schedule` invalida el temporizador anterior; sólo la última tarea
// programada llega a ejecutarse, `delay` después de la última llamada.
// Una tarea que ya empezó a ejecutarse no se cancela.
use log::warn;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;

#[derive(Debug, Default)]
struct DebounceSlot {
  generation: u64,
  timer: Option<AbortHandle>,
}

#[derive(Debug)]
pub struct Debouncer {
  delay: Duration,
  slot: Arc<Mutex<DebounceSlot>>,
}

fn lock(slot: &Mutex<DebounceSlot>) -> MutexGuard<'_, DebounceSlot> {
  slot.lock().unwrap_or_else(|e| e.into_inner())
}

impl Debouncer {
  pub fn new(delay: Duration) -> Self {
    Self { delay,
           slot: Arc::new(Mutex::new(DebounceSlot::default())) }
  }

  pub fn delay(&self) -> Duration {
    self.delay
  }

  /// (Re)arma el temporizador. Devuelve `false` si no hay un runtime de
  /// tokio disponible; en ese caso no se programa nada.
  pub fn schedule<F, Fut>(&self, task: F) -> bool
    where F: FnOnce() -> Fut + Send + 'static,
          Fut: Future<Output = ()> + Send + 'static
  {
    let Ok(handle) = Handle::try_current() else {
      warn!("sin runtime de tokio: escritura diferida no programada");
      return false;
    };
    let mut slot = lock(&self.slot);
    if let Some(timer) = slot.timer.take() {
      timer.abort();
    }
    slot.generation += 1;
    let generation = slot.generation;
    let shared = Arc::clone(&self.slot);
    let delay = self.delay;
    let join = handle.spawn(async move {
                       tokio::time::sleep(delay).await;
                       {
                         let mut slot = lock(&shared);
                         if slot.generation != generation {
                           return;
                         }
                         slot.timer = None;
                       }
                       task().await;
                     });
    slot.timer = Some(join.abort_handle());
    true
  }

  /// Desarma el temporizador pendiente, si lo hay.
  pub fn cancel(&self) -> bool {
    let mut slot = lock(&self.slot);
    slot.generation += 1;
    match slot.timer.take() {
      Some(timer) => {
        timer.abort();
        true
      }
      None => false,
    }
  }

  pub fn is_armed(&self) -> bool {
    lock(&self.slot).timer.is_some()
  }
}

impl Drop for Debouncer {
  fn drop(&mut self) {
    self.cancel();
  }
}
