// Archivo: collections.rs
// Propósito: accesores por colección (`get_all`/`save`) y generadores de
// códigos derivados del contenido en memoria.
use crate::documents::Aggregate;
use crate::engine::SyncEngine;
use crate::errors::SyncError;
use crate::partition::Collection;
use chrono::Datelike;
use erp_domain::sequence::{next_invoice_number, next_material_code, next_numeric_id, next_proposal_number};
use erp_domain::{Entity, MaterialKind, RecordId, Settings};
use std::marker::PhantomData;

/// Enlaza un tipo marcador con una colección del agregado.
pub trait CollectionKey: Send + Sync + 'static {
  type Record: Entity;
  const COLLECTION: Collection;

  fn list(agg: &Aggregate) -> &Vec<Self::Record>;
  fn list_mut(agg: &mut Aggregate) -> &mut Vec<Self::Record>;
}

macro_rules! collection_keys {
  ($($key:ident => $record:ty, $doc:ident . $field:ident;)*) => {
    $(
      #[derive(Debug, Clone, Copy)]
      pub struct $key;

      impl CollectionKey for $key {
        type Record = $record;
        const COLLECTION: Collection = Collection::$key;

        fn list(agg: &Aggregate) -> &Vec<$record> {
          &agg.$doc.$field
        }

        fn list_mut(agg: &mut Aggregate) -> &mut Vec<$record> {
          &mut agg.$doc.$field
        }
      }
    )*
  };
}

/// Marcadores de colección (uno por colección de lista).
pub mod keys {
  use super::{Aggregate, Collection, CollectionKey};
  use erp_domain::{Appointment, BankTransaction, Category, Client, DevNote, Document, Employee, Invoice, Material,
                   Proposal, Purchase, RecurringContract, RecurringPurchase, StockMovement, Template, Transaction,
                   User};

  collection_keys! {
    Users => User, config.users;
    Categories => Category, config.categories;
    Templates => Template, config.templates;
    DevNotes => DevNote, config.dev_notes;
    Clients => Client, crm.clients;
    Employees => Employee, crm.employees;
    Transactions => Transaction, finance.transactions;
    BankTransactions => BankTransaction, finance.bank_transactions;
    Invoices => Invoice, finance.invoices;
    Purchases => Purchase, finance.purchases;
    RecurringPurchases => RecurringPurchase, finance.recurring_purchases;
    RecurringContracts => RecurringContract, finance.recurring_contracts;
    Proposals => Proposal, operations.proposals;
    Materials => Material, operations.materials;
    StockMovements => StockMovement, operations.stock_movements;
    Appointments => Appointment, operations.appointments;
    Documents => Document, operations.documents;
  }
}

/// Accesor de una colección. No hace E/S: `save` sólo muta la memoria y
/// programa la escritura diferida.
pub struct CollectionHandle<'a, K: CollectionKey> {
  engine: &'a SyncEngine,
  _key: PhantomData<K>,
}

impl<'a, K: CollectionKey> CollectionHandle<'a, K> {
  pub(crate) fn new(engine: &'a SyncEngine) -> Self {
    Self { engine,
           _key: PhantomData }
  }

  pub fn get_all(&self) -> Result<Vec<K::Record>, SyncError> {
    self.engine.read(|agg| K::list(agg).clone())
  }

  /// Registros sin borrado lógico.
  pub fn get_active(&self) -> Result<Vec<K::Record>, SyncError> {
    self.engine
        .read(|agg| K::list(agg).iter().filter(|r| !r.is_deleted()).cloned().collect())
  }

  pub fn get(&self, id: &RecordId) -> Result<Option<K::Record>, SyncError> {
    self.engine.read(|agg| K::list(agg).iter().find(|r| r.id() == id).cloned())
  }

  pub fn len(&self) -> Result<usize, SyncError> {
    self.engine.read(|agg| K::list(agg).len())
  }

  pub fn is_empty(&self) -> Result<bool, SyncError> {
    Ok(self.len()? == 0)
  }

  /// Sustituye la colección completa. Devuelve la lista que se persistirá
  /// (con sellos de tiempo y con los registros protegidos restaurados).
  pub fn save(&self, records: Vec<K::Record>) -> Result<Vec<K::Record>, SyncError> {
    self.engine.save_collection::<K>(records)
  }

  /// Próximo id numérico (máximo + 1).
  pub fn next_id(&self) -> Result<i64, SyncError> {
    self.engine.read(|agg| next_numeric_id(K::list(agg)))
  }
}

impl CollectionHandle<'_, keys::Materials> {
  /// Próximo código del catálogo para `kind` (`M000001`, `S000001`).
  pub fn next_code(&self, kind: &MaterialKind) -> Result<String, SyncError> {
    self.engine.read(|agg| next_material_code(&agg.operations.materials, kind))
  }
}

impl CollectionHandle<'_, keys::Invoices> {
  /// Próximo número de factura en la serie configurada.
  pub fn next_number(&self, year: i32) -> Result<String, SyncError> {
    self.engine.read(|agg| {
                 let series = match agg.config.settings.invoice_series.trim() {
                   "" => "FT",
                   s => s,
                 };
                 next_invoice_number(&agg.finance.invoices, series, year)
               })
  }
}

impl CollectionHandle<'_, keys::Proposals> {
  pub fn next_number(&self, year: i32) -> Result<String, SyncError> {
    self.engine.read(|agg| next_proposal_number(&agg.operations.proposals, year))
  }
}

/// Accesor del objeto único de configuración.
pub struct SettingsHandle<'a> {
  engine: &'a SyncEngine,
}

impl<'a> SettingsHandle<'a> {
  pub(crate) fn new(engine: &'a SyncEngine) -> Self {
    Self { engine }
  }

  pub fn get(&self) -> Result<Settings, SyncError> {
    self.engine.read(|agg| agg.config.settings.clone())
  }

  pub fn save(&self, settings: Settings) -> Result<Settings, SyncError> {
    self.engine.save_settings(settings)
  }
}

macro_rules! engine_accessors {
  ($($name:ident => $key:ident;)*) => {
    impl SyncEngine {
      pub fn settings(&self) -> SettingsHandle<'_> {
        SettingsHandle::new(self)
      }

      $(
        pub fn $name(&self) -> CollectionHandle<'_, keys::$key> {
          CollectionHandle::new(self)
        }
      )*

      /// Año en curso según el reloj del motor (para la numeración).
      pub fn current_year(&self) -> i32 {
        self.inner.clock.now().year()
      }
    }
  };
}

engine_accessors! {
  users => Users;
  categories => Categories;
  templates => Templates;
  dev_notes => DevNotes;
  clients => Clients;
  employees => Employees;
  transactions => Transactions;
  bank_transactions => BankTransactions;
  invoices => Invoices;
  purchases => Purchases;
  recurring_purchases => RecurringPurchases;
  recurring_contracts => RecurringContracts;
  proposals => Proposals;
  materials => Materials;
  stock_movements => StockMovements;
  appointments => Appointments;
  documents => Documents;
}
