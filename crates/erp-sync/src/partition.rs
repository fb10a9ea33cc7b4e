// Archivo: partition.rs
// Propósito: tabla estática colección -> partición. La pertenencia se
// resuelve con un `match` exhaustivo: añadir una colección sin asignarle
// partición no compila.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Uno de los cuatro documentos remotos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Partition {
  Config,
  Crm,
  Finance,
  Operations,
}

impl Partition {
  pub const ALL: [Partition; 4] = [Partition::Config, Partition::Crm, Partition::Finance, Partition::Operations];

  /// Colecciones persistidas juntas en esta partición, en el orden del
  /// documento.
  pub fn collections(self) -> &'static [Collection] {
    match self {
      Partition::Config => &[Collection::Settings,
                             Collection::Users,
                             Collection::Categories,
                             Collection::Templates,
                             Collection::DevNotes],
      Partition::Crm => &[Collection::Clients, Collection::Employees],
      Partition::Finance => &[Collection::Transactions,
                              Collection::BankTransactions,
                              Collection::Invoices,
                              Collection::Purchases,
                              Collection::RecurringPurchases,
                              Collection::RecurringContracts],
      Partition::Operations => &[Collection::Proposals,
                                 Collection::Materials,
                                 Collection::StockMovements,
                                 Collection::Appointments,
                                 Collection::Documents],
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Partition::Config => "config",
      Partition::Crm => "crm",
      Partition::Finance => "finance",
      Partition::Operations => "operations",
    }
  }
}

impl fmt::Display for Partition {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// Colección de entidades con nombre.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
  Settings,
  Users,
  Categories,
  Templates,
  DevNotes,
  Clients,
  Employees,
  Transactions,
  BankTransactions,
  Invoices,
  Purchases,
  RecurringPurchases,
  RecurringContracts,
  Proposals,
  Materials,
  StockMovements,
  Appointments,
  Documents,
}

impl Collection {
  pub const ALL: [Collection; 18] = [Collection::Settings,
                                     Collection::Users,
                                     Collection::Categories,
                                     Collection::Templates,
                                     Collection::DevNotes,
                                     Collection::Clients,
                                     Collection::Employees,
                                     Collection::Transactions,
                                     Collection::BankTransactions,
                                     Collection::Invoices,
                                     Collection::Purchases,
                                     Collection::RecurringPurchases,
                                     Collection::RecurringContracts,
                                     Collection::Proposals,
                                     Collection::Materials,
                                     Collection::StockMovements,
                                     Collection::Appointments,
                                     Collection::Documents];

  pub fn partition(self) -> Partition {
    match self {
      Collection::Settings
      | Collection::Users
      | Collection::Categories
      | Collection::Templates
      | Collection::DevNotes => Partition::Config,
      Collection::Clients | Collection::Employees => Partition::Crm,
      Collection::Transactions
      | Collection::BankTransactions
      | Collection::Invoices
      | Collection::Purchases
      | Collection::RecurringPurchases
      | Collection::RecurringContracts => Partition::Finance,
      Collection::Proposals
      | Collection::Materials
      | Collection::StockMovements
      | Collection::Appointments
      | Collection::Documents => Partition::Operations,
    }
  }

  /// Nombre del campo en los documentos JSON.
  pub fn field_name(self) -> &'static str {
    match self {
      Collection::Settings => "settings",
      Collection::Users => "users",
      Collection::Categories => "categories",
      Collection::Templates => "templates",
      Collection::DevNotes => "devNotes",
      Collection::Clients => "clients",
      Collection::Employees => "employees",
      Collection::Transactions => "transactions",
      Collection::BankTransactions => "bankTransactions",
      Collection::Invoices => "invoices",
      Collection::Purchases => "purchases",
      Collection::RecurringPurchases => "recurringPurchases",
      Collection::RecurringContracts => "recurringContracts",
      Collection::Proposals => "proposals",
      Collection::Materials => "materials",
      Collection::StockMovements => "stockMovements",
      Collection::Appointments => "appointments",
      Collection::Documents => "documents",
    }
  }

  pub fn from_field_name(name: &str) -> Option<Collection> {
    Collection::ALL.into_iter().find(|c| c.field_name() == name)
  }
}

impl fmt::Display for Collection {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.field_name())
  }
}
