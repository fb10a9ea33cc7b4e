#[macro_use]
mod record;
mod config;
mod crm;
pub mod defaults;
mod errors;
mod finance;
mod operations;
pub mod sequence;

pub use config::{Category, CategoryKind, DevNote, Settings, Template, User};
pub use crm::{Client, Employee};
pub use errors::DomainError;
pub use finance::{BankTransaction, Invoice, InvoiceStatus, LineItem, Purchase, RecurringContract, RecurringPurchase,
                  Transaction};
pub use operations::{Appointment, Document, Material, MaterialKind, Proposal, StockMovement};
pub use record::{ensure_unique_ids, null_as_default, Entity, RecordId, RecordMeta};
