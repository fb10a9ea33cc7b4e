mod common;

use common::{Harness, ROOT};
use docstore::{InMemoryDocumentStore, StoreOp};
use erp_sync::{NoticeLevel, Partition, PartitionPhase, SyncConfig, SyncError, WriteState};
use serde_json::json;
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

const PARTITION_FILES: [&str; 4] = ["erp_config.json", "erp_crm.json", "erp_finance.json", "erp_operations.json"];

#[tokio::test(start_paused = true)]
async fn empty_store_bootstraps_defaults() {
  let h = Harness::without_backups();
  assert_ok!(h.engine.init().await);

  for name in PARTITION_FILES {
    assert!(h.store.find_by_name(&h.root(), name).is_some(), "falta {}", name);
  }
  let config = h.store.content(&h.file("erp_config.json")).unwrap();
  assert_eq!(config["settings"]["currency"], json!("CVE"));
  assert_eq!(config["categories"].as_array().unwrap().len(), 19);

  assert_eq!(h.engine.settings().get().unwrap().currency, "CVE");
  assert_eq!(h.engine.categories().len().unwrap(), 19);
  assert!(h.engine.transactions().get_all().unwrap().is_empty());
  assert_eq!(h.engine.partition_state(Partition::Crm), (PartitionPhase::Ready, WriteState::Idle));
  assert!(h.store.writes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn existing_partitions_are_loaded_not_recreated() {
  let store = Arc::new(InMemoryDocumentStore::new());
  let root = store.seed_folder(ROOT, None).unwrap();
  store.seed_file(&root, "erp_crm.json", json!({"clients": [{"id": "c1", "name": "Ana"}], "lastSync": 1700000000000i64}))
       .unwrap();
  store.seed_file(&root, "erp_finance.json", json!({"transactions": [{"id": 1, "description": "Renda"}]}))
       .unwrap();

  let h = Harness::with_store(store, SyncConfig::default().without_backups());
  assert_ok!(h.engine.init().await);

  assert_eq!(h.engine.clients().get_all().unwrap()[0].name, "Ana");
  assert_eq!(h.engine.transactions().get_all().unwrap()[0].description, "Renda");
  let created: Vec<String> = h.store
                              .operations()
                              .into_iter()
                              .filter_map(|op| match op {
                                StoreOp::Create { name, .. } => Some(name),
                                _ => None,
                              })
                              .collect();
  assert_eq!(created, vec!["erp_config.json".to_string(), "erp_operations.json".to_string()]);
  assert_eq!(h.engine.last_sync().map(|t| t.timestamp_millis()), Some(1700000000000));
}

#[tokio::test(start_paused = true)]
async fn null_fields_in_a_partition_file_do_not_block_init() {
  let store = Arc::new(InMemoryDocumentStore::new());
  let root = store.seed_folder(ROOT, None).unwrap();
  store.seed_file(&root,
                  "erp_finance.json",
                  json!({"invoices": [{"id": 1, "status": "Emitida", "total": 1000, "notes": null, "clientNif": null}],
                         "purchases": null}))
       .unwrap();

  let h = Harness::with_store(store, SyncConfig::default().without_backups());
  assert_ok!(h.engine.init().await);

  let invoices = h.engine.invoices().get_all().unwrap();
  assert_eq!(invoices[0].total, 1000.0);
  assert_eq!(invoices[0].notes, "");
  assert!(h.engine.purchases().get_all().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn null_fields_in_the_legacy_document_are_migrated() {
  let store = Arc::new(InMemoryDocumentStore::new());
  let root = store.seed_folder(ROOT, None).unwrap();
  let legacy = json!({
    "settings": {"companyName": "Frio Lda", "vatRate": null},
    "transactions": [{"id": 1, "description": "Renda", "expense": 25000, "income": null, "categoryId": null}],
    "devNotes": null,
    "materials": null,
    "lastSync": null
  });
  store.seed_file(&root, "erp_database.json", legacy).unwrap();

  let h = Harness::with_store(store, SyncConfig::default().without_backups());
  assert_ok!(h.engine.init().await);

  assert_eq!(h.engine.transactions().get_all().unwrap()[0].income, 0.0);
  assert_eq!(h.engine.settings().get().unwrap().vat_rate, 15.0);
  assert!(h.engine.dev_notes().get_all().unwrap().is_empty());
  assert!(h.store.find_by_name(&h.root(), "erp_database.json.migrated-2026-10-19.bak").is_some());
  let config = h.store.content(&h.file("erp_config.json")).unwrap();
  assert_eq!(config["devNotes"], json!([]));
}

#[tokio::test(start_paused = true)]
async fn legacy_document_is_split_and_quarantined() {
  let store = Arc::new(InMemoryDocumentStore::new());
  let root = store.seed_folder(ROOT, None).unwrap();
  let legacy = json!({
    "settings": {"companyName": "Frio Lda", "currency": "CVE"},
    "transactions": [{"id": 1, "description": "Test", "income": 100}],
    "clients": [{"id": 2, "name": "Hotel Praia"}],
    "proposals": [{"id": 3, "number": "PROP-2025-004"}],
    "invoices": [{"id": 4, "number": "FT 2025/0009", "status": "Emitida", "total": 1000}],
    "lastSync": 1690000000000i64
  });
  let legacy_id = store.seed_file(&root, "erp_database.json", legacy).unwrap();

  let h = Harness::with_store(store, SyncConfig::default().without_backups());
  assert_ok!(h.engine.init().await);

  let root = h.root();
  assert!(h.store.find_by_name(&root, "erp_database.json").is_none());
  let quarantined = h.store.find_by_name(&root, "erp_database.json.migrated-2026-10-19.bak").unwrap();
  assert_eq!(quarantined.id, legacy_id);
  assert!(h.store.content(&legacy_id).is_some());

  let finance = h.store.content(&h.file("erp_finance.json")).unwrap();
  assert_eq!(finance["transactions"][0]["description"], json!("Test"));
  assert_eq!(finance["invoices"][0]["status"], json!("Emitida"));
  assert!(finance.get("clients").is_none());
  let crm = h.store.content(&h.file("erp_crm.json")).unwrap();
  assert_eq!(crm["clients"][0]["name"], json!("Hotel Praia"));
  let ops = h.store.content(&h.file("erp_operations.json")).unwrap();
  assert_eq!(ops["proposals"][0]["number"], json!("PROP-2025-004"));
  let config = h.store.content(&h.file("erp_config.json")).unwrap();
  assert_eq!(config["settings"]["companyName"], json!("Frio Lda"));

  // cargado directamente desde el reparto, sin releer los archivos nuevos
  assert!(!h.store.operations().iter().any(|op| matches!(op, StoreOp::Read { id } if *id != legacy_id)));
  assert_eq!(h.engine.settings().get().unwrap().company_name, "Frio Lda");
  assert!(h.notices().iter().any(|n| n.level == NoticeLevel::Info));
}

#[tokio::test(start_paused = true)]
async fn interrupted_migration_resumes_without_overwriting() {
  let store = Arc::new(InMemoryDocumentStore::new());
  let root = store.seed_folder(ROOT, None).unwrap();
  store.seed_file(&root, "erp_database.json", json!({"clients": [{"id": 1, "name": "Antigo"}], "materials": []}))
       .unwrap();
  store.seed_file(&root, "erp_crm.json", json!({"clients": [{"id": 1, "name": "Já migrado"}]})).unwrap();

  let h = Harness::with_store(store, SyncConfig::default().without_backups());
  assert_ok!(h.engine.init().await);

  assert_eq!(h.engine.clients().get_all().unwrap()[0].name, "Já migrado");
  assert_eq!(h.store.content(&h.file("erp_crm.json")).unwrap()["clients"][0]["name"], json!("Já migrado"));
  assert!(h.store.find_by_name(&h.root(), "erp_database.json").is_none());
  for name in PARTITION_FILES {
    assert!(h.store.find_by_name(&h.root(), name).is_some());
  }
}

#[tokio::test(start_paused = true)]
async fn legacy_next_to_all_partitions_is_left_alone() {
  let store = Arc::new(InMemoryDocumentStore::new());
  let root = store.seed_folder(ROOT, None).unwrap();
  for name in PARTITION_FILES {
    store.seed_file(&root, name, json!({})).unwrap();
  }
  store.seed_file(&root, "erp_database.json", json!({"clients": [{"id": 1}]})).unwrap();

  let h = Harness::with_store(store, SyncConfig::default().without_backups());
  assert_ok!(h.engine.init().await);
  assert!(h.engine.clients().get_all().unwrap().is_empty());
  assert!(h.store.find_by_name(&h.root(), "erp_database.json").is_some());
}

#[tokio::test(start_paused = true)]
async fn broken_legacy_document_fails_bootstrap() {
  let store = Arc::new(InMemoryDocumentStore::new());
  let root = store.seed_folder(ROOT, None).unwrap();
  store.seed_file(&root, "erp_database.json", json!(["not", "an", "object"])).unwrap();

  let h = Harness::with_store(store, SyncConfig::default().without_backups());
  let err = h.engine.init().await.unwrap_err();
  assert!(matches!(err, SyncError::Bootstrap { stage: "migración", .. }));
  assert!(h.store.find_by_name(&h.root(), "erp_database.json").is_some());
}

#[tokio::test(start_paused = true)]
async fn unreachable_store_is_a_critical_bootstrap_error() {
  let h = Harness::without_backups();
  h.store.set_authenticated(false);

  let err = h.engine.init().await.unwrap_err();
  assert!(matches!(err, SyncError::Bootstrap { .. }));
  assert!(!h.engine.is_ready());
  assert!(matches!(h.engine.clients().get_all(), Err(SyncError::NotReady)));
  assert_eq!(h.engine.partition_state(Partition::Config).0, PartitionPhase::Uninitialized);
  assert!(h.notices().iter().any(|n| n.level == NoticeLevel::Error));

  h.store.set_authenticated(true);
  assert_ok!(h.engine.init().await);
  assert!(h.engine.is_ready());
}

#[tokio::test(start_paused = true)]
async fn init_is_idempotent_and_reset_requires_new_init() {
  let h = Harness::without_backups();
  assert_ok!(h.engine.init().await);
  let ops = h.store.operations().len();
  assert_ok!(h.engine.init().await);
  assert_eq!(h.store.operations().len(), ops);

  h.engine.reset();
  assert!(!h.engine.is_ready());
  assert_err!(h.engine.transactions().get_all());
  assert!(h.engine.last_sync().is_none());

  assert_ok!(h.engine.init().await);
  assert_eq!(h.engine.categories().len().unwrap(), 19);
}
