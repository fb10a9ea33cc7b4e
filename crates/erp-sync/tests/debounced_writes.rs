mod common;

use common::{settle, Harness};
use docstore::DocumentStore;
use erp_domain::{Client, RecordId, Transaction};
use erp_sync::{NoticeLevel, Partition, PartitionPhase, SyncError, SyncStatus, WriteState};
use serde_json::json;
use std::time::Duration;
use tokio_test::assert_ok;

fn tx(id: i64, description: &str, income: f64) -> Transaction {
  Transaction { id: RecordId::Number(id),
                description: description.into(),
                income,
                ..Default::default() }
}

#[tokio::test(start_paused = true)]
async fn saved_transaction_is_written_once_to_finance() {
  let h = Harness::without_backups();
  assert_ok!(h.engine.init().await);

  let saved = h.engine.transactions().save(vec![tx(1, "Test", 100.0)]).unwrap();
  assert_eq!(saved.len(), 1);
  assert!(saved[0].meta.updated_at.is_some());
  let all = h.engine.transactions().get_all().unwrap();
  assert_eq!(all, saved);
  assert!(h.store.writes().is_empty());
  assert_eq!(h.engine.status(), SyncStatus::Saving);

  settle().await;

  let writes = h.store.writes();
  assert_eq!(writes.len(), 1);
  assert_eq!(writes[0].0, h.file("erp_finance.json"));
  assert_eq!(writes[0].1["transactions"][0]["description"], json!("Test"));
  assert_eq!(writes[0].1["transactions"][0]["income"], json!(100.0));
  assert!(writes[0].1["lastSync"].as_i64().unwrap() > 0);
  assert_eq!(h.engine.status(), SyncStatus::Saved);
  assert_eq!(h.statuses(), vec![SyncStatus::Saving, SyncStatus::Saved]);
  assert!(h.engine.pending_partitions().is_empty());
  assert!(h.engine.last_sync().is_some());
}

#[tokio::test(start_paused = true)]
async fn identical_save_keeps_timestamps() {
  let h = Harness::without_backups();
  assert_ok!(h.engine.init().await);

  let first = h.engine.transactions().save(vec![tx(1, "A", 10.0), tx(2, "B", 20.0)]).unwrap();
  h.clock.advance(chrono::Duration::minutes(5));
  let second = h.engine.transactions().save(first.clone()).unwrap();
  assert_eq!(first, second);

  // la misma lista recién construida (sin sellos) tampoco cambia nada
  let third = h.engine.transactions().save(vec![tx(1, "A", 10.0), tx(2, "B", 20.0)]).unwrap();
  assert_eq!(third, first);

  let mut edited = first.clone();
  edited[1].income = 25.0;
  let fourth = h.engine.transactions().save(edited).unwrap();
  assert_eq!(fourth[0], first[0]);
  assert_ne!(fourth[1].meta.updated_at, first[1].meta.updated_at);
  assert_eq!(fourth[1].meta.created_at, first[1].meta.created_at);
}

#[tokio::test(start_paused = true)]
async fn rapid_mutations_coalesce_into_one_write_with_final_state() {
  let h = Harness::without_backups();
  assert_ok!(h.engine.init().await);
  let finance = h.file("erp_finance.json");

  let mut list = Vec::new();
  for i in 1..=5 {
    list.push(tx(i, &format!("mov {}", i), i as f64));
    h.engine.transactions().save(list.clone()).unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;
  }
  assert_eq!(h.store.write_count(&finance), 0);

  settle().await;
  assert_eq!(h.store.write_count(&finance), 1);
  let written = &h.store.writes()[0].1;
  assert_eq!(written["transactions"].as_array().unwrap().len(), 5);
  assert_eq!(written["transactions"][4]["description"], json!("mov 5"));
}

#[tokio::test(start_paused = true)]
async fn sibling_collections_share_the_partition_timer() {
  let h = Harness::without_backups();
  assert_ok!(h.engine.init().await);

  h.engine.transactions().save(vec![tx(1, "A", 1.0)]).unwrap();
  tokio::time::sleep(Duration::from_millis(1_000)).await;
  h.engine.purchases().save(Vec::new()).unwrap();
  tokio::time::sleep(Duration::from_millis(1_500)).await;
  assert!(h.store.writes().is_empty());
  settle().await;
  assert_eq!(h.store.writes().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn finance_mutation_leaves_other_partitions_untouched() {
  let h = Harness::without_backups();
  assert_ok!(h.engine.init().await);

  h.engine.transactions().save(vec![tx(1, "A", 1.0)]).unwrap();
  assert_eq!(h.engine.pending_partitions(), vec![Partition::Finance]);
  for p in [Partition::Config, Partition::Crm, Partition::Operations] {
    assert_eq!(h.engine.partition_state(p), (PartitionPhase::Ready, WriteState::Idle));
  }
  assert_eq!(h.engine.partition_state(Partition::Finance).1, WriteState::Pending);

  settle().await;
  let written: Vec<_> = h.store.writes().into_iter().map(|(id, _)| id).collect();
  assert_eq!(written, vec![h.file("erp_finance.json")]);
}

#[tokio::test(start_paused = true)]
async fn partitions_write_independently() {
  let h = Harness::without_backups();
  assert_ok!(h.engine.init().await);

  h.engine.transactions().save(vec![tx(1, "A", 1.0)]).unwrap();
  tokio::time::sleep(Duration::from_millis(1_500)).await;
  h.engine
   .clients()
   .save(vec![Client { id: RecordId::Text("c1".into()),
                       name: "Ana".into(),
                       ..Default::default() }])
   .unwrap();
  // Finance no se reprograma por la mutación en CRM
  tokio::time::sleep(Duration::from_millis(600)).await;
  assert_eq!(h.store.write_count(&h.file("erp_finance.json")), 1);
  assert_eq!(h.store.write_count(&h.file("erp_crm.json")), 0);
  settle().await;
  assert_eq!(h.store.write_count(&h.file("erp_crm.json")), 1);
}

#[tokio::test(start_paused = true)]
async fn failed_write_reports_error_and_next_mutation_retries() {
  let h = Harness::without_backups();
  assert_ok!(h.engine.init().await);
  let finance = h.file("erp_finance.json");

  h.store.set_fail_updates(true);
  h.engine.transactions().save(vec![tx(1, "A", 1.0)]).unwrap();
  settle().await;

  assert_eq!(h.statuses(), vec![SyncStatus::Saving, SyncStatus::Error]);
  assert_eq!(h.engine.partition_state(Partition::Finance).1, WriteState::WriteError);
  assert_eq!(h.engine.pending_partitions(), vec![Partition::Finance]);
  assert!(h.notices()
           .iter()
           .any(|n| n.level == NoticeLevel::Error && n.partition == Some(Partition::Finance)));
  assert_eq!(h.store.update_attempts(&finance), 1);

  // sin reintento automático
  settle().await;
  assert_eq!(h.store.update_attempts(&finance), 1);

  h.store.set_fail_updates(false);
  h.engine.transactions().save(vec![tx(1, "A", 1.0), tx(2, "B", 2.0)]).unwrap();
  assert_eq!(h.engine.status(), SyncStatus::Saving);
  settle().await;
  assert_eq!(h.store.update_attempts(&finance), 2);
  assert_eq!(h.store.write_count(&finance), 1);
  assert_eq!(h.engine.status(), SyncStatus::Saved);
  assert!(h.engine.pending_partitions().is_empty());
}

#[tokio::test(start_paused = true)]
async fn mutation_during_write_is_written_afterwards() {
  let h = Harness::without_backups();
  assert_ok!(h.engine.init().await);
  let finance = h.file("erp_finance.json");
  h.store.set_update_delay(Some(Duration::from_secs(3)));

  h.engine.transactions().save(vec![tx(1, "A", 1.0)]).unwrap();
  settle().await;
  assert_eq!(h.engine.partition_state(Partition::Finance).1, WriteState::Writing);

  h.engine.transactions().save(vec![tx(1, "A", 1.0), tx(2, "B", 2.0)]).unwrap();
  tokio::time::sleep(Duration::from_secs(10)).await;

  let writes: Vec<_> = h.store.writes().into_iter().filter(|(id, _)| *id == finance).collect();
  assert_eq!(writes.len(), 2);
  assert_eq!(writes[0].1["transactions"].as_array().unwrap().len(), 1);
  assert_eq!(writes[1].1["transactions"].as_array().unwrap().len(), 2);
  assert!(h.engine.pending_partitions().is_empty());
  assert_eq!(h.engine.status(), SyncStatus::Saved);
}

#[tokio::test(start_paused = true)]
async fn flush_writes_pending_partitions_immediately() {
  let h = Harness::without_backups();
  assert_ok!(h.engine.init().await);

  h.engine.transactions().save(vec![tx(1, "A", 1.0)]).unwrap();
  h.engine.materials().save(Vec::new()).unwrap();
  assert_ok!(h.engine.flush().await);
  assert_eq!(h.store.writes().len(), 2);
  assert!(h.engine.pending_partitions().is_empty());

  // los temporizadores desarmados no vuelven a escribir
  settle().await;
  assert_eq!(h.store.writes().len(), 2);

  h.store.set_fail_updates(true);
  h.engine.transactions().save(Vec::new()).unwrap();
  let err = h.engine.flush().await.unwrap_err();
  assert!(matches!(err, SyncError::Write { partition: Partition::Finance, .. }));
}

#[tokio::test(start_paused = true)]
async fn force_sync_replaces_memory_with_remote_state() {
  let h = Harness::without_backups();
  assert_ok!(h.engine.init().await);
  let crm = h.file("erp_crm.json");

  h.engine.transactions().save(vec![tx(1, "local", 1.0)]).unwrap();
  // otro dispositivo escribió CRM
  assert_ok!(h.store.update_file(&crm, &json!({"clients": [{"id": 9, "name": "Remoto"}]})).await);
  h.store.clear_log();

  assert_ok!(h.engine.force_sync().await);
  assert_eq!(h.engine.clients().get_all().unwrap()[0].name, "Remoto");
  assert!(h.engine.transactions().get_all().unwrap().is_empty());
  assert!(h.engine.pending_partitions().is_empty());

  settle().await;
  assert!(h.store.writes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn failed_force_sync_keeps_local_state_and_rearms_writes() {
  let h = Harness::without_backups();
  assert_ok!(h.engine.init().await);

  h.engine.transactions().save(vec![tx(1, "local", 1.0)]).unwrap();
  h.store.set_fail_reads(true);
  let err = h.engine.force_sync().await.unwrap_err();
  assert!(matches!(err, SyncError::Read { partition: Partition::Config, .. }));
  assert_eq!(h.engine.transactions().get_all().unwrap()[0].description, "local");

  h.store.set_fail_reads(false);
  settle().await;
  assert_eq!(h.store.write_count(&h.file("erp_finance.json")), 1);
}
