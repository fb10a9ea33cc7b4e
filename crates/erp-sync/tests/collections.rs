mod common;

use common::{settle, Harness};
use erp_domain::{Invoice, InvoiceStatus, LineItem, Material, MaterialKind, Proposal, RecordId, Settings};
use erp_sync::{NoticeLevel, Partition, SyncEngine, SyncError};
use serde_json::json;
use tokio_test::assert_ok;

fn material(engine: &SyncEngine, kind: MaterialKind, name: &str) -> Material {
  let code = engine.materials().next_code(&kind).unwrap();
  Material { id: RecordId::Text(code.clone()),
             code,
             name: name.into(),
             kind,
             ..Default::default() }
}

fn issued_invoice() -> Invoice {
  Invoice { id: RecordId::Number(1),
            number: "FT 2026/0001".into(),
            client_name: "Hotel Praia".into(),
            client_nif: "254000111".into(),
            items: vec![LineItem { description: "Manutenção AC".into(),
                                   quantity: 1.0,
                                   unit_price: 1000.0,
                                   total: 1000.0,
                                   ..Default::default() }],
            total: 1000.0,
            status: InvoiceStatus::Issued,
            ..Default::default() }
}

#[tokio::test(start_paused = true)]
async fn material_codes_follow_the_catalogue() {
  let h = Harness::without_backups();
  assert_ok!(h.engine.init().await);

  assert_eq!(h.engine.materials().next_code(&MaterialKind::Material).unwrap(), "M000001");
  let first = material(&h.engine, MaterialKind::Material, "Gás R410A");
  h.engine.materials().save(vec![first.clone()]).unwrap();
  assert_eq!(h.engine.materials().next_code(&MaterialKind::Material).unwrap(), "M000002");
  assert_eq!(h.engine.materials().next_code(&MaterialKind::Service).unwrap(), "S000001");

  let service = material(&h.engine, MaterialKind::Service, "Instalação");
  h.engine.materials().save(vec![first, service]).unwrap();
  assert_eq!(h.engine.materials().next_code(&MaterialKind::Service).unwrap(), "S000002");
}

#[tokio::test(start_paused = true)]
async fn issued_invoice_content_cannot_change() {
  let h = Harness::without_backups();
  assert_ok!(h.engine.init().await);
  h.engine.invoices().save(vec![issued_invoice()]).unwrap();

  let mut tampered = issued_invoice();
  tampered.total = 1200.0;
  let returned = h.engine.invoices().save(vec![tampered]).unwrap();
  assert_eq!(returned[0].total, 1000.0);
  assert_eq!(h.engine.invoices().get(&RecordId::Number(1)).unwrap().unwrap().total, 1000.0);
  let rejections: Vec<_> = h.notices()
                            .into_iter()
                            .filter(|n| n.level == NoticeLevel::Warning)
                            .collect();
  assert_eq!(rejections.len(), 1);
  assert!(rejections[0].message.contains("FT 2026/0001"));
  assert_eq!(rejections[0].partition, Some(Partition::Finance));

  let mut noted = issued_invoice();
  noted.notes = "Pago por transferência".into();
  let returned = h.engine.invoices().save(vec![noted]).unwrap();
  assert_eq!(returned[0].notes, "Pago por transferência");
  assert_eq!(h.notices().iter().filter(|n| n.level == NoticeLevel::Warning).count(), 1);

  settle().await;
  let written = &h.store.writes()[0].1;
  assert_eq!(written["invoices"][0]["total"], json!(1000.0));
  assert_eq!(written["invoices"][0]["notes"], json!("Pago por transferência"));
}

#[tokio::test(start_paused = true)]
async fn issued_invoice_can_be_soft_deleted_but_not_dropped() {
  let h = Harness::without_backups();
  assert_ok!(h.engine.init().await);
  h.engine.invoices().save(vec![issued_invoice()]).unwrap();

  let returned = h.engine.invoices().save(Vec::new()).unwrap();
  assert_eq!(returned.len(), 1);

  let mut deleted = issued_invoice();
  deleted.meta.deleted = true;
  let returned = h.engine.invoices().save(vec![deleted]).unwrap();
  assert!(returned[0].meta.deleted);
  assert!(h.engine.invoices().get_active().unwrap().is_empty());
  assert_eq!(h.engine.invoices().get_all().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn issued_invoice_cannot_be_reopened_as_draft() {
  let h = Harness::without_backups();
  assert_ok!(h.engine.init().await);
  h.engine.invoices().save(vec![issued_invoice()]).unwrap();

  let mut reopened = issued_invoice();
  reopened.status = InvoiceStatus::Draft;
  let returned = h.engine.invoices().save(vec![reopened]).unwrap();
  assert_eq!(returned[0].status, InvoiceStatus::Issued);

  let mut retotalled = issued_invoice();
  retotalled.status = InvoiceStatus::Draft;
  retotalled.total = 1.0;
  let returned = h.engine.invoices().save(vec![retotalled]).unwrap();
  assert_eq!(returned[0].total, 1000.0);
  assert_eq!(h.notices().iter().filter(|n| n.level == NoticeLevel::Warning).count(), 2);

  let mut cancelled = issued_invoice();
  cancelled.status = InvoiceStatus::Cancelled;
  let returned = h.engine.invoices().save(vec![cancelled]).unwrap();
  assert_eq!(returned[0].status, InvoiceStatus::Cancelled);
}

#[tokio::test(start_paused = true)]
async fn draft_invoice_is_freely_editable_and_numbered() {
  let h = Harness::without_backups();
  assert_ok!(h.engine.init().await);
  let year = h.engine.current_year();
  assert_eq!(year, 2026);

  let number = h.engine.invoices().next_number(year).unwrap();
  assert_eq!(number, "FT 2026/0001");
  let draft = Invoice { id: RecordId::Number(h.engine.invoices().next_id().unwrap()),
                        number,
                        total: 50.0,
                        ..Default::default() };
  h.engine.invoices().save(vec![draft.clone()]).unwrap();
  let mut edited = draft;
  edited.total = 75.0;
  assert_eq!(h.engine.invoices().save(vec![edited]).unwrap()[0].total, 75.0);
  assert_eq!(h.engine.invoices().next_number(year).unwrap(), "FT 2026/0002");

  let mut settings = h.engine.settings().get().unwrap();
  settings.invoice_series = "FR".into();
  h.engine.settings().save(settings).unwrap();
  assert_eq!(h.engine.invoices().next_number(year).unwrap(), "FR 2026/0001");
}

#[tokio::test(start_paused = true)]
async fn proposal_numbers_and_duplicate_ids() {
  let h = Harness::without_backups();
  assert_ok!(h.engine.init().await);
  assert_eq!(h.engine.proposals().next_number(2026).unwrap(), "PROP-2026-001");

  let p = Proposal { id: RecordId::Number(1),
                     number: "PROP-2026-001".into(),
                     ..Default::default() };
  let err = h.engine.proposals().save(vec![p.clone(), p.clone()]).unwrap_err();
  assert!(matches!(err, SyncError::Domain(_)));
  assert!(h.engine.proposals().get_all().unwrap().is_empty());
  assert!(h.engine.pending_partitions().is_empty());

  h.engine.proposals().save(vec![p]).unwrap();
  assert_eq!(h.engine.proposals().next_number(2026).unwrap(), "PROP-2026-002");
  assert_eq!(h.engine.proposals().next_id().unwrap(), 2);
}

#[tokio::test(start_paused = true)]
async fn settings_save_stamps_and_schedules_config_write() {
  let h = Harness::without_backups();
  assert_ok!(h.engine.init().await);

  let unchanged = h.engine.settings().save(h.engine.settings().get().unwrap()).unwrap();
  assert!(unchanged.meta.updated_at.is_none());
  assert!(h.engine.pending_partitions().is_empty());

  let updated = h.engine
                 .settings()
                 .save(Settings { company_name: "Frio Lda".into(),
                                  ..h.engine.settings().get().unwrap() })
                 .unwrap();
  assert!(updated.meta.updated_at.is_some());
  assert_eq!(h.engine.pending_partitions(), vec![Partition::Config]);

  settle().await;
  let config = h.store.content(&h.file("erp_config.json")).unwrap();
  assert_eq!(config["settings"]["companyName"], json!("Frio Lda"));
  assert_eq!(config["categories"].as_array().unwrap().len(), 19);
}

#[tokio::test(start_paused = true)]
async fn accessors_refuse_before_init() {
  let h = Harness::without_backups();
  assert!(matches!(h.engine.materials().next_code(&MaterialKind::Material), Err(SyncError::NotReady)));
  assert!(matches!(h.engine.clients().save(Vec::new()), Err(SyncError::NotReady)));
  assert!(matches!(h.engine.settings().get(), Err(SyncError::NotReady)));
  assert!(matches!(h.engine.flush().await, Err(SyncError::NotReady)));
  assert!(matches!(h.engine.force_sync().await, Err(SyncError::NotReady)));
}
