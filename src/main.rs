use async_trait::async_trait;
use chrono::Utc;
use erp_domain::{Invoice, InvoiceStatus, LineItem, Material, MaterialKind, RecordId, Transaction};
use erp_sync::{resolve_session, IdentityError, IdentityProvider, Notice, SyncConfig, SyncEngine, UserProfile};
use log::info;
use std::error::Error;
use std::io::{self, Write};
use std::sync::Arc;

/// Identidad tomada de `ERP_USER_EMAIL` / `ERP_USER_NAME`.
struct EnvIdentity;

#[async_trait]
impl IdentityProvider for EnvIdentity {
    async fn current_profile(&self) -> Result<UserProfile, IdentityError> {
        let email = std::env::var("ERP_USER_EMAIL").map_err(|_| IdentityError("ERP_USER_EMAIL no definido".into()))?;
        let name = std::env::var("ERP_USER_NAME").unwrap_or_else(|_| email.clone());
        Ok(UserProfile { email,
                         name,
                         role: "admin".into() })
    }
}

/// Pequeño menú interactivo sobre el motor de sincronización, con los
/// documentos guardados en la carpeta indicada por `ERP_STORE_ROOT`.
///
/// Opciones soportadas:
/// 1) Ver colecciones (número de registros)
/// 2) Añadir movimiento de caja
/// 3) Añadir material con el código siguiente
/// 4) Emitir factura
/// 5) Forzar resincronización
/// 6) Estado de sincronización
/// 7) Salir (escribe lo pendiente)
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let config = SyncConfig::from_env()?;
    let store = docstore_fs::new_from_env()?;

    let session = resolve_session(&EnvIdentity, config.session_timeout()).await;
    if session.degraded {
        println!("Aviso: sesión sin perfil, se usa el perfil por defecto");
    }
    info!("sesión de {} ({})", session.profile.name, session.profile.email);

    let engine = SyncEngine::new(Arc::new(store), config);
    engine.set_notifier(|n: &Notice| println!("[{:?}] {}", n.level, n.message));
    engine.on_sync_change(|s| info!("estado de sincronización: {}", s));
    if let Err(e) = engine.init().await {
        eprintln!("No se pudo cargar la base de datos: {}", e);
        return Err(Box::new(e) as Box<dyn Error>);
    }

    loop {
        println!("\n== ERP CLI ==");
        println!("1) Ver colecciones");
        println!("2) Añadir movimiento");
        println!("3) Añadir material");
        println!("4) Emitir factura");
        println!("5) Forzar resincronización");
        println!("6) Estado");
        println!("7) Salir");
        let choice = prompt("Elige una opción: ")?;
        match choice.trim() {
            "1" => {
                if let Err(e) = print_sizes(&engine) {
                    eprintln!("Error leyendo colecciones: {}", e);
                }
            }
            "2" => {
                let description = prompt("Descripción: ")?;
                let amount: f64 = match prompt("Importe (negativo = despesa): ")?.trim().parse() {
                    Ok(n) => n,
                    Err(_) => {
                        eprintln!("Importe inválido");
                        continue;
                    }
                };
                let result = engine.transactions().next_id().and_then(|id| {
                    let mut list = engine.transactions().get_all()?;
                    list.push(Transaction { id: RecordId::Number(id),
                                            date: Utc::now().format("%Y-%m-%d").to_string(),
                                            description: description.trim().to_string(),
                                            income: amount.max(0.0),
                                            expense: (-amount).max(0.0),
                                            ..Default::default() });
                    engine.transactions().save(list)
                });
                match result {
                    Ok(list) => println!("Movimiento guardado ({} en total)", list.len()),
                    Err(e) => eprintln!("Error guardando movimiento: {}", e),
                }
            }
            "3" => {
                let name = prompt("Nombre: ")?;
                let kind = match prompt("Tipo (1 = Material, 2 = Serviço): ")?.trim() {
                    "2" => MaterialKind::Service,
                    _ => MaterialKind::Material,
                };
                let price: f64 = prompt("Precio: ")?.trim().parse().unwrap_or(0.0);
                let result = engine.materials().next_code(&kind).and_then(|code| {
                    let mut list = engine.materials().get_all()?;
                    list.push(Material { id: RecordId::Text(code.clone()),
                                         code: code.clone(),
                                         name: name.trim().to_string(),
                                         kind,
                                         price,
                                         ..Default::default() });
                    engine.materials().save(list).map(|_| code)
                });
                match result {
                    Ok(code) => println!("Material creado: {}", code),
                    Err(e) => eprintln!("Error creando material: {}", e),
                }
            }
            "4" => {
                let client = prompt("Cliente: ")?;
                let nif = prompt("NIF del cliente: ")?;
                let amount: f64 = match prompt("Importe sin IVA: ")?.trim().parse() {
                    Ok(n) => n,
                    Err(_) => {
                        eprintln!("Importe inválido");
                        continue;
                    }
                };
                match issue_invoice(&engine, client.trim(), nif.trim(), amount) {
                    Ok(number) => println!("Factura emitida: {}", number),
                    Err(e) => eprintln!("Error emitiendo factura: {}", e),
                }
            }
            "5" => match engine.force_sync().await {
                Ok(()) => println!("Datos recargados"),
                Err(e) => eprintln!("Error de resincronización: {}", e),
            },
            "6" => {
                println!("Estado: {}", engine.status());
                println!("Pendientes: {:?}", engine.pending_partitions());
                match engine.last_sync() {
                    Some(t) => println!("Última sincronización: {}", t),
                    None => println!("Última sincronización: -"),
                }
            }
            "7" => {
                println!("Guardando cambios pendientes...");
                if let Err(e) = engine.flush().await {
                    eprintln!("Algunos cambios no se guardaron: {}", e);
                }
                println!("Saliendo...");
                break;
            }
            other => {
                println!("Opción inválida: {}", other);
            }
        }
    }

    Ok(())
}

fn print_sizes(engine: &SyncEngine) -> Result<(), erp_sync::SyncError> {
    let settings = engine.settings().get()?;
    println!("Empresa: {} ({})", settings.company_name, settings.currency);
    println!("categorías:   {}", engine.categories().len()?);
    println!("clientes:     {}", engine.clients().len()?);
    println!("funcionarios: {}", engine.employees().len()?);
    println!("movimientos:  {}", engine.transactions().len()?);
    println!("facturas:     {}", engine.invoices().len()?);
    println!("propuestas:   {}", engine.proposals().len()?);
    println!("materiales:   {}", engine.materials().len()?);
    Ok(())
}

fn issue_invoice(engine: &SyncEngine, client: &str, nif: &str, amount: f64) -> Result<String, erp_sync::SyncError> {
    let settings = engine.settings().get()?;
    let number = engine.invoices().next_number(engine.current_year())?;
    let tax = (amount * settings.vat_rate / 100.0 * 100.0).round() / 100.0;
    let today = Utc::now().date_naive();
    let due = today + chrono::Duration::days(i64::from(settings.payment_terms_days));
    let mut list = engine.invoices().get_all()?;
    list.push(Invoice { id: RecordId::Number(engine.invoices().next_id()?),
                        number: number.clone(),
                        client_name: client.to_string(),
                        client_nif: nif.to_string(),
                        date: today.to_string(),
                        due_date: due.to_string(),
                        items: vec![LineItem { description: "Serviços prestados".into(),
                                               quantity: 1.0,
                                               unit_price: amount,
                                               tax_rate: settings.vat_rate,
                                               total: amount,
                                               ..Default::default() }],
                        subtotal: amount,
                        tax,
                        total: amount + tax,
                        status: InvoiceStatus::Issued,
                        ..Default::default() });
    engine.invoices().save(list)?;
    Ok(number)
}

fn prompt(msg: &str) -> io::Result<String> {
    print!("{}", msg);
    io::stdout().flush()?;
    let mut s = String::new();
    io::stdin().read_line(&mut s)?;
    Ok(s)
}
