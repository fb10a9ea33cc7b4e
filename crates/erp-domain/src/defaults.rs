//! Valores por defecto usados para arrancar un almacenamiento vacío.
use crate::config::{Category, CategoryKind, Settings};
use crate::record::RecordId;
use once_cell::sync::Lazy;

/// Plan de cuentas predefinido: (código, nombre, naturaleza).
const CHART_OF_ACCOUNTS: [(&str, &str, CategoryKind); 19] =
  [("R01", "Prestação de Serviços", CategoryKind::Income),
   ("R02", "Venda de Materiais", CategoryKind::Income),
   ("R03", "Contratos de Manutenção", CategoryKind::Income),
   ("R04", "Juros Bancários", CategoryKind::Income),
   ("R05", "Outras Receitas", CategoryKind::Income),
   ("D01", "Compra de Materiais", CategoryKind::Expense),
   ("D02", "Salários", CategoryKind::Expense),
   ("D03", "Segurança Social (INPS)", CategoryKind::Expense),
   ("D04", "Renda", CategoryKind::Expense),
   ("D05", "Eletricidade e Água", CategoryKind::Expense),
   ("D06", "Comunicações e Internet", CategoryKind::Expense),
   ("D07", "Combustível", CategoryKind::Expense),
   ("D08", "Manutenção de Viaturas", CategoryKind::Expense),
   ("D09", "Material de Escritório", CategoryKind::Expense),
   ("D10", "Impostos e Taxas", CategoryKind::Expense),
   ("D11", "Comissões Bancárias", CategoryKind::Expense),
   ("D12", "Seguros", CategoryKind::Expense),
   ("D13", "Subcontratação", CategoryKind::Expense),
   ("D14", "Outras Despesas", CategoryKind::Expense)];

static DEFAULT_CATEGORIES: Lazy<Vec<Category>> = Lazy::new(|| {
  CHART_OF_ACCOUNTS.iter()
                   .enumerate()
                   .map(|(i, (code, name, kind))| Category { id: RecordId::Number(i as i64 + 1),
                                                              code: code.to_string(),
                                                              name: name.to_string(),
                                                              kind: kind.clone(),
                                                              ..Default::default() })
                   .collect()
});

/// Configuración inicial del sistema (moeda `CVE`, IVA 15%).
pub fn default_settings() -> Settings {
  Settings::default()
}

/// Las 19 cuentas predefinidas del plan de cuentas.
pub fn default_categories() -> Vec<Category> {
  DEFAULT_CATEGORIES.clone()
}
