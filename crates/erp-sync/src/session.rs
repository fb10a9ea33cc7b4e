// Archivo: session.rs
// Propósito: arranque de sesión con límite de tiempo sobre el proveedor
// de identidad.
use async_trait::async_trait;
use log::warn;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
  pub email: String,
  pub name: String,
  pub role: String,
}

impl Default for UserProfile {
  fn default() -> Self {
    Self { email: String::new(),
           name: "Utilizador".into(),
           role: "user".into() }
  }
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Error del proveedor de identidad: {0}")]
pub struct IdentityError(pub String);

/// Proveedor externo de identidad (la sesión de la nube).
#[async_trait]
pub trait IdentityProvider: Send + Sync {
  async fn current_profile(&self) -> Result<UserProfile, IdentityError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
  pub profile: UserProfile,
  /// `true` si se usó el perfil por defecto (tiempo agotado o error).
  pub degraded: bool,
}

/// Consulta el perfil con un límite de `timeout`. Si se agota o falla,
/// devuelve una sesión degradada con el perfil por defecto.
pub async fn resolve_session(provider: &dyn IdentityProvider, timeout: Duration) -> Session {
  match tokio::time::timeout(timeout, provider.current_profile()).await {
    Ok(Ok(profile)) => Session { profile,
                                 degraded: false },
    Ok(Err(e)) => {
      warn!("{}: se usa el perfil por defecto", e);
      Session { profile: UserProfile::default(),
                degraded: true }
    }
    Err(_) => {
      warn!("el proveedor de identidad no respondió en {:?}", timeout);
      Session { profile: UserProfile::default(),
                degraded: true }
    }
  }
}
