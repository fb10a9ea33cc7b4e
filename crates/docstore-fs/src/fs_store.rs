use async_trait::async_trait;
use chrono::{DateTime, Utc};
use docstore::{DocumentStore, FileDescriptor, FileId, Result, StoreError};
use log::{debug, info, warn};
use serde_json::Value as JsonValue;
use std::path::{Component, Path, PathBuf};
use uuid::Uuid;

/// Prefijo de los archivos temporales usados para escrituras atómicas.
const TMP_PREFIX: &str = ".tmp-";

/// Almacén de documentos respaldado por un directorio local.
#[derive(Debug, Clone)]
pub struct FsDocumentStore {
  root: PathBuf,
}

impl FsDocumentStore {
  /// Crea el almacén sobre `root`. El directorio no se crea aquí: mientras
  /// no exista, `find_folder` se comporta como un cliente sin configurar.
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  fn check_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains('/') || name.contains('\\') || name == "." || name == ".." {
      return Err(StoreError::Other(format!("nombre inválido: {:?}", name)));
    }
    Ok(())
  }

  /// Traduce un handle (ruta relativa) a una ruta absoluta dentro de la raíz.
  fn resolve(&self, id: &FileId) -> Result<PathBuf> {
    let rel = Path::new(id.as_str());
    if rel.components().any(|c| !matches!(c, Component::Normal(_))) {
      return Err(StoreError::Other(format!("handle inválido: {}", id)));
    }
    Ok(self.root.join(rel))
  }

  fn child_id(parent: Option<&FileId>, name: &str) -> FileId {
    match parent {
      Some(p) => FileId::new(format!("{}/{}", p.as_str(), name)),
      None => FileId::new(name),
    }
  }

  fn parent_of(id: &FileId) -> Option<FileId> {
    id.as_str().rsplit_once('/').map(|(p, _)| FileId::new(p))
  }

  async fn descriptor(&self, id: FileId) -> Result<FileDescriptor> {
    let path = self.resolve(&id)?;
    let meta = tokio::fs::metadata(&path).await?;
    let modified_at = meta.modified().map(DateTime::<Utc>::from).unwrap_or_else(|_| Utc::now());
    let name = path.file_name()
                   .map(|n| n.to_string_lossy().into_owned())
                   .unwrap_or_default();
    Ok(FileDescriptor { parent: Self::parent_of(&id),
                        id,
                        name,
                        is_folder: meta.is_dir(),
                        modified_at })
  }

  /// Escribe `content` en un temporal del mismo directorio y lo renombra
  /// sobre `path`, para que un lector nunca vea un documento a medias.
  async fn write_atomic(&self, path: &Path, content: &JsonValue) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(content)?;
    let dir = path.parent()
                  .ok_or_else(|| StoreError::Other(format!("ruta sin carpeta: {}", path.display())))?;
    let tmp = dir.join(format!("{}{}", TMP_PREFIX, Uuid::new_v4().simple()));
    tokio::fs::write(&tmp, &bytes).await?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
      let _ = tokio::fs::remove_file(&tmp).await;
      return Err(e.into());
    }
    Ok(())
  }

  async fn ensure_file(&self, path: &Path, id: &FileId) -> Result<()> {
    match tokio::fs::metadata(path).await {
      Ok(m) if m.is_file() => Ok(()),
      Ok(_) => Err(StoreError::Other(format!("{} es una carpeta", id))),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StoreError::NotFound(format!("archivo {}", id))),
      Err(e) => Err(e.into()),
    }
  }
}

#[async_trait]
impl DocumentStore for FsDocumentStore {
  async fn find_folder(&self, name: &str, parent: Option<&FileId>) -> Result<Option<FileId>> {
    if Self::check_name(name).is_err() {
      return Ok(None);
    }
    if !tokio::fs::try_exists(&self.root).await.unwrap_or(false) {
      warn!("raíz del almacén {} no disponible", self.root.display());
      return Ok(None);
    }
    let id = Self::child_id(parent, name);
    let path = self.resolve(&id)?;
    match tokio::fs::metadata(&path).await {
      Ok(m) if m.is_dir() => Ok(Some(id)),
      _ => Ok(None),
    }
  }

  async fn create_folder(&self, name: &str, parent: Option<&FileId>) -> Result<FileId> {
    Self::check_name(name)?;
    let id = Self::child_id(parent, name);
    let path = self.resolve(&id)?;
    tokio::fs::create_dir_all(&path).await?;
    info!("carpeta creada: {}", path.display());
    Ok(id)
  }

  async fn list_files_in_folder(&self, folder: &FileId) -> Result<Vec<FileDescriptor>> {
    let path = self.resolve(folder)?;
    let mut dir = tokio::fs::read_dir(&path).await?;
    let mut out = Vec::new();
    while let Some(entry) = dir.next_entry().await? {
      let name = entry.file_name().to_string_lossy().into_owned();
      if name.starts_with(TMP_PREFIX) {
        continue;
      }
      out.push(self.descriptor(Self::child_id(Some(folder), &name)).await?);
    }
    out.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(out)
  }

  async fn create_file(&self, folder: &FileId, content: &JsonValue, name: &str) -> Result<FileDescriptor> {
    Self::check_name(name)?;
    let id = Self::child_id(Some(folder), name);
    let path = self.resolve(&id)?;
    if tokio::fs::try_exists(&path).await? {
      return Err(StoreError::Other(format!("ya existe {}", id)));
    }
    self.write_atomic(&path, content).await?;
    debug!("archivo creado: {}", id);
    self.descriptor(id).await
  }

  async fn read_file(&self, id: &FileId) -> Result<JsonValue> {
    let path = self.resolve(id)?;
    let bytes = tokio::fs::read(&path).await?;
    Ok(serde_json::from_slice(&bytes)?)
  }

  async fn update_file(&self, id: &FileId, content: &JsonValue) -> Result<()> {
    let path = self.resolve(id)?;
    self.ensure_file(&path, id).await?;
    self.write_atomic(&path, content).await?;
    debug!("archivo actualizado: {}", id);
    Ok(())
  }

  async fn copy_file(&self, id: &FileId, dest_folder: &FileId, new_name: &str) -> Result<FileDescriptor> {
    Self::check_name(new_name)?;
    let src = self.resolve(id)?;
    self.ensure_file(&src, id).await?;
    let dest_id = Self::child_id(Some(dest_folder), new_name);
    let dest = self.resolve(&dest_id)?;
    tokio::fs::copy(&src, &dest).await?;
    self.descriptor(dest_id).await
  }

  async fn rename_file(&self, id: &FileId, new_name: &str) -> Result<()> {
    Self::check_name(new_name)?;
    let src = self.resolve(id)?;
    self.ensure_file(&src, id).await?;
    let dest = self.resolve(&Self::child_id(Self::parent_of(id).as_ref(), new_name))?;
    tokio::fs::rename(&src, &dest).await?;
    info!("archivo renombrado: {} -> {}", src.display(), dest.display());
    Ok(())
  }
}

/// Crear el almacén desde las variables de entorno (`ERP_STORE_ROOT`, por
/// defecto `./erp-store`). Lee `.env` si existe.
pub fn new_from_env() -> Result<FsDocumentStore> {
  dotenvy::dotenv().ok();
  let root = std::env::var("ERP_STORE_ROOT").unwrap_or_else(|_| "./erp-store".into());
  if root.trim().is_empty() {
    return Err(StoreError::Other("ERP_STORE_ROOT está vacío".into()));
  }
  std::fs::create_dir_all(&root).map_err(StoreError::from)?;
  info!("almacén de documentos en {}", root);
  Ok(FsDocumentStore::new(root))
}
