//! Directory-backed secret store shared by the API and worker processes.
//!
//! Each key is written to `<dir>/<sha256(key)>.secret` as a sealed value.
//! Writes go to a temporary file first and are renamed into place.

use crate::cipher::{SecretCipher, key_digest};
use async_trait::async_trait;
use hookrun_core::ports::SecretStore;
use hookrun_core::{Error, Result};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::debug;

pub struct FileSecretStore {
    dir: PathBuf,
    cipher: SecretCipher,
}

impl FileSecretStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub async fn open(dir: impl Into<PathBuf>, cipher: SecretCipher) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            Error::Internal(format!(
                "Failed to create secrets directory {}: {}",
                dir.display(),
                e
            ))
        })?;
        Ok(Self { dir, cipher })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.secret", key_digest(key)))
    }
}

#[async_trait]
impl SecretStore for FileSecretStore {
    async fn add(&self, key: &str, value: &str) -> Result<()> {
        let sealed = self.cipher.seal(value)?;
        let path = self.path_for(key);
        let tmp = path.with_extension("tmp");

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(&tmp).await?;
        file.write_all(sealed.as_bytes()).await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        debug!(path = %path.display(), "Secret stored");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<String> {
        let path = self.path_for(key);
        let sealed = tokio::fs::read_to_string(&path).await.map_err(|e| {
            Error::SecretUnavailable(format!("Failed to read {}: {}", path.display(), e))
        })?;
        self.cipher.open(&sealed)
    }

    fn name(&self) -> &'static str {
        "file"
    }
}
