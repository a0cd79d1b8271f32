//! In-process secret store with encryption at rest.
//!
//! Values live only as long as the process, so this backend suits tests and
//! the single-process `serve --with-worker` mode.

use crate::cipher::SecretCipher;
use async_trait::async_trait;
use hookrun_core::ports::SecretStore;
use hookrun_core::{Error, Result};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

pub struct NativeSecretStore {
    cipher: SecretCipher,
    secrets: RwLock<HashMap<String, EncryptedSecret>>,
}

struct EncryptedSecret {
    sealed: String,
    version: u32,
}

impl NativeSecretStore {
    pub fn new(cipher: SecretCipher) -> Self {
        Self {
            cipher,
            secrets: RwLock::new(HashMap::new()),
        }
    }

    pub fn from_master_key(master_key: &str) -> Self {
        Self::new(SecretCipher::from_master_key(master_key))
    }

    /// Current version of a key, starting at 1.
    pub async fn version(&self, key: &str) -> Option<u32> {
        self.secrets.read().await.get(key).map(|s| s.version)
    }

    pub async fn delete(&self, key: &str) -> bool {
        self.secrets.write().await.remove(key).is_some()
    }
}

#[async_trait]
impl SecretStore for NativeSecretStore {
    async fn add(&self, key: &str, value: &str) -> Result<()> {
        let sealed = self.cipher.seal(value)?;

        let mut secrets = self.secrets.write().await;
        let version = secrets.get(key).map(|s| s.version + 1).unwrap_or(1);
        secrets.insert(key.to_string(), EncryptedSecret { sealed, version });

        debug!(version, "Secret stored");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<String> {
        let secrets = self.secrets.read().await;
        let encrypted = secrets
            .get(key)
            .ok_or_else(|| Error::SecretUnavailable("no secret for trigger".to_string()))?;

        self.cipher.open(&encrypted.sealed)
    }

    fn name(&self) -> &'static str {
        "native"
    }
}
