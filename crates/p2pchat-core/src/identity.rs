//! Node identity
//!
//! A node's identity is the iroh secret key its endpoint is bound with; the
//! derived endpoint id is the `peer_id` it registers under. By default the
//! key lives only as long as the process ([`EphemeralIdentity`]). A
//! [`FileIdentity`] keeps the peer id stable across restarts.

use std::fs;
use std::path::{Path, PathBuf};

use iroh::SecretKey;
use tracing::{debug, info};

use crate::error::{ChatError, ChatResult};

/// Where a node's secret key is loaded from and saved to.
pub trait IdentityStore: Send + Sync {
    /// Previously saved key, if any.
    fn load(&self) -> ChatResult<Option<SecretKey>>;

    /// Persist a freshly generated key.
    fn save(&self, key: &SecretKey) -> ChatResult<()>;
}

/// Never persists anything; every process gets a new peer id.
#[derive(Debug, Default, Clone, Copy)]
pub struct EphemeralIdentity;

impl IdentityStore for EphemeralIdentity {
    fn load(&self) -> ChatResult<Option<SecretKey>> {
        Ok(None)
    }

    fn save(&self, _key: &SecretKey) -> ChatResult<()> {
        Ok(())
    }
}

/// Secret key stored hex-encoded in a single file.
#[derive(Debug, Clone)]
pub struct FileIdentity {
    path: PathBuf,
}

impl FileIdentity {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl IdentityStore for FileIdentity {
    fn load(&self) -> ChatResult<Option<SecretKey>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let text = fs::read_to_string(&self.path)?;
        let bytes = hex::decode(text.trim()).map_err(|e| {
            ChatError::Decode(format!("identity file {}: {}", self.path.display(), e))
        })?;
        let key_bytes: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| {
            ChatError::Decode(format!(
                "identity file {}: expected 32 bytes, got {}",
                self.path.display(),
                b.len()
            ))
        })?;

        Ok(Some(SecretKey::from(key_bytes)))
    }

    fn save(&self, key: &SecretKey) -> ChatResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, hex::encode(key.to_bytes()))?;
        debug!(path = %self.path.display(), "Saved identity");
        Ok(())
    }
}

/// Load the stored key, or generate and save a new one.
pub fn load_or_generate(store: &dyn IdentityStore) -> ChatResult<SecretKey> {
    if let Some(key) = store.load()? {
        info!(peer_id = %key.public(), "Loaded existing identity");
        return Ok(key);
    }

    let key = SecretKey::generate(&mut rand::rng());
    store.save(&key)?;
    info!(peer_id = %key.public(), "Generated new identity");
    Ok(key)
}
