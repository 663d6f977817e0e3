//! Keystore for identity persistence
//!
//! Loads the node's iden from its working directory, generating and saving
//! a fresh one on first start so the node keeps its identity across
//! restarts.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use axon_core::{IDEN_LEN, Iden, IdentityStore, StorageError};
use tracing::{debug, info};

/// Filename for the node iden
const IDEN_FILENAME: &str = "node.iden";

/// File-backed [`IdentityStore`]
pub struct Keystore {
    /// Path to the keystore directory
    path: PathBuf,
}

impl Keystore {
    /// Create a new keystore with the given data directory
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.to_path_buf(),
        }
    }

    fn iden_path(&self) -> PathBuf {
        self.path.join(IDEN_FILENAME)
    }

    /// Whether an iden has been saved
    pub fn exists(&self) -> bool {
        self.iden_path().exists()
    }

    /// Load the saved iden
    pub async fn load(&self) -> Result<Iden, StorageError> {
        let path = self.iden_path();
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| StorageError::Io(format!("Failed to read iden file: {}", e)))?;

        if bytes.len() != IDEN_LEN {
            return Err(StorageError::Corrupt(format!(
                "{}: expected {} bytes, got {}",
                path.display(),
                IDEN_LEN,
                bytes.len()
            )));
        }

        let iden =
            Iden::from_slice(&bytes).map_err(|e| StorageError::Corrupt(e.to_string()))?;
        debug!(iden = %iden.short_id(), "Loaded iden from keystore");
        Ok(iden)
    }

    /// Save `iden`, readable by the owner only
    pub async fn save(&self, iden: &Iden) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.path)
            .await
            .map_err(|e| StorageError::Io(format!("Failed to create keystore dir: {}", e)))?;

        let path = self.iden_path();
        tokio::fs::write(&path, iden.as_bytes())
            .await
            .map_err(|e| StorageError::Io(format!("Failed to write iden file: {}", e)))?;

        set_restrictive_permissions(&path).await?;

        info!(iden = %iden.short_id(), path = %path.display(), "Saved iden to keystore");
        Ok(())
    }
}

#[async_trait]
impl IdentityStore for Keystore {
    async fn load_or_create(&self) -> Result<Iden, StorageError> {
        if self.exists() {
            return self.load().await;
        }

        info!("No existing iden found, generating new one");
        let iden = Iden::random();
        self.save(&iden).await?;
        Ok(iden)
    }
}

async fn set_restrictive_permissions(path: &Path) -> Result<(), StorageError> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .await
            .map_err(|e| StorageError::Io(format!("Failed to set iden permissions: {}", e)))?;
    }
    let _ = path; // Silence unused warning on non-Unix
    Ok(())
}
