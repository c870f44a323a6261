//! File-based secret-key repository for headless and development
//! environments.
//!
//! The key is stored as a binary file with restricted permissions (0600 on
//! Unix). Less secure than the OS keyring; use
//! [`crate::KeyringSecretKeyRepository`] where a platform keystore exists.

use std::fs;
use std::io;
use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use applock_core::{
    crypto::{KeyError, PinKey},
    ports::SecretKeyRepositoryPort,
};

const KEY_FILE: &str = "pin-key.v1.bin";

pub struct FileSecretKeyRepository {
    base_dir: PathBuf,
}

impl FileSecretKeyRepository {
    /// Create a repository rooted at the platform config directory.
    pub fn new(app_dir_name: &str) -> Result<Self, io::Error> {
        let base_dir = dirs::config_dir()
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, "cannot determine config directory")
            })?
            .join(app_dir_name);

        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    /// Create a repository with a custom base directory, mainly for tests.
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    fn key_path(&self) -> PathBuf {
        self.base_dir.join(KEY_FILE)
    }

    fn store_key(&self, key: &PinKey) -> Result<(), KeyError> {
        fs::create_dir_all(&self.base_dir)
            .map_err(|e| KeyError::Backend(format!("create key dir failed: {}", e)))?;

        let path = self.key_path();
        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, key.as_bytes())
            .map_err(|e| KeyError::Backend(format!("write key temp file failed: {}", e)))?;

        // Key material must never appear under default umask permissions,
        // so restrict the temp file before renaming it into place.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&tmp_path, fs::Permissions::from_mode(0o600))
                .map_err(|e| KeyError::Backend(format!("set key file permissions failed: {}", e)))?;
        }

        fs::rename(&tmp_path, &path)
            .map_err(|e| KeyError::Backend(format!("rename key file failed: {}", e)))?;

        Ok(())
    }
}

#[async_trait]
impl SecretKeyRepositoryPort for FileSecretKeyRepository {
    async fn get_or_create_key(&self) -> Result<PinKey, KeyError> {
        match fs::read(self.key_path()) {
            Ok(bytes) => PinKey::from_bytes(&bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let key = PinKey::generate()?;
                self.store_key(&key)?;
                debug!("pin key created");
                Ok(key)
            }
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                Err(KeyError::PermissionDenied)
            }
            Err(e) => Err(KeyError::Backend(format!("read key file failed: {}", e))),
        }
    }
}
