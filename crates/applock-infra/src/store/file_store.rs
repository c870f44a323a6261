//! File-backed lock-screen store.
//!
//! The record (encrypted verifier + attempt counter) is kept as a small
//! JSON file with atomic write-and-rename, useless on its own without the
//! key held by the secret-key repository. All mutations run behind one
//! async mutex, so verify attempts are totally ordered and the decrement
//! can never be lost to a concurrent submission.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::{watch, Mutex};
use tracing::debug;

use applock_core::{
    crypto::EncryptedBlob,
    ports::{LockScreenStorePort, StoreError},
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreRecord {
    #[serde(default)]
    encrypted_pin: Option<EncryptedBlob>,

    /// `None` reads back as the configured maximum.
    #[serde(default)]
    remaining_attempts: Option<u32>,
}

pub struct FileLockScreenStore {
    path: PathBuf,
    max_attempts: u32,
    record: Mutex<StoreRecord>,
    configured_tx: watch::Sender<bool>,
}

impl FileLockScreenStore {
    /// Open (or initialize) the store at `path`. A missing file means no
    /// PIN is configured; a present but unreadable file is an error, not
    /// an empty record, so a corrupt store can never silently disable the
    /// lock.
    pub async fn open(path: impl Into<PathBuf>, max_attempts: u32) -> Result<Self, StoreError> {
        let path = path.into();
        let record = match fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                StoreError::Corrupt(format!("parse {} failed: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => StoreRecord::default(),
            Err(e) => {
                return Err(StoreError::Io(format!(
                    "read {} failed: {}",
                    path.display(),
                    e
                )))
            }
        };

        let (configured_tx, _) = watch::channel(record.encrypted_pin.is_some());
        Ok(Self {
            path,
            max_attempts,
            record: Mutex::new(record),
            configured_tx,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn ensure_parent_dir(&self) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).await.map_err(|e| {
                StoreError::Io(format!("create store dir failed: {}: {}", dir.display(), e))
            })?;
        }
        Ok(())
    }

    /// Write the record to a temporary file, then rename over the target.
    /// The file on disk is always either the old record or the new one.
    async fn persist(&self, record: &StoreRecord) -> Result<(), StoreError> {
        self.ensure_parent_dir().await?;

        let content = serde_json::to_string_pretty(record)
            .map_err(|e| StoreError::Corrupt(format!("serialize store record failed: {}", e)))?;

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, content).await.map_err(|e| {
            StoreError::Io(format!("write {} failed: {}", tmp_path.display(), e))
        })?;

        // Restrict the temp file before it becomes the record, so the
        // record is never visible with default umask permissions.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            fs::set_permissions(&tmp_path, perms).await.map_err(|e| {
                StoreError::Io(format!(
                    "set permissions on {} failed: {}",
                    tmp_path.display(),
                    e
                ))
            })?;
        }

        fs::rename(&tmp_path, &self.path).await.map_err(|e| {
            StoreError::Io(format!(
                "rename {} -> {} failed: {}",
                tmp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        Ok(())
    }

    /// Apply `mutate` to the in-memory record and persist the result. On
    /// persist failure the in-memory record is rolled back, so memory and
    /// disk never disagree.
    async fn mutate<R>(
        &self,
        mutate: impl FnOnce(&mut StoreRecord) -> R,
    ) -> Result<R, StoreError> {
        let mut record = self.record.lock().await;
        let previous = record.clone();
        let result = mutate(&mut record);
        if let Err(e) = self.persist(&record).await {
            *record = previous;
            return Err(e);
        }
        self.configured_tx
            .send_if_modified(|configured| {
                let now = record.encrypted_pin.is_some();
                if *configured != now {
                    *configured = now;
                    true
                } else {
                    false
                }
            });
        Ok(result)
    }
}

#[async_trait]
impl LockScreenStorePort for FileLockScreenStore {
    async fn get_encrypted_code(&self) -> Result<Option<EncryptedBlob>, StoreError> {
        Ok(self.record.lock().await.encrypted_pin.clone())
    }

    async fn save_encrypted_pin_code(&self, blob: EncryptedBlob) -> Result<(), StoreError> {
        self.mutate(|record| {
            record.encrypted_pin = Some(blob);
            record.remaining_attempts = None;
        })
        .await?;
        debug!("encrypted pin code saved, counter reset");
        Ok(())
    }

    async fn delete_encrypted_pin_code(&self) -> Result<(), StoreError> {
        self.mutate(|record| {
            record.encrypted_pin = None;
            record.remaining_attempts = None;
        })
        .await?;
        debug!("encrypted pin code deleted, counter reset");
        Ok(())
    }

    async fn has_pin_code(&self) -> Result<bool, StoreError> {
        Ok(self.record.lock().await.encrypted_pin.is_some())
    }

    async fn remaining_attempts(&self) -> Result<u32, StoreError> {
        let record = self.record.lock().await;
        Ok(record.remaining_attempts.unwrap_or(self.max_attempts))
    }

    async fn on_wrong_pin(&self) -> Result<u32, StoreError> {
        let max_attempts = self.max_attempts;
        self.mutate(move |record| {
            let next = record
                .remaining_attempts
                .unwrap_or(max_attempts)
                .saturating_sub(1);
            record.remaining_attempts = Some(next);
            next
        })
        .await
    }

    async fn reset_counter(&self) -> Result<(), StoreError> {
        self.mutate(|record| {
            record.remaining_attempts = None;
        })
        .await
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.configured_tx.subscribe()
    }
}
