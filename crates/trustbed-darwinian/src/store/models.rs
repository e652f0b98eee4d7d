//! Opaque model blob store
//!
//! Models are bincode-encoded into `<dir>/<key>.bin`. The returned
//! [`ModelBlobRef`] carries a blake3 checksum that is verified on load, so a
//! snapshot never silently pairs with a different model.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument};
use trustbed_common::{Result, TrustbedError};
use trustbed_ledger::ModelBlobRef;

/// Key of the model shared by every reporter
pub const SHARED_KEY: &str = "shared";

const REPORTER_PREFIX: &str = "reporter-";

/// Blob key of one reporter's model
pub fn reporter_key(reporter: usize) -> String {
    format!("{}{}", REPORTER_PREFIX, reporter)
}

/// Reporter id encoded in a blob key, if it is a per-reporter key
pub fn parse_reporter_key(key: &str) -> Option<usize> {
    key.strip_prefix(REPORTER_PREFIX)?.parse().ok()
}

/// Directory of model blobs
#[derive(Debug, Clone)]
pub struct ModelStore {
    dir: PathBuf,
}

impl ModelStore {
    /// Open a store, creating the directory if needed
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .map_err(|e| TrustbedError::Storage(format!("{}: {}", dir.display(), e)))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn blob_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.bin", key))
    }

    #[instrument(skip(self, model), fields(dir = %self.dir.display()))]
    pub fn save<T: Serialize>(&self, key: &str, model: &T) -> Result<ModelBlobRef> {
        let bytes = bincode::serialize(model)
            .map_err(|e| TrustbedError::Serialization(format!("model {}: {}", key, e)))?;
        let checksum = blake3::hash(&bytes).to_hex().to_string();

        let path = self.blob_path(key);
        fs::write(&path, &bytes)
            .map_err(|e| TrustbedError::Storage(format!("{}: {}", path.display(), e)))?;

        debug!(key, bytes = bytes.len(), "Saved model blob");
        Ok(ModelBlobRef {
            key: key.to_string(),
            checksum,
        })
    }

    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    pub fn load<T: DeserializeOwned>(&self, blob: &ModelBlobRef) -> Result<T> {
        let path = self.blob_path(&blob.key);
        let bytes = fs::read(&path)
            .map_err(|e| TrustbedError::Storage(format!("{}: {}", path.display(), e)))?;

        let actual = blake3::hash(&bytes).to_hex().to_string();
        if actual != blob.checksum {
            return Err(TrustbedError::Storage(format!(
                "checksum mismatch for model {}: expected {}, found {}",
                blob.key, blob.checksum, actual
            )));
        }

        bincode::deserialize(&bytes)
            .map_err(|e| TrustbedError::Serialization(format!("model {}: {}", blob.key, e)))
    }
}
