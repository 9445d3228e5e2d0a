//! FileKvStore - ファイルベースの key-value ストア
//!
//! 1 キー = `<dir>/<key>.json`。書き込みは `<key>.tmp` に書いてから rename する
//! ので、途中でクラッシュしても前の値か新しい値のどちらかが残る。

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;

use crate::ports::{KvStore, StoreError};

pub struct FileKvStore {
    dir: PathBuf,
}

impl FileKvStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str, extension: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StoreError::Unavailable(format!("invalid storage key {key:?}")));
        }
        Ok(self.dir.join(format!("{key}.{extension}")))
    }
}

#[async_trait]
impl KvStore for FileKvStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let path = self.path_for(key, "json")?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let path = self.path_for(key, "json")?;
        let tmp = self.path_for(key, "tmp")?;
        let bytes = serde_json::to_vec_pretty(&value)?;

        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        tracing::debug!(key, path = %path.display(), bytes = bytes.len(), "stored value");
        Ok(())
    }
}
