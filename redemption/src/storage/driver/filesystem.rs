use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::storage::{ObjectStore, Precondition, StorageError, StoredObject};

use sha2::{Digest, Sha256};
use tokio::{
    fs::{File, create_dir_all, read, remove_file, rename},
    io::{self, AsyncWriteExt},
    sync::Mutex,
};

/// Stores every object as a plain file under `root`, named by its key.
///
/// The version of an object is the hex SHA-256 of its content. Writes land in
/// a temporary sibling file first and are renamed into place, so readers never
/// observe a half-written record.
pub struct FilesystemStore {
    root: PathBuf,
    write_lock: Mutex<()>,
    tmp_seq: AtomicU64,
}

impl FilesystemStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        FilesystemStore {
            root: root.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
            tmp_seq: AtomicU64::new(0),
        }
    }

    fn object_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    async fn create_path(&self, key: &str) -> io::Result<PathBuf> {
        let file_path = self.object_path(key);
        if let Some(parent) = file_path.parent() {
            create_dir_all(parent).await?;
        }
        Ok(file_path)
    }

    async fn read_version(path: &Path) -> io::Result<Option<String>> {
        match read(path).await {
            Ok(data) => Ok(Some(content_version(&data))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

fn content_version(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

#[async_trait::async_trait]
impl ObjectStore for FilesystemStore {
    async fn get_object(&self, key: &str) -> Result<Option<StoredObject>, StorageError> {
        match read(self.object_path(key)).await {
            Ok(data) => {
                let version = Some(content_version(&data));
                Ok(Some(StoredObject { data, version }))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put_object(
        &self,
        key: &str,
        data: Vec<u8>,
        precondition: Precondition,
    ) -> Result<(), StorageError> {
        // Serializes compare-and-write against other writers in this process.
        let _guard = self.write_lock.lock().await;

        let file_path = self.create_path(key).await?;
        if let Precondition::IfMatch(expected) = &precondition {
            let current = Self::read_version(&file_path).await?;
            if current.as_deref() != Some(expected.as_str()) {
                return Err(StorageError::PreconditionFailed(key.to_string()));
            }
        }

        let seq = self.tmp_seq.fetch_add(1, Ordering::Relaxed);
        let mut tmp_name = file_path.as_os_str().to_owned();
        tmp_name.push(format!(".{}.{seq}.tmp", std::process::id()));
        let tmp_path = PathBuf::from(tmp_name);

        let written = async {
            let mut file = File::create(&tmp_path).await?;
            file.write_all(&data).await?;
            file.sync_all().await?;
            rename(&tmp_path, &file_path).await
        }
        .await;

        if let Err(e) = written {
            let _ = remove_file(&tmp_path).await;
            return Err(e.into());
        }
        Ok(())
    }
}
