//! Blob store rooted in a local directory.
//!
//! All access goes through a `cap_std` directory handle, so logical names can
//! never escape the root. Files are created with create-new semantics: the
//! filesystem itself decides which of several concurrent writers wins a name.
//! Content types are not persisted; readers infer them from the extension.

use std::io::{self, Read, Write};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use cap_std::fs::{Dir, File, OpenOptions};
use cap_std::ambient_authority;
use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use tracing::debug;

use crate::domain::ports::{BLOB_CHUNK_SIZE, BlobChunks, BlobStore, BlobStoreError, OpenedBlob};
use crate::domain::{BlobMetadata, BlobName, MediaLocator};

/// Blob store writing one file per blob below a root directory.
#[derive(Clone)]
pub struct FilesystemBlobStore {
    root: Arc<Dir>,
    locator: MediaLocator,
}

impl FilesystemBlobStore {
    /// Open (creating if needed) the root directory.
    ///
    /// # Errors
    /// Returns the I/O error when the directory cannot be created or opened.
    pub fn open(root: &Path, locator: MediaLocator) -> io::Result<Self> {
        Dir::create_ambient_dir_all(root, ambient_authority())?;
        let dir = Dir::open_ambient_dir(root, ambient_authority())?;
        Ok(Self {
            root: Arc::new(dir),
            locator,
        })
    }

    async fn blocking<T, F>(&self, op: F) -> Result<T, BlobStoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Dir) -> Result<T, BlobStoreError> + Send + 'static,
    {
        let root = Arc::clone(&self.root);
        tokio::task::spawn_blocking(move || op(&root))
            .await
            .map_err(|err| BlobStoreError::io(format!("blocking task failed: {err}")))?
    }
}

fn io_failure(name: &BlobName, err: &io::Error) -> BlobStoreError {
    BlobStoreError::io(format!("{name}: {err}"))
}

/// Write `content` to a file that must not already exist.
///
/// Returns `Ok(false)` when the name is taken.
fn write_new(root: &Dir, name: &BlobName, content: &[u8]) -> Result<bool, BlobStoreError> {
    let path = Path::new(name.as_ref());
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        root.create_dir_all(parent)
            .map_err(|err| io_failure(name, &err))?;
    }
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    let mut file = match root.open_with(path, &options) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => return Ok(false),
        Err(err) => return Err(io_failure(name, &err)),
    };
    if let Err(err) = file.write_all(content).and_then(|()| file.sync_all()) {
        // Leave no truncated file behind under a name we claimed.
        drop(file);
        let _cleanup = root.remove_file(path);
        return Err(io_failure(name, &err));
    }
    Ok(true)
}

fn stream_file(file: File) -> BlobChunks {
    futures_util::stream::try_unfold(file, |mut file| async move {
        let (file, chunk) = tokio::task::spawn_blocking(move || {
            let mut buf = vec![0; BLOB_CHUNK_SIZE];
            let read = file.read(&mut buf)?;
            buf.truncate(read);
            Ok::<_, io::Error>((file, buf))
        })
        .await
        .map_err(|err| BlobStoreError::io(format!("blocking task failed: {err}")))?
        .map_err(|err| BlobStoreError::io(err.to_string()))?;
        if chunk.is_empty() {
            Ok(None)
        } else {
            Ok(Some((chunk, file)))
        }
    })
    .boxed()
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn exists(&self, name: &BlobName) -> Result<bool, BlobStoreError> {
        let name = name.clone();
        self.blocking(move |root| Ok(root.is_file(name.as_ref())))
            .await
    }

    async fn save(
        &self,
        name: &BlobName,
        content: Vec<u8>,
        _content_type: Option<String>,
    ) -> Result<BlobName, BlobStoreError> {
        let requested = name.clone();
        self.blocking(move |root| {
            for candidate in requested.save_candidates() {
                if write_new(root, &candidate, &content)? {
                    return Ok(candidate);
                }
                debug!(name = %candidate, "blob name taken; trying another");
            }
            Err(BlobStoreError::names_exhausted(requested.as_ref()))
        })
        .await
    }

    async fn open(&self, name: &BlobName) -> Result<Option<OpenedBlob>, BlobStoreError> {
        let name = name.clone();
        self.blocking(move |root| {
            let file = match root.open(name.as_ref()) {
                Ok(file) => file,
                Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
                Err(err) => return Err(io_failure(&name, &err)),
            };
            let meta = file.metadata().map_err(|err| io_failure(&name, &err))?;
            if !meta.is_file() {
                return Ok(None);
            }
            let created_at = meta
                .modified()
                .map(|time| DateTime::<Utc>::from(time.into_std()))
                .unwrap_or_else(|_| Utc::now());
            Ok(Some(OpenedBlob {
                metadata: BlobMetadata {
                    name,
                    size: meta.len(),
                    content_type: None,
                    created_at,
                },
                content: stream_file(file),
            }))
        })
        .await
    }

    async fn delete(&self, name: &BlobName) -> Result<(), BlobStoreError> {
        let name = name.clone();
        self.blocking(move |root| match root.remove_file(name.as_ref()) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(io_failure(&name, &err)),
        })
        .await
    }

    fn url_for(&self, name: &BlobName) -> String {
        self.locator.url_for(name)
    }
}
