//! Where accepted file parts end up.
//!
//! Bytes are spooled to a temporary file beneath the base directory while the
//! part streams in, and only renamed into place once the size policy has
//! accepted the part. `UploadStore::Discard` reads and drops everything.

use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub enum UploadStore {
    /// Accept and report, but never write.
    Discard,
    /// Write accepted parts to `base_dir/<submitted file name>`.
    Disk(DiskStore),
}

#[derive(Debug, Clone)]
pub struct DiskStore {
    pub base_dir: PathBuf,
}

impl DiskStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Final location for a submitted file name, if it names a file at all.
    ///
    /// Only the last path component is kept, so `../../etc/passwd` lands as
    /// `passwd` inside the base directory.
    pub fn target_path(&self, submitted: &str) -> Option<PathBuf> {
        let last = submitted.rsplit(['/', '\\']).next()?;
        if last.is_empty() || last == "." || last == ".." || last.contains('\0') {
            return None;
        }
        Some(self.base_dir.join(last))
    }
}

impl UploadStore {
    pub fn from_dir(dir: Option<PathBuf>) -> Self {
        match dir {
            Some(dir) => UploadStore::Disk(DiskStore::new(dir)),
            None => UploadStore::Discard,
        }
    }

    /// Begin receiving one file part.
    pub async fn stage(&self) -> io::Result<Staging> {
        match self {
            UploadStore::Discard => Ok(Staging::Sink),
            UploadStore::Disk(store) => {
                fs::create_dir_all(&store.base_dir).await?;
                let tmp_path = store.base_dir.join(format!(".tmp-{}", Uuid::new_v4()));
                let file = File::create(&tmp_path).await?;
                Ok(Staging::Spool {
                    store: store.clone(),
                    file,
                    guard: SpoolGuard::new(tmp_path),
                })
            }
        }
    }
}

/// Owns a spool file path and removes the file unless it was moved into place.
///
/// Covers every exit that skips `commit`/`discard`, including a request
/// future dropped mid-stream.
#[derive(Debug)]
pub struct SpoolGuard {
    path: PathBuf,
    armed: bool,
}

impl SpoolGuard {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The file has been renamed away; nothing to clean up.
    fn disarm(mut self) {
        self.armed = false;
    }

    async fn remove(mut self) {
        self.armed = false;
        remove_spool(&self.path).await;
    }
}

impl Drop for SpoolGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(_) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => debug!(
                "failed to remove spool file {}: {}",
                self.path.display(),
                err
            ),
        }
    }
}

/// Bytes of one file part in flight.
#[derive(Debug)]
pub enum Staging {
    Sink,
    Spool {
        store: DiskStore,
        file: File,
        guard: SpoolGuard,
    },
}

impl Staging {
    pub async fn write(&mut self, chunk: &[u8]) -> io::Result<()> {
        match self {
            Staging::Sink => Ok(()),
            Staging::Spool { file, .. } => file.write_all(chunk).await,
        }
    }

    /// Drop the spooled bytes. Further writes are ignored.
    pub async fn abandon(&mut self) {
        if let Staging::Spool { file, guard, .. } = std::mem::replace(self, Staging::Sink) {
            drop(file);
            guard.remove().await;
        }
    }

    /// Move the spooled bytes to their final place.
    ///
    /// Returns the written path, or `None` when nothing was written. On any
    /// error the spool file is removed when `guard` drops.
    pub async fn commit(self, file_name: Option<&str>) -> io::Result<Option<PathBuf>> {
        let Staging::Spool {
            store,
            mut file,
            guard,
        } = self
        else {
            return Ok(None);
        };

        let Some(target) = file_name.and_then(|name| store.target_path(name)) else {
            warn!(
                "not persisting upload with unusable file name {:?}",
                file_name
            );
            drop(file);
            guard.remove().await;
            return Ok(None);
        };

        finish(&mut file).await?;
        drop(file);

        if let Err(err) = fs::rename(guard.path(), &target).await {
            if err.kind() != ErrorKind::AlreadyExists {
                return Err(err);
            }
            fs::remove_file(&target).await?;
            fs::rename(guard.path(), &target).await?;
        }
        guard.disarm();

        debug!("persisted upload to {}", target.display());
        Ok(Some(target))
    }

    /// Drop the spool without keeping anything.
    pub async fn discard(mut self) {
        self.abandon().await;
    }
}

async fn finish(file: &mut File) -> io::Result<()> {
    file.flush().await?;
    file.sync_all().await
}

async fn remove_spool(path: &Path) {
    match fs::remove_file(path).await {
        Ok(_) => {}
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => debug!("failed to remove spool file {}: {}", path.display(), err),
    }
}
