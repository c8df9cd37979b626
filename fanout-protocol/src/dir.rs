//! Scratch directory ownership and sentinel-file operations

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{ProtocolError, ProtocolResult};
use crate::files::{file_id, pad_width, parse_name, JobFile};
use crate::wire::{JobInput, JobOutcome};

/// Deletions race slow filesystems, so each is retried this many times
const CLEANUP_ATTEMPTS: u32 = 5;
/// Base delay between deletion attempts; grows linearly per attempt
const CLEANUP_DELAY: Duration = Duration::from_millis(100);

/// Owns one scratch directory and all file naming inside it
///
/// The dispatcher creates one `JobDir` per run; workers attach to the same
/// path with [`JobDir::open`]. Every path the protocol touches goes through
/// this handle, so no ambient directory state exists.
#[derive(Debug, Clone)]
pub struct JobDir {
    root: PathBuf,
    width: usize,
}

impl JobDir {
    /// Create a fresh uniquely-named scratch directory under `share_dir`
    pub async fn create(share_dir: &Path, n_jobs: u64) -> ProtocolResult<Self> {
        let root = share_dir.join(format!("fanout-{}", Uuid::new_v4()));
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| ProtocolError::io(&root, e))?;
        debug!(dir = %root.display(), n_jobs, "created protocol directory");
        Ok(Self {
            root,
            width: pad_width(n_jobs),
        })
    }

    /// Attach to an existing protocol directory (worker side); creates nothing
    pub fn open(root: impl Into<PathBuf>, n_jobs: u64) -> Self {
        Self {
            root: root.into(),
            width: pad_width(n_jobs),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Zero-padded file id for a job index
    pub fn file_id(&self, id: u64) -> String {
        file_id(id, self.width)
    }

    /// Full path of one sentinel file
    pub fn path(&self, id: u64, kind: JobFile) -> PathBuf {
        self.root
            .join(format!("{}{}", self.file_id(id), kind.suffix()))
    }

    pub async fn write_input(&self, id: u64, input: &JobInput) -> ProtocolResult<()> {
        let bytes = serde_json::to_vec(input)?;
        self.write(self.path(id, JobFile::Input), &bytes).await
    }

    pub async fn read_input(&self, id: u64) -> ProtocolResult<JobInput> {
        let path = self.path(id, JobFile::Input);
        let bytes = tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ProtocolError::MissingFile {
                    kind: JobFile::Input.tag(),
                    id,
                }
            } else {
                ProtocolError::io(&path, e)
            }
        })?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Write the job's return value; callers must do this before
    /// [`JobDir::mark_done`] so the collector never sees `done` first
    pub async fn write_output(&self, id: u64, outcome: &JobOutcome) -> ProtocolResult<()> {
        let bytes = serde_json::to_vec(outcome)?;
        self.write(self.path(id, JobFile::Output), &bytes).await
    }

    /// Read the job's outcome; `None` when no output file was produced
    /// (a non-storing run's success path)
    pub async fn read_output(&self, id: u64) -> ProtocolResult<Option<JobOutcome>> {
        let path = self.path(id, JobFile::Output);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ProtocolError::io(&path, e)),
        }
    }

    pub async fn mark_started(&self, id: u64) -> ProtocolResult<()> {
        self.write(self.path(id, JobFile::Started), &[]).await
    }

    /// Write the completion signal; the final protocol step for a job
    pub async fn mark_done(&self, id: u64) -> ProtocolResult<()> {
        self.write(self.path(id, JobFile::Done), &[]).await
    }

    pub async fn exists(&self, id: u64, kind: JobFile) -> ProtocolResult<bool> {
        let path = self.path(id, kind);
        tokio::fs::try_exists(&path)
            .await
            .map_err(|e| ProtocolError::io(&path, e))
    }

    /// Ids currently bearing `kind`'s sentinel
    pub async fn scan(&self, kind: JobFile) -> ProtocolResult<BTreeSet<u64>> {
        let mut ids = BTreeSet::new();
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| ProtocolError::io(&self.root, e))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ProtocolError::io(&self.root, e))?
        {
            let name = entry.file_name();
            if let Some(name) = name.to_str() {
                if let Some(id) = parse_name(name, kind) {
                    ids.insert(id);
                }
            }
        }
        Ok(ids)
    }

    /// Delete every file of a collected job; afterwards no file with the
    /// job's id prefix remains
    pub async fn remove_job(&self, id: u64) -> ProtocolResult<()> {
        for kind in JobFile::all() {
            self.remove_with_retry(self.path(id, kind)).await?;
        }
        Ok(())
    }

    /// Best-effort recursive removal of the whole scratch directory; a final
    /// failure is logged, never fatal
    pub async fn remove_all(&self) {
        let mut last_error = None;
        for attempt in 1..=CLEANUP_ATTEMPTS {
            match tokio::fs::remove_dir_all(&self.root).await {
                Ok(()) => return,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return,
                Err(e) => {
                    last_error = Some(e);
                    sleep(CLEANUP_DELAY * attempt).await;
                }
            }
        }
        if let Some(e) = last_error {
            warn!(
                dir = %self.root.display(),
                error = %e,
                "leaving scratch directory behind after {} attempts",
                CLEANUP_ATTEMPTS
            );
        }
    }

    async fn write(&self, path: PathBuf, bytes: &[u8]) -> ProtocolResult<()> {
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| ProtocolError::io(&path, e))
    }

    async fn remove_with_retry(&self, path: PathBuf) -> ProtocolResult<()> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match tokio::fs::remove_file(&path).await {
                Ok(()) => return Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
                Err(e) if attempt >= CLEANUP_ATTEMPTS => {
                    return Err(ProtocolError::CleanupFailed {
                        path,
                        attempts: attempt,
                        source: e,
                    });
                }
                Err(e) => {
                    warn!(path = %path.display(), attempt, error = %e, "delete failed, retrying");
                    sleep(CLEANUP_DELAY * attempt).await;
                }
            }
        }
    }
}
