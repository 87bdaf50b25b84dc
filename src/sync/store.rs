//! Filesystem bucket store.
//!
//! Layout: one directory per date under the output root, one `hour_HH.csv`
//! per bucket inside it. Writes go to a temp file in the same directory and
//! are renamed into place, so a reader sees either the old content or the
//! complete new content, never a torn write.

use super::{BucketStore, StoreError, StoredBucketRecord};
use crate::BucketKey;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Bucket store rooted at an output directory.
#[derive(Debug, Clone)]
pub struct FsBucketStore {
    root: PathBuf,
}

impl FsBucketStore {
    /// Store rooted at `root`; directories are created lazily on first write.
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// Root output directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file backing a bucket: `<root>/<YYYY-MM-DD>/hour_HH.csv`.
    pub fn bucket_path(&self, bucket: BucketKey) -> PathBuf {
        self.root
            .join(bucket.date().format("%Y-%m-%d").to_string())
            .join(bucket.file_name())
    }

    fn io_error(bucket: BucketKey, source: std::io::Error) -> StoreError {
        StoreError::Io {
            bucket: bucket.to_string(),
            source,
        }
    }
}

impl BucketStore for FsBucketStore {
    fn read(&self, bucket: BucketKey) -> Result<Option<StoredBucketRecord>, StoreError> {
        let path = self.bucket_path(bucket);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(StoredBucketRecord::from_content(content))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::io_error(bucket, e)),
        }
    }

    fn write(&self, bucket: BucketKey, content: &str) -> Result<(), StoreError> {
        let path = self.bucket_path(bucket);
        let dir = path
            .parent()
            .expect("bucket path always has a date directory");
        fs::create_dir_all(dir).map_err(|e| Self::io_error(bucket, e))?;

        // Temp file in the same directory so the rename stays on one
        // filesystem and is atomic.
        let tmp_path = dir.join(format!(".{}.tmp", bucket.file_name()));
        let mut tmp = fs::File::create(&tmp_path).map_err(|e| Self::io_error(bucket, e))?;
        tmp.write_all(content.as_bytes())
            .map_err(|e| Self::io_error(bucket, e))?;
        tmp.sync_all().map_err(|e| Self::io_error(bucket, e))?;
        drop(tmp);

        fs::rename(&tmp_path, &path).map_err(|e| Self::io_error(bucket, e))?;
        debug!(path = %path.display(), bytes = content.len(), "bucket written");
        Ok(())
    }
}
