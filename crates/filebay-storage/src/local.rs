//! Local filesystem storage: placer and remover for the storage root.

use crate::error::{StoreError, StoreResult};
use crate::ident;
use bytes::Bytes;
use filebay_core::{UploadPolicy, ValidationError};
use futures::{Stream, StreamExt};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Attempts to find an unused stored name before giving up. With 62^8 random
/// prefixes per millisecond this loop effectively never iterates twice.
const NAME_RETRY_LIMIT: u32 = 8;

/// A file accepted into the storage root.
#[derive(Debug, Clone)]
pub struct PlacedFile {
    pub stored_name: String,
    pub size: u64,
    pub content_type: String,
}

/// Storage root handle.
///
/// Cheap to clone and safe to use from many concurrent request-handling
/// tasks: there is no in-process shared mutable state, only the filesystem.
#[derive(Clone)]
pub struct LocalStore {
    root: PathBuf,
    public_base: String,
}

impl LocalStore {
    /// Create the storage root if absent and return a handle to it.
    ///
    /// An unwritable root is a startup failure, not a per-request one.
    pub async fn new(root: impl Into<PathBuf>, public_base: impl Into<String>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await.map_err(|e| {
            StoreError::Config(format!(
                "failed to create storage root {}: {}",
                root.display(),
                e
            ))
        })?;
        Ok(LocalStore {
            root,
            public_base: public_base.into(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Servable path for a stored name, e.g. `/uploads/{storedName}`.
    pub fn public_url(&self, stored_name: &str) -> String {
        format!("{}/{}", self.public_base.trim_end_matches('/'), stored_name)
    }

    /// Validate an uploaded stream and write it into the storage root under a
    /// freshly generated stored name.
    ///
    /// The upload is rejected before any disk write when the declared content
    /// type is outside the policy allow-list (or a declared size exceeds the
    /// ceiling). Bytes are streamed to a temporary `.part` file with the
    /// ceiling enforced mid-stream, then renamed into place atomically, so no
    /// half-written file is ever visible under its final name. Every failure
    /// path removes the partial file.
    pub async fn place<S, E>(
        &self,
        original_name: &str,
        declared_type: &str,
        declared_size: Option<u64>,
        policy: &UploadPolicy,
        mut stream: S,
    ) -> StoreResult<PlacedFile>
    where
        S: Stream<Item = Result<Bytes, E>> + Unpin,
        E: Into<StoreError>,
    {
        policy.validate(declared_type, declared_size)?;

        let sanitized = ident::sanitize_file_name(original_name);
        let stored_name = self.unused_stored_name(&sanitized).await?;
        let final_path = self.root.join(&stored_name);
        let part_path = self.root.join(format!(".{}.part", stored_name));

        // create_new: even a lost name-generation race cannot clobber anything
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&part_path)
            .await
            .map_err(|e| StoreError::UploadFailed(format!("failed to create part file: {}", e)))?;

        let write_result = copy_stream(&mut file, &mut stream, policy.max_upload_bytes()).await;
        drop(file);

        let size = match write_result {
            Ok(size) => size,
            Err(e) => {
                self.discard_part(&part_path).await;
                return Err(e);
            }
        };

        if let Err(e) = fs::rename(&part_path, &final_path).await {
            self.discard_part(&part_path).await;
            return Err(StoreError::Io(e));
        }

        tracing::info!(
            stored_name = %stored_name,
            size_bytes = size,
            content_type = %declared_type,
            "file placed in storage root"
        );

        Ok(PlacedFile {
            stored_name,
            size,
            content_type: declared_type.to_string(),
        })
    }

    /// Remove a stored file by name.
    ///
    /// The name is validated against the storage root before the unlink: a
    /// name with separators or parent references, or whose canonical path
    /// falls outside the canonical root, is rejected without touching disk.
    /// Removing an absent name yields `NotFound`, which is safe to retry.
    pub async fn remove(&self, requested_name: &str) -> StoreResult<()> {
        let path = self.resolve(requested_name)?;

        fs::remove_file(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StoreError::NotFound(requested_name.to_string())
            } else {
                StoreError::Io(e)
            }
        })?;

        tracing::info!(stored_name = %requested_name, "file removed from storage root");
        Ok(())
    }

    /// Check whether a stored name currently exists in the storage root.
    pub async fn exists(&self, stored_name: &str) -> StoreResult<bool> {
        match self.resolve(stored_name) {
            Ok(path) => Ok(fs::try_exists(&path).await.unwrap_or(false)),
            Err(StoreError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Resolve a caller-supplied name to a canonical path strictly inside the
    /// canonical storage root.
    fn resolve(&self, requested_name: &str) -> StoreResult<PathBuf> {
        if requested_name.trim().is_empty() {
            return Err(StoreError::MissingName);
        }
        if requested_name.contains('/') || requested_name.contains('\\') {
            return Err(StoreError::InvalidName(
                "name contains path separators".to_string(),
            ));
        }
        // A single path component from here on, so `..` itself is the only
        // traversal left. Dots embedded in a name (`a..b.png`) are legitimate
        // stored names and must stay removable.
        if requested_name == ".." {
            return Err(StoreError::InvalidName(
                "name is a parent-directory reference".to_string(),
            ));
        }

        let root = self.root.canonicalize().map_err(|e| {
            StoreError::Config(format!("failed to canonicalize storage root: {}", e))
        })?;

        match root.join(requested_name).canonicalize() {
            Ok(canonical) => {
                // Symlinks are resolved by canonicalize, so a link pointing
                // outside the root is caught here, as is a name like `.`
                // that resolves to the root itself.
                if canonical == root || !canonical.starts_with(&root) {
                    return Err(StoreError::InvalidName(
                        "name does not resolve to a file inside the storage root".to_string(),
                    ));
                }
                Ok(canonical)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(requested_name.to_string()))
            }
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    /// Compose a stored name that does not currently exist in the root.
    ///
    /// Uniqueness is already structural (random prefix x timestamp suffix);
    /// the existence check closes the residual collision window without any
    /// cross-request lock.
    async fn unused_stored_name(&self, sanitized: &str) -> StoreResult<String> {
        for _ in 0..NAME_RETRY_LIMIT {
            let name = ident::compose_stored_name(
                &ident::new_identifier(ident::DEFAULT_RANDOM_LEN),
                sanitized,
            );
            if !fs::try_exists(self.root.join(&name)).await.unwrap_or(false) {
                return Ok(name);
            }
        }
        Err(StoreError::UploadFailed(
            "could not generate an unused stored name".to_string(),
        ))
    }

    async fn discard_part(&self, part_path: &Path) {
        if let Err(e) = fs::remove_file(part_path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(error = %e, "failed to remove partial upload");
            }
        }
    }
}

/// Stream chunks into the part file, enforcing the byte ceiling as they
/// arrive. A truncated or errored client stream aborts the write; the caller
/// discards the part file on any error. The stream producer classifies its
/// own read errors by converting them into `StoreError`.
async fn copy_stream<S, E>(file: &mut fs::File, stream: &mut S, max: u64) -> StoreResult<u64>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Into<StoreError>,
{
    let mut written: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(Into::into)?;
        written += chunk.len() as u64;
        if written > max {
            return Err(ValidationError::TooLarge { size: written, max }.into());
        }
        file.write_all(&chunk).await?;
    }
    file.sync_all().await?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn policy() -> UploadPolicy {
        UploadPolicy::new(
            64,
            vec!["image/png".to_string(), "application/pdf".to_string()],
        )
    }

    fn chunked(data: &[u8]) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Unpin {
        let chunks: Vec<Result<Bytes, std::io::Error>> = data
            .chunks(4)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        futures::stream::iter(chunks)
    }

    async fn visible_files(root: &Path) -> Vec<String> {
        let mut names = Vec::new();
        let mut entries = fs::read_dir(root).await.unwrap();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        names
    }

    #[tokio::test]
    async fn place_round_trips_content() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path(), "/uploads").await.unwrap();

        let data = b"0123456789";
        let placed = store
            .place("a.png", "image/png", None, &policy(), chunked(data))
            .await
            .unwrap();

        assert!(placed.stored_name.ends_with("-a.png"));
        assert_eq!(placed.size, 10);
        assert_eq!(placed.content_type, "image/png");

        let prefix = placed.stored_name.strip_suffix("-a.png").unwrap();
        assert!(prefix.len() > ident::DEFAULT_RANDOM_LEN);
        assert!(prefix.chars().all(|c| c.is_ascii_alphanumeric()));

        let on_disk = fs::read(dir.path().join(&placed.stored_name)).await.unwrap();
        assert_eq!(on_disk, data);

        // no .part leftovers
        assert_eq!(visible_files(dir.path()).await, vec![placed.stored_name]);
    }

    #[tokio::test]
    async fn place_rejects_unsupported_type_without_touching_disk() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path(), "/uploads").await.unwrap();

        let result = store
            .place("a.txt", "text/plain", None, &policy(), chunked(b"hello"))
            .await;

        assert!(matches!(
            result,
            Err(StoreError::Rejected(ValidationError::UnsupportedType { .. }))
        ));
        assert!(visible_files(dir.path()).await.is_empty());
    }

    #[tokio::test]
    async fn place_aborts_over_ceiling_and_removes_partial() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path(), "/uploads").await.unwrap();

        let oversized = vec![0u8; 65];
        let result = store
            .place("big.png", "image/png", None, &policy(), chunked(&oversized))
            .await;

        assert!(matches!(
            result,
            Err(StoreError::Rejected(ValidationError::TooLarge { .. }))
        ));
        assert!(visible_files(dir.path()).await.is_empty());
    }

    #[tokio::test]
    async fn place_cleans_up_on_interrupted_stream() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path(), "/uploads").await.unwrap();

        let broken = futures::stream::iter(vec![
            Ok(Bytes::from_static(b"part")),
            Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "client went away",
            )),
        ]);

        let result = store
            .place("drop.png", "image/png", None, &policy(), broken)
            .await;

        assert!(matches!(result, Err(StoreError::Io(_))));
        assert!(visible_files(dir.path()).await.is_empty());
    }

    #[tokio::test]
    async fn stored_names_with_inner_dots_round_trip() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path(), "/uploads").await.unwrap();

        let placed = store
            .place("a..b.png", "image/png", None, &policy(), chunked(b"dots"))
            .await
            .unwrap();
        assert!(placed.stored_name.ends_with("-a..b.png"));
        assert!(store.exists(&placed.stored_name).await.unwrap());

        store.remove(&placed.stored_name).await.unwrap();
        assert!(visible_files(dir.path()).await.is_empty());
    }

    #[tokio::test]
    async fn remove_is_idempotent_failure() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path(), "/uploads").await.unwrap();

        let placed = store
            .place("a.pdf", "application/pdf", None, &policy(), chunked(b"pdf"))
            .await
            .unwrap();

        store.remove(&placed.stored_name).await.unwrap();
        assert!(!store.exists(&placed.stored_name).await.unwrap());

        let second = store.remove(&placed.stored_name).await;
        assert!(matches!(second, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn remove_rejects_traversal_sequences() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path(), "/uploads").await.unwrap();

        for name in ["../../etc/passwd", "..", "a/b.png", "\\evil", "sub/../x"] {
            let result = store.remove(name).await;
            assert!(
                matches!(result, Err(StoreError::InvalidName(_))),
                "expected InvalidName for {:?}",
                name
            );
        }
    }

    #[tokio::test]
    async fn remove_rejects_the_root_itself() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path(), "/uploads").await.unwrap();

        // `.` is a single component but canonicalizes to the root
        let result = store.remove(".").await;
        assert!(matches!(result, Err(StoreError::InvalidName(_))));
        assert!(dir.path().is_dir());
    }

    #[tokio::test]
    async fn remove_rejects_missing_name() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path(), "/uploads").await.unwrap();

        assert!(matches!(store.remove("").await, Err(StoreError::MissingName)));
        assert!(matches!(store.remove("   ").await, Err(StoreError::MissingName)));
    }

    #[tokio::test]
    async fn remove_missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path(), "/uploads").await.unwrap();

        let result = store.remove("nope.png").await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn concurrent_places_get_distinct_names() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path(), "/uploads").await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..32 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .place("same.png", "image/png", None, &policy(), chunked(b"data"))
                    .await
                    .unwrap()
                    .stored_name
            }));
        }

        let mut names = std::collections::HashSet::new();
        for handle in handles {
            assert!(names.insert(handle.await.unwrap()));
        }
        assert_eq!(visible_files(dir.path()).await.len(), 32);
    }

    #[tokio::test]
    async fn public_url_uses_base_path() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path(), "/uploads/").await.unwrap();
        assert_eq!(store.public_url("abc-a.png"), "/uploads/abc-a.png");
    }
}
