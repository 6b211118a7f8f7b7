//! Collaborator stores: uploaded card images and named card sets.
//!
//! Both stores are simple file-backed I/O behind small interfaces. The
//! game core never touches them; it only consumes the ordered list of
//! image references they produce as deck-builder input.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use rand::Rng;
use rand::distr::Alphanumeric;
use tokio::fs;

/// Errors from the upload and card-set stores.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A deck needs at least 2 distinct images.
    #[error("at least 2 images are required, got {0}")]
    TooFewImages(usize),

    /// The named card set does not exist.
    #[error("card set '{0}' not found")]
    SetNotFound(String),

    /// Underlying filesystem failure.
    #[error("store I/O failed")]
    Io(#[from] std::io::Error),

    /// The card-set file on disk is not valid JSON.
    #[error("card set file is corrupt")]
    Corrupt(#[from] serde_json::Error),
}

/// One image received from a client, with its original file name (only
/// the extension is kept).
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Stores uploaded card images and hands back stable references.
pub trait ImageStore {
    /// Persists a batch of images, returning one reference per image in
    /// input order.
    ///
    /// # Errors
    /// [`StoreError::TooFewImages`] when the batch cannot form a deck.
    async fn store_batch(
        &self,
        images: Vec<UploadedImage>,
    ) -> Result<Vec<String>, StoreError>;
}

/// [`ImageStore`] writing into an uploads directory on the local
/// filesystem. Each image gets a random file name (original extension
/// preserved) and is referenced as `/uploads/<name>`.
pub struct FsImageStore {
    root: PathBuf,
}

impl FsImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn random_name(original: &str) -> String {
        let stem: String = rand::rng()
            .sample_iter(Alphanumeric)
            .take(16)
            .map(char::from)
            .collect();
        match Path::new(original).extension().and_then(|e| e.to_str()) {
            Some(ext) => format!("{stem}.{ext}"),
            None => stem,
        }
    }
}

impl ImageStore for FsImageStore {
    async fn store_batch(
        &self,
        images: Vec<UploadedImage>,
    ) -> Result<Vec<String>, StoreError> {
        if images.len() < 2 {
            return Err(StoreError::TooFewImages(images.len()));
        }

        fs::create_dir_all(&self.root).await?;

        let mut refs = Vec::with_capacity(images.len());
        for image in images {
            let name = Self::random_name(&image.file_name);
            fs::write(self.root.join(&name), &image.bytes).await?;
            tracing::debug!(file = %name, bytes = image.bytes.len(), "image stored");
            refs.push(format!("/uploads/{name}"));
        }
        Ok(refs)
    }
}

/// Named, ordered lists of image references, persisted as one JSON file.
///
/// Lets players reuse a deck across sessions without re-uploading. The
/// whole store is read and rewritten per operation; card sets are tiny
/// and written rarely.
pub struct CardSetStore {
    path: PathBuf,
}

impl CardSetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Saves (or replaces) a named card set.
    pub async fn save(
        &self,
        name: &str,
        refs: Vec<String>,
    ) -> Result<(), StoreError> {
        let mut sets = self.read_all().await?;
        sets.insert(name.to_string(), refs);
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let json = serde_json::to_vec_pretty(&sets)?;
        fs::write(&self.path, json).await?;
        tracing::debug!(set = %name, "card set saved");
        Ok(())
    }

    /// Loads a named card set.
    ///
    /// # Errors
    /// [`StoreError::SetNotFound`] when no set has that name.
    pub async fn load(&self, name: &str) -> Result<Vec<String>, StoreError> {
        let mut sets = self.read_all().await?;
        sets.remove(name)
            .ok_or_else(|| StoreError::SetNotFound(name.to_string()))
    }

    /// Names of all stored card sets, sorted.
    pub async fn list(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.read_all().await?.into_keys().collect())
    }

    async fn read_all(
        &self,
    ) -> Result<BTreeMap<String, Vec<String>>, StoreError> {
        match fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Ok(BTreeMap::new())
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(label: &str) -> PathBuf {
        let suffix: String = rand::rng()
            .sample_iter(Alphanumeric)
            .take(8)
            .map(char::from)
            .collect();
        std::env::temp_dir().join(format!("pairgrid-{label}-{suffix}"))
    }

    fn png(name: &str) -> UploadedImage {
        UploadedImage {
            file_name: name.to_string(),
            bytes: vec![1, 2, 3],
        }
    }

    #[tokio::test]
    async fn test_store_batch_returns_upload_refs() {
        let dir = scratch_dir("uploads");
        let store = FsImageStore::new(&dir);

        let refs = store
            .store_batch(vec![png("cat.png"), png("dog.jpg")])
            .await
            .unwrap();

        assert_eq!(refs.len(), 2);
        assert!(refs[0].starts_with("/uploads/"));
        assert!(refs[0].ends_with(".png"));
        assert!(refs[1].ends_with(".jpg"));
        assert_ne!(refs[0], refs[1]);

        // The files are really on disk.
        for r in &refs {
            let name = r.strip_prefix("/uploads/").unwrap();
            assert!(dir.join(name).exists());
        }
        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_store_batch_rejects_single_image() {
        let store = FsImageStore::new(scratch_dir("uploads"));
        let result = store.store_batch(vec![png("cat.png")]).await;
        assert!(matches!(result, Err(StoreError::TooFewImages(1))));
    }

    #[tokio::test]
    async fn test_store_batch_keeps_extensionless_names() {
        let dir = scratch_dir("uploads");
        let store = FsImageStore::new(&dir);
        let refs = store
            .store_batch(vec![png("noext"), png("other")])
            .await
            .unwrap();
        assert!(!refs[0].contains('.'));
        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_card_set_save_load_round_trip() {
        let path = scratch_dir("sets").join("card_sets.json");
        let store = CardSetStore::new(&path);

        let refs = vec!["/uploads/a.png".to_string(), "/uploads/b.png".to_string()];
        store.save("animals", refs.clone()).await.unwrap();

        let loaded = store.load("animals").await.unwrap();
        assert_eq!(loaded, refs, "order is preserved");
        tokio::fs::remove_dir_all(path.parent().unwrap()).await.unwrap();
    }

    #[tokio::test]
    async fn test_card_set_load_missing_not_found() {
        let path = scratch_dir("sets").join("card_sets.json");
        let store = CardSetStore::new(&path);
        let result = store.load("nope").await;
        assert!(matches!(result, Err(StoreError::SetNotFound(_))));
    }

    #[tokio::test]
    async fn test_card_set_list_is_sorted() {
        let path = scratch_dir("sets").join("card_sets.json");
        let store = CardSetStore::new(&path);

        store.save("zoo", vec!["/uploads/z.png".into()]).await.unwrap();
        store.save("art", vec!["/uploads/a.png".into()]).await.unwrap();

        assert_eq!(store.list().await.unwrap(), vec!["art", "zoo"]);
        tokio::fs::remove_dir_all(path.parent().unwrap()).await.unwrap();
    }

    #[tokio::test]
    async fn test_card_set_save_replaces_existing() {
        let path = scratch_dir("sets").join("card_sets.json");
        let store = CardSetStore::new(&path);

        store.save("deck", vec!["/uploads/old.png".into()]).await.unwrap();
        store.save("deck", vec!["/uploads/new.png".into()]).await.unwrap();

        assert_eq!(store.load("deck").await.unwrap(), vec!["/uploads/new.png"]);
        assert_eq!(store.list().await.unwrap().len(), 1);
        tokio::fs::remove_dir_all(path.parent().unwrap()).await.unwrap();
    }
}
