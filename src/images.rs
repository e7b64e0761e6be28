use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use std::path::PathBuf;
use uuid::Uuid;

/// Source of opaque image file ids. Injected so path generation stays a pure
/// function of its inputs and can be pinned in tests.
pub trait ImageIdGen: Send + Sync {
    fn generate(&self) -> Uuid;
}

pub struct UuidGen;

impl ImageIdGen for UuidGen {
    fn generate(&self) -> Uuid {
        Uuid::new_v4()
    }
}

/// Builds `uploads/recipe/<id>.<ext>`, keeping the extension of the original
/// filename. The id never derives from the input, so paths cannot collide or
/// be guessed from the upload.
pub fn generate_path(ids: &dyn ImageIdGen, original_filename: &str) -> String {
    let id = ids.generate();
    match original_filename.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => format!("uploads/recipe/{}.{}", id, ext),
        _ => format!("uploads/recipe/{}", id),
    }
}

#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn put(&self, path: &str, body: Bytes) -> anyhow::Result<()>;
    async fn delete(&self, path: &str) -> anyhow::Result<()>;
}

/// Local-disk store rooted at `MEDIA_ROOT`.
pub struct FsImageStore {
    root: PathBuf,
}

impl FsImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ImageStore for FsImageStore {
    async fn put(&self, path: &str, body: Bytes) -> anyhow::Result<()> {
        let full = self.root.join(path);
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("create_dir_all {}", parent.display()))?;
        }
        tokio::fs::write(&full, &body)
            .await
            .with_context(|| format!("write {}", full.display()))?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> anyhow::Result<()> {
        let full = self.root.join(path);
        match tokio::fs::remove_file(&full).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("remove {}", full.display())),
        }
    }
}

#[cfg(test)]
pub(crate) struct FixedIdGen(pub Uuid);

#[cfg(test)]
impl ImageIdGen for FixedIdGen {
    fn generate(&self) -> Uuid {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_uses_injected_id_and_original_extension() {
        let id = Uuid::parse_str("0a0b0c0d-0e0f-4a4b-8c8d-0e0f0a0b0c0d").unwrap();
        let path = generate_path(&FixedIdGen(id), "example.jpg");
        assert_eq!(path, format!("uploads/recipe/{}.jpg", id));
    }

    #[test]
    fn path_without_extension_has_none() {
        let id = Uuid::parse_str("0a0b0c0d-0e0f-4a4b-8c8d-0e0f0a0b0c0d").unwrap();
        let path = generate_path(&FixedIdGen(id), "example");
        assert_eq!(path, format!("uploads/recipe/{}", id));
    }

    #[test]
    fn two_real_ids_do_not_collide() {
        let a = generate_path(&UuidGen, "a.png");
        let b = generate_path(&UuidGen, "a.png");
        assert_ne!(a, b);
    }
}
