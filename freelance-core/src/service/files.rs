use super::{Actor, Market};
use crate::common::error::{MarketError, Result};
use crate::domain::{Audit, FileObject};
use crate::storage::object_store::sha256_hex;
use std::path::Path;
use tracing::{info, warn};
use uuid::Uuid;

/// An uploaded file as received from a multipart part.
#[derive(Debug, Clone, Default)]
pub struct Upload {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Upload {
    fn extension(&self) -> String {
        self.filename
            .as_deref()
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .map(str::to_ascii_lowercase)
            .unwrap_or_else(|| "bin".to_string())
    }
}

pub struct FileService<'a> {
    market: &'a Market,
}

impl<'a> FileService<'a> {
    pub fn new(market: &'a Market) -> Self {
        Self { market }
    }

    /// Stores the bytes under `users/<login>/<category>/<uuid>.<ext>` and records a FileObject.
    pub async fn store_upload(&self, actor: &Actor, category: &str, upload: &Upload) -> Result<FileObject> {
        let login = actor.require_login()?;
        if upload.bytes.is_empty() {
            return Err(MarketError::bad_request("fileObject", "emptyFile", "Uploaded file is empty"));
        }

        let bucket = self.market.bucket().to_string();
        let key = format!("users/{login}/{category}/{}.{}", Uuid::new_v4(), upload.extension());
        self.market.store().put(&bucket, &key, &upload.bytes).await?;

        let file = FileObject {
            id: None,
            bucket: bucket.clone(),
            object_key: key.clone(),
            content_type: upload.content_type.clone(),
            file_size: Some(i64::try_from(upload.bytes.len()).unwrap_or(i64::MAX)),
            checksum: Some(sha256_hex(&upload.bytes)),
            duration_seconds: Some(0),
            audit: Audit::default(),
        };

        match self.market.crud::<FileObject>().create(actor, file).await {
            Ok(saved) => {
                info!(key = %saved.object_key, size = ?saved.file_size, "stored upload");
                Ok(saved)
            }
            Err(e) => {
                if let Err(cleanup) = self.market.store().delete(&bucket, &key).await {
                    warn!(%key, error = %cleanup, "failed to remove orphaned object");
                }
                Err(e)
            }
        }
    }

    pub async fn content(&self, id: i64) -> Result<(FileObject, Vec<u8>)> {
        let file = self.market.crud::<FileObject>().find_one(id).await?;
        let bytes = self
            .market
            .store()
            .get(&file.bucket, &file.object_key)
            .await?
            .ok_or_else(|| {
                MarketError::not_found("fileObject", "contentNotFound", format!("No content stored for file {id}"))
            })?;
        Ok((file, bytes))
    }

    pub async fn delete_with_content(&self, id: i64) -> Result<()> {
        let file = self.market.crud::<FileObject>().find_one(id).await?;
        self.market.crud::<FileObject>().delete(id).await?;
        self.market.store().delete(&file.bucket, &file.object_key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::{market, upload};

    #[tokio::test]
    async fn stores_bytes_and_metadata() {
        let market = market();
        let files = market.files();
        let saved = files
            .store_upload(&Actor::user("ada"), "profile-pictures", &upload("Me.PNG", "image/png", b"abc"))
            .await
            .unwrap();

        assert_eq!(saved.bucket, "test-bucket");
        assert!(saved.object_key.starts_with("users/ada/profile-pictures/"));
        assert!(saved.object_key.ends_with(".png"));
        assert_eq!(saved.file_size, Some(3));
        assert_eq!(
            saved.checksum.as_deref(),
            Some("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
        );

        let (meta, bytes) = files.content(saved.id.unwrap()).await.unwrap();
        assert_eq!(meta.content_type.as_deref(), Some("image/png"));
        assert_eq!(bytes, b"abc");
    }

    #[tokio::test]
    async fn rejects_anonymous_and_empty_uploads() {
        let market = market();
        let files = market.files();
        let anon = files
            .store_upload(&Actor::anonymous(), "x", &upload("a.txt", "text/plain", b"a"))
            .await;
        assert!(matches!(anon, Err(MarketError::Unauthorized(_))));

        let empty = files
            .store_upload(&Actor::user("ada"), "x", &upload("a.txt", "text/plain", b""))
            .await
            .unwrap_err();
        assert_eq!(empty.key(), "emptyFile");
    }

    #[tokio::test]
    async fn delete_removes_row_and_object() {
        let market = market();
        let files = market.files();
        let saved = files
            .store_upload(&Actor::user("ada"), "docs", &upload("cv", "application/pdf", b"%PDF"))
            .await
            .unwrap();
        assert!(saved.object_key.ends_with(".bin"));

        files.delete_with_content(saved.id.unwrap()).await.unwrap();
        assert!(market
            .store()
            .get(&saved.bucket, &saved.object_key)
            .await
            .unwrap()
            .is_none());
        assert!(files.content(saved.id.unwrap()).await.is_err());
    }
}
