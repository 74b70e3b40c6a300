use bytes::Bytes;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::storage::StorageClient;

/// An image file pulled out of a multipart body.
#[derive(Debug, Clone)]
pub struct UploadItem {
    pub body: Bytes,
    pub content_type: String,
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// Rejects anything other than JPEG, PNG or WEBP. Runs before any upload.
pub fn check_media_type(content_type: &str) -> AppResult<&'static str> {
    let normalized = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    ext_from_mime(&normalized).ok_or(AppError::UnsupportedMedia)
}

/// Uploads one image under `prefix` and returns its public URL.
pub async fn upload_image(
    storage: &dyn StorageClient,
    prefix: &str,
    item: UploadItem,
) -> AppResult<String> {
    let ext = check_media_type(&item.content_type)?;
    let key = format!("{}/{}.{}", prefix, Uuid::new_v4(), ext);
    storage
        .put_object(&key, item.body, &item.content_type)
        .await
        .map_err(|e| AppError::UploadFailed(format!("{:#}", e)))?;
    debug!(%key, "image uploaded");
    Ok(storage.public_url(&key))
}

/// Best-effort removal of an image that will not be referenced after all.
pub async fn discard_image(storage: &dyn StorageClient, url: &str) {
    let Some(key) = storage.key_from_url(url) else {
        return;
    };
    if let Err(e) = storage.delete_object(&key).await {
        warn!(error = %e, %key, "failed to discard orphaned image");
    }
}

#[cfg(test)]
mod image_tests {
    use super::*;
    use crate::storage::fake::FakeStorage;

    fn item(ct: &str) -> UploadItem {
        UploadItem {
            body: Bytes::from_static(b"\x89PNG...."),
            content_type: ct.to_string(),
        }
    }

    #[test]
    fn test_ext_from_mime() {
        assert_eq!(ext_from_mime("image/jpeg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/jpg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/png"), Some("png"));
        assert_eq!(ext_from_mime("image/webp"), Some("webp"));
        assert_eq!(ext_from_mime("image/gif"), None);
        assert_eq!(ext_from_mime("application/octet-stream"), None);
    }

    #[test]
    fn media_type_check_ignores_case_and_parameters() {
        assert_eq!(check_media_type("IMAGE/PNG").unwrap(), "png");
        assert_eq!(check_media_type("image/webp; charset=binary").unwrap(), "webp");
        assert!(matches!(
            check_media_type("image/gif"),
            Err(AppError::UnsupportedMedia)
        ));
    }

    #[tokio::test]
    async fn upload_returns_public_url_under_prefix() {
        let storage = FakeStorage::default();
        let url = upload_image(&storage, "blogs", item("image/png")).await.unwrap();
        assert!(url.starts_with("https://fake.local/blogs/"));
        assert!(url.ends_with(".png"));
        assert_eq!(storage.put_count(), 1);
    }

    #[tokio::test]
    async fn gif_is_rejected_without_touching_storage() {
        let storage = FakeStorage::default();
        let err = upload_image(&storage, "blogs", item("image/gif")).await.unwrap_err();
        assert!(matches!(err, AppError::UnsupportedMedia));
        assert_eq!(storage.put_count(), 0);
    }

    #[tokio::test]
    async fn storage_failure_surfaces_as_upload_failed() {
        let storage = FakeStorage::failing();
        let err = upload_image(&storage, "blogs", item("image/jpeg")).await.unwrap_err();
        assert!(matches!(err, AppError::UploadFailed(_)));
    }

    #[tokio::test]
    async fn discard_deletes_by_key() {
        let storage = FakeStorage::default();
        discard_image(&storage, "https://fake.local/blogs/abc.png").await;
        discard_image(&storage, "https://elsewhere.example/x.png").await;
        assert_eq!(*storage.deleted.lock().unwrap(), vec!["blogs/abc.png".to_string()]);
    }
}
