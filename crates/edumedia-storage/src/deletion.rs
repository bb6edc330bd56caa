//! Best-effort deletion of stored media by delivery URL.

use std::sync::Arc;

use edumedia_core::ResourceKind;

use crate::keys::parse_resource_url;
use crate::traits::RemoteStorage;

/// What a successful deletion did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionOutcome {
    pub public_id: String,
    pub resource_kind: ResourceKind,
    /// False when the backend no longer had the resource
    pub removed: bool,
}

/// Deletes resources by URL. Never fails; problems are logged and swallowed.
#[derive(Clone)]
pub struct ResourceDeletionClient {
    storage: Arc<dyn RemoteStorage>,
}

impl ResourceDeletionClient {
    pub fn new(storage: Arc<dyn RemoteStorage>) -> Self {
        Self { storage }
    }

    /// Delete the resource behind `url` together with its derived variants.
    ///
    /// Returns `None` without touching the backend for an absent or blank URL,
    /// a URL the backend did not issue, or one without a recoverable public
    /// id. Returns `None` as well when a remote call fails.
    pub async fn delete(&self, url: Option<&str>) -> Option<DeletionOutcome> {
        let url = url.map(str::trim).filter(|u| !u.is_empty())?;

        if !self.storage.owns_url(url) {
            tracing::debug!(url = %url, "URL not issued by storage backend, skipping delete");
            return None;
        }

        let Some(locator) = parse_resource_url(url) else {
            tracing::warn!(url = %url, "Could not extract public id from URL");
            return None;
        };

        let removed = match self
            .storage
            .destroy(&locator.public_id, locator.resource_kind, true)
            .await
        {
            Ok(removed) => removed,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    public_id = %locator.public_id,
                    kind = %locator.resource_kind,
                    "Failed to delete resource"
                );
                return None;
            }
        };

        if let Err(e) = self
            .storage
            .delete_derived(&locator.public_id, locator.resource_kind)
            .await
        {
            tracing::warn!(
                error = %e,
                public_id = %locator.public_id,
                kind = %locator.resource_kind,
                "Failed to delete derived resources"
            );
            return None;
        }

        tracing::info!(
            public_id = %locator.public_id,
            kind = %locator.resource_kind,
            removed = removed,
            "Resource deleted"
        );

        Some(DeletionOutcome {
            public_id: locator.public_id,
            resource_kind: locator.resource_kind,
            removed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedStorage, SCRIPTED_URL_PREFIX};

    fn owned_url(path: &str) -> String {
        format!("{}{}", SCRIPTED_URL_PREFIX, path)
    }

    #[tokio::test]
    async fn test_delete_parses_and_purges() {
        let storage = Arc::new(ScriptedStorage::default());
        let client = ResourceDeletionClient::new(storage.clone());
        let url = owned_url("image/upload/v1700000000/folder/sub/name.png");

        let outcome = client.delete(Some(&url)).await.unwrap();

        assert_eq!(outcome.public_id, "folder/sub/name");
        assert_eq!(outcome.resource_kind, ResourceKind::Image);
        assert!(outcome.removed);
        assert_eq!(
            storage.destroyed(),
            vec![("folder/sub/name".to_string(), ResourceKind::Image, true)]
        );
        assert_eq!(
            storage.derived_purged(),
            vec![("folder/sub/name".to_string(), ResourceKind::Image)]
        );
    }

    #[tokio::test]
    async fn test_empty_or_missing_url_makes_no_calls() {
        let storage = Arc::new(ScriptedStorage::default());
        let client = ResourceDeletionClient::new(storage.clone());

        assert!(client.delete(None).await.is_none());
        assert!(client.delete(Some("")).await.is_none());
        assert!(client.delete(Some("   ")).await.is_none());
        assert_eq!(storage.call_count(), 0);
    }

    #[tokio::test]
    async fn test_foreign_url_makes_no_calls() {
        let storage = Arc::new(ScriptedStorage::default());
        let client = ResourceDeletionClient::new(storage.clone());

        let outcome = client
            .delete(Some("https://cdn.example.com/image/upload/v1/a.png"))
            .await;

        assert!(outcome.is_none());
        assert_eq!(storage.call_count(), 0);
    }

    #[tokio::test]
    async fn test_failing_destroy_is_swallowed() {
        let storage = Arc::new(ScriptedStorage::failing_deletes());
        let client = ResourceDeletionClient::new(storage.clone());

        let outcome = client
            .delete(Some(&owned_url("video/upload/v1/lessons/intro.mp4")))
            .await;

        assert!(outcome.is_none());
        assert_eq!(
            storage.destroyed(),
            vec![("lessons/intro".to_string(), ResourceKind::Video, true)]
        );
        assert!(storage.derived_purged().is_empty());
    }

    #[tokio::test]
    async fn test_failing_derived_purge_is_swallowed() {
        let storage = Arc::new(ScriptedStorage::default().with_failing_delete_derived());
        let client = ResourceDeletionClient::new(storage.clone());

        let outcome = client
            .delete(Some(&owned_url("image/upload/v1/chat-images/a.jpg")))
            .await;

        assert!(outcome.is_none());
        assert_eq!(storage.destroyed().len(), 1);
        assert_eq!(storage.derived_purged().len(), 1);
    }
}
