//! Storage routing: backend choice and object key derivation.
//!
//! Images and ordinary-sized video go to the primary blob store; an explicit
//! caller flag plus video classification routes to the secondary large-object
//! backend. Key shape and sanitization live in `mediapress_storage::keys`.

use mediapress_core::models::{BackendChoice, MediaAsset, StorageTarget, UploadRequest};
use mediapress_storage::keys;
use rand::Rng;

/// Targets for one commit: the primary object and, for thumbnailed images,
/// the thumbnail object alongside it.
#[derive(Clone, Debug)]
pub struct RoutedTargets {
    pub backend: BackendChoice,
    pub primary: StorageTarget,
    pub thumbnail: Option<StorageTarget>,
}

pub struct StorageRouter;

impl StorageRouter {
    pub fn route(request: &UploadRequest, asset: &MediaAsset) -> RoutedTargets {
        let timestamp = chrono::Utc::now().timestamp_millis();
        let nonce: u16 = rand::rng().random_range(0..=u16::MAX);
        Self::route_at(request, asset, timestamp, nonce)
    }

    /// Deterministic variant; `route` supplies wall-clock time and a nonce.
    pub fn route_at(
        request: &UploadRequest,
        asset: &MediaAsset,
        timestamp_millis: i64,
        nonce: u16,
    ) -> RoutedTargets {
        let backend = if request.flags.prefer_large_object && asset.is_video() {
            BackendChoice::LargeObject
        } else {
            BackendChoice::Primary
        };

        let folder = keys::sanitize_folder(&request.folder);
        let stem = keys::sanitize_stem(&request.original_filename);
        let filename = keys::object_filename(timestamp_millis, nonce, &stem, &asset.extension);

        let primary = StorageTarget {
            backend,
            key: keys::object_key(&folder, &filename),
            content_type: asset.content_type.clone(),
        };

        let thumbnail = asset.thumbnail.as_ref().map(|_| StorageTarget {
            backend,
            key: keys::thumbnail_key(&folder, &filename),
            content_type: asset.content_type.clone(),
        });

        tracing::debug!(
            backend = ?backend,
            key = %primary.key,
            has_thumbnail = thumbnail.is_some(),
            "Routed upload"
        );

        RoutedTargets {
            backend,
            primary,
            thumbnail,
        }
    }
}
