//! Transient in-memory audio blobs addressed by revocable URLs.
//!
//! Mirrors a host object-URL registry: synthesized audio is registered once,
//! addressed by an opaque `blob:` URL while it backs a media handle, and
//! revoked when the session ends. [`BlobUrl`] is a move-only token and
//! [`BlobStore::revoke`] consumes it, so a URL cannot be released twice.
//! The store counts minted and revoked URLs so leaks are observable.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use uuid::Uuid;

use voicesync_core::{MediaSource, SynthesizedAudio};

/// URL scheme prefix for minted blob URLs.
const BLOB_URL_PREFIX: &str = "blob:voicesync/";

/// A registered audio payload.
#[derive(Debug, Clone)]
pub struct Blob {
    /// Encoded audio bytes.
    pub data: Bytes,

    /// MIME type.
    pub content_type: String,
}

/// Revocable handle to a registered blob.
///
/// Deliberately neither `Clone` nor `Copy`: exactly one owner may revoke it.
#[derive(PartialEq, Eq, Hash)]
pub struct BlobUrl(String);

impl BlobUrl {
    /// The URL string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BlobUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BlobUrl").field(&self.0).finish()
    }
}

impl fmt::Display for BlobUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Default)]
struct BlobStoreInner {
    blobs: Mutex<HashMap<String, Blob>>,
    minted: AtomicU64,
    revoked: AtomicU64,
}

/// Shared registry of transient audio blobs.
///
/// Cheap to clone; all clones share the same registry.
#[derive(Clone, Default)]
pub struct BlobStore {
    inner: Arc<BlobStoreInner>,
}

impl BlobStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a payload and mint a fresh URL for it.
    pub fn create(&self, data: Bytes, content_type: impl Into<String>) -> BlobUrl {
        let url = format!("{BLOB_URL_PREFIX}{}", Uuid::new_v4());
        let blob = Blob {
            data,
            content_type: content_type.into(),
        };
        if let Ok(mut blobs) = self.inner.blobs.lock() {
            blobs.insert(url.clone(), blob);
        }
        self.inner.minted.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(url = %url, "Blob URL created");
        BlobUrl(url)
    }

    /// Register a synthesized payload.
    pub fn create_from(&self, audio: SynthesizedAudio) -> BlobUrl {
        self.create(audio.data, audio.content_type)
    }

    /// Look up the payload behind a URL.
    #[must_use]
    pub fn resolve(&self, url: &BlobUrl) -> Option<Blob> {
        self.inner
            .blobs
            .lock()
            .ok()
            .and_then(|blobs| blobs.get(url.as_str()).cloned())
    }

    /// Resolve a URL into a [`MediaSource`] ready for a media backend.
    #[must_use]
    pub fn media_source(&self, url: &BlobUrl) -> Option<MediaSource> {
        self.resolve(url).map(|blob| MediaSource {
            url: url.as_str().to_string(),
            data: blob.data,
            content_type: blob.content_type,
        })
    }

    /// Release a URL and free its payload. Returns whether it was live.
    pub fn revoke(&self, url: BlobUrl) -> bool {
        let removed = self
            .inner
            .blobs
            .lock()
            .map(|mut blobs| blobs.remove(url.as_str()).is_some())
            .unwrap_or(false);
        if removed {
            self.inner.revoked.fetch_add(1, Ordering::SeqCst);
            tracing::debug!(url = %url, "Blob URL revoked");
        } else {
            tracing::warn!(url = %url, "Revoked a blob URL that was not live");
        }
        removed
    }

    /// Number of URLs currently registered.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.inner.blobs.lock().map(|b| b.len()).unwrap_or(0)
    }

    /// Total URLs ever minted by this store.
    #[must_use]
    pub fn minted(&self) -> u64 {
        self.inner.minted.load(Ordering::SeqCst)
    }

    /// Total URLs revoked.
    #[must_use]
    pub fn revoked(&self) -> u64 {
        self.inner.revoked.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for BlobStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobStore")
            .field("live", &self.live_count())
            .field("minted", &self.minted())
            .field("revoked", &self.revoked())
            .finish()
    }
}
