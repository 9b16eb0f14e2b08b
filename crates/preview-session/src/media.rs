/// Generated media results
///
/// A successful generation yields a [`MediaResult`]: a locally playable
/// reference, the raw clip bytes, and the opaque handle the backend needs
/// to extend the exact same artifact later. The playable reference owns a
/// release hook that fires exactly once when the result is dropped, so the
/// session releases it synchronously with whichever transition discards it.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Opaque reference to a generated clip on the backend side.
///
/// Only ever passed back to the same backend to request an extension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceHandle(String);

impl ServiceHandle {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

type ReleaseHook = Box<dyn FnOnce(&str) + Send>;

/// Locally resolvable playable reference (a file path or URL).
///
/// Owned exclusively by the session; the optional release hook runs once
/// on drop (deleting a cache file, revoking a URL, or just counting in
/// tests).
pub struct PlayableMedia {
    location: String,
    release: Option<ReleaseHook>,
}

impl PlayableMedia {
    /// Playable reference with no cleanup obligation.
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            release: None,
        }
    }

    /// Playable reference that runs `hook` when released.
    pub fn with_release_hook(
        location: impl Into<String>,
        hook: impl FnOnce(&str) + Send + 'static,
    ) -> Self {
        Self {
            location: location.into(),
            release: Some(Box::new(hook)),
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }
}

impl Drop for PlayableMedia {
    fn drop(&mut self) {
        if let Some(hook) = self.release.take() {
            hook(&self.location);
        }
    }
}

impl std::fmt::Debug for PlayableMedia {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayableMedia")
            .field("location", &self.location)
            .field("has_release_hook", &self.release.is_some())
            .finish()
    }
}

/// One successfully generated clip.
pub struct MediaResult {
    /// Playable reference for the UI.
    pub playable: PlayableMedia,

    /// Raw clip bytes, re-wrapped as the input for an extension request.
    pub bytes: Arc<Vec<u8>>,

    /// Backend handle for extending this exact clip.
    pub service_handle: ServiceHandle,

    /// Completion timestamp.
    pub created_at: DateTime<Utc>,
}

impl MediaResult {
    pub fn new(playable: PlayableMedia, bytes: Vec<u8>, service_handle: ServiceHandle) -> Self {
        Self {
            playable,
            bytes: Arc::new(bytes),
            service_handle,
            created_at: Utc::now(),
        }
    }
}

impl std::fmt::Debug for MediaResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaResult")
            .field("playable", &self.playable)
            .field("bytes_len", &self.bytes.len())
            .field("service_handle", &self.service_handle)
            .field("created_at", &self.created_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_release_hook_fires_once_on_drop() {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = released.clone();
        let playable = PlayableMedia::with_release_hook("file:///tmp/clip.mp4", move |loc| {
            assert_eq!(loc, "file:///tmp/clip.mp4");
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(released.load(Ordering::SeqCst), 0);
        drop(playable);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_media_result_drop_releases_playable() {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = released.clone();
        let media = MediaResult::new(
            PlayableMedia::with_release_hook("clip.mp4", move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
            vec![1, 2, 3],
            ServiceHandle::new("op/123"),
        );

        assert_eq!(media.bytes.len(), 3);
        drop(media);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }
}
