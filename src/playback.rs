//! Shared playback state with chunked, cancelable streaming
//!
//! The gateway keeps exactly one "last answer" in memory. Each publish
//! replaces the `(id, audio, cancellation token)` triple as a unit, so a
//! stream started against one answer can never observe the bytes of one
//! answer paired with the token of another.

use std::sync::Mutex;

use bytes::Bytes;
use futures::Stream;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Default streaming chunk size in bytes
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// One published answer: identifier, audio, and its cancellation token
#[derive(Debug, Clone)]
struct Published {
    id: Uuid,
    audio: Bytes,
    cancel: CancellationToken,
}

/// Non-blocking view of the playback slot, for client polling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackStatus {
    /// Whether any answer has been published
    pub available: bool,
    /// Identifier of the current answer, if any
    pub id: Option<Uuid>,
}

/// Coordinates access to the single shared answer buffer
///
/// Any number of concurrent readers may stream the current answer; each
/// stream is bound to the snapshot taken when it was created. Cancellation
/// is one-shot per answer: once raised, the token stays raised until the
/// next publish installs a fresh one, so restreaming a cancelled answer
/// terminates before its first chunk.
#[derive(Debug)]
pub struct PlaybackCoordinator {
    chunk_size: usize,
    current: Mutex<Option<Published>>,
}

impl PlaybackCoordinator {
    /// Create a coordinator with the default chunk size
    #[must_use]
    pub fn new() -> Self {
        Self::with_chunk_size(DEFAULT_CHUNK_SIZE)
    }

    /// Create a coordinator with a custom chunk size
    ///
    /// # Panics
    ///
    /// Panics if `chunk_size` is zero.
    #[must_use]
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        assert!(chunk_size > 0, "chunk size must be non-zero");
        Self {
            chunk_size,
            current: Mutex::new(None),
        }
    }

    /// Publish a new answer, replacing the previous one
    ///
    /// Installs a fresh, unraised cancellation token and returns the new
    /// answer identifier. In-flight streams of the previous answer keep
    /// draining their own snapshot.
    pub fn publish(&self, audio: impl Into<Bytes>) -> Uuid {
        let id = Uuid::new_v4();
        let published = Published {
            id,
            audio: audio.into(),
            cancel: CancellationToken::new(),
        };

        let mut slot = self.current.lock().unwrap();
        *slot = Some(published);
        drop(slot);

        tracing::debug!(answer_id = %id, "published answer");
        id
    }

    /// Stream the current answer as fixed-size chunks
    ///
    /// Returns `None` if nothing has been published yet. The returned
    /// stream reads a snapshot of `(audio, token)` taken atomically here;
    /// the token is checked before every chunk and the producer yields to
    /// the scheduler between chunks so a concurrent [`cancel`] takes effect
    /// within one chunk interval.
    ///
    /// [`cancel`]: Self::cancel
    pub fn stream(&self) -> Option<impl Stream<Item = Bytes> + Send + use<>> {
        let (id, audio, cancel) = {
            let slot = self.current.lock().unwrap();
            let published = slot.as_ref()?;
            (
                published.id,
                published.audio.clone(),
                published.cancel.clone(),
            )
        };

        let chunk_size = self.chunk_size;
        Some(async_stream::stream! {
            let mut offset = 0;
            while offset < audio.len() {
                if cancel.is_cancelled() {
                    tracing::debug!(answer_id = %id, offset, "stream cancelled");
                    break;
                }
                let end = usize::min(offset + chunk_size, audio.len());
                yield audio.slice(offset..end);
                offset = end;
                tokio::task::yield_now().await;
            }
        })
    }

    /// Cancel any stream of the current answer
    ///
    /// Raises the current answer's cancellation token and returns its id.
    /// Idempotent; returns `None` (and has no effect) when nothing has been
    /// published. Streams of superseded answers are unaffected.
    pub fn cancel(&self) -> Option<Uuid> {
        let slot = self.current.lock().unwrap();
        slot.as_ref().map(|published| {
            published.cancel.cancel();
            published.id
        })
    }

    /// Report whether an answer is available, and its id
    #[must_use]
    pub fn status(&self) -> PlaybackStatus {
        let slot = self.current.lock().unwrap();
        slot.as_ref().map_or(
            PlaybackStatus {
                available: false,
                id: None,
            },
            |published| PlaybackStatus {
                available: true,
                id: Some(published.id),
            },
        )
    }
}

impl Default for PlaybackCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
