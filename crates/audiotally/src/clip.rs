//! Core clip types for audiotally.
//!
//! This module defines the fundamental data structures for representing
//! audio regions extracted from a copied clip list, plus the trait through
//! which the surrounding application supplies clipboard access.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single audio region extracted from a copied clip list.
///
/// Records are immutable once created and always satisfy `end > start`;
/// zero-length and inverted regions are dropped at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipRecord {
    /// Base name of the source audio file (directory components stripped).
    pub filename: String,

    /// Region start position in samples.
    pub start: u64,

    /// Region end position in samples (always greater than `start`).
    pub end: u64,

    /// Region length in samples (`end - start`).
    pub duration_samples: u64,
}

impl ClipRecord {
    /// Create a record, or `None` when the region has zero or negative length.
    #[must_use]
    pub fn new(filename: impl Into<String>, start: u64, end: u64) -> Option<Self> {
        if end <= start {
            return None;
        }
        Some(Self {
            filename: filename.into(),
            start,
            end,
            duration_samples: end - start,
        })
    }
}

/// One observation of the clipboard, taken on a poll tick.
///
/// Snapshots compare equal by content hash, not by raw bytes.
#[derive(Debug, Clone)]
pub struct ClipboardSnapshot {
    /// The raw clipboard text, kept for verbatim restoration.
    pub raw_content: String,

    /// BLAKE3 hash of the content for change detection.
    pub content_hash: String,

    /// When this snapshot was taken.
    pub captured_at: DateTime<Utc>,
}

impl ClipboardSnapshot {
    /// Create a new snapshot of the given clipboard text.
    ///
    /// Automatically computes the content hash and stamps the capture time.
    #[must_use]
    pub fn new(raw_content: String) -> Self {
        let content_hash = Self::compute_hash(&raw_content);
        Self {
            raw_content,
            content_hash,
            captured_at: Utc::now(),
        }
    }

    /// Compute the BLAKE3 hash of the given content.
    #[must_use]
    pub fn compute_hash(content: &str) -> String {
        blake3::hash(content.as_bytes()).to_hex().to_string()
    }

    /// Check if this snapshot's content matches the given hash.
    #[must_use]
    pub fn matches_hash(&self, hash: &str) -> bool {
        self.content_hash == hash
    }

    /// Get the length of the captured content.
    #[must_use]
    pub fn content_len(&self) -> usize {
        self.raw_content.len()
    }
}

impl PartialEq for ClipboardSnapshot {
    fn eq(&self, other: &Self) -> bool {
        self.content_hash == other.content_hash
    }
}

impl Eq for ClipboardSnapshot {}

/// Trait for clipboard access supplied by the surrounding application.
///
/// Implementors provide the actual mechanism for reading and restoring
/// clipboard text on a specific platform. Both operations are async so the
/// caller can bound them with a timeout; a failed read is treated as
/// "unreadable this tick" and never evicts cached state.
#[async_trait::async_trait]
pub trait ClipboardReader: Send + Sync {
    /// The name of this clipboard source (for logging/debugging).
    fn name(&self) -> &'static str;

    /// Read the current clipboard text.
    ///
    /// `Ok(None)` means the clipboard is empty or holds non-text content.
    ///
    /// # Errors
    ///
    /// Returns an error if the clipboard cannot be read right now.
    async fn read_text(&self) -> crate::error::Result<Option<String>>;

    /// Write the given text back to the clipboard verbatim.
    ///
    /// Used to preserve paste fidelity in the source DAW after a
    /// calculation. Failures are non-fatal to the caller.
    ///
    /// # Errors
    ///
    /// Returns an error if the clipboard cannot be written.
    async fn restore(&self, text: &str) -> crate::error::Result<()>;
}

#[async_trait::async_trait]
impl ClipboardReader for audiotally_clipboard::SystemClipboard {
    fn name(&self) -> &'static str {
        "system-clipboard"
    }

    async fn read_text(&self) -> crate::error::Result<Option<String>> {
        audiotally_clipboard::SystemClipboard::read_text(self)
            .await
            .map_err(crate::error::Error::from)
    }

    async fn restore(&self, text: &str) -> crate::error::Result<()> {
        self.write_text(text)
            .await
            .map_err(crate::error::Error::from)
    }
}
