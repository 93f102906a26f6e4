//! System clipboard access for audiotally.
//!
//! Clipboard syscalls run on a blocking thread and every call is bounded by a
//! timeout, so a hung clipboard provider can never stall the polling loop.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::time::Duration;

use clipboard_rs::{Clipboard, ClipboardContext};
use thiserror::Error;
use tokio::time::timeout;
use tracing::trace;

/// Errors that can occur while talking to the system clipboard.
#[derive(Debug, Error)]
pub enum ClipboardError {
    /// Failed to access the clipboard provider.
    #[error("clipboard access failed: {0}")]
    AccessFailed(String),

    /// The clipboard did not answer within the configured timeout.
    #[error("clipboard did not answer within {0:?}")]
    Timeout(Duration),

    /// The blocking clipboard task failed to complete.
    #[error("clipboard task failed: {0}")]
    TaskFailed(String),
}

/// Result type for clipboard operations.
pub type Result<T> = std::result::Result<T, ClipboardError>;

/// Default bound for a single clipboard operation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(500);

/// Handle to the system clipboard.
///
/// The underlying platform context is created per call on a blocking thread;
/// the handle itself is cheap to clone and carries only the timeout.
#[derive(Debug, Clone)]
pub struct SystemClipboard {
    op_timeout: Duration,
}

impl SystemClipboard {
    /// Create a clipboard handle with the default timeout.
    #[must_use]
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create a clipboard handle with a custom per-operation timeout.
    #[must_use]
    pub fn with_timeout(op_timeout: Duration) -> Self {
        Self { op_timeout }
    }

    /// The per-operation timeout bound.
    #[must_use]
    pub fn op_timeout(&self) -> Duration {
        self.op_timeout
    }

    /// Read the current clipboard text.
    ///
    /// Returns `Ok(None)` when the clipboard is empty or holds non-text
    /// content; that is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the clipboard provider cannot be reached or does
    /// not answer within the timeout.
    pub async fn read_text(&self) -> Result<Option<String>> {
        let read = tokio::task::spawn_blocking(|| -> Result<Option<String>> {
            let ctx = ClipboardContext::new()
                .map_err(|e| ClipboardError::AccessFailed(e.to_string()))?;

            match ctx.get_text() {
                Ok(text) if !text.is_empty() => Ok(Some(text)),
                // No text content or non-text clipboard is not an error
                Ok(_) | Err(_) => Ok(None),
            }
        });

        match timeout(self.op_timeout, read).await {
            Ok(Ok(result)) => result,
            Ok(Err(join)) => Err(ClipboardError::TaskFailed(join.to_string())),
            Err(_) => {
                trace!(timeout_ms = self.op_timeout.as_millis() as u64, "clipboard read timed out");
                Err(ClipboardError::Timeout(self.op_timeout))
            }
        }
    }

    /// Write text to the clipboard verbatim.
    ///
    /// # Errors
    ///
    /// Returns an error if the clipboard provider cannot be reached or does
    /// not answer within the timeout.
    pub async fn write_text(&self, text: &str) -> Result<()> {
        let text = text.to_owned();
        let write = tokio::task::spawn_blocking(move || -> Result<()> {
            let ctx = ClipboardContext::new()
                .map_err(|e| ClipboardError::AccessFailed(e.to_string()))?;

            ctx.set_text(text)
                .map_err(|e| ClipboardError::AccessFailed(e.to_string()))
        });

        match timeout(self.op_timeout, write).await {
            Ok(Ok(result)) => result,
            Ok(Err(join)) => Err(ClipboardError::TaskFailed(join.to_string())),
            Err(_) => Err(ClipboardError::Timeout(self.op_timeout)),
        }
    }
}

impl Default for SystemClipboard {
    fn default() -> Self {
        Self::new()
    }
}
