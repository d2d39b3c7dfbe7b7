//! System clipboard as a `ClipboardSource`.

use pctl_core::clipboard::{ClipboardError, ClipboardSource};
use tracing::{debug, warn};

/// Opened lazily on first read, since some platforms reject access before
/// the terminal has a display connection.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClipboardSource for SystemClipboard {
    fn read_text(&mut self) -> Result<Option<String>, ClipboardError> {
        if self.inner.is_none() {
            match arboard::Clipboard::new() {
                Ok(c) => self.inner = Some(c),
                Err(e) => {
                    // No clipboard at all (headless, ssh): ask instead.
                    debug!("[clipboard] unavailable: {}", e);
                    return Ok(None);
                }
            }
        }
        let Some(clipboard) = self.inner.as_mut() else {
            return Ok(None);
        };
        classify(clipboard.get_text())
    }
}

/// Non-text or empty contents read as an empty string so the caller
/// reports "empty"; anything else is a read failure.
fn classify(result: Result<String, arboard::Error>) -> Result<Option<String>, ClipboardError> {
    match result {
        Ok(text) => Ok(Some(text)),
        Err(arboard::Error::ContentNotAvailable) => Ok(Some(String::new())),
        Err(arboard::Error::ClipboardNotSupported) => Ok(None),
        Err(e) => {
            warn!("[clipboard] read failed: {}", e);
            Err(ClipboardError::Denied(e.to_string()))
        }
    }
}
