use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("clipboard read denied: {0}")]
    Denied(String),
}

/// Source of text for "add link from clipboard".
pub trait ClipboardSource {
    /// `Ok(None)` means no clipboard is available at all and the caller
    /// should fall back to asking the user for the text.  An empty or
    /// whitespace string is `Ok(Some(..))`.
    fn read_text(&mut self) -> Result<Option<String>, ClipboardError>;
}

#[derive(Debug, Error)]
pub enum InsertError {
    #[error("Clipboard is empty or contains only whitespace.")]
    Blank,
    #[error("Failed to read clipboard contents. Please check your clipboard permissions.")]
    Clipboard(#[from] ClipboardError),
}

/// Trim pasted text, rejecting blank input.
pub fn normalize_entry(text: &str) -> Result<String, InsertError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(InsertError::Blank);
    }
    Ok(trimmed.to_string())
}
