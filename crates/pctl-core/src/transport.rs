use async_trait::async_trait;
use thiserror::Error;

use crate::protocol::{Command, CommandReply, PlaylistSnapshot, TrackMetadata};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("backend returned {status}: {message}")]
    Backend { status: u16, message: String },
    #[error("unreadable response: {0}")]
    Decode(String),
}

/// The playerctl web backend's REST surface.
///
/// Every per-player call takes the player identifier explicitly; callers read
/// the current selection fresh for each request.
#[async_trait]
pub trait CommandTransport: Send + Sync {
    async fn command(&self, player: &str, command: Command)
        -> Result<CommandReply, TransportError>;

    async fn metadata(&self, player: &str) -> Result<TrackMetadata, TransportError>;

    async fn volume(&self, player: &str) -> Result<f64, TransportError>;

    async fn set_volume(&self, player: &str, value: f64) -> Result<CommandReply, TransportError>;

    async fn seek(&self, player: &str, delta_secs: i64) -> Result<CommandReply, TransportError>;

    async fn seek_absolute(&self, player: &str, position_secs: u64)
        -> Result<CommandReply, TransportError>;

    async fn playlist(&self) -> Result<Vec<String>, TransportError>;

    async fn current_item(&self) -> Result<Option<String>, TransportError>;

    async fn set_playlist(&self, entries: &[String]) -> Result<(), TransportError>;

    async fn set_index(&self, index: usize) -> Result<(), TransportError>;

    async fn players(&self) -> Result<Vec<String>, TransportError>;

    /// Playlist and current item together; fails if either request fails.
    async fn playlist_snapshot(&self) -> Result<PlaylistSnapshot, TransportError> {
        let (entries, current) = tokio::try_join!(self.playlist(), self.current_item())?;
        Ok(PlaylistSnapshot { entries, current })
    }
}
