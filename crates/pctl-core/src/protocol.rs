use std::fmt;

use serde::{Deserialize, Serialize};

/// Transport commands accepted by `GET /api/{command}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Command {
    Play,
    Pause,
    PlayPause,
    Next,
    Previous,
    Status,
}

impl Command {
    /// Path segment used in the REST route.
    pub fn as_str(self) -> &'static str {
        match self {
            Command::Play => "play",
            Command::Pause => "pause",
            Command::PlayPause => "play-pause",
            Command::Next => "next",
            Command::Previous => "previous",
            Command::Status => "status",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reply of every command-like endpoint (`/api/{command}`, volume/seek setters).
/// playerctl prints nothing for most commands, so `result` is often null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandReply {
    #[serde(default)]
    pub result: Option<String>,
}

/// Backend playback status string ("Playing", "Paused", "Stopped", ...).
/// Only ever compared against "Playing".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackStatus(pub String);

impl PlaybackStatus {
    pub const PLAYING: &'static str = "Playing";

    pub fn is_playing(&self) -> bool {
        self.0 == Self::PLAYING
    }

    pub fn from_reply(reply: &CommandReply) -> Self {
        Self(reply.result.clone().unwrap_or_default())
    }
}

impl fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `GET /api/metadata` body.  `length` and `position` are whole seconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackMetadata {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub length: f64,
    #[serde(default)]
    pub position: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeReply {
    pub volume: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaylistBody {
    pub playlist: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentItemReply {
    #[serde(default)]
    pub current_item: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetIndexBody {
    pub index: usize,
}

/// Error body returned with non-2xx statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorReply {
    pub error: String,
}

/// Playlist plus current-item pointer, fetched together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaylistSnapshot {
    pub entries: Vec<String>,
    pub current: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_without_thumbnail() {
        let json = r#"{"title":"Song","artist":"Band","length":215,"position":12}"#;
        let meta: TrackMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(meta.title, "Song");
        assert_eq!(meta.thumbnail, None);
        assert_eq!(meta.length, 215.0);
        assert_eq!(meta.position, 12.0);
    }

    #[test]
    fn test_null_result_and_current_item() {
        let reply: CommandReply = serde_json::from_str(r#"{"result":null}"#).unwrap();
        assert_eq!(reply.result, None);
        assert!(!PlaybackStatus::from_reply(&reply).is_playing());

        let current: CurrentItemReply = serde_json::from_str(r#"{"current_item":null}"#).unwrap();
        assert_eq!(current.current_item, None);
    }

    #[test]
    fn test_playing_is_exact_match() {
        assert!(PlaybackStatus("Playing".into()).is_playing());
        assert!(!PlaybackStatus("playing".into()).is_playing());
        assert!(!PlaybackStatus("Paused".into()).is_playing());
    }

    #[test]
    fn test_command_path_segments() {
        assert_eq!(Command::PlayPause.as_str(), "play-pause");
        assert_eq!(Command::Previous.to_string(), "previous");
        let parsed: Command = serde_json::from_str("\"play-pause\"").unwrap();
        assert_eq!(parsed, Command::PlayPause);
    }

    #[test]
    fn test_set_index_body_shape() {
        let body = serde_json::to_value(SetIndexBody { index: 2 }).unwrap();
        assert_eq!(body, serde_json::json!({ "index": 2 }));
    }
}
