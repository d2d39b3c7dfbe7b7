use tracing::debug;

use crate::protocol::{Command, CommandReply, PlaylistSnapshot, TrackMetadata};
use crate::transport::{CommandTransport, TransportError};

/// Outbound work produced by the controller.  Executing a request never
/// touches controller state; its [`Completion`] is applied later.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Command { player: String, command: Command },
    Metadata { player: String },
    Volume { player: String },
    /// Status fetch whose reply only feeds the keep-alive edge detector.
    PlaybackProbe { player: String },
    SetVolume { player: String, value: f64 },
    Seek { player: String, delta_secs: i64 },
    SeekAbsolute { player: String, position_secs: u64 },
    FetchPlaylist,
    CommitPlaylist { entries: Vec<String> },
    SetIndex { index: usize },
    FetchPlayers,
}

/// Result of executing a [`Request`], carrying whatever the controller needs
/// to apply it.
#[derive(Debug)]
pub enum Completion {
    Command {
        command: Command,
        result: Result<CommandReply, TransportError>,
    },
    Metadata(Result<TrackMetadata, TransportError>),
    Volume(Result<f64, TransportError>),
    PlaybackProbe(Result<CommandReply, TransportError>),
    /// Volume and seek setters; the reply is only logged.
    Adjusted {
        what: &'static str,
        result: Result<CommandReply, TransportError>,
    },
    Playlist(Result<PlaylistSnapshot, TransportError>),
    Commit {
        entries: Vec<String>,
        result: Result<(), TransportError>,
    },
    SetIndex {
        index: usize,
        result: Result<(), TransportError>,
    },
    Players(Result<Vec<String>, TransportError>),
}

impl Request {
    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Request::Command { command, .. } => command.as_str(),
            Request::Metadata { .. } => "metadata",
            Request::Volume { .. } => "volume",
            Request::PlaybackProbe { .. } => "probe",
            Request::SetVolume { .. } => "set-volume",
            Request::Seek { .. } => "seek",
            Request::SeekAbsolute { .. } => "seek-absolute",
            Request::FetchPlaylist => "playlist",
            Request::CommitPlaylist { .. } => "commit",
            Request::SetIndex { .. } => "set-index",
            Request::FetchPlayers => "players",
        }
    }
}

pub async fn execute(transport: &dyn CommandTransport, request: Request) -> Completion {
    debug!("[request] {}", request.label());
    match request {
        Request::Command { player, command } => Completion::Command {
            command,
            result: transport.command(&player, command).await,
        },
        Request::Metadata { player } => Completion::Metadata(transport.metadata(&player).await),
        Request::Volume { player } => Completion::Volume(transport.volume(&player).await),
        Request::PlaybackProbe { player } => {
            Completion::PlaybackProbe(transport.command(&player, Command::Status).await)
        }
        Request::SetVolume { player, value } => Completion::Adjusted {
            what: "volume",
            result: transport.set_volume(&player, value).await,
        },
        Request::Seek { player, delta_secs } => Completion::Adjusted {
            what: "seek",
            result: transport.seek(&player, delta_secs).await,
        },
        Request::SeekAbsolute {
            player,
            position_secs,
        } => Completion::Adjusted {
            what: "seek_absolute",
            result: transport.seek_absolute(&player, position_secs).await,
        },
        Request::FetchPlaylist => Completion::Playlist(transport.playlist_snapshot().await),
        Request::CommitPlaylist { entries } => {
            let result = transport.set_playlist(&entries).await;
            Completion::Commit { entries, result }
        }
        Request::SetIndex { index } => Completion::SetIndex {
            index,
            result: transport.set_index(index).await,
        },
        Request::FetchPlayers => Completion::Players(transport.players().await),
    }
}
