//! AppState: read-only snapshot passed to all components during render/event.
//!
//! Components read this but never mutate it.  The App rebuilds it from the
//! controller after every change.

use chrono::{DateTime, Local};
use pctl_core::config::CommitPolicy;
use pctl_core::playlist::PlaylistRow;
use pctl_core::status::StatusView;
use pctl_core::Controller;

use crate::widgets::status_bar::{InputMode, MediaLamp};

#[derive(Debug, Clone, Default)]
pub struct PlaylistState {
    pub rows: Vec<PlaylistRow>,
    pub placeholder: Option<&'static str>,
    pub loaded: bool,
    pub dirty: bool,
    pub dragging: bool,
    pub policy: CommitPolicy,
    /// When the last refresh was applied.
    pub synced_at: Option<DateTime<Local>>,
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub server: String,
    pub player: String,
    pub players: Vec<String>,
    pub status: StatusView,
    pub seeking: bool,
    pub playlist: PlaylistState,
    pub media: MediaLamp,
    pub input_mode: InputMode,
}

impl AppState {
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            player: String::new(),
            players: Vec::new(),
            status: StatusView::default(),
            seeking: false,
            playlist: PlaylistState::default(),
            media: MediaLamp::Off,
            input_mode: InputMode::Normal,
        }
    }

    /// Copy everything the components draw out of the controller.
    pub fn sync(&mut self, controller: &Controller) {
        self.player = controller.player().to_string();
        self.players = controller.players().to_vec();
        self.status = controller.status().clone();
        self.seeking = controller.is_seeking();

        let pl = controller.playlist();
        self.playlist.rows = pl.rows();
        self.playlist.placeholder = pl.placeholder();
        self.playlist.loaded = pl.is_loaded();
        self.playlist.dirty = pl.is_dirty();
        self.playlist.dragging = pl.is_dragging();
        self.playlist.policy = pl.policy();

        self.media = if controller.media_active() {
            MediaLamp::Active
        } else if controller.media_retry_armed() {
            MediaLamp::Waiting
        } else {
            MediaLamp::Off
        };
    }
}
