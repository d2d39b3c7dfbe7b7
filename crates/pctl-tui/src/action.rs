//! Action enum: all user-initiated intents.

use pctl_core::protocol::Command;

/// Unique identifier for a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentId {
    Header,
    Playlist,
    Players,
    HelpOverlay,
}

impl ComponentId {
    pub fn label(self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Playlist => "playlist",
            Self::Players => "players",
            Self::HelpOverlay => "help",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "playlist" => Some(Self::Playlist),
            "players" => Some(Self::Players),
            _ => None,
        }
    }
}

/// Components produce Actions; the App dispatches them to the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // ── Playback ─────────────────────────────────────────────────────────────
    Send(Command),
    VolumeStep(f64),
    SeekRelative(i64),
    BeginScrub,
    ScrubTo(f64),
    ScrubBy(f64),
    EndScrub,
    CancelScrub,

    // ── Players ──────────────────────────────────────────────────────────────
    SelectPlayer(String),
    CyclePlayer { forward: bool },

    // ── Playlist ─────────────────────────────────────────────────────────────
    GrabStart,
    GrabMove { from: usize, to: usize },
    GrabEnd,
    Commit,
    Revert,
    AddFromClipboard,
    OpenPrompt,
    AddText(String),
    JumpTo(usize),
    Tap(usize),

    // ── Navigation ───────────────────────────────────────────────────────────
    FocusNext,
    FocusPrev,
    FocusPane(ComponentId),

    // ── System ───────────────────────────────────────────────────────────────
    ToggleHelp,
    Quit,
}
