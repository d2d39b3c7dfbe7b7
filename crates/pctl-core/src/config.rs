use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::platform;
use crate::protocol::Command;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub playlist: PlaylistConfig,
    #[serde(default)]
    pub media: MediaConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the playerctl web backend, without the `/api` suffix.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Player selected at start-up.  Empty = let the backend pick.
    #[serde(default)]
    pub default_player: String,
    /// Command sent for an OS "play" intent.
    #[serde(default = "default_play_command")]
    pub play_command: Command,
    /// Which players get next/previous turned into a playlist jump.
    #[serde(default)]
    pub jump_redirect: JumpRedirect,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_status_interval_ms")]
    pub status_interval_ms: u64,
    #[serde(default = "default_playlist_interval_ms")]
    pub playlist_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistConfig {
    #[serde(default)]
    pub commit_policy: CommitPolicy,
    /// Window in which a second tap on the same entry counts as a double tap.
    #[serde(default = "default_double_tap_ms")]
    pub double_tap_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Register with the OS media-control surface (MPRIS / SMTC / Now Playing).
    #[serde(default = "default_media_enabled")]
    pub enabled: bool,
    #[serde(default = "default_display_name")]
    pub display_name: String,
}

/// When a local playlist edit is pushed to the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitPolicy {
    /// Edits mark the playlist dirty; the user commits explicitly.
    #[default]
    Batched,
    /// Every edit is committed as soon as it is made.
    Immediate,
}

impl std::str::FromStr for CommitPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "batched" => Ok(Self::Batched),
            "immediate" => Ok(Self::Immediate),
            other => Err(format!("unknown commit policy '{other}' (batched|immediate)")),
        }
    }
}

/// Predicate over the selected player deciding whether next/previous are
/// redirected into a playlist jump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum JumpRedirect {
    Never,
    Always,
    /// Players without an instance qualifier (`mpv`, not `mpv.instance1234`).
    Bare,
    Players { players: Vec<String> },
}

impl Default for JumpRedirect {
    fn default() -> Self {
        JumpRedirect::Players {
            players: vec!["mpv".to_string()],
        }
    }
}

impl JumpRedirect {
    pub fn applies_to(&self, player: &str) -> bool {
        match self {
            JumpRedirect::Never => false,
            JumpRedirect::Always => true,
            JumpRedirect::Bare => !player.is_empty() && !player.contains('.'),
            JumpRedirect::Players { players } => players.iter().any(|p| p == player),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            default_player: String::new(),
            play_command: default_play_command(),
            jump_redirect: JumpRedirect::default(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            status_interval_ms: default_status_interval_ms(),
            playlist_interval_ms: default_playlist_interval_ms(),
        }
    }
}

impl Default for PlaylistConfig {
    fn default() -> Self {
        Self {
            commit_policy: CommitPolicy::default(),
            double_tap_ms: default_double_tap_ms(),
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            enabled: default_media_enabled(),
            display_name: default_display_name(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_request_timeout_ms() -> u64 {
    5000
}

fn default_play_command() -> Command {
    Command::Play
}

fn default_status_interval_ms() -> u64 {
    2000
}

fn default_playlist_interval_ms() -> u64 {
    5000
}

fn default_double_tap_ms() -> u64 {
    300
}

fn default_media_enabled() -> bool {
    true
}

fn default_display_name() -> String {
    "PlayerCTL".to_string()
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load from `path`, writing a default config there first if it does not exist.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}
