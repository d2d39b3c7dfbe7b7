//! Bridge between the OS media-control surface and the remote.
//!
//! The keep-alive is a playback registration we keep in the "playing" state
//! so the OS keeps routing media keys to us.  Starting it may need a user
//! gesture first; when it fails we wait for the next interaction and retry.

use thiserror::Error;
use tracing::{info, warn};

use crate::protocol::Command;
use crate::subscription::Subscription;

#[derive(Debug, Error)]
pub enum KeepAliveError {
    #[error("interaction required: {0}")]
    InteractionRequired(String),
    #[error("media controls unavailable: {0}")]
    Unavailable(String),
}

pub trait KeepAlive {
    fn start(&mut self) -> Result<(), KeepAliveError>;
    fn play(&mut self) -> Result<(), KeepAliveError>;
    fn pause(&mut self);
    fn is_paused(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPlayback {
    Playing,
    Paused,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionMetadata {
    pub title: String,
    pub artist: String,
    pub artwork: Option<String>,
}

/// The OS "now playing" display.
pub trait MediaSessionSurface {
    fn set_playback_state(&mut self, state: SessionPlayback);
    fn set_metadata(&mut self, metadata: &SessionMetadata);
}

pub trait MediaPlatform: KeepAlive + MediaSessionSurface {}

impl<T: KeepAlive + MediaSessionSurface> MediaPlatform for T {}

/// Platform used when media controls are disabled.  Starting it fails, so
/// the bridge never becomes active.
#[derive(Debug, Default)]
pub struct NoMediaPlatform;

impl KeepAlive for NoMediaPlatform {
    fn start(&mut self) -> Result<(), KeepAliveError> {
        Err(KeepAliveError::Unavailable("media controls disabled".into()))
    }

    fn play(&mut self) -> Result<(), KeepAliveError> {
        Ok(())
    }

    fn pause(&mut self) {}

    fn is_paused(&self) -> bool {
        true
    }
}

impl MediaSessionSurface for NoMediaPlatform {
    fn set_playback_state(&mut self, _state: SessionPlayback) {}
    fn set_metadata(&mut self, _metadata: &SessionMetadata) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaIntent {
    Play,
    Pause,
    Previous,
    Next,
}

/// What `initialize` or a retry produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    /// Start failed and a retry is armed for the next interaction.
    Deferred,
    /// Start failed for good (no platform support).
    Unavailable,
    NotNeeded,
}

#[derive(Debug)]
pub struct MediaBridge {
    active: bool,
    local_change: bool,
    retry: Option<Subscription>,
    play_command: Command,
    default_metadata: SessionMetadata,
}

impl MediaBridge {
    pub fn new(play_command: Command, display_name: &str) -> Self {
        Self {
            active: false,
            local_change: false,
            retry: None,
            play_command,
            default_metadata: SessionMetadata {
                title: display_name.to_string(),
                artist: "Remote control".to_string(),
                artwork: None,
            },
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn retry_armed(&self) -> bool {
        self.retry.as_ref().is_some_and(Subscription::is_active)
    }

    pub fn local_change_pending(&self) -> bool {
        self.local_change
    }

    /// Clear and return the one-shot local-change flag.
    pub fn take_local_change(&mut self) -> bool {
        std::mem::take(&mut self.local_change)
    }

    pub fn initialize(&mut self, platform: &mut dyn MediaPlatform) -> StartOutcome {
        if self.active {
            return StartOutcome::NotNeeded;
        }
        match platform.start() {
            Ok(()) => {
                self.activate(platform);
                StartOutcome::Started
            }
            Err(KeepAliveError::Unavailable(reason)) => {
                info!("[media] keep-alive unavailable: {}", reason);
                StartOutcome::Unavailable
            }
            Err(e) => {
                warn!("[media] keep-alive start failed: {}", e);
                self.retry = Some(Subscription::new("interaction"));
                StartOutcome::Deferred
            }
        }
    }

    /// Called on every key press or click.  Retries a deferred start.
    pub fn on_interaction(&mut self, platform: &mut dyn MediaPlatform) -> StartOutcome {
        let Some(retry) = self.retry.as_mut() else {
            return StartOutcome::NotNeeded;
        };
        if !retry.deliver() {
            return StartOutcome::NotNeeded;
        }
        match platform.start() {
            Ok(()) => {
                retry.unsubscribe();
                self.retry = None;
                self.activate(platform);
                StartOutcome::Started
            }
            Err(e) => {
                warn!("[media] keep-alive retry failed: {}", e);
                StartOutcome::Deferred
            }
        }
    }

    fn activate(&mut self, platform: &mut dyn MediaPlatform) {
        self.active = true;
        platform.set_metadata(&self.default_metadata);
        info!("[media] session active");
    }

    /// Apply an OS intent.  Returns the command to route, if any.
    pub fn intent(
        &mut self,
        intent: MediaIntent,
        platform: &mut dyn MediaPlatform,
    ) -> Option<Command> {
        if !self.active {
            warn!("[media] {:?} ignored, session not active", intent);
            return None;
        }
        match intent {
            MediaIntent::Play => {
                self.local_change = true;
                if let Err(e) = platform.play() {
                    warn!("[media] keep-alive resume failed: {}", e);
                }
                platform.set_playback_state(SessionPlayback::Playing);
                Some(self.play_command)
            }
            MediaIntent::Pause => {
                self.local_change = true;
                platform.pause();
                platform.set_playback_state(SessionPlayback::Paused);
                Some(Command::Pause)
            }
            MediaIntent::Previous => Some(Command::Previous),
            MediaIntent::Next => Some(Command::Next),
        }
    }

    /// Side effect of a play/pause reply on the keep-alive.
    pub fn after_command(&mut self, command: Command, platform: &mut dyn MediaPlatform) {
        if !self.active {
            return;
        }
        match command {
            Command::Play | Command::PlayPause if platform.is_paused() => {
                if let Err(e) = platform.play() {
                    warn!("[media] keep-alive resume failed: {}", e);
                }
            }
            Command::Pause if !platform.is_paused() => platform.pause(),
            _ => {}
        }
    }

    /// Match the keep-alive to a playback edge seen by the poller.
    pub fn sync_playing(&mut self, playing: bool, platform: &mut dyn MediaPlatform) {
        if !self.active {
            return;
        }
        if playing {
            if let Err(e) = platform.play() {
                warn!("[media] keep-alive resume failed: {}", e);
            }
            platform.set_playback_state(SessionPlayback::Playing);
        } else {
            platform.pause();
            platform.set_playback_state(SessionPlayback::Paused);
        }
    }

    pub fn mirror_metadata(&self, metadata: &SessionMetadata, platform: &mut dyn MediaPlatform) {
        if self.active {
            platform.set_metadata(metadata);
        }
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;

    /// Records every call; `start` fails while `start_failures` is non-zero.
    #[derive(Debug, Default)]
    pub struct FakePlatform {
        pub start_failures: u32,
        pub started: bool,
        pub paused: bool,
        pub plays: u32,
        pub pauses: u32,
        pub states: Vec<SessionPlayback>,
        pub metadata: Vec<SessionMetadata>,
    }

    impl KeepAlive for FakePlatform {
        fn start(&mut self) -> Result<(), KeepAliveError> {
            if self.start_failures > 0 {
                self.start_failures -= 1;
                return Err(KeepAliveError::InteractionRequired("autoplay blocked".into()));
            }
            self.started = true;
            self.paused = false;
            Ok(())
        }

        fn play(&mut self) -> Result<(), KeepAliveError> {
            self.plays += 1;
            self.paused = false;
            Ok(())
        }

        fn pause(&mut self) {
            self.pauses += 1;
            self.paused = true;
        }

        fn is_paused(&self) -> bool {
            self.paused
        }
    }

    impl MediaSessionSurface for FakePlatform {
        fn set_playback_state(&mut self, state: SessionPlayback) {
            self.states.push(state);
        }

        fn set_metadata(&mut self, metadata: &SessionMetadata) {
            self.metadata.push(metadata.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::FakePlatform;
    use super::*;

    fn bridge() -> MediaBridge {
        MediaBridge::new(Command::Play, "PlayerCTL")
    }

    #[test]
    fn test_initialize_sets_default_metadata() {
        let mut p = FakePlatform::default();
        let mut b = bridge();
        assert_eq!(b.initialize(&mut p), StartOutcome::Started);
        assert!(b.is_active());
        assert_eq!(p.metadata[0].title, "PlayerCTL");
        assert_eq!(p.metadata[0].artist, "Remote control");
    }

    #[test]
    fn test_failed_start_retries_on_interaction() {
        let mut p = FakePlatform {
            start_failures: 2,
            ..Default::default()
        };
        let mut b = bridge();
        assert_eq!(b.initialize(&mut p), StartOutcome::Deferred);
        assert!(b.retry_armed());
        assert!(!b.is_active());

        assert_eq!(b.on_interaction(&mut p), StartOutcome::Deferred);
        assert!(b.retry_armed());

        assert_eq!(b.on_interaction(&mut p), StartOutcome::Started);
        assert!(!b.retry_armed());
        assert!(b.is_active());
        assert_eq!(b.on_interaction(&mut p), StartOutcome::NotNeeded);
    }

    #[test]
    fn test_unavailable_platform_does_not_arm_retry() {
        let mut b = bridge();
        assert_eq!(b.initialize(&mut NoMediaPlatform), StartOutcome::Unavailable);
        assert!(!b.retry_armed());
        assert_eq!(b.intent(MediaIntent::Play, &mut NoMediaPlatform), None);
    }

    #[test]
    fn test_play_intent_sets_local_change_first() {
        let mut p = FakePlatform::default();
        let mut b = MediaBridge::new(Command::PlayPause, "PlayerCTL");
        b.initialize(&mut p);
        assert_eq!(b.intent(MediaIntent::Play, &mut p), Some(Command::PlayPause));
        assert!(b.local_change_pending());
        assert_eq!(p.states, vec![SessionPlayback::Playing]);
        assert!(b.take_local_change());
        assert!(!b.take_local_change());
    }

    #[test]
    fn test_pause_intent() {
        let mut p = FakePlatform::default();
        let mut b = bridge();
        b.initialize(&mut p);
        assert_eq!(b.intent(MediaIntent::Pause, &mut p), Some(Command::Pause));
        assert!(p.paused);
        assert_eq!(p.states, vec![SessionPlayback::Paused]);
    }

    #[test]
    fn test_after_command_resumes_only_when_paused() {
        let mut p = FakePlatform::default();
        let mut b = bridge();
        b.initialize(&mut p);
        b.after_command(Command::Play, &mut p);
        assert_eq!(p.plays, 0);
        b.after_command(Command::Pause, &mut p);
        assert_eq!(p.pauses, 1);
        b.after_command(Command::Pause, &mut p);
        assert_eq!(p.pauses, 1);
        b.after_command(Command::PlayPause, &mut p);
        assert_eq!(p.plays, 1);
    }
}
