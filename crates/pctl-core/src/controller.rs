//! The single owner of remote state.
//!
//! Front ends call the input methods, execute the returned [`Request`]s and
//! hand each [`Completion`] to [`Controller::apply`].  User-facing messages
//! queue up as [`Notice`]s.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::clipboard::{ClipboardSource, InsertError};
use crate::command::{CommandClient, Route};
use crate::config::Config;
use crate::media::{MediaBridge, MediaIntent, MediaPlatform, StartOutcome};
use crate::playlist::{PlaylistSync, RefreshOutcome};
use crate::protocol::{Command, PlaybackStatus};
use crate::request::{Completion, Request};
use crate::scheduler::{Scheduler, TaskHandle};
use crate::status::{StatusPoller, StatusView};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
}

impl Notice {
    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Timer {
    StatusTick,
    PlaylistRefresh,
}

/// Result of "add from clipboard".
#[derive(Debug, PartialEq)]
pub enum InsertOutcome {
    Requests(Vec<Request>),
    /// No clipboard; ask the user for the text and call `insert_text`.
    Prompt,
}

pub struct Controller {
    scheduler: Scheduler<Timer>,
    timers: Vec<TaskHandle>,
    status_period: Duration,
    playlist_period: Duration,
    media_enabled: bool,
    command: CommandClient,
    status: StatusPoller,
    playlist: PlaylistSync,
    media: MediaBridge,
    platform: Box<dyn MediaPlatform>,
    players: Vec<String>,
    notices: VecDeque<Notice>,
}

impl Controller {
    pub fn new(config: &Config, platform: Box<dyn MediaPlatform>) -> Self {
        Self {
            scheduler: Scheduler::new(),
            timers: Vec::new(),
            status_period: Duration::from_millis(config.polling.status_interval_ms),
            playlist_period: Duration::from_millis(config.polling.playlist_interval_ms),
            media_enabled: config.media.enabled,
            command: CommandClient::new(
                config.player.default_player.clone(),
                config.player.jump_redirect.clone(),
            ),
            status: StatusPoller::new(),
            playlist: PlaylistSync::new(
                config.playlist.commit_policy,
                Duration::from_millis(config.playlist.double_tap_ms),
            ),
            media: MediaBridge::new(config.player.play_command, &config.media.display_name),
            platform,
            players: Vec::new(),
            notices: VecDeque::new(),
        }
    }

    // ── Lifecycle ──────────────────────────────────────────────────────────────

    /// Arm the timers, start the media bridge and return the start-up
    /// fetches (one status tick, one playlist refresh, the player list).
    pub fn start(&mut self) -> Vec<Request> {
        if self.timers.is_empty() {
            self.timers.push(self.scheduler.every(self.status_period, Timer::StatusTick));
            self.timers
                .push(self.scheduler.every(self.playlist_period, Timer::PlaylistRefresh));
        }

        if self.media_enabled {
            self.initialize_media();
        }

        let mut requests = self.tick();
        requests.extend(self.playlist.refresh_request());
        requests.push(Request::FetchPlayers);
        requests
    }

    pub fn stop(&mut self) {
        for handle in self.timers.drain(..) {
            self.scheduler.cancel(handle);
        }
    }

    pub fn is_running(&self) -> bool {
        !self.timers.is_empty()
    }

    /// Advance the virtual clock and run whatever came due.
    pub fn advance(&mut self, elapsed: Duration) -> Vec<Request> {
        let mut requests = Vec::new();
        for timer in self.scheduler.advance(elapsed) {
            match timer {
                Timer::StatusTick => requests.extend(self.tick()),
                Timer::PlaylistRefresh => requests.extend(self.playlist.refresh_request()),
            }
        }
        requests
    }

    /// One status poll: status, metadata, volume and the playback probe.
    pub fn tick(&self) -> Vec<Request> {
        vec![
            self.command.command(Command::Status),
            self.command.metadata(),
            self.command.volume(),
            self.command.playback_probe(),
        ]
    }

    pub fn refresh_playlist(&self) -> Vec<Request> {
        self.playlist.refresh_request().into_iter().collect()
    }

    // ── Completions ────────────────────────────────────────────────────────────

    pub fn apply(&mut self, completion: Completion) {
        match completion {
            Completion::Command { command, result } => match result {
                Ok(reply) => {
                    debug!("[command] {} -> {:?}", command, reply.result);
                    if command == Command::Status {
                        self.status.apply_status(&reply);
                    }
                    self.media.after_command(command, self.platform.as_mut());
                }
                Err(e) => warn!("[command] {} failed: {}", command, e),
            },
            Completion::Metadata(result) => {
                if let Some(meta) = self.status.apply_metadata(result) {
                    self.media.mirror_metadata(&meta, self.platform.as_mut());
                }
            }
            Completion::Volume(result) => self.status.apply_volume(result),
            Completion::PlaybackProbe(result) => match result {
                Ok(reply) => self.apply_probe(PlaybackStatus::from_reply(&reply).is_playing()),
                Err(e) => warn!("[status] playback probe failed: {}", e),
            },
            Completion::Adjusted { what, result } => match result {
                Ok(reply) => debug!("[command] {} -> {:?}", what, reply.result),
                Err(e) => warn!("[command] {} failed: {}", what, e),
            },
            Completion::Playlist(result) => {
                if self.playlist.apply_refresh(result) == RefreshOutcome::Discarded {
                    debug!("[playlist] kept local order over backend reply");
                }
            }
            Completion::Commit { entries, result } => {
                match self.playlist.apply_commit(entries, result) {
                    Ok(()) => self.notify(Severity::Success, "Playlist order updated"),
                    Err(_) => self.notify(Severity::Error, "Error updating playlist order"),
                }
            }
            Completion::SetIndex { index, result } => {
                if let Err(e) = self.playlist.apply_set_index(index, result) {
                    self.notify(Severity::Error, format!("Jump failed: {e}"));
                }
            }
            Completion::Players(result) => match result {
                Ok(players) => {
                    info!("[players] {} available", players.len());
                    self.players = players;
                }
                Err(e) => warn!("[players] fetch failed: {}", e),
            },
        }
    }

    fn apply_probe(&mut self, playing: bool) {
        if self.media.take_local_change() {
            return;
        }
        if self.status.observe_playing(playing) {
            self.media.sync_playing(playing, self.platform.as_mut());
        }
    }

    // ── Commands ───────────────────────────────────────────────────────────────

    /// Send a transport command, turning next/previous into a playlist jump
    /// for redirected players.
    pub fn send_command(&mut self, command: Command) -> Vec<Request> {
        match self.command.route(command) {
            Route::Send(request) => vec![request],
            Route::Jump(direction) => {
                let jump = self.playlist.step(direction);
                if jump.is_none() {
                    debug!("[command] {} redirect: playlist empty", command);
                }
                jump.into_iter().collect()
            }
        }
    }

    pub fn set_volume(&mut self, value: f64) -> Vec<Request> {
        let request = self.command.set_volume(value);
        if let Request::SetVolume { value, .. } = &request {
            self.status.set_local_volume(*value);
        }
        vec![request]
    }

    /// Nudge the volume relative to the last known value.
    pub fn adjust_volume(&mut self, delta: f64) -> Vec<Request> {
        let Some(current) = self.status.view().volume else {
            return Vec::new();
        };
        self.set_volume(current + delta)
    }

    pub fn seek(&mut self, delta_secs: i64) -> Vec<Request> {
        vec![self.command.seek(delta_secs)]
    }

    pub fn begin_seek(&mut self) {
        self.status.begin_seek();
    }

    pub fn scrub_seek(&mut self, value: f64) {
        self.status.scrub_seek(value);
    }

    pub fn end_seek(&mut self) -> Vec<Request> {
        self.status
            .end_seek()
            .map(|position| self.command.seek_absolute(position))
            .into_iter()
            .collect()
    }

    /// Abandon a seek gesture; the next metadata reply restores the position.
    pub fn cancel_seek(&mut self) {
        self.status.cancel_seek();
    }

    /// Switch players; polls the new one right away.
    pub fn select_player(&mut self, player: impl Into<String>) -> Vec<Request> {
        let player = player.into();
        if player == self.command.player() {
            return Vec::new();
        }
        info!("[players] selected {:?}", player);
        self.command.set_player(player);
        self.tick()
    }

    /// Select the next player in the fetched list, wrapping.
    pub fn cycle_player(&mut self, forward: bool) -> Vec<Request> {
        if self.players.is_empty() {
            return Vec::new();
        }
        let len = self.players.len();
        let next = match self.players.iter().position(|p| p == self.command.player()) {
            Some(i) if forward => (i + 1) % len,
            Some(i) => (i + len - 1) % len,
            None => 0,
        };
        let player = self.players[next].clone();
        self.select_player(player)
    }

    // ── Playlist ───────────────────────────────────────────────────────────────

    pub fn drag_start(&mut self) {
        self.playlist.drag_start();
    }

    pub fn drag_move(&mut self, from: usize, to: usize) -> bool {
        self.playlist.drag_move(from, to)
    }

    pub fn drag_end(&mut self) -> Vec<Request> {
        self.playlist.drag_end().into_iter().collect()
    }

    pub fn commit(&mut self) -> Vec<Request> {
        vec![self.playlist.commit_request()]
    }

    pub fn revert(&mut self) -> bool {
        let reverted = self.playlist.revert();
        if reverted {
            self.notify(Severity::Info, "Local playlist changes discarded");
        }
        reverted
    }

    pub fn insert_from_clipboard(&mut self, source: &mut dyn ClipboardSource) -> InsertOutcome {
        match source.read_text() {
            Ok(Some(text)) => InsertOutcome::Requests(self.insert_text(&text)),
            Ok(None) => InsertOutcome::Prompt,
            Err(e) => {
                warn!("[playlist] failed to read clipboard contents: {}", e);
                self.notify(Severity::Error, InsertError::from(e).to_string());
                InsertOutcome::Requests(Vec::new())
            }
        }
    }

    pub fn insert_text(&mut self, text: &str) -> Vec<Request> {
        match self.playlist.insert_text(text) {
            Ok(request) => request.into_iter().collect(),
            Err(e) => {
                self.notify(Severity::Warning, e.to_string());
                Vec::new()
            }
        }
    }

    pub fn jump_to_index(&mut self, index: usize) -> Vec<Request> {
        self.playlist.jump_to_index(index).into_iter().collect()
    }

    pub fn tap_entry(&mut self, index: usize, at: Instant) -> Vec<Request> {
        self.playlist.tap(index, at).into_iter().collect()
    }

    // ── Media session ──────────────────────────────────────────────────────────

    fn initialize_media(&mut self) {
        if self.media.initialize(self.platform.as_mut()) == StartOutcome::Deferred {
            self.notify(
                Severity::Warning,
                "Media keys need an interaction: press any key to enable",
            );
        }
    }

    /// Any key press or click.  Retries a deferred keep-alive start.
    pub fn user_interaction(&mut self) {
        if self.media.on_interaction(self.platform.as_mut()) == StartOutcome::Started {
            self.notify(Severity::Info, "Media keys enabled");
        }
    }

    pub fn media_intent(&mut self, intent: MediaIntent) -> Vec<Request> {
        match self.media.intent(intent, self.platform.as_mut()) {
            Some(command) => self.send_command(command),
            None => Vec::new(),
        }
    }

    // ── Views ──────────────────────────────────────────────────────────────────

    pub fn status(&self) -> &StatusView {
        self.status.view()
    }

    pub fn is_seeking(&self) -> bool {
        self.status.is_seeking()
    }

    pub fn playlist(&self) -> &PlaylistSync {
        &self.playlist
    }

    pub fn player(&self) -> &str {
        self.command.player()
    }

    pub fn players(&self) -> &[String] {
        &self.players
    }

    pub fn media_active(&self) -> bool {
        self.media.is_active()
    }

    pub fn media_retry_armed(&self) -> bool {
        self.media.retry_armed()
    }

    fn notify(&mut self, severity: Severity, message: impl Into<String>) {
        self.notices.push_back(Notice::new(severity, message));
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::clipboard::ClipboardError;
    use crate::config::{CommitPolicy, JumpRedirect};
    use crate::media::fake::FakePlatform;
    use crate::media::{KeepAlive, KeepAliveError, MediaSessionSurface, SessionMetadata, SessionPlayback};
    use crate::protocol::{CommandReply, PlaylistSnapshot, TrackMetadata};

    #[derive(Clone, Default)]
    struct Shared(Rc<RefCell<FakePlatform>>);

    impl KeepAlive for Shared {
        fn start(&mut self) -> Result<(), KeepAliveError> {
            self.0.borrow_mut().start()
        }
        fn play(&mut self) -> Result<(), KeepAliveError> {
            self.0.borrow_mut().play()
        }
        fn pause(&mut self) {
            self.0.borrow_mut().pause()
        }
        fn is_paused(&self) -> bool {
            self.0.borrow().is_paused()
        }
    }

    impl MediaSessionSurface for Shared {
        fn set_playback_state(&mut self, state: SessionPlayback) {
            self.0.borrow_mut().set_playback_state(state)
        }
        fn set_metadata(&mut self, metadata: &SessionMetadata) {
            self.0.borrow_mut().set_metadata(metadata)
        }
    }

    struct Clip(Result<Option<String>, ()>);

    impl ClipboardSource for Clip {
        fn read_text(&mut self) -> Result<Option<String>, ClipboardError> {
            self.0
                .clone()
                .map_err(|_| ClipboardError::Denied("not allowed".into()))
        }
    }

    fn controller_with(config: Config) -> (Controller, Shared) {
        let shared = Shared::default();
        let c = Controller::new(&config, Box::new(shared.clone()));
        (c, shared)
    }

    fn controller(player: &str, policy: CommitPolicy) -> (Controller, Shared) {
        let mut config = Config::default();
        config.player.default_player = player.to_string();
        config.playlist.commit_policy = policy;
        controller_with(config)
    }

    fn load(c: &mut Controller, items: &[&str], current: Option<&str>) {
        c.apply(Completion::Playlist(Ok(PlaylistSnapshot {
            entries: items.iter().map(|s| s.to_string()).collect(),
            current: current.map(str::to_string),
        })));
    }

    fn probe(c: &mut Controller, status: &str) {
        c.apply(Completion::PlaybackProbe(Ok(CommandReply {
            result: Some(status.into()),
        })));
    }

    #[test]
    fn test_start_issues_tick_refresh_and_players() {
        let (mut c, _) = controller("mpv", CommitPolicy::Batched);
        let requests = c.start();
        assert_eq!(requests.len(), 6);
        assert_eq!(
            requests[0],
            Request::Command {
                player: "mpv".into(),
                command: Command::Status
            }
        );
        assert!(requests.contains(&Request::FetchPlaylist));
        assert!(requests.contains(&Request::FetchPlayers));
        assert!(c.media_active());
    }

    #[test]
    fn test_timers_follow_configured_periods() {
        let (mut c, _) = controller("mpv", CommitPolicy::Batched);
        c.start();
        assert!(c.advance(Duration::from_millis(1999)).is_empty());
        assert_eq!(c.advance(Duration::from_millis(1)).len(), 4);
        let at_5s = c.advance(Duration::from_millis(3000));
        assert_eq!(at_5s.len(), 5);
        assert!(at_5s.contains(&Request::FetchPlaylist));
    }

    #[test]
    fn test_stop_cancels_timers() {
        let (mut c, _) = controller("mpv", CommitPolicy::Batched);
        c.start();
        c.stop();
        assert!(!c.is_running());
        assert!(c.advance(Duration::from_secs(60)).is_empty());
    }

    #[test]
    fn test_scheduled_refresh_skipped_while_dragging() {
        let (mut c, _) = controller("mpv", CommitPolicy::Batched);
        c.start();
        load(&mut c, &["a", "b"], None);
        c.drag_start();
        let requests = c.advance(Duration::from_millis(5000));
        assert!(!requests.contains(&Request::FetchPlaylist));
        c.drag_end();
        let requests = c.advance(Duration::from_millis(5000));
        assert!(requests.contains(&Request::FetchPlaylist));
    }

    #[test]
    fn test_next_for_bare_player_jumps() {
        let (mut c, _) = controller("mpv", CommitPolicy::Batched);
        load(&mut c, &["a", "b", "c"], Some("b"));
        assert_eq!(
            c.send_command(Command::Next),
            vec![Request::SetIndex { index: 2 }]
        );
        assert_eq!(
            c.send_command(Command::Previous),
            vec![Request::SetIndex { index: 0 }]
        );
    }

    #[test]
    fn test_next_with_empty_playlist_does_nothing() {
        let (mut c, _) = controller("mpv", CommitPolicy::Batched);
        assert!(c.send_command(Command::Next).is_empty());
    }

    #[test]
    fn test_bare_redirect_skips_instance_players() {
        let mut config = Config::default();
        config.player.default_player = "spotify".into();
        config.player.jump_redirect = JumpRedirect::Bare;
        let (mut c, _) = controller_with(config);
        load(&mut c, &["a"], Some("a"));
        // "spotify" is bare too, so the bare predicate redirects it
        assert_eq!(c.send_command(Command::Next), vec![Request::SetIndex { index: 0 }]);
        c.select_player("spotify.instance77");
        assert_eq!(
            c.send_command(Command::Next),
            vec![Request::Command {
                player: "spotify.instance77".into(),
                command: Command::Next
            }]
        );
    }

    #[test]
    fn test_select_player_ticks_immediately() {
        let (mut c, _) = controller("mpv", CommitPolicy::Batched);
        let requests = c.select_player("vlc");
        assert_eq!(requests.len(), 4);
        assert!(requests.iter().all(|r| match r {
            Request::Command { player, .. }
            | Request::Metadata { player }
            | Request::Volume { player }
            | Request::PlaybackProbe { player } => player == "vlc",
            _ => false,
        }));
        assert!(c.select_player("vlc").is_empty());
    }

    #[test]
    fn test_cycle_player_wraps() {
        let (mut c, _) = controller("b", CommitPolicy::Batched);
        c.apply(Completion::Players(Ok(vec!["a".into(), "b".into()])));
        c.cycle_player(true);
        assert_eq!(c.player(), "a");
        c.cycle_player(false);
        assert_eq!(c.player(), "b");
    }

    #[test]
    fn test_commit_notices() {
        let (mut c, _) = controller("mpv", CommitPolicy::Batched);
        load(&mut c, &["a", "b"], None);
        c.apply(Completion::Commit {
            entries: vec!["a".into(), "b".into()],
            result: Ok(()),
        });
        c.apply(Completion::Commit {
            entries: vec!["a".into()],
            result: Err(crate::transport::TransportError::Decode("x".into())),
        });
        let notices = c.drain_notices();
        assert_eq!(notices[0], Notice::new(Severity::Success, "Playlist order updated"));
        assert_eq!(notices[1].severity, Severity::Error);
        assert!(c.drain_notices().is_empty());
    }

    #[test]
    fn test_clipboard_insert_paths() {
        let (mut c, _) = controller("mpv", CommitPolicy::Batched);
        load(&mut c, &["a"], None);

        let out = c.insert_from_clipboard(&mut Clip(Ok(Some("  http://x  ".into()))));
        assert_eq!(out, InsertOutcome::Requests(vec![]));
        assert_eq!(c.playlist().entries().last().map(String::as_str), Some("http://x"));
        assert!(c.playlist().is_dirty());

        assert_eq!(c.insert_from_clipboard(&mut Clip(Ok(None))), InsertOutcome::Prompt);

        c.insert_from_clipboard(&mut Clip(Ok(Some("   ".into()))));
        c.insert_from_clipboard(&mut Clip(Err(())));
        let notices = c.drain_notices();
        assert_eq!(notices[0].message, "Clipboard is empty or contains only whitespace.");
        assert_eq!(notices[1].severity, Severity::Error);
        assert!(notices[1].message.contains("permissions"));
        assert_eq!(c.playlist().entries().len(), 2);
    }

    #[test]
    fn test_clipboard_insert_immediate_commits() {
        let (mut c, _) = controller("mpv", CommitPolicy::Immediate);
        load(&mut c, &["a"], None);
        let out = c.insert_from_clipboard(&mut Clip(Ok(Some("  http://x  ".into()))));
        assert_eq!(
            out,
            InsertOutcome::Requests(vec![Request::CommitPlaylist {
                entries: vec!["a".into(), "http://x".into()]
            }])
        );
    }

    #[test]
    fn test_end_seek_sends_absolute_position() {
        let (mut c, _) = controller("mpv", CommitPolicy::Batched);
        c.apply(Completion::Metadata(Ok(TrackMetadata {
            length: 300.0,
            position: 10.0,
            ..Default::default()
        })));
        c.begin_seek();
        c.scrub_seek(120.4);
        assert_eq!(
            c.end_seek(),
            vec![Request::SeekAbsolute {
                player: "mpv".into(),
                position_secs: 120
            }]
        );
        assert!(c.end_seek().is_empty());
    }

    #[test]
    fn test_probe_syncs_keep_alive_on_edges() {
        let (mut c, shared) = controller("mpv", CommitPolicy::Batched);
        c.start();
        probe(&mut c, "Playing");
        assert_eq!(shared.0.borrow().plays, 1);
        probe(&mut c, "Playing");
        assert_eq!(shared.0.borrow().plays, 1);
        probe(&mut c, "Paused");
        assert!(shared.0.borrow().paused);
    }

    #[test]
    fn test_local_change_suppresses_one_probe() {
        let (mut c, shared) = controller("mpv", CommitPolicy::Batched);
        c.start();
        let requests = c.media_intent(MediaIntent::Play);
        assert_eq!(
            requests,
            vec![Request::Command {
                player: "mpv".into(),
                command: Command::Play
            }]
        );
        let plays = shared.0.borrow().plays;
        probe(&mut c, "Playing");
        assert_eq!(shared.0.borrow().plays, plays);
        assert!(!c.status.is_playing());
        probe(&mut c, "Playing");
        assert!(c.status.is_playing());
    }

    #[test]
    fn test_metadata_mirrored_to_session() {
        let (mut c, shared) = controller("mpv", CommitPolicy::Batched);
        c.start();
        c.apply(Completion::Metadata(Ok(TrackMetadata {
            title: "Song".into(),
            artist: "Band".into(),
            ..Default::default()
        })));
        let last = shared.0.borrow().metadata.last().cloned();
        assert_eq!(last.map(|m| m.title), Some("Song".to_string()));
    }

    #[test]
    fn test_deferred_media_start_retried_on_interaction() {
        let (mut c, shared) = controller("mpv", CommitPolicy::Batched);
        shared.0.borrow_mut().start_failures = 1;
        c.start();
        assert!(!c.media_active());
        assert!(c.media_retry_armed());
        assert_eq!(c.drain_notices()[0].severity, Severity::Warning);
        c.user_interaction();
        assert!(c.media_active());
        assert!(!c.media_retry_armed());
    }

    #[test]
    fn test_volume_adjust_clamps_and_updates_locally() {
        let (mut c, _) = controller("mpv", CommitPolicy::Batched);
        assert!(c.adjust_volume(0.1).is_empty());
        c.apply(Completion::Volume(Ok(0.95)));
        assert_eq!(
            c.adjust_volume(0.1),
            vec![Request::SetVolume {
                player: "mpv".into(),
                value: 1.0
            }]
        );
        assert_eq!(c.status().volume, Some(1.0));
    }

    #[test]
    fn test_double_tap_jumps_once() {
        let (mut c, _) = controller("mpv", CommitPolicy::Batched);
        load(&mut c, &["a", "b"], None);
        let t0 = Instant::now();
        assert!(c.tap_entry(1, t0).is_empty());
        assert_eq!(
            c.tap_entry(1, t0 + Duration::from_millis(100)),
            vec![Request::SetIndex { index: 1 }]
        );
        c.apply(Completion::SetIndex {
            index: 1,
            result: Ok(()),
        });
        assert_eq!(c.playlist().current(), Some("b"));
    }
}
