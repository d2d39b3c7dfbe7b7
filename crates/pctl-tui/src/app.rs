//! App: component-based event loop around the `Controller`.
//!
//! Architecture:
//! - `App` owns the controller, all components and `AppState` (the read-only
//!   snapshot components draw from).
//! - A `tokio::mpsc` channel carries terminal events and request completions.
//! - A 100 ms interval advances the controller's scheduler.  Every request
//!   the controller returns runs on its own task and comes back as
//!   `AppMessage::Completion`.
//! - Components return `Vec<Action>`; the App applies each to the controller.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Local;
use pctl_core::controller::InsertOutcome;
use pctl_core::http::HttpTransport;
use pctl_core::media::MediaIntent;
use pctl_core::protocol::Command;
use pctl_core::request;
use pctl_core::{Completion, Controller, Request};
use ratatui::crossterm::{
    event::{
        self, DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste,
        EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent,
        MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    widgets::Block,
    Terminal,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    clipboard::SystemClipboard,
    component::Component,
    components::{
        header::Header, help_overlay::HelpOverlay, players_panel::PlayersPanel,
        playlist_panel::PlaylistPanel,
    },
    focus::FocusRing,
    theme::C_BG,
    widgets::{
        prompt_input::{PromptAction, PromptInput},
        status_bar::{self, InputMode},
        toast::ToastManager,
    },
};

const VOLUME_STEP: f64 = 0.05;
const SEEK_STEP_SECS: i64 = 10;
const SEEK_STEP_LONG_SECS: i64 = 60;
const SCRUB_STEP_SECS: f64 = 5.0;
const SCRUB_STEP_LONG_SECS: f64 = 30.0;

pub enum AppMessage {
    Event(Event),
    Completion(Completion),
}

// ── Session persistence ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct UiSessionState {
    pub player: Option<String>,
    pub focused_component: String,
}

pub fn load_ui_session_state(path: &Path) -> UiSessionState {
    let Ok(content) = std::fs::read_to_string(path) else {
        return UiSessionState::default();
    };
    serde_json::from_str(&content).unwrap_or_default()
}

fn save_ui_session_state(path: &Path, state: &UiSessionState) -> anyhow::Result<()> {
    std::fs::write(path, serde_json::to_string_pretty(state)?)?;
    Ok(())
}

// ── Pane area tracking ────────────────────────────────────────────────────────

/// Last-drawn rects, used by `handle_mouse` for hit-testing.
#[derive(Default, Clone)]
struct PaneAreas {
    header: Rect,
    playlist: Rect,
    players: Rect,
}

fn hit(r: Rect, col: u16, row: u16) -> bool {
    r.width > 0
        && r.height > 0
        && col >= r.x
        && col < r.x + r.width
        && row >= r.y
        && row < r.y + r.height
}

pub struct App {
    controller: Controller,
    transport: Arc<HttpTransport>,
    clipboard: SystemClipboard,
    state: AppState,

    header: Header,
    playlist: PlaylistPanel,
    players: PlayersPanel,
    help_overlay: HelpOverlay,
    focus: FocusRing,
    toast: ToastManager,
    prompt: PromptInput,
    pane_areas: PaneAreas,
    /// Pane that took a mouse press; it gets drags until the release.
    mouse_capture: Option<ComponentId>,

    msg_tx: Option<mpsc::Sender<AppMessage>>,
    ui_state_path: PathBuf,
    should_quit: bool,
}

impl App {
    pub fn new(
        controller: Controller,
        transport: Arc<HttpTransport>,
        server: String,
        ui_state_path: PathBuf,
        session: UiSessionState,
    ) -> Self {
        let mut focus = FocusRing::new(vec![ComponentId::Playlist, ComponentId::Players]);
        if let Some(id) = ComponentId::from_label(&session.focused_component) {
            focus.set(id);
        }
        let mut state = AppState::new(server);
        state.sync(&controller);

        Self {
            controller,
            transport,
            clipboard: SystemClipboard::new(),
            state,
            header: Header::new(),
            playlist: PlaylistPanel::new(),
            players: PlayersPanel::new(),
            help_overlay: HelpOverlay::new(),
            focus,
            toast: ToastManager::new(),
            prompt: PromptInput::new("link"),
            pane_areas: PaneAreas::default(),
            mouse_capture: None,
            msg_tx: None,
            ui_state_path,
            should_quit: false,
        }
    }

    pub async fn run(
        mut self,
        mut media_rx: mpsc::UnboundedReceiver<MediaIntent>,
    ) -> anyhow::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(
            stdout,
            EnterAlternateScreen,
            EnableMouseCapture,
            EnableBracketedPaste
        )?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        debug!("run(): terminal created, size={:?}", terminal.size());

        let (tx, mut rx) = mpsc::channel::<AppMessage>(1024);
        self.msg_tx = Some(tx.clone());

        // ── Background task: keyboard/mouse events ────────────────────────────
        let event_tx = tx.clone();
        tokio::task::spawn_blocking(move || loop {
            match event::read() {
                Ok(ev) => {
                    if event_tx.blocking_send(AppMessage::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        });

        // ── Start-up fetches ──────────────────────────────────────────────────
        let requests = self.controller.start();
        self.execute_all(requests);
        self.after_change();

        // ── Periodic timers ───────────────────────────────────────────────────
        let mut scheduler_tick = tokio::time::interval(Duration::from_millis(100));
        scheduler_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut last_advance = Instant::now();

        let mut toast_tick = tokio::time::interval(Duration::from_millis(250));
        toast_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // ── Main loop ─────────────────────────────────────────────────────────
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal.draw(|f| self.draw(f))?;
            }
            needs_redraw = false;

            if self.should_quit {
                break;
            }

            tokio::select! {
                Some(msg) = rx.recv() => {
                    const MAX_DRAIN: usize = 256;
                    let mut redraw = self.handle_message(msg);
                    let mut drained = 0usize;
                    while drained < MAX_DRAIN {
                        let Ok(next) = rx.try_recv() else {
                            break;
                        };
                        drained += 1;
                        redraw |= self.handle_message(next);
                    }
                    needs_redraw = redraw;
                }

                Some(intent) = media_rx.recv() => {
                    info!("[media] intent {:?}", intent);
                    let requests = self.controller.media_intent(intent);
                    self.execute_all(requests);
                    self.after_change();
                    needs_redraw = true;
                }

                _ = scheduler_tick.tick() => {
                    let now = Instant::now();
                    let requests = self.controller.advance(now - last_advance);
                    last_advance = now;
                    if !requests.is_empty() {
                        self.execute_all(requests);
                    }
                }

                _ = toast_tick.tick() => {
                    if !self.toast.is_empty() {
                        self.toast.tick();
                        needs_redraw = true;
                    }
                }
            }
        }

        // ── Teardown ──────────────────────────────────────────────────────────
        self.controller.stop();
        self.save_session();
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture,
            DisableBracketedPaste
        )?;
        terminal.show_cursor()?;

        Ok(())
    }

    fn save_session(&self) {
        let player = self.controller.player();
        let session = UiSessionState {
            player: (!player.is_empty()).then(|| player.to_string()),
            focused_component: self
                .focus
                .current()
                .map(|id| id.label().to_string())
                .unwrap_or_default(),
        };
        if let Err(e) = save_ui_session_state(&self.ui_state_path, &session) {
            warn!("failed to save ui state: {}", e);
        }
    }

    // ── Requests ──────────────────────────────────────────────────────────────

    /// Run each request on its own task; completions come back on the
    /// message channel in whatever order they finish.
    fn execute_all(&self, requests: Vec<Request>) {
        let Some(tx) = self.msg_tx.as_ref() else {
            return;
        };
        for req in requests {
            let transport = Arc::clone(&self.transport);
            let tx = tx.clone();
            tokio::spawn(async move {
                let completion = request::execute(transport.as_ref(), req).await;
                let _ = tx.send(AppMessage::Completion(completion)).await;
            });
        }
    }

    /// Pull notices into toasts and rebuild the component snapshot.
    fn after_change(&mut self) {
        for notice in self.controller.drain_notices() {
            self.toast.notice(notice);
        }
        self.state.sync(&self.controller);
        self.state.input_mode = if self.prompt.is_active() {
            InputMode::Prompt
        } else if self.state.playlist.dragging {
            InputMode::Grab
        } else if self.state.seeking {
            InputMode::Scrub
        } else {
            InputMode::Normal
        };
    }

    fn handle_message(&mut self, msg: AppMessage) -> bool {
        match msg {
            AppMessage::Event(Event::Key(key)) => {
                if key.kind == KeyEventKind::Release {
                    return false;
                }
                self.controller.user_interaction();
                for action in self.handle_key(key) {
                    self.dispatch(action);
                }
                self.after_change();
                true
            }
            AppMessage::Event(Event::Mouse(event)) => {
                if matches!(event.kind, MouseEventKind::Down(_)) {
                    self.controller.user_interaction();
                }
                let actions = self.handle_mouse(event);
                if actions.is_empty() {
                    return false;
                }
                for action in actions {
                    self.dispatch(action);
                }
                self.after_change();
                true
            }
            AppMessage::Event(Event::Paste(text)) => {
                self.controller.user_interaction();
                if self.prompt.is_active() {
                    self.prompt.paste(&text);
                } else {
                    // Pasting outside the prompt adds the link directly.
                    self.dispatch(Action::AddText(text));
                }
                self.after_change();
                true
            }
            AppMessage::Event(Event::Resize(_, _)) => true,
            AppMessage::Event(_) => false,
            AppMessage::Completion(completion) => {
                let refresh = matches!(completion, Completion::Playlist(Ok(_)))
                    && !self.state.playlist.dirty
                    && !self.state.playlist.dragging;
                self.controller.apply(completion);
                if refresh {
                    self.state.playlist.synced_at = Some(Local::now());
                }
                self.after_change();
                true
            }
        }
    }

    // ── Key handling ──────────────────────────────────────────────────────────

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Action> {
        if key.code == KeyCode::Char('c') && key.modifiers == KeyModifiers::CONTROL {
            return vec![Action::Quit];
        }

        // The prompt captures everything, including 'q'.
        if self.prompt.is_active() {
            return match self.prompt.handle_key(key) {
                PromptAction::Submitted(text) => vec![Action::AddText(text)],
                PromptAction::Cancelled | PromptAction::Editing => vec![],
            };
        }

        if self.help_overlay.visible {
            return self.help_overlay.handle_key(key, &self.state);
        }

        match self.state.input_mode {
            InputMode::Scrub => return self.handle_scrub_key(key),
            // A grabbed entry belongs to the playlist whatever has focus.
            InputMode::Grab => return self.playlist.handle_key(key, &self.state),
            _ => {}
        }

        let shift = key.modifiers.contains(KeyModifiers::SHIFT);
        match key.code {
            KeyCode::Char('q') if key.modifiers == KeyModifiers::NONE => {
                return vec![Action::Quit]
            }
            KeyCode::Char('?') => return vec![Action::ToggleHelp],
            KeyCode::Tab => return vec![Action::FocusNext],
            KeyCode::BackTab => return vec![Action::FocusPrev],
            KeyCode::Char('1') => return vec![Action::FocusPane(ComponentId::Playlist)],
            KeyCode::Char('2') => return vec![Action::FocusPane(ComponentId::Players)],

            // ── Global playback keys ──────────────────────────────────────────
            KeyCode::Char(' ') => return vec![Action::Send(Command::PlayPause)],
            KeyCode::Char('n') => return vec![Action::Send(Command::Next)],
            KeyCode::Char('p') => return vec![Action::Send(Command::Previous)],
            KeyCode::Right | KeyCode::Char('+') | KeyCode::Char('=') => {
                return vec![Action::VolumeStep(VOLUME_STEP)]
            }
            KeyCode::Left | KeyCode::Char('-') => return vec![Action::VolumeStep(-VOLUME_STEP)],
            KeyCode::Char(',') if !shift => {
                return vec![Action::SeekRelative(-SEEK_STEP_SECS)]
            }
            KeyCode::Char('.') if !shift => return vec![Action::SeekRelative(SEEK_STEP_SECS)],
            KeyCode::Char('<') | KeyCode::Char(',') => {
                return vec![Action::SeekRelative(-SEEK_STEP_LONG_SECS)]
            }
            KeyCode::Char('>') | KeyCode::Char('.') => {
                return vec![Action::SeekRelative(SEEK_STEP_LONG_SECS)]
            }
            KeyCode::Char('s') => return vec![Action::BeginScrub],
            KeyCode::Char('[') => return vec![Action::CyclePlayer { forward: false }],
            KeyCode::Char(']') => return vec![Action::CyclePlayer { forward: true }],
            _ => {}
        }

        let s = &self.state;
        match self.focus.current() {
            Some(ComponentId::Playlist) => self.playlist.handle_key(key, s),
            Some(ComponentId::Players) => self.players.handle_key(key, s),
            _ => vec![],
        }
    }

    fn handle_scrub_key(&mut self, key: KeyEvent) -> Vec<Action> {
        let step = if key.modifiers.contains(KeyModifiers::SHIFT) {
            SCRUB_STEP_LONG_SECS
        } else {
            SCRUB_STEP_SECS
        };
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => vec![Action::ScrubBy(-step)],
            KeyCode::Right | KeyCode::Char('l') => vec![Action::ScrubBy(step)],
            KeyCode::Enter | KeyCode::Char('s') => vec![Action::EndScrub],
            KeyCode::Esc => vec![Action::CancelScrub],
            _ => vec![],
        }
    }

    // ── Mouse handling ────────────────────────────────────────────────────────

    fn handle_mouse(&mut self, event: MouseEvent) -> Vec<Action> {
        if self.prompt.is_active() || self.help_overlay.visible {
            return vec![];
        }
        let areas = self.pane_areas.clone();
        let s = &self.state;

        // Drags and the release go to whoever took the press.
        if matches!(event.kind, MouseEventKind::Drag(_) | MouseEventKind::Up(_)) {
            let actions = match self.mouse_capture {
                Some(ComponentId::Header) => self.header.handle_mouse(event, areas.header, s),
                Some(ComponentId::Playlist) => {
                    self.playlist.handle_mouse(event, areas.playlist, s)
                }
                _ => vec![],
            };
            if matches!(event.kind, MouseEventKind::Up(_)) {
                self.mouse_capture = None;
            }
            return actions;
        }

        let is_click = matches!(
            event.kind,
            MouseEventKind::Down(_) | MouseEventKind::ScrollUp | MouseEventKind::ScrollDown
        );
        if !is_click {
            return vec![];
        }
        let pressed = matches!(event.kind, MouseEventKind::Down(_));
        let (col, row) = (event.column, event.row);

        if hit(areas.header, col, row) {
            if pressed {
                self.mouse_capture = Some(ComponentId::Header);
            }
            return self.header.handle_mouse(event, areas.header, s);
        }
        if hit(areas.playlist, col, row) {
            let mut actions = self.playlist.handle_mouse(event, areas.playlist, s);
            if pressed {
                self.mouse_capture = Some(ComponentId::Playlist);
                if !self.focus.is_focused(ComponentId::Playlist) {
                    actions.insert(0, Action::FocusPane(ComponentId::Playlist));
                }
            }
            return actions;
        }
        if hit(areas.players, col, row) {
            let mut actions = self.players.handle_mouse(event, areas.players, s);
            if pressed && !self.focus.is_focused(ComponentId::Players) {
                actions.insert(0, Action::FocusPane(ComponentId::Players));
            }
            return actions;
        }
        vec![]
    }

    // ── Action dispatcher ─────────────────────────────────────────────────────

    fn dispatch(&mut self, action: Action) {
        {
            let s = &self.state;
            self.header.on_action(&action, s);
            self.playlist.on_action(&action, s);
            self.players.on_action(&action, s);
            self.help_overlay.on_action(&action, s);
        }
        self.apply_action(action);
    }

    fn apply_action(&mut self, action: Action) {
        debug!("apply_action: {:?}", action);
        let requests = match action {
            // ── Playback ──────────────────────────────────────────────────────
            Action::Send(command) => self.controller.send_command(command),
            Action::VolumeStep(delta) => self.controller.adjust_volume(delta),
            Action::SeekRelative(secs) => self.controller.seek(secs),
            Action::BeginScrub => {
                self.controller.begin_seek();
                vec![]
            }
            Action::ScrubTo(value) => {
                self.controller.scrub_seek(value);
                vec![]
            }
            Action::ScrubBy(delta) => {
                let value = self.controller.status().seek_value + delta;
                self.controller.scrub_seek(value);
                vec![]
            }
            Action::EndScrub => self.controller.end_seek(),
            Action::CancelScrub => {
                self.controller.cancel_seek();
                vec![]
            }

            // ── Players ───────────────────────────────────────────────────────
            Action::SelectPlayer(player) => self.controller.select_player(player),
            Action::CyclePlayer { forward } => self.controller.cycle_player(forward),

            // ── Playlist ──────────────────────────────────────────────────────
            Action::GrabStart => {
                self.controller.drag_start();
                vec![]
            }
            Action::GrabMove { from, to } => {
                self.controller.drag_move(from, to);
                vec![]
            }
            Action::GrabEnd => self.controller.drag_end(),
            Action::Commit => self.controller.commit(),
            Action::Revert => {
                if !self.controller.revert() {
                    self.toast.info("No local changes");
                }
                vec![]
            }
            Action::AddFromClipboard => {
                match self.controller.insert_from_clipboard(&mut self.clipboard) {
                    InsertOutcome::Requests(requests) => requests,
                    InsertOutcome::Prompt => {
                        self.prompt.open();
                        vec![]
                    }
                }
            }
            Action::OpenPrompt => {
                self.prompt.open();
                vec![]
            }
            Action::AddText(text) => self.controller.insert_text(&text),
            Action::JumpTo(index) => self.controller.jump_to_index(index),
            Action::Tap(index) => self.controller.tap_entry(index, Instant::now()),

            // ── Navigation ────────────────────────────────────────────────────
            Action::FocusNext => {
                self.focus.next();
                vec![]
            }
            Action::FocusPrev => {
                self.focus.prev();
                vec![]
            }
            Action::FocusPane(id) => {
                self.focus.set(id);
                vec![]
            }

            // Components already reacted in `dispatch`.
            Action::ToggleHelp => vec![],
            Action::Quit => {
                self.should_quit = true;
                vec![]
            }
        };
        self.execute_all(requests);
    }

    // ── Drawing ───────────────────────────────────────────────────────────────

    fn draw(&mut self, frame: &mut ratatui::Frame) {
        let area = frame.area();
        frame.render_widget(Block::default().style(Style::default().bg(C_BG)), area);

        let prompt_h = if self.prompt.is_active() { 1 } else { 0 };
        let outer = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Min(0),
                Constraint::Length(prompt_h),
                Constraint::Length(1),
            ])
            .split(area);

        let header_area = outer[0];
        let body_area = outer[1];
        let prompt_area = outer[2];
        let status_area = outer[3];

        self.header.draw(frame, header_area, false, &self.state);
        self.pane_areas.header = header_area;

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
            .split(body_area);
        let playlist_focused = self.focus.is_focused(ComponentId::Playlist);
        let players_focused = self.focus.is_focused(ComponentId::Players);
        self.playlist
            .draw(frame, body[0], playlist_focused, &self.state);
        self.players.draw(frame, body[1], players_focused, &self.state);
        self.pane_areas.playlist = body[0];
        self.pane_areas.players = body[1];

        if self.prompt.is_active() {
            self.prompt.draw(frame, prompt_area);
        }

        status_bar::draw_keys_bar(frame, status_area, self.state.input_mode, self.state.media);

        if self.help_overlay.visible {
            self.help_overlay.draw(frame, area, false, &self.state);
        }

        // Toasts sit on top of everything.
        self.toast.draw(frame, body_area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_excludes_far_edges() {
        let r = Rect {
            x: 2,
            y: 3,
            width: 4,
            height: 2,
        };
        assert!(hit(r, 2, 3));
        assert!(hit(r, 5, 4));
        assert!(!hit(r, 6, 4));
        assert!(!hit(r, 5, 5));
        assert!(!hit(Rect::default(), 0, 0));
    }

    #[test]
    fn test_session_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ui_state.json");
        let state = UiSessionState {
            player: Some("mpv".into()),
            focused_component: "players".into(),
        };
        save_ui_session_state(&path, &state).unwrap();
        let loaded = load_ui_session_state(&path);
        assert_eq!(loaded.player.as_deref(), Some("mpv"));
        assert_eq!(
            ComponentId::from_label(&loaded.focused_component),
            Some(ComponentId::Players)
        );
    }

    #[test]
    fn test_missing_session_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_ui_session_state(&dir.path().join("ui_state.json"));
        assert!(loaded.player.is_none());
    }
}
