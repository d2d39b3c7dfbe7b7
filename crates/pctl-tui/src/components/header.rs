//! Header component: 2-row top bar.
//!
//! Row 1: play state, title and artist, artwork marker, player, volume.
//! Row 2: seek bar.  Click or drag on the bar to scrub; scroll for volume.
//!
//! Not focusable.

use ratatui::crossterm::event::{KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph},
    Frame,
};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{C_ARTIST, C_MUTED, C_PAUSED, C_PLAYING, C_PRIMARY, C_SECONDARY, C_VOLUME},
    widgets::{progress_bar, truncate},
};
use unicode_width::UnicodeWidthStr;

const VOLUME_WHEEL_STEP: f64 = 0.05;

#[derive(Default)]
pub struct Header {
    /// Seek bar rect from the last draw.
    bar: Rect,
    /// A mouse scrub started on the bar and has not been released.
    dragging: bool,
}

impl Header {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    fn hit_bar(&self, event: &MouseEvent) -> bool {
        let r = self.bar;
        r.width > 0
            && event.column >= r.x
            && event.column < r.x + r.width
            && event.row == r.y
    }
}

impl Component for Header {
    fn id(&self) -> ComponentId {
        ComponentId::Header
    }

    fn handle_key(&mut self, _key: KeyEvent, _state: &AppState) -> Vec<Action> {
        vec![]
    }

    fn handle_mouse(&mut self, event: MouseEvent, _area: Rect, state: &AppState) -> Vec<Action> {
        let max = state.status.seek_max;
        match event.kind {
            MouseEventKind::Down(MouseButton::Left) if self.hit_bar(&event) => {
                self.dragging = true;
                let pos = progress_bar::position_at(self.bar, event.column, max);
                vec![Action::BeginScrub, Action::ScrubTo(pos)]
            }
            MouseEventKind::Drag(MouseButton::Left) if self.dragging => {
                vec![Action::ScrubTo(progress_bar::position_at(
                    self.bar,
                    event.column,
                    max,
                ))]
            }
            MouseEventKind::Up(MouseButton::Left) if self.dragging => {
                self.dragging = false;
                vec![Action::EndScrub]
            }
            MouseEventKind::ScrollUp => vec![Action::VolumeStep(VOLUME_WHEEL_STEP)],
            MouseEventKind::ScrollDown => vec![Action::VolumeStep(-VOLUME_WHEEL_STEP)],
            _ => vec![],
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, _focused: bool, state: &AppState) {
        if area.height < 2 {
            frame.render_widget(Clear, area);
            frame.render_widget(Paragraph::new(build_row1(state, area.width)), area);
            self.bar = Rect::default();
            return;
        }

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Length(1)])
            .split(area);

        frame.render_widget(Clear, rows[0]);
        frame.render_widget(Paragraph::new(build_row1(state, rows[0].width)), rows[0]);

        let s = &state.status;
        self.bar = progress_bar::draw_progress(
            frame,
            rows[1],
            s.seek_value,
            s.seek_max,
            state.seeking,
        );
    }
}

// ── Row 1: now playing ────────────────────────────────────────────────────────

fn build_row1(state: &AppState, width: u16) -> Line<'static> {
    let s = &state.status;

    let (icon, icon_color) = if s.status.is_playing() {
        ("▶", C_PLAYING)
    } else if s.status.0.is_empty() {
        ("■", C_MUTED)
    } else {
        ("⏸", C_PAUSED)
    };

    let player = if state.player.is_empty() {
        "no player".to_string()
    } else {
        state.player.clone()
    };
    let volume = match s.volume {
        Some(v) => format!("vol {:>3}%", (v * 100.0).round() as i64),
        None => "vol  --".to_string(),
    };
    let art = if s.thumbnail_visible() { " ◆" } else { "" };

    // Right side is fixed; the title gets what's left.
    let right = format!("{}  {}  {} ", art, player, volume);
    let right_w = right.width();
    let avail = (width as usize).saturating_sub(right_w + 4);

    let title = if s.title.is_empty() {
        "nothing playing".to_string()
    } else {
        s.title.clone()
    };
    let (title_text, artist_text) = if s.artist.is_empty() {
        (truncate(&title, avail), String::new())
    } else {
        let title_w = avail.saturating_sub(avail / 3);
        let t = truncate(&title, title_w);
        let used = t.width() + 3;
        (t, truncate(&s.artist, avail.saturating_sub(used)))
    };

    let artist_w = if artist_text.is_empty() {
        0
    } else {
        3 + artist_text.width()
    };
    let left_w = 3 + title_text.width() + artist_w;
    let pad = (width as usize).saturating_sub(left_w + right_w);

    let mut spans = vec![
        Span::raw(" "),
        Span::styled(icon, Style::default().fg(icon_color)),
        Span::raw(" "),
        Span::styled(
            title_text,
            Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
        ),
    ];
    if !artist_text.is_empty() {
        spans.push(Span::styled(" · ", Style::default().fg(C_MUTED)));
        spans.push(Span::styled(artist_text, Style::default().fg(C_ARTIST)));
    }
    spans.push(Span::raw(" ".repeat(pad)));
    spans.push(Span::styled(art, Style::default().fg(C_SECONDARY)));
    spans.push(Span::raw("  "));
    spans.push(Span::styled(player, Style::default().fg(C_SECONDARY)));
    spans.push(Span::raw("  "));
    spans.push(Span::styled(volume, Style::default().fg(C_VOLUME)));
    spans.push(Span::raw(" "));
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyModifiers;

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn state_with_length(max: f64) -> AppState {
        let mut s = AppState::new("http://test");
        s.status.seek_max = max;
        s
    }

    #[test]
    fn test_drag_on_bar_scrubs_then_seeks() {
        let mut h = Header::new();
        h.bar = Rect {
            x: 5,
            y: 1,
            width: 100,
            height: 1,
        };
        let s = state_with_length(100.0);
        let area = Rect::default();

        let down = h.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 25, 1), area, &s);
        assert_eq!(down, vec![Action::BeginScrub, Action::ScrubTo(20.0)]);
        assert!(h.is_dragging());

        // drags keep scrubbing even off the bar row
        let drag = h.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), 55, 4), area, &s);
        assert_eq!(drag, vec![Action::ScrubTo(50.0)]);

        let up = h.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 55, 4), area, &s);
        assert_eq!(up, vec![Action::EndScrub]);
        assert!(!h.is_dragging());
    }

    #[test]
    fn test_click_off_bar_is_ignored() {
        let mut h = Header::new();
        h.bar = Rect {
            x: 5,
            y: 1,
            width: 10,
            height: 1,
        };
        let s = state_with_length(100.0);
        let out = h.handle_mouse(
            mouse(MouseEventKind::Down(MouseButton::Left), 25, 0),
            Rect::default(),
            &s,
        );
        assert!(out.is_empty());
        assert!(!h.is_dragging());
    }
}
