//! PlaylistPanel: the shared playlist, with keyboard grab and mouse drag
//! reordering, double-click to jump, and the unstaged-changes badge.

use ratatui::crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{
        style_grabbed, style_muted, style_selected, C_BADGE_DIRTY, C_BADGE_ERR, C_MUTED,
        C_PLAYING, C_PRIMARY, C_SECONDARY,
    },
    widgets::{
        pane_chrome::{pane_chrome, Badge},
        truncate,
    },
};

/// An in-progress mouse press on a row.
#[derive(Debug, Clone, Copy)]
struct Press {
    /// Where the pressed entry sits now.
    at: usize,
    dragging: bool,
}

pub struct PlaylistPanel {
    selected: usize,
    scroll: usize,
    press: Option<Press>,
    list_state: ListState,
}

impl PlaylistPanel {
    pub fn new() -> Self {
        Self {
            selected: 0,
            scroll: 0,
            press: None,
            list_state: ListState::default(),
        }
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    /// A mouse drag is holding an entry.
    pub fn is_mouse_dragging(&self) -> bool {
        self.press.is_some_and(|p| p.dragging)
    }

    fn clamp(&mut self, len: usize) {
        self.selected = self.selected.min(len.saturating_sub(1));
    }

    fn ensure_visible(&mut self, height: usize) {
        if height == 0 {
            return;
        }
        if self.selected < self.scroll {
            self.scroll = self.selected;
        } else if self.selected >= self.scroll + height {
            self.scroll = self.selected + 1 - height;
        }
    }

    /// Move the cursor; while grabbing, the entry moves with it.
    fn step(&mut self, delta: isize, state: &AppState) -> Vec<Action> {
        let len = state.playlist.rows.len();
        if len == 0 {
            return vec![];
        }
        let from = self.selected.min(len - 1);
        let to = from.saturating_add_signed(delta).min(len - 1);
        self.selected = to;
        if state.playlist.dragging && from != to {
            return vec![Action::GrabMove { from, to }];
        }
        vec![]
    }

    fn row_at(&self, area: Rect, row: u16) -> usize {
        row.saturating_sub(area.y + 1) as usize + self.scroll
    }

    fn handle_grab_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.step(-1, state),
            KeyCode::Down | KeyCode::Char('j') => self.step(1, state),
            KeyCode::Enter | KeyCode::Esc | KeyCode::Char('m') => vec![Action::GrabEnd],
            _ => vec![],
        }
    }
}

impl Default for PlaylistPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for PlaylistPanel {
    fn id(&self) -> ComponentId {
        ComponentId::Playlist
    }

    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        self.clamp(state.playlist.rows.len());
        if state.playlist.dragging {
            return self.handle_grab_key(key, state);
        }

        let len = state.playlist.rows.len();
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.step(-1, state),
            KeyCode::Down | KeyCode::Char('j') => self.step(1, state),
            KeyCode::PageUp => self.step(-10, state),
            KeyCode::PageDown => self.step(10, state),
            KeyCode::Home | KeyCode::Char('g') => {
                self.selected = 0;
                vec![]
            }
            KeyCode::End | KeyCode::Char('G') => {
                self.selected = len.saturating_sub(1);
                vec![]
            }
            KeyCode::Char('J') => {
                if let Some(row) = state.playlist.rows.iter().find(|r| r.is_current) {
                    self.selected = row.index;
                }
                vec![]
            }
            KeyCode::Enter if len > 0 => vec![Action::JumpTo(self.selected)],
            KeyCode::Char('m') if len > 0 => vec![Action::GrabStart],
            KeyCode::Char('a') => vec![Action::AddFromClipboard],
            KeyCode::Char('A') => vec![Action::OpenPrompt],
            KeyCode::Char('c') => vec![Action::Commit],
            KeyCode::Char('u') => vec![Action::Revert],
            _ => vec![],
        }
    }

    fn handle_mouse(&mut self, event: MouseEvent, area: Rect, state: &AppState) -> Vec<Action> {
        let len = state.playlist.rows.len();
        match event.kind {
            MouseEventKind::ScrollUp => self.step(-1, state),
            MouseEventKind::ScrollDown => self.step(1, state),
            MouseEventKind::Down(MouseButton::Left) => {
                if state.playlist.dragging {
                    return vec![];
                }
                let row = self.row_at(area, event.row);
                if event.row <= area.y || row >= len {
                    return vec![];
                }
                self.selected = row;
                self.press = Some(Press {
                    at: row,
                    dragging: false,
                });
                vec![Action::Tap(row)]
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                let Some(mut press) = self.press else {
                    return vec![];
                };
                if len == 0 {
                    return vec![];
                }
                let target = self.row_at(area, event.row).min(len - 1);
                if target == press.at {
                    return vec![];
                }
                let mut actions = Vec::new();
                if !press.dragging {
                    press.dragging = true;
                    actions.push(Action::GrabStart);
                }
                actions.push(Action::GrabMove {
                    from: press.at,
                    to: target,
                });
                press.at = target;
                self.selected = target;
                self.press = Some(press);
                actions
            }
            MouseEventKind::Up(MouseButton::Left) => match self.press.take() {
                Some(p) if p.dragging => vec![Action::GrabEnd],
                _ => vec![],
            },
            _ => vec![],
        }
    }

    fn on_action(&mut self, action: &Action, state: &AppState) {
        // New entries land at the end; follow them.
        if let Action::AddText(_) = action {
            self.selected = state.playlist.rows.len();
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let pl = &state.playlist;
        let badge = if pl.dirty {
            Some(Badge {
                text: "UNSTAGED",
                color: C_BADGE_DIRTY,
            })
        } else if pl.placeholder.is_some() {
            Some(Badge {
                text: "ERR",
                color: C_BADGE_ERR,
            })
        } else {
            None
        };

        let mut block = pane_chrome("playlist", Some('1'), focused, badge);
        if let Some(at) = pl.synced_at {
            block = block.title_bottom(
                Line::from(Span::styled(
                    format!(" synced {} ", at.format("%H:%M:%S")),
                    style_muted(),
                ))
                .right_aligned(),
            );
        }
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if pl.rows.is_empty() {
            let msg = match pl.placeholder {
                Some(text) => text,
                None if !pl.loaded => "loading…",
                None => "playlist is empty",
            };
            frame.render_widget(
                Paragraph::new(Span::styled(format!("  {}", msg), Style::default().fg(C_MUTED))),
                inner,
            );
            return;
        }

        self.clamp(pl.rows.len());
        let height = inner.height as usize;
        self.ensure_visible(height);
        let num_w = pl.rows.len().to_string().len();
        let text_w = (inner.width as usize).saturating_sub(num_w + 5);

        let items: Vec<ListItem> = pl
            .rows
            .iter()
            .skip(self.scroll)
            .take(height)
            .map(|row| {
                let is_selected = row.index == self.selected;
                let (marker, marker_style) = if row.is_current {
                    ("▶", Style::default().fg(C_PLAYING))
                } else {
                    (" ", Style::default())
                };
                let text_style = if row.is_current {
                    Style::default().fg(C_PLAYING).add_modifier(Modifier::BOLD)
                } else if is_selected {
                    Style::default().fg(C_PRIMARY)
                } else {
                    Style::default().fg(C_SECONDARY)
                };
                let line = Line::from(vec![
                    Span::raw(" "),
                    Span::styled(marker, marker_style),
                    Span::styled(
                        format!(" {:>w$} ", row.index + 1, w = num_w),
                        Style::default().fg(C_MUTED),
                    ),
                    Span::styled(truncate(&row.text, text_w), text_style),
                ]);
                let item = ListItem::new(line);
                if is_selected && pl.dragging {
                    item.style(style_grabbed())
                } else if is_selected && focused {
                    item.style(style_selected())
                } else {
                    item
                }
            })
            .collect();

        self.list_state
            .select(Some(self.selected.saturating_sub(self.scroll)));
        frame.render_stateful_widget(List::new(items), inner, &mut self.list_state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pctl_core::playlist::render;
    use ratatui::crossterm::event::KeyModifiers;

    fn state(entries: &[&str], current: Option<&str>) -> AppState {
        let entries: Vec<String> = entries.iter().map(|e| e.to_string()).collect();
        let mut s = AppState::new("http://test");
        s.playlist.rows = render(&entries, current);
        s.playlist.loaded = true;
        s
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn mouse(kind: MouseEventKind, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column: 4,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    const AREA: Rect = Rect {
        x: 0,
        y: 2,
        width: 40,
        height: 10,
    };

    #[test]
    fn test_enter_jumps_to_selected() {
        let s = state(&["a", "b", "c"], None);
        let mut p = PlaylistPanel::new();
        p.handle_key(key(KeyCode::Down), &s);
        p.handle_key(key(KeyCode::Down), &s);
        p.handle_key(key(KeyCode::Down), &s);
        assert_eq!(p.handle_key(key(KeyCode::Enter), &s), vec![Action::JumpTo(2)]);
    }

    #[test]
    fn test_grab_moves_entry_with_cursor() {
        let mut s = state(&["a", "b", "c"], None);
        let mut p = PlaylistPanel::new();
        assert_eq!(p.handle_key(key(KeyCode::Char('m')), &s), vec![Action::GrabStart]);
        s.playlist.dragging = true;
        assert_eq!(
            p.handle_key(key(KeyCode::Char('j')), &s),
            vec![Action::GrabMove { from: 0, to: 1 }]
        );
        assert_eq!(p.selected(), 1);
        // edits are not allowed mid-grab
        assert!(p.handle_key(key(KeyCode::Char('c')), &s).is_empty());
        assert_eq!(p.handle_key(key(KeyCode::Esc), &s), vec![Action::GrabEnd]);
    }

    #[test]
    fn test_grab_at_edge_emits_nothing() {
        let mut s = state(&["a", "b"], None);
        s.playlist.dragging = true;
        let mut p = PlaylistPanel::new();
        assert!(p.handle_key(key(KeyCode::Up), &s).is_empty());
    }

    #[test]
    fn test_click_taps_row() {
        let s = state(&["a", "b", "c"], None);
        let mut p = PlaylistPanel::new();
        // border row is not an entry
        assert!(p
            .handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 2), AREA, &s)
            .is_empty());
        assert_eq!(
            p.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 4), AREA, &s),
            vec![Action::Tap(1)]
        );
        assert!(p
            .handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 4), AREA, &s)
            .is_empty());
    }

    #[test]
    fn test_mouse_drag_reorders() {
        let s = state(&["a", "b", "c"], None);
        let mut p = PlaylistPanel::new();
        p.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 3), AREA, &s);
        assert_eq!(
            p.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), 4), AREA, &s),
            vec![Action::GrabStart, Action::GrabMove { from: 0, to: 1 }]
        );
        assert!(p.is_mouse_dragging());
        // past the last row clamps to it
        assert_eq!(
            p.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), 11), AREA, &s),
            vec![Action::GrabMove { from: 1, to: 2 }]
        );
        assert_eq!(
            p.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 11), AREA, &s),
            vec![Action::GrabEnd]
        );
        assert!(!p.is_mouse_dragging());
        assert_eq!(p.selected(), 2);
    }

    #[test]
    fn test_jump_to_current_row() {
        let s = state(&["a", "b", "c"], Some("c"));
        let mut p = PlaylistPanel::new();
        p.handle_key(key(KeyCode::Char('J')), &s);
        assert_eq!(p.selected(), 2);
    }
}
