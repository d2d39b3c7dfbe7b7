//! PlayersPanel: players reported by the backend; Enter selects one.

use ratatui::crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, Paragraph},
    Frame,
};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{style_selected, C_MUTED, C_PLAYING, C_SECONDARY},
    widgets::{pane_chrome::pane_chrome, truncate},
};

#[derive(Default)]
pub struct PlayersPanel {
    selected: usize,
}

impl PlayersPanel {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Component for PlayersPanel {
    fn id(&self) -> ComponentId {
        ComponentId::Players
    }

    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        let len = state.players.len();
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.selected = (self.selected + 1).min(len.saturating_sub(1));
            }
            KeyCode::Enter => {
                if let Some(name) = state.players.get(self.selected) {
                    return vec![Action::SelectPlayer(name.clone())];
                }
            }
            _ => {}
        }
        vec![]
    }

    fn handle_mouse(&mut self, event: MouseEvent, area: Rect, state: &AppState) -> Vec<Action> {
        if let MouseEventKind::Down(MouseButton::Left) = event.kind {
            if event.row <= area.y {
                return vec![];
            }
            let row = (event.row - area.y - 1) as usize;
            if let Some(name) = state.players.get(row) {
                self.selected = row;
                return vec![Action::SelectPlayer(name.clone())];
            }
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let block = pane_chrome("players", Some('2'), focused, None);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if state.players.is_empty() {
            frame.render_widget(
                Paragraph::new(Span::styled("  no players", Style::default().fg(C_MUTED))),
                inner,
            );
            return;
        }

        self.selected = self.selected.min(state.players.len() - 1);
        let width = (inner.width as usize).saturating_sub(4);
        let items: Vec<ListItem> = state
            .players
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let active = *name == state.player;
                let (marker, style) = if active {
                    (
                        "●",
                        Style::default().fg(C_PLAYING).add_modifier(Modifier::BOLD),
                    )
                } else {
                    (" ", Style::default().fg(C_SECONDARY))
                };
                let item = ListItem::new(Line::from(vec![
                    Span::raw(" "),
                    Span::styled(marker, Style::default().fg(C_PLAYING)),
                    Span::raw(" "),
                    Span::styled(truncate(name, width), style),
                ]));
                if focused && i == self.selected {
                    item.style(style_selected())
                } else {
                    item
                }
            })
            .collect();
        frame.render_widget(List::new(items), inner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyModifiers;

    #[test]
    fn test_enter_selects_highlighted_player() {
        let mut s = AppState::new("http://test");
        s.players = vec!["mpv".into(), "firefox.instance42".into()];
        let mut p = PlayersPanel::new();
        p.handle_key(KeyEvent::new(KeyCode::Down, KeyModifiers::NONE), &s);
        p.handle_key(KeyEvent::new(KeyCode::Down, KeyModifiers::NONE), &s);
        assert_eq!(
            p.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE), &s),
            vec![Action::SelectPlayer("firefox.instance42".into())]
        );
    }

    #[test]
    fn test_enter_without_players_does_nothing() {
        let s = AppState::new("http://test");
        let mut p = PlayersPanel::new();
        assert!(p
            .handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE), &s)
            .is_empty());
    }
}
