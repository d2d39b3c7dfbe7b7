//! PromptInput: one-line text prompt built on tui-input.
//!
//! Used when the clipboard cannot be read and the link to add has to be
//! typed or pasted by hand.

use ratatui::crossterm::event::{Event, KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use tui_input::{backend::crossterm::EventHandler, Input};

use crate::theme::{C_MUTED, C_PROMPT_BG, C_PROMPT_FG};

#[derive(Debug, PartialEq)]
pub enum PromptAction {
    Submitted(String),
    Cancelled,
    Editing,
}

pub struct PromptInput {
    input: Input,
    active: bool,
    label: String,
}

impl PromptInput {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            input: Input::default(),
            active: false,
            label: label.into(),
        }
    }

    /// Open the prompt with an empty value.
    pub fn open(&mut self) {
        self.input = Input::default();
        self.active = true;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn value(&self) -> &str {
        self.input.value()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> PromptAction {
        match key.code {
            KeyCode::Esc => {
                self.active = false;
                PromptAction::Cancelled
            }
            KeyCode::Enter => {
                self.active = false;
                PromptAction::Submitted(self.input.value().to_string())
            }
            _ => {
                self.input.handle_event(&Event::Key(key));
                PromptAction::Editing
            }
        }
    }

    /// Bracketed paste arrives as one event rather than a key per char.
    pub fn paste(&mut self, text: &str) {
        let mut value = self.input.value().to_string();
        value.push_str(text);
        self.input = Input::new(value);
    }

    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        let prefix = format!("{}: ", self.label);
        let prefix_w = prefix.chars().count() as u16;
        let scroll = self
            .input
            .visual_scroll(area.width.saturating_sub(prefix_w + 1) as usize);
        let value = self.input.value();

        let spans = vec![
            Span::styled(prefix, Style::default().fg(C_MUTED)),
            Span::styled(
                value.chars().skip(scroll).collect::<String>(),
                Style::default().fg(C_PROMPT_FG),
            ),
        ];
        let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(C_PROMPT_BG));
        frame.render_widget(paragraph, area);

        if self.active {
            let cursor_x = area.x + prefix_w + (self.input.visual_cursor() - scroll) as u16;
            frame.set_cursor_position((cursor_x.min(area.x + area.width - 1), area.y));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_typing_then_enter_submits() {
        let mut p = PromptInput::new("link");
        p.open();
        for c in "http://x".chars() {
            assert_eq!(p.handle_key(key(KeyCode::Char(c))), PromptAction::Editing);
        }
        assert_eq!(
            p.handle_key(key(KeyCode::Enter)),
            PromptAction::Submitted("http://x".into())
        );
        assert!(!p.is_active());
    }

    #[test]
    fn test_escape_cancels_and_reopen_clears() {
        let mut p = PromptInput::new("link");
        p.open();
        p.paste("abc");
        assert_eq!(p.value(), "abc");
        assert_eq!(p.handle_key(key(KeyCode::Esc)), PromptAction::Cancelled);
        p.open();
        assert_eq!(p.value(), "");
    }
}
