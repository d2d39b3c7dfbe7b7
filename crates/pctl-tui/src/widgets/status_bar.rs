//! Status bar: bottom line with input mode, media-keys lamp and keybindings.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::theme::{
    C_MODE_GRAB, C_MODE_NORMAL, C_MODE_PROMPT, C_MODE_SCRUB, C_MUTED, C_PAUSED, C_PLAYING,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    /// A playlist entry is grabbed and moves with the cursor.
    Grab,
    /// Seek bar is being scrubbed; position updates are held back.
    Scrub,
    Prompt,
}

impl InputMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Grab => "GRAB",
            Self::Scrub => "SEEK",
            Self::Prompt => "INPUT",
        }
    }

    pub fn color(self) -> Color {
        match self {
            Self::Normal => C_MODE_NORMAL,
            Self::Grab => C_MODE_GRAB,
            Self::Scrub => C_MODE_SCRUB,
            Self::Prompt => C_MODE_PROMPT,
        }
    }
}

/// State of the OS media-keys registration, shown as a lamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaLamp {
    Active,
    /// Start failed; retried on the next key press or click.
    Waiting,
    Off,
}

impl MediaLamp {
    fn color(self) -> Color {
        match self {
            Self::Active => C_PLAYING,
            Self::Waiting => C_PAUSED,
            Self::Off => C_MUTED,
        }
    }
}

/// Draw the keybindings footer bar (one row).
pub fn draw_keys_bar(frame: &mut Frame, area: Rect, mode: InputMode, lamp: MediaLamp) {
    let mut spans = vec![
        Span::styled(
            format!(" {} ", mode.label()),
            Style::default().fg(mode.color()).add_modifier(Modifier::BOLD),
        ),
        Span::styled("●", Style::default().fg(lamp.color()).add_modifier(Modifier::BOLD)),
        Span::raw(" "),
    ];

    let keys = match mode {
        InputMode::Normal => {
            " space play/pause  n/p next/prev  ←→ vol  ,/. seek  s scrub  enter jump  m grab  a add  A type  c commit  u revert  [/] player  tab panes  ? help  q quit"
        }
        InputMode::Grab => " ↑↓/jk move entry  enter/m/esc drop",
        InputMode::Scrub => " ←→ scrub  shift faster  enter seek  esc cancel",
        InputMode::Prompt => " type or paste a link  enter add  esc cancel",
    };
    spans.push(Span::styled(keys, Style::default().fg(C_MUTED)));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
