//! Smooth Unicode seek bar.

use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::theme::{C_MODE_SCRUB, C_MUTED, C_PLAYING, C_SECONDARY};

/// Render the seek bar in `area` and return the rect the bar itself
/// occupies (labels excluded), for mouse hit-testing.
pub fn draw_progress(
    frame: &mut Frame,
    area: Rect,
    value: f64,
    max: f64,
    scrubbing: bool,
) -> Rect {
    if area.width < 4 || area.height == 0 {
        return Rect::default();
    }

    let left_label = fmt_time(value);
    let right_label = fmt_time(max);
    let left_w = left_label.len() as u16 + 1;
    let label_w = left_w + right_label.len() as u16 + 1;
    let bar_w = area.width.saturating_sub(label_w).max(4) as usize;

    let progress = if max > 0.0 { value / max } else { 0.0 };

    // 8 eighths per cell
    let eighths = (progress.clamp(0.0, 1.0) * bar_w as f64 * 8.0) as usize;
    let full_blocks = eighths / 8;
    let partial = eighths % 8;

    const BLOCKS: [char; 9] = [' ', '▏', '▎', '▍', '▌', '▋', '▊', '▉', '█'];

    let mut bar = String::with_capacity(bar_w + 4);
    for _ in 0..full_blocks {
        bar.push('█');
    }
    if full_blocks < bar_w {
        bar.push(BLOCKS[partial]);
        for _ in (full_blocks + 1)..bar_w {
            bar.push(' ');
        }
    }

    let bar_color = if scrubbing { C_MODE_SCRUB } else { C_PLAYING };
    let spans = vec![
        Span::styled(format!("{} ", left_label), Style::default().fg(C_SECONDARY)),
        Span::styled(bar, Style::default().fg(bar_color)),
        Span::styled(format!(" {}", right_label), Style::default().fg(C_MUTED)),
    ];
    frame.render_widget(Paragraph::new(Line::from(spans)), area);

    Rect {
        x: area.x + left_w,
        y: area.y,
        width: (bar_w as u16).min(area.width.saturating_sub(left_w)),
        height: 1,
    }
}

/// Map a column inside the bar rect to a position in seconds.
pub fn position_at(bar: Rect, column: u16, max: f64) -> f64 {
    if bar.width == 0 || max <= 0.0 {
        return 0.0;
    }
    let offset = column.saturating_sub(bar.x).min(bar.width) as f64;
    max * offset / bar.width as f64
}

pub fn fmt_time(secs: f64) -> String {
    if secs < 0.0 || !secs.is_finite() {
        return "0:00".to_string();
    }
    let s = secs as u64;
    let h = s / 3600;
    let m = (s % 3600) / 60;
    let s = s % 60;
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{}:{:02}", m, s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fmt_time() {
        assert_eq!(fmt_time(0.0), "0:00");
        assert_eq!(fmt_time(65.9), "1:05");
        assert_eq!(fmt_time(3725.0), "1:02:05");
        assert_eq!(fmt_time(-3.0), "0:00");
        assert_eq!(fmt_time(f64::NAN), "0:00");
    }

    #[test]
    fn test_position_at_maps_columns() {
        let bar = Rect {
            x: 10,
            y: 0,
            width: 100,
            height: 1,
        };
        assert_eq!(position_at(bar, 10, 200.0), 0.0);
        assert_eq!(position_at(bar, 60, 200.0), 100.0);
        assert_eq!(position_at(bar, 500, 200.0), 200.0);
        assert_eq!(position_at(bar, 2, 200.0), 0.0);
        assert_eq!(position_at(bar, 60, 0.0), 0.0);
    }
}
