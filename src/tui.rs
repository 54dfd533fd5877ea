use std::io::stdout;

use crossterm::event::{DisableMouseCapture, EnableMouseCapture, KeyCode};
use crossterm::execute;
use ratatui::layout::{Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::DefaultTerminal;

use crate::effects::{fade, gradient_color};
use crate::error::{CardError, Result};

pub const TITLE_STYLE: Style = Style::new().add_modifier(Modifier::BOLD);

pub const QUOTE_COLOR_SUGAR: Color = Color::Rgb(233, 213, 255);
pub const QUOTE_COLOR_MOON: Color = Color::Rgb(191, 219, 254);
pub const SOFT_TEXT: Color = Color::Rgb(203, 213, 225);
pub const ACCENT: Color = Color::Rgb(192, 132, 252);
pub const HEART: Color = Color::Rgb(236, 72, 153);
pub const FOOTER: Color = Color::Rgb(100, 100, 130);

pub const BUTTON_BG: Color = Color::Rgb(40, 36, 70);
pub const BUTTON_FOCUS_BG: Color = Color::Rgb(88, 60, 140);

/// Wrap text to a given width. Returns (wrapped_string, line_count).
pub fn wrap_text(text: &str, width: usize) -> (String, u16) {
    if width == 0 {
        return (text.to_string(), 1);
    }
    let wrapped = textwrap::fill(text, width);
    let lines = wrapped.lines().count().max(1) as u16;
    (wrapped, lines)
}

/// Headline text with the aurora gradient running across it.
pub fn neon_line(text: &str, phase: f64, opacity: f64) -> Line<'static> {
    let len = text.chars().count().max(1) as f64;
    let spans: Vec<Span> = text
        .chars()
        .enumerate()
        .map(|(i, ch)| {
            let color = fade(gradient_color(phase + i as f64 / len * 0.5), opacity);
            Span::styled(ch.to_string(), TITLE_STYLE.fg(color))
        })
        .collect();
    Line::from(spans)
}

/// Keep the centre `scale` share of a line's characters, padding the rest
/// with spaces so the visible part stays centred.
pub fn squeeze(text: &str, scale: f64) -> String {
    if scale >= 1.0 {
        return text.to_string();
    }
    let chars: Vec<char> = text.chars().collect();
    let keep = ((chars.len() as f64) * scale.max(0.0)).round() as usize;
    let cut = (chars.len() - keep) / 2;
    chars
        .iter()
        .enumerate()
        .map(|(i, &c)| if i >= cut && i < cut + keep { c } else { ' ' })
        .collect()
}

/// Move a rect by a cell offset, staying inside `bounds`.
pub fn shift(rect: Rect, dx: i16, dy: i16, bounds: Rect) -> Rect {
    let max_x = bounds.right().saturating_sub(rect.width);
    let max_y = bounds.bottom().saturating_sub(rect.height);
    let x = (rect.x as i32 + dx as i32).clamp(bounds.x as i32, max_x.max(bounds.x) as i32);
    let y = (rect.y as i32 + dy as i32).clamp(bounds.y as i32, max_y.max(bounds.y) as i32);
    Rect::new(x as u16, y as u16, rect.width, rect.height).intersection(bounds)
}

/// A rect of `width` cells centred horizontally in `row`.
pub fn centered(row: Rect, width: u16) -> Rect {
    let width = width.min(row.width);
    Rect::new(row.x + (row.width - width) / 2, row.y, width, row.height)
}

// ---------------------------------------------------------------------------
// Clickable regions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Yes,
    No,
    Continue,
    Send,
    Gift,
    Restart,
}

/// Clickable areas recorded during the last draw.
#[derive(Debug, Default)]
pub struct HitMap {
    regions: Vec<(Rect, Target)>,
}

impl HitMap {
    pub fn clear(&mut self) {
        self.regions.clear();
    }

    pub fn add(&mut self, area: Rect, target: Target) {
        if !area.is_empty() {
            self.regions.push((area, target));
        }
    }

    pub fn target_at(&self, column: u16, row: u16) -> Option<Target> {
        let pos = Position::new(column, row);
        self.regions
            .iter()
            .rev()
            .find(|(area, _)| area.contains(pos))
            .map(|(_, target)| *target)
    }
}

// ---------------------------------------------------------------------------
// Single-line text input
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct TextField {
    value: String,
    cursor: usize,
}

impl TextField {
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Replace the contents, cursor at the end.
    pub fn reset(&mut self, value: &str) {
        self.value = value.to_string();
        self.cursor = value.chars().count();
    }

    /// Convert the char-index cursor to a byte offset.
    fn cursor_byte_pos(&self) -> usize {
        self.value
            .char_indices()
            .nth(self.cursor)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }

    /// Apply an editing key. Returns true when the text changed.
    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        let char_len = self.value.chars().count();
        match code {
            KeyCode::Char(c) => {
                let byte_pos = self.cursor_byte_pos();
                self.value.insert(byte_pos, c);
                self.cursor += 1;
                return true;
            }
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    let byte_pos = self.cursor_byte_pos();
                    self.value.remove(byte_pos);
                    return true;
                }
            }
            KeyCode::Delete => {
                if self.cursor < char_len {
                    let byte_pos = self.cursor_byte_pos();
                    self.value.remove(byte_pos);
                    return true;
                }
            }
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(char_len),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = char_len,
            _ => {}
        }
        false
    }

    /// The value with a block cursor inserted.
    pub fn display(&self) -> String {
        let mut display = self.value.clone();
        display.insert(self.cursor_byte_pos(), '\u{2588}');
        display
    }
}

// ---------------------------------------------------------------------------
// Terminal session
// ---------------------------------------------------------------------------

/// Run `body` with the terminal in raw/alternate-screen mode and mouse
/// capture on. The terminal is restored on return and on panic.
pub fn with_terminal<F>(body: F) -> Result<()>
where
    F: FnOnce(&mut DefaultTerminal) -> Result<()>,
{
    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = execute!(stdout(), DisableMouseCapture);
        ratatui::restore();
        hook(info);
    }));

    let mut terminal = ratatui::init();
    let result = execute!(stdout(), EnableMouseCapture)
        .map_err(CardError::from)
        .and_then(|_| body(&mut terminal));

    let _ = execute!(stdout(), DisableMouseCapture);
    drop(terminal);
    ratatui::restore();
    result
}
