use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::effects::fade;
use crate::motion::{ease_out, spring, Pose, Shown};
use crate::sequencer::{CardState, Step};
use crate::tui::{
    centered, neon_line, shift, squeeze, wrap_text, HitMap, Target, TextField, ACCENT,
    BUTTON_BG, BUTTON_FOCUS_BG, FOOTER, HEART, QUOTE_COLOR_MOON, QUOTE_COLOR_SUGAR, SOFT_TEXT,
};

pub const SUGAR_QUESTION: &str = "Are you a sugar?";
pub const SUGAR_REPLY: &str = "\"Then why I always feel very filled with you?\"";
pub const MOON_QUESTION: &str = "Are you a moon?";
pub const MOON_REPLY: &str = "\"Then why you are so pretty and bright?\"";
pub const NAME_PREAMBLE: &str = "Wait, I forgot to ask...";
pub const NAME_QUESTION: &str = "What's your name?";
pub const NAME_PLACEHOLDER: &str = "Type here...";
pub const DELIVERY: &str = "A special delivery for";
pub const TAP_TO_OPEN: &str = "TAP TO OPEN";
pub const WISH: &str = "May your day be as bright as the moon and as sweet as sugar. \
                        You deserve all the magic the universe has to offer.";
pub const RESTART: &str = "RESTART MAGIC";
pub const CONTINUE: &str = "CONTINUE \u{2192}";
const SEND_GLYPH: &str = "\u{27a4}";

const YES_LABEL: &str = "  Yes  ";
const NO_LABEL: &str = "  No  ";
const BUTTON_GAP: u16 = 6;
const INPUT_WIDTH: u16 = 30;
const WISH_WIDTH: usize = 56;

const GIFT_ART: &[&str] = &[
    r"   \\  //   ",
    r" ___\\//___ ",
    r"|    ||    |",
    r"|____||____|",
    r" |   ||   | ",
    r" |   ||   | ",
    r" |___||___| ",
];

const HEART_ART: &[&str] = &[
    " \u{2584}\u{2588}\u{2588}\u{2588}\u{2584} \u{2584}\u{2588}\u{2588}\u{2588}\u{2584} ",
    "\u{2588}\u{2588}\u{2588}\u{2588}\u{2588}\u{2588}\u{2588}\u{2588}\u{2588}\u{2588}\u{2588}\u{2588}\u{2588}",
    " \u{2580}\u{2588}\u{2588}\u{2588}\u{2588}\u{2588}\u{2588}\u{2588}\u{2588}\u{2588}\u{2580} ",
    "   \u{2580}\u{2588}\u{2588}\u{2588}\u{2588}\u{2588}\u{2580}   ",
    "     \u{2580}\u{2588}\u{2580}     ",
];

/// Which answer button has keyboard focus on the yes/no screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Yes,
    No,
}

impl Focus {
    pub fn toggle(self) -> Self {
        match self {
            Focus::Yes => Focus::No,
            Focus::No => Focus::Yes,
        }
    }
}

/// Everything a renderer may look at.
pub struct View<'a> {
    pub state: &'a CardState,
    pub shown: Shown,
    pub field: &'a TextField,
    pub focus: Focus,
    /// Gradient phase for headline colors.
    pub phase: f64,
    /// Seconds since the card started, for looping decorations.
    pub secs: f64,
}

impl View<'_> {
    fn pose(&self) -> Pose {
        self.shown.pose
    }

    fn hit(&self, hits: &mut HitMap, area: Rect, target: Target) {
        if !self.shown.leaving {
            hits.add(area, target);
        }
    }
}

/// Draw whichever step is on screen. Renderers never touch the card state;
/// besides the frame they only fill `hits`, so a click resolves against the
/// last drawn layout.
pub fn draw(frame: &mut Frame, area: Rect, view: &View, hits: &mut HitMap) {
    match view.shown.step {
        Step::Sugar => draw_question(frame, area, view, hits, SUGAR_QUESTION),
        Step::SugarResponse => draw_reply(frame, area, view, hits, SUGAR_REPLY, QUOTE_COLOR_SUGAR),
        Step::Moon => draw_question(frame, area, view, hits, MOON_QUESTION),
        Step::MoonResponse => draw_reply(frame, area, view, hits, MOON_REPLY, QUOTE_COLOR_MOON),
        Step::Name => draw_name(frame, area, view, hits),
        Step::Gift => draw_gift(frame, area, view, hits),
        Step::Opened => draw_opened(frame, area, view, hits),
    }
    draw_hints(frame, area, view.shown.step);
}

/// Stack rows of the given heights, centred vertically in `area`.
fn stack(area: Rect, heights: &[u16]) -> Vec<Rect> {
    let mut constraints = vec![Constraint::Fill(1)];
    constraints.extend(heights.iter().map(|&h| Constraint::Length(h)));
    constraints.push(Constraint::Fill(1));
    let rows = Layout::vertical(constraints).split(area);
    rows[1..rows.len() - 1].to_vec()
}

fn place(row: Rect, pose: Pose, area: Rect) -> Rect {
    let (dx, dy) = pose.offset();
    shift(row, dx, dy, area)
}

fn centered_text(frame: &mut Frame, area: Rect, line: Line) {
    frame.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
}

fn plain(text: &str, color: Color, pose: Pose) -> Line<'static> {
    Line::from(Span::styled(
        squeeze(text, pose.scale),
        Style::new().fg(fade(color, pose.opacity)),
    ))
}

/// Art lines shrunk towards their centre: rows outside the visible share
/// are blanked, the rest are squeezed sideways.
fn scale_art(art: &[&str], scale: f64) -> Vec<String> {
    let rows = art.len();
    let keep = ((rows as f64) * scale.clamp(0.0, 1.0)).round() as usize;
    let cut = (rows - keep) / 2;
    art.iter()
        .enumerate()
        .map(|(i, line)| {
            if i >= cut && i < cut + keep {
                squeeze(line, scale)
            } else {
                " ".repeat(line.chars().count())
            }
        })
        .collect()
}

fn art_width(art: &[&str]) -> u16 {
    art.iter().map(|l| l.chars().count()).max().unwrap_or(0) as u16
}

fn draw_question(frame: &mut Frame, area: Rect, view: &View, hits: &mut HitMap, question: &str) {
    let pose = view.pose();
    let rows = stack(area, &[1, 2, 1]);
    let (title_row, button_row) = (place(rows[0], pose, area), place(rows[2], pose, area));

    centered_text(
        frame,
        title_row,
        neon_line(&squeeze(question, pose.scale), view.phase, pose.opacity),
    );

    let yes_w = YES_LABEL.chars().count() as u16;
    let no_w = NO_LABEL.chars().count() as u16;
    let buttons = centered(button_row, yes_w + BUTTON_GAP + no_w);
    let yes_area = Rect::new(buttons.x, buttons.y, yes_w, 1).intersection(button_row);
    let no_area = Rect::new(buttons.x + yes_w + BUTTON_GAP, buttons.y, no_w, 1).intersection(button_row);

    for (label, rect, focus) in [(YES_LABEL, yes_area, Focus::Yes), (NO_LABEL, no_area, Focus::No)] {
        let bg = if view.focus == focus { BUTTON_FOCUS_BG } else { BUTTON_BG };
        let style = Style::new()
            .fg(fade(Color::Rgb(255, 255, 255), pose.opacity))
            .bg(fade(bg, pose.opacity))
            .add_modifier(Modifier::BOLD);
        frame.render_widget(Paragraph::new(Span::styled(label, style)), rect);
    }

    view.hit(hits, yes_area, Target::Yes);
    view.hit(hits, no_area, Target::No);
}

fn draw_reply(
    frame: &mut Frame,
    area: Rect,
    view: &View,
    hits: &mut HitMap,
    reply: &str,
    color: Color,
) {
    let pose = view.pose();
    let width = (area.width.saturating_sub(6) as usize).min(60);
    let (wrapped, height) = wrap_text(reply, width);
    let rows = stack(area, &[height, 2, 1]);
    let quote_style = Style::new()
        .fg(fade(color, pose.opacity))
        .add_modifier(Modifier::ITALIC);
    let lines: Vec<Line> = wrapped
        .lines()
        .map(|l| Line::from(Span::styled(squeeze(l, pose.scale), quote_style)))
        .collect();
    frame.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center),
        place(rows[0], pose, area),
    );

    let continue_row = place(rows[2], pose, area);
    let button = centered(continue_row, CONTINUE.chars().count() as u16);
    centered_text(frame, continue_row, plain(CONTINUE, SOFT_TEXT, Pose { opacity: pose.opacity * 0.6, ..pose }));
    view.hit(hits, button, Target::Continue);
}

fn draw_name(frame: &mut Frame, area: Rect, view: &View, hits: &mut HitMap) {
    let pose = view.pose();
    let rows = stack(area, &[1, 1, 1, 2, 1, 1]);
    centered_text(
        frame,
        place(rows[0], pose, area),
        plain(NAME_PREAMBLE, SOFT_TEXT, Pose { opacity: pose.opacity * 0.8, ..pose }),
    );
    centered_text(
        frame,
        place(rows[2], pose, area),
        neon_line(NAME_QUESTION, view.phase, pose.opacity),
    );

    let input = centered(place(rows[4], pose, area), INPUT_WIDTH);
    let underline = centered(place(rows[5], pose, area), INPUT_WIDTH);
    let has_draft = !view.state.draft().is_empty();

    let text_width = input.width.saturating_sub(3) as usize;
    let line = if has_draft {
        let display = view.field.display();
        let overflow = display.chars().count().saturating_sub(text_width);
        let visible: String = display.chars().skip(overflow).collect();
        Line::from(Span::styled(
            visible,
            Style::new().fg(fade(Color::Rgb(255, 255, 255), pose.opacity)),
        ))
    } else {
        Line::from(vec![
            Span::styled("\u{2588}", Style::new().fg(fade(ACCENT, pose.opacity))),
            Span::styled(NAME_PLACEHOLDER, Style::new().fg(fade(FOOTER, pose.opacity))),
        ])
    };
    frame.render_widget(Paragraph::new(line).alignment(Alignment::Center), input);

    if has_draft {
        let send = Rect::new(input.right().saturating_sub(2), input.y, 2, 1).intersection(input);
        frame.render_widget(
            Paragraph::new(Span::styled(
                SEND_GLYPH,
                Style::new().fg(fade(ACCENT, pose.opacity)).add_modifier(Modifier::BOLD),
            )),
            send,
        );
        view.hit(hits, send, Target::Send);
    }

    frame.render_widget(
        Paragraph::new(Span::styled(
            "\u{2500}".repeat(underline.width as usize),
            Style::new().fg(fade(ACCENT, pose.opacity * 0.5)),
        )),
        underline,
    );
}

/// Hop up and down once a second.
fn bounce(secs: f64) -> i16 {
    if secs.rem_euclid(1.0) < 0.5 {
        -1
    } else {
        0
    }
}

fn draw_gift(frame: &mut Frame, area: Rect, view: &View, hits: &mut HitMap) {
    let pose = view.pose();
    let gift_h = GIFT_ART.len() as u16;
    let rows = stack(area, &[1, 1, 1, gift_h, 2, 1]);

    centered_text(
        frame,
        place(rows[0], pose, area),
        plain(DELIVERY, SOFT_TEXT, Pose { opacity: pose.opacity * 0.7, ..pose }),
    );
    centered_text(
        frame,
        place(rows[1], pose, area),
        neon_line(&squeeze(view.state.name(), pose.scale), view.phase, pose.opacity),
    );

    let gift_area = centered(place(rows[3], pose, area), art_width(GIFT_ART));
    let gift_style = Style::new()
        .fg(fade(ACCENT, pose.opacity))
        .add_modifier(Modifier::BOLD);
    let lines: Vec<Line> = scale_art(GIFT_ART, pose.scale)
        .into_iter()
        .map(|l| Line::from(Span::styled(l, gift_style)))
        .collect();
    frame.render_widget(Paragraph::new(lines), gift_area);

    let tap_row = place(rows[5], Pose { dy: pose.dy + bounce(view.secs) as f64, ..pose }, area);
    centered_text(
        frame,
        tap_row,
        plain(TAP_TO_OPEN, Color::Rgb(216, 180, 254), pose),
    );

    view.hit(hits, gift_area, Target::Gift);
    view.hit(hits, centered(tap_row, TAP_TO_OPEN.chars().count() as u16), Target::Gift);
}

fn draw_opened(frame: &mut Frame, area: Rect, view: &View, hits: &mut HitMap) {
    let pose = view.pose();
    let heart_h = HEART_ART.len() as u16;
    let wish_width = (area.width.saturating_sub(6) as usize).min(WISH_WIDTH);
    let (wish, wish_h) = wrap_text(WISH, wish_width);
    let rows = stack(area, &[heart_h, 1, 1, 1, wish_h, 2, 1]);

    let heart_scale = spring(view.shown.element_progress(0));
    let heart_area = centered(rows[0], art_width(HEART_ART));
    let heart_style = Style::new().fg(fade(HEART, pose.opacity));
    let heart: Vec<Line> = scale_art(HEART_ART, heart_scale)
        .into_iter()
        .map(|l| Line::from(Span::styled(l, heart_style)))
        .collect();
    frame.render_widget(Paragraph::new(heart), heart_area);

    let title_t = ease_out(view.shown.element_progress(1));
    let title = format!("HAPPY BIRTHDAY, {}!", view.state.shouted_name());
    let title_row = place(rows[2], Pose { dy: 1.0 - title_t, ..pose }, area);
    centered_text(
        frame,
        title_row,
        neon_line(&title, view.phase, pose.opacity * title_t),
    );

    let wish_t = ease_out(view.shown.element_progress(2));
    let wish_style = Style::new().fg(fade(Color::Rgb(233, 213, 255), pose.opacity * wish_t * 0.8));
    let wish_lines: Vec<Line> = wish
        .lines()
        .map(|l| Line::from(Span::styled(l.to_string(), wish_style)))
        .collect();
    frame.render_widget(
        Paragraph::new(wish_lines).alignment(Alignment::Center),
        place(rows[4], Pose { dy: 1.0 - wish_t, ..pose }, area),
    );

    let restart_t = view.shown.element_progress(3);
    let restart_row = rows[6];
    centered_text(
        frame,
        restart_row,
        plain(RESTART, SOFT_TEXT, Pose { opacity: pose.opacity * restart_t, ..Pose::REST }),
    );
    // Clickable before it has faded in; the animation never gates input.
    view.hit(hits, centered(restart_row, RESTART.chars().count() as u16 + 2), Target::Restart);
}

fn hint_for(step: Step) -> &'static str {
    match step {
        Step::Sugar | Step::Moon => "y/n or \u{2190}/\u{2192} + Enter to answer   Esc to leave",
        Step::SugarResponse | Step::MoonResponse => "Enter to continue   Esc to leave",
        Step::Name => "type your name, Enter to send   Esc to leave",
        Step::Gift => "Enter or click the gift to open it   Esc to leave",
        Step::Opened => "r to restart   Esc to leave",
    }
}

fn draw_hints(frame: &mut Frame, area: Rect, step: Step) {
    if area.height < 3 {
        return;
    }
    let row = Rect::new(area.x, area.bottom() - 1, area.width, 1);
    frame.render_widget(
        Paragraph::new(Span::styled(hint_for(step), Style::new().fg(FOOTER)))
            .alignment(Alignment::Center),
        row,
    );
}
