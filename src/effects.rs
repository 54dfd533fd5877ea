use std::f64::consts::TAU;

use rand::Rng;
use ratatui::layout::Rect;
use ratatui::style::Color;
use ratatui::Frame;
use tracing::debug;

use crate::error::{CardError, Result};
use crate::sequencer::Celebration;

/// Night-sky backdrop everything fades into.
pub const BACKGROUND: Color = Color::Rgb(14, 11, 32);
const BACKGROUND_RGB: (f64, f64, f64) = (14.0, 11.0, 32.0);

/// Aurora gradient: violet -> pink -> blue -> mint -> violet
pub const GRADIENT: &[(f64, f64, f64)] = &[
    (196.0, 181.0, 253.0), // #c4b5fd violet
    (249.0, 168.0, 212.0), // #f9a8d4 pink
    (147.0, 197.0, 253.0), // #93c5fd blue
    (110.0, 231.0, 183.0), // #6ee7b7 mint
    (196.0, 181.0, 253.0), // #c4b5fd wrap back to violet
];

pub const PARTICLE_CHARS: &[char] = &['\u{00b7}', '\u{2218}', '\u{2022}', '\u{25e6}'];

/// Interpolate along the gradient for a position in 0.0..1.0
pub fn gradient_color(t: f64) -> Color {
    let t = t.rem_euclid(1.0);
    let segments = (GRADIENT.len() - 1) as f64;
    let scaled = t * segments;
    let idx = (scaled as usize).min(GRADIENT.len() - 2);
    let frac = scaled - idx as f64;

    let (r1, g1, b1) = GRADIENT[idx];
    let (r2, g2, b2) = GRADIENT[idx + 1];

    let r = (r1 + (r2 - r1) * frac) as u8;
    let g = (g1 + (g2 - g1) * frac) as u8;
    let b = (b1 + (b2 - b1) * frac) as u8;

    Color::Rgb(r, g, b)
}

/// Blend an RGB color towards the background. Named colors can't be blended,
/// so they just vanish below half opacity.
pub fn fade(color: Color, opacity: f64) -> Color {
    let a = opacity.clamp(0.0, 1.0);
    match color {
        Color::Rgb(r, g, b) => {
            let (br, bg, bb) = BACKGROUND_RGB;
            let mix = |c: u8, base: f64| (base + (c as f64 - base) * a).round() as u8;
            Color::Rgb(mix(r, br), mix(g, bg), mix(b, bb))
        }
        other if a >= 0.5 => other,
        _ => BACKGROUND,
    }
}

fn put(frame: &mut Frame, area: Rect, x: f64, y: f64, ch: char, color: Color) {
    if x < 0.0 || y < 0.0 {
        return;
    }
    let (cx, cy) = (x as u16, y as u16);
    if cx >= area.width || cy >= area.height {
        return;
    }
    if let Some(cell) = frame.buffer_mut().cell_mut((area.x + cx, area.y + cy)) {
        cell.set_char(ch).set_fg(color);
    }
}

// ---------------------------------------------------------------------------
// Ambient motes
// ---------------------------------------------------------------------------

pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub speed: f64,
    pub drift: f64,
    pub brightness: f64,
    pub char_idx: usize,
    pub color_idx: usize,
}

impl Particle {
    /// Spawn a new particle below the visible area so it floats upward.
    pub fn new(width: u16, height: u16) -> Self {
        let mut rng = rand::thread_rng();
        Self {
            x: rng.gen_range(0.0..width.max(1) as f64),
            y: height as f64 + rng.gen_range(0.0..5.0),
            speed: rng.gen_range(0.08..0.25),
            drift: rng.gen_range(-0.06..0.06),
            brightness: 0.0,
            char_idx: rng.gen_range(0..PARTICLE_CHARS.len()),
            color_idx: rng.gen_range(0..GRADIENT.len() - 1),
        }
    }

    /// Spawn a particle already inside the viewport (for pre-seeding).
    pub fn seeded(width: u16, height: u16) -> Self {
        let mut rng = rand::thread_rng();
        Self {
            x: rng.gen_range(0.0..width.max(1) as f64),
            y: rng.gen_range(0.0..height.max(1) as f64),
            speed: rng.gen_range(0.08..0.25),
            drift: rng.gen_range(-0.06..0.06),
            brightness: rng.gen_range(0.15..0.45),
            char_idx: rng.gen_range(0..PARTICLE_CHARS.len()),
            color_idx: rng.gen_range(0..GRADIENT.len() - 1),
        }
    }

    pub fn tick(&mut self) {
        self.y -= self.speed;
        self.x += self.drift;
        if self.y > 0.0 {
            self.brightness = (self.brightness + 0.05).min(0.45);
        }
    }

    pub fn is_dead(&self) -> bool {
        self.y < -1.0
    }
}

pub fn pre_seed_particles(count: usize, width: u16, height: u16) -> Vec<Particle> {
    (0..count).map(|_| Particle::seeded(width, height)).collect()
}

/// Advance existing motes, cull dead ones, maybe spawn a new one.
pub fn tick_particles(particles: &mut Vec<Particle>, max: usize, width: u16, height: u16) {
    for p in particles.iter_mut() {
        p.tick();
    }
    particles.retain(|p| !p.is_dead());
    let mut rng = rand::thread_rng();
    if particles.len() < max && rng.gen_range(0..3) == 0 {
        particles.push(Particle::new(width, height));
    }
}

pub fn render_particles(particles: &[Particle], frame: &mut Frame, area: Rect) {
    for p in particles {
        let color = fade(gradient_color(p.color_idx as f64 / GRADIENT.len() as f64), p.brightness);
        put(frame, area, p.x, p.y, PARTICLE_CHARS[p.char_idx], color);
    }
}

// ---------------------------------------------------------------------------
// Corner ornaments
// ---------------------------------------------------------------------------

const SPARKLE: &[&str] = &["  \u{2577}  ", " \u{2500}\u{2726}\u{2500} ", "  \u{2575}  "];
const MOON: &[&str] = &[" \u{2584}\u{2580}\u{2580}", "\u{2588}   ", " \u{2580}\u{2584}\u{2584}"];
const SPARKLE_COLOR: Color = Color::Rgb(192, 132, 252);
const MOON_COLOR: Color = Color::Rgb(96, 165, 250);
const ORNAMENT_OPACITY: f64 = 0.35;
const MOON_PULSE_DELAY: f64 = 0.7;

/// Slow breathing between full and half strength, two seconds per cycle.
pub fn pulse(secs: f64) -> f64 {
    0.75 + 0.25 * (TAU * secs / 2.0).cos()
}

fn render_art(frame: &mut Frame, area: Rect, x: u16, y: u16, art: &[&str], color: Color) {
    for (row, line) in art.iter().enumerate() {
        for (col, ch) in line.chars().enumerate() {
            if ch != ' ' {
                put(frame, area, (x as usize + col) as f64, (y as usize + row) as f64, ch, color);
            }
        }
    }
}

pub fn render_ornaments(secs: f64, frame: &mut Frame, area: Rect) {
    if area.width < 20 || area.height < 10 {
        return;
    }
    let sparkle = fade(SPARKLE_COLOR, ORNAMENT_OPACITY * pulse(secs));
    render_art(frame, area, 3, 1, SPARKLE, sparkle);

    let moon = fade(MOON_COLOR, ORNAMENT_OPACITY * pulse(secs - MOON_PULSE_DELAY));
    let moon_w = MOON.iter().map(|l| l.chars().count()).max().unwrap_or(0) as u16;
    render_art(
        frame,
        area,
        area.width.saturating_sub(moon_w + 3),
        area.height.saturating_sub(MOON.len() as u16 + 1),
        MOON,
        moon,
    );
}

// ---------------------------------------------------------------------------
// Confetti
// ---------------------------------------------------------------------------

pub struct BurstConfig {
    pub particle_count: usize,
    /// Cone width in degrees, centred straight up.
    pub spread: f64,
    /// Launch point as fractions of the viewport (x, y).
    pub origin: (f64, f64),
    pub colors: &'static [Color],
    pub start_velocity: f64,
    pub decay: f64,
    pub gravity: f64,
    pub ticks: u32,
}

pub const BURST: BurstConfig = BurstConfig {
    particle_count: 150,
    spread: 70.0,
    origin: (0.5, 0.6),
    colors: &[
        Color::Rgb(0xa8, 0x55, 0xf7),
        Color::Rgb(0xec, 0x48, 0x99),
        Color::Rgb(0x3b, 0x82, 0xf6),
        Color::Rgb(0x10, 0xb9, 0x81),
    ],
    start_velocity: 45.0,
    decay: 0.9,
    gravity: 1.0,
    ticks: 200,
};

/// Physics runs in pixels at 60 Hz; the card ticks at roughly 30 Hz.
const STEPS_PER_TICK: u32 = 2;
const PX_PER_COL: f64 = 12.5;
const PX_PER_ROW: f64 = 30.0;
const CONFETTI_CHARS: &[char] = &['\u{25aa}', '\u{25a0}', '\u{2022}', '\u{25cf}', '\u{25c6}'];

pub struct ConfettiPiece {
    pub x: f64,
    pub y: f64,
    angle: f64,
    velocity: f64,
    wobble: f64,
    wobble_speed: f64,
    pub age: u32,
    pub color: Color,
    pub glyph: char,
}

impl ConfettiPiece {
    fn launch(config: &BurstConfig, x: f64, y: f64, rng: &mut impl Rng) -> Self {
        let spread = config.spread.to_radians();
        let angle = -90f64.to_radians() + (0.5 * spread - rng.gen::<f64>() * spread);
        Self {
            x,
            y,
            angle,
            velocity: config.start_velocity * 0.5 + rng.gen::<f64>() * config.start_velocity,
            wobble: rng.gen_range(0.0..10.0),
            wobble_speed: rng.gen_range(0.05..0.15),
            age: 0,
            color: config.colors[rng.gen_range(0..config.colors.len())],
            glyph: CONFETTI_CHARS[rng.gen_range(0..CONFETTI_CHARS.len())],
        }
    }

    fn step(&mut self, config: &BurstConfig) {
        self.x += (self.angle.cos() * self.velocity + 3.0 * self.wobble.cos()) / PX_PER_COL;
        self.y += (self.angle.sin() * self.velocity + config.gravity * 3.0) / PX_PER_ROW;
        self.velocity *= config.decay;
        self.wobble += self.wobble_speed;
        self.age += 1;
    }

    pub fn opacity(&self, config: &BurstConfig) -> f64 {
        1.0 - self.age as f64 / config.ticks as f64
    }

    /// Pieces may fly above the top edge and fall back in; anything past the
    /// sides or bottom is gone for good.
    fn is_done(&self, config: &BurstConfig, width: u16, height: u16) -> bool {
        self.age >= config.ticks || self.x < 0.0 || self.x >= width as f64 || self.y >= height as f64
    }
}

pub struct ConfettiField {
    enabled: bool,
    width: u16,
    height: u16,
    pieces: Vec<ConfettiPiece>,
    bursts: usize,
}

impl ConfettiField {
    pub fn new(enabled: bool, width: u16, height: u16) -> Self {
        Self {
            enabled,
            width,
            height,
            pieces: Vec::new(),
            bursts: 0,
        }
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
    }

    #[cfg(test)]
    pub fn pieces(&self) -> &[ConfettiPiece] {
        &self.pieces
    }

    /// Number of bursts launched so far.
    pub fn bursts(&self) -> usize {
        self.bursts
    }

    pub fn tick(&mut self) {
        let (w, h) = (self.width, self.height);
        for piece in self.pieces.iter_mut() {
            for _ in 0..STEPS_PER_TICK {
                piece.step(&BURST);
            }
        }
        self.pieces.retain(|p| !p.is_done(&BURST, w, h));
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        for piece in &self.pieces {
            put(
                frame,
                area,
                piece.x,
                piece.y,
                piece.glyph,
                fade(piece.color, piece.opacity(&BURST)),
            );
        }
    }
}

impl Celebration for ConfettiField {
    fn celebrate(&mut self) -> Result<()> {
        if !self.enabled {
            debug!("confetti disabled");
            return Ok(());
        }
        if self.width == 0 || self.height == 0 {
            return Err(CardError::Effect(format!(
                "viewport {}x{} has no room for confetti",
                self.width, self.height
            )));
        }
        let x = self.width as f64 * BURST.origin.0;
        let y = self.height as f64 * BURST.origin.1;
        let mut rng = rand::thread_rng();
        self.pieces
            .extend((0..BURST.particle_count).map(|_| ConfettiPiece::launch(&BURST, x, y, &mut rng)));
        self.bursts += 1;
        debug!(pieces = self.pieces.len(), "confetti launched");
        Ok(())
    }
}
