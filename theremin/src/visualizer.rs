//! Software-rendered overlay using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ selfie view (image x mirrored)               │
//! │        ┆                 ┆                   │ ← faint width guides
//! │ ┄┄┄┄┄┄┄┆┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┆┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄ │ ← height guide (min)
//! │ ━━━━━━━┿━━━━━━━━━━━━━━━━━┿━━━━━━━━━━━━━━━━━━ │ ← left metric
//! │        ┆     ┃           ┆                   │ ← right metric
//! │ ┄┄┄┄┄┄┄┆┄┄┄┄┄┃┄┄┄┄┄┄┄┄┄┄┄┆┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄ │ ← height guide (max)
//! ├──────────────────────────────────────────────┤
//! │ TRACKING  AMP 0.051  FREQ 570.8 HZ  PLAYING  │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Keys: drag with the mouse to move both hands, `L`/`R` hide the hand for
//! that role, `C` drops confidence, `D` duplicates a label, `Q`/`Esc` quit.

use std::sync::mpsc::Sender;
use std::time::Duration;

use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};
use hand_signal::{landmark, Activity, LandmarkSet, Role};
use tone_map::MappingConfig;

use crate::pipeline::{StopSignal, Tick};
use crate::source::SimInput;
use crate::tone::DriverState;

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

pub const VIEW_W:   usize = 640;
pub const VIEW_H:   usize = 480;
const STATUS_H:     usize = 24;
pub const WIN_H:    usize = VIEW_H + STATUS_H;
const TEXT_SCALE:   usize = 2;

const BG_COLOR:     u32 = 0xFF10141C;
const STATUS_BG:    u32 = 0xFF1E2433;
const GUIDE_COLOR:  u32 = 0xFF2E3A4F;
const RAW_COLOR:    u32 = 0xFF505866;
pub const LEFT_COLOR:  u32 = 0xFF3FD0E0;  // vertical axis
pub const RIGHT_COLOR: u32 = 0xFFFF9A3C;  // horizontal axis
const TEXT_COLOR:   u32 = 0xFFE6E6E6;
const HELD_COLOR:   u32 = 0xFFE0C040;

// ════════════════════════════════════════════════════════════════════════════
// Canvas — window-free pixel buffer
// ════════════════════════════════════════════════════════════════════════════

/// ARGB pixel buffer with the primitives the overlay needs.
pub struct Canvas {
    width:  usize,
    height: usize,
    buf:    Vec<u32>,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Self {
        Canvas { width, height, buf: vec![BG_COLOR; width * height] }
    }

    pub fn width(&self)  -> usize { self.width }
    pub fn height(&self) -> usize { self.height }
    pub fn buffer(&self) -> &[u32] { &self.buf }

    pub fn pixel(&self, x: usize, y: usize) -> Option<u32> {
        (x < self.width && y < self.height).then(|| self.buf[y * self.width + x])
    }

    pub fn clear(&mut self, color: u32) { self.buf.fill(color); }

    fn set(&mut self, x: i32, y: i32, color: u32) {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            self.buf[y as usize * self.width + x as usize] = color;
        }
    }

    pub fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y + h).min(self.height) {
            let start = row * self.width;
            self.buf[start + x.min(self.width)..start + (x + w).min(self.width)].fill(color);
        }
    }

    /// Full-width horizontal line.
    pub fn hline(&mut self, y: usize, color: u32) {
        if y < self.height {
            self.buf[y * self.width..(y + 1) * self.width].fill(color);
        }
    }

    /// Vertical line from row 0 to `bottom` (exclusive).
    pub fn vline(&mut self, x: usize, bottom: usize, color: u32) {
        for row in 0..bottom.min(self.height) {
            if x < self.width { self.buf[row * self.width + x] = color; }
        }
    }

    /// Dashed variant used for guides.
    fn dashed_hline(&mut self, y: usize, color: u32) {
        for x in (0..self.width).filter(|x| x % 8 < 4) {
            self.set(x as i32, y as i32, color);
        }
    }

    fn dashed_vline(&mut self, x: usize, bottom: usize, color: u32) {
        for y in (0..bottom.min(self.height)).filter(|y| y % 8 < 4) {
            self.set(x as i32, y as i32, color);
        }
    }

    /// Bresenham segment.
    pub fn line(&mut self, (x0, y0): (i32, i32), (x1, y1): (i32, i32), color: u32) {
        let (dx, dy) = ((x1 - x0).abs(), -(y1 - y0).abs());
        let (sx, sy) = (if x0 < x1 { 1 } else { -1 }, if y0 < y1 { 1 } else { -1 });
        let (mut x, mut y, mut err) = (x0, y0, dx + dy);
        loop {
            self.set(x, y, color);
            if x == x1 && y == y1 { break; }
            let e2 = 2 * err;
            if e2 >= dy { err += dy; x += sx; }
            if e2 <= dx { err += dx; y += sy; }
        }
    }

    fn dot(&mut self, (cx, cy): (i32, i32), r: i32, color: u32) {
        for dy in -r..=r {
            for dx in -r..=r {
                if dx * dx + dy * dy <= r * r {
                    self.set(cx + dx, cy + dy, color);
                }
            }
        }
    }

    /// Upper-case text in the built-in 3×5 font, scaled.
    pub fn text(&mut self, x: usize, y: usize, text: &str, scale: usize, color: u32) {
        let mut cx = x;
        for ch in text.chars() {
            let rows = glyph(ch.to_ascii_uppercase());
            for (ry, row) in rows.iter().enumerate() {
                for (rx, cell) in row.bytes().enumerate() {
                    if cell == b'#' {
                        self.fill_rect(cx + rx * scale, y + ry * scale, scale, scale, color);
                    }
                }
            }
            cx += 4 * scale;
            if cx + 3 * scale > self.width { break; }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Scene
// ════════════════════════════════════════════════════════════════════════════

/// Normalized image coordinate → mirrored view column.
pub fn view_x(image_x: f32) -> usize {
    ((1.0 - image_x.clamp(0.0, 1.0)) * (VIEW_W - 1) as f32).round() as usize
}

/// Normalized image coordinate → view row.
pub fn view_y(image_y: f32) -> usize {
    (image_y.clamp(0.0, 1.0) * (VIEW_H - 1) as f32).round() as usize
}

fn view_point(x: f32, y: f32) -> (i32, i32) {
    let px = (1.0 - x) * (VIEW_W - 1) as f32;
    let py = y * (VIEW_H - 1) as f32;
    (px.round() as i32, py.round() as i32)
}

fn draw_skeleton(canvas: &mut Canvas, hand: &LandmarkSet, color: u32) {
    let pts = hand.points();
    for &(a, b) in landmark::BONES.iter() {
        canvas.line(view_point(pts[a].x, pts[a].y), view_point(pts[b].x, pts[b].y), color);
    }
    for p in pts.iter() {
        canvas.dot(view_point(p.x, p.y), 2, color);
    }
}

/// One status-bar line for this tick.
pub fn status_line(tick: Option<&Tick>, driver: DriverState) -> String {
    let activity = tick.map_or("waiting for hands", |t| t.report.activity.label());
    let mut line = activity.to_uppercase();
    if let Some(p) = tick.and_then(|t| t.report.params) {
        line.push_str(&format!("  AMP {:.3}  FREQ {:.1} HZ", p.amplitude, p.frequency));
    }
    if tick.is_some_and(|t| t.report.released) {
        line.push_str("  RELEASED");
    }
    line.push_str("  TONE ");
    line.push_str(&driver.name().to_uppercase());
    line
}

/// Render a full frame into `canvas`.
pub fn draw_scene(canvas: &mut Canvas, tick: Option<&Tick>, driver: DriverState, mapping: &MappingConfig) {
    canvas.clear(BG_COLOR);

    for y in [mapping.height.min, mapping.height.max] {
        canvas.dashed_hline(view_y(y), GUIDE_COLOR);
    }
    for x in [mapping.width.min, mapping.width.max] {
        canvas.dashed_vline(view_x(x), VIEW_H, GUIDE_COLOR);
    }

    if let Some(tick) = tick {
        let report = &tick.report;
        let (lc, rc) = match report.activity {
            Activity::Held(_) => (HELD_COLOR, HELD_COLOR),
            _ => (LEFT_COLOR, RIGHT_COLOR),
        };

        // Unresolved detections in grey, under the pair the tone came from.
        if report.pair.is_none() {
            for det in &tick.detections {
                draw_skeleton(canvas, &det.landmarks, RAW_COLOR);
            }
        }
        if let Some(pair) = &report.active {
            draw_skeleton(canvas, pair.hand(Role::Left), lc);
            draw_skeleton(canvas, pair.hand(Role::Right), rc);
        }

        if let Some(signal) = report.activity.signal() {
            canvas.hline(view_y(signal.left), lc);
            canvas.vline(view_x(signal.right), VIEW_H, rc);
        }
    }

    canvas.fill_rect(0, VIEW_H, canvas.width(), STATUS_H, STATUS_BG);
    let status = status_line(tick, driver);
    canvas.text(8, VIEW_H + (STATUS_H - 5 * TEXT_SCALE) / 2, &status, TEXT_SCALE, TEXT_COLOR);
}

// ════════════════════════════════════════════════════════════════════════════
// Overlay — the window
// ════════════════════════════════════════════════════════════════════════════

pub struct Overlay {
    window:  Window,
    canvas:  Canvas,
    sim_tx:  Option<Sender<SimInput>>,
    stop:    StopSignal,
    mapping: MappingConfig,
}

impl Overlay {
    /// `sim_tx` is `Some` when the simulator is the active source.
    pub fn new(
        sim_tx:  Option<Sender<SimInput>>,
        stop:    StopSignal,
        mapping: MappingConfig,
    ) -> Result<Self, minifb::Error> {
        let mut window = Window::new(
            "Visual Theremin",
            VIEW_W, WIN_H,
            WindowOptions { resize: false, ..WindowOptions::default() },
        )?;
        window.limit_update_rate(Some(Duration::from_millis(16)));

        Ok(Overlay { window, canvas: Canvas::new(VIEW_W, WIN_H), sim_tx, stop, mapping })
    }

    fn send(&self, input: SimInput) {
        if let Some(tx) = &self.sim_tx {
            let _ = tx.send(input);
        }
    }

    /// Forward input to the simulator.  Returns `false`, and raises the stop
    /// signal, once the user asks to quit.
    pub fn poll_input(&mut self) -> bool {
        let quit = !self.window.is_open()
            || self.window.is_key_pressed(Key::Q, KeyRepeat::No)
            || self.window.is_key_pressed(Key::Escape, KeyRepeat::No);
        if quit {
            self.stop.stop();
            return false;
        }

        let one_shot = |k: Key| self.window.is_key_pressed(k, KeyRepeat::No);
        let toggles = [
            (Key::L, SimInput::ToggleHand(Role::Left)),
            (Key::R, SimInput::ToggleHand(Role::Right)),
            (Key::C, SimInput::ToggleLowConfidence),
            (Key::D, SimInput::ToggleSameLabel),
        ];
        let pressed: Vec<SimInput> = toggles.iter()
            .filter(|(k, _)| one_shot(*k))
            .map(|&(_, input)| input)
            .collect();
        for input in pressed {
            self.send(input);
        }

        if self.window.get_mouse_down(MouseButton::Left) {
            if let Some((mx, my)) = self.window.get_mouse_pos(MouseMode::Clamp) {
                if (my as usize) < VIEW_H {
                    self.send(SimInput::Pointer {
                        x: mx / (VIEW_W - 1) as f32,
                        y: my / (VIEW_H - 1) as f32,
                    });
                }
            }
        }
        true
    }

    pub fn render(&mut self, tick: Option<&Tick>, driver: DriverState) {
        draw_scene(&mut self.canvas, tick, driver, &self.mapping);
        if let Err(e) = self.window.update_with_buffer(self.canvas.buffer(), VIEW_W, WIN_H) {
            tracing::warn!("overlay update failed: {}", e);
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// 3×5 font, one string per row
// ────────────────────────────────────────────────────────────────────────────

fn glyph(c: char) -> [&'static str; 5] {
    match c {
        '0' => ["###", "#.#", "#.#", "#.#", "###"],
        '1' => [".#.", "##.", ".#.", ".#.", "###"],
        '2' => ["###", "..#", "###", "#..", "###"],
        '3' => ["###", "..#", ".##", "..#", "###"],
        '4' => ["#.#", "#.#", "###", "..#", "..#"],
        '5' => ["###", "#..", "###", "..#", "##."],
        '6' => ["###", "#..", "###", "#.#", "###"],
        '7' => ["###", "..#", ".#.", ".#.", ".#."],
        '8' => ["###", "#.#", "###", "#.#", "###"],
        '9' => ["###", "#.#", "###", "..#", "###"],
        'A' => [".#.", "#.#", "###", "#.#", "#.#"],
        'C' => [".##", "#..", "#..", "#..", ".##"],
        'D' => ["##.", "#.#", "#.#", "#.#", "##."],
        'E' => ["###", "#..", "##.", "#..", "###"],
        'F' => ["###", "#..", "##.", "#..", "#.."],
        'G' => [".##", "#..", "#.#", "#.#", ".##"],
        'H' => ["#.#", "#.#", "###", "#.#", "#.#"],
        'I' => ["###", ".#.", ".#.", ".#.", "###"],
        'K' => ["#.#", "##.", "#..", "##.", "#.#"],
        'L' => ["#..", "#..", "#..", "#..", "###"],
        'M' => ["#.#", "###", "###", "#.#", "#.#"],
        'N' => ["##.", "#.#", "#.#", "#.#", "#.#"],
        'O' => [".#.", "#.#", "#.#", "#.#", ".#."],
        'P' => ["##.", "#.#", "##.", "#..", "#.."],
        'Q' => [".#.", "#.#", "#.#", "##.", ".##"],
        'R' => ["##.", "#.#", "##.", "#.#", "#.#"],
        'S' => [".##", "#..", ".#.", "..#", "##."],
        'T' => ["###", ".#.", ".#.", ".#.", ".#."],
        'U' => ["#.#", "#.#", "#.#", "#.#", "###"],
        'V' => ["#.#", "#.#", "#.#", "#.#", ".#."],
        'W' => ["#.#", "#.#", "###", "###", "#.#"],
        'Y' => ["#.#", "#.#", ".#.", ".#.", ".#."],
        'Z' => ["###", "..#", ".#.", "#..", "###"],
        '.' => ["...", "...", "...", "...", ".#."],
        ':' => ["...", ".#.", "...", ".#.", "..."],
        '-' => ["...", "...", "###", "...", "..."],
        ' ' => ["...", "...", "...", "...", "..."],
        _   => ["...", "...", ".#.", "...", "..."],
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
