//! Software-rendered visualizer using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ tilt 45.0  bias 45.0  hand: tracking         │   ┌──────────────┐
//! │                                              │   │  camera      │
//! │               \ /    \ /                     │   │  preview     │
//! │                 \    /                       │   │  (mirrored)  │
//! │                   \/                         │   └──────────────┘
//! │                   |                          │
//! │ H=hud  Q/Esc=quit                            │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Drawing goes through [`Canvas`], a plain pixel buffer, so it can be
//! exercised without opening a window.

use std::sync::mpsc::Sender;
use std::time::Duration;

use fractal_tree::{Point, Segment};
use image::RgbImage;
use minifb::{Key, KeyRepeat, MouseMode, Window, WindowOptions};

use crate::config::WindowConfig;
use crate::pointer::SimInput;

const HUD_COLOR:    u32 = 0xFFAADDFF;
const LEGEND_COLOR: u32 = 0xFF888888;
const HUD_SCALE:    usize = 2;

// ════════════════════════════════════════════════════════════════════════════
// Canvas — pixel buffer and drawing primitives
// ════════════════════════════════════════════════════════════════════════════

/// An ARGB pixel buffer (`0xAARRGGBB`, row-major).
pub struct Canvas {
    width:  usize,
    height: usize,
    buf:    Vec<u32>,
}

impl Canvas {
    pub fn new(width: usize, height: usize, fill: u32) -> Self {
        Canvas { width, height, buf: vec![fill; width * height] }
    }

    pub fn width(&self)  -> usize { self.width }
    pub fn height(&self) -> usize { self.height }
    pub fn pixels(&self) -> &[u32] { &self.buf }

    pub fn pixel(&self, x: usize, y: usize) -> Option<u32> {
        (x < self.width && y < self.height).then(|| self.buf[y * self.width + x])
    }

    pub fn clear(&mut self, color: u32) {
        self.buf.fill(color);
    }

    pub fn set_pixel(&mut self, x: i64, y: i64, color: u32) {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            self.buf[y as usize * self.width + x as usize] = color;
        }
    }

    pub fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y + h).min(self.height) {
            for col in x..(x + w).min(self.width) {
                self.buf[row * self.width + col] = color;
            }
        }
    }

    /// Bresenham line from `a` to `b`, clipped to the canvas first so only
    /// visible pixels are walked.
    pub fn draw_line(&mut self, color: u32, a: Point, b: Point) {
        if !(a.is_finite() && b.is_finite()) {
            return;
        }
        let Some((a, b)) = self.clip(a, b) else { return };
        let (mut x0, mut y0) = (a.x.round() as i64, a.y.round() as i64);
        let (x1, y1) = (b.x.round() as i64, b.y.round() as i64);

        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            self.set_pixel(x0, y0, color);
            if x0 == x1 && y0 == y1 { break; }
            let e2 = 2 * err;
            if e2 >= dy { err += dy; x0 += sx; }
            if e2 <= dx { err += dx; y0 += sy; }
        }
    }

    /// Liang–Barsky: the part of `a`–`b` inside the pixel grid, if any.
    fn clip(&self, a: Point, b: Point) -> Option<(Point, Point)> {
        if self.width == 0 || self.height == 0 {
            return None;
        }
        let (x_max, y_max) = ((self.width - 1) as f64, (self.height - 1) as f64);
        let (dx, dy) = (b.x - a.x, b.y - a.y);
        let (mut t0, mut t1) = (0.0f64, 1.0f64);

        for (p, q) in [(-dx, a.x), (dx, x_max - a.x), (-dy, a.y), (dy, y_max - a.y)] {
            if p == 0.0 {
                if q < 0.0 { return None; }
                continue;
            }
            let r = q / p;
            if p < 0.0 {
                if r > t1 { return None; }
                t0 = t0.max(r);
            } else {
                if r < t0 { return None; }
                t1 = t1.min(r);
            }
        }

        Some((
            Point::new(a.x + t0 * dx, a.y + t0 * dy),
            Point::new(a.x + t1 * dx, a.y + t1 * dy),
        ))
    }

    pub fn draw_segment(&mut self, color: u32, seg: &Segment) {
        self.draw_line(color, seg.start, seg.end);
    }

    /// Text in the built-in 3×5 font, each font pixel drawn `scale`×`scale`.
    pub fn draw_label(&mut self, text: &str, x: usize, y: usize, scale: usize, color: u32) {
        let scale = scale.max(1);
        let mut cx = x;
        for ch in text.chars() {
            let glyph = char_glyph(ch);
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..3usize {
                    if bits & (1 << (2 - col)) != 0 {
                        self.fill_rect(cx + col * scale, y + row * scale, scale, scale, color);
                    }
                }
            }
            cx += 4 * scale; // 3 wide + 1 gap
            if cx + 4 * scale > self.width { break; }
        }
    }

    /// Copy `frame` in, scaled by nearest neighbour to fill the canvas.
    pub fn blit_scaled(&mut self, frame: &RgbImage) {
        let (fw, fh) = (frame.width() as usize, frame.height() as usize);
        if fw == 0 || fh == 0 { return; }
        for row in 0..self.height {
            let sy = row * fh / self.height;
            for col in 0..self.width {
                let sx = col * fw / self.width;
                let [r, g, b] = frame.get_pixel(sx as u32, sy as u32).0;
                self.buf[row * self.width + col] = rgb(r, g, b);
            }
        }
    }
}

/// Pack 8-bit channels into an opaque ARGB pixel.
pub fn rgb(r: u8, g: u8, b: u8) -> u32 {
    0xFF000000 | (r as u32) << 16 | (g as u32) << 8 | b as u32
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer — the tree window
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window:       Window,
    canvas:       Canvas,
    background:   u32,
    branch_color: u32,
    show_hud:     bool,
    sim_tx:       Option<Sender<SimInput>>,
}

impl Visualizer {
    /// Open the tree window.  With `sim_tx`, each [`poll_input`] forwards the
    /// mouse position for the simulated pointer source.
    ///
    /// [`poll_input`]: Visualizer::poll_input
    pub fn new(cfg: &WindowConfig, sim_tx: Option<Sender<SimInput>>) -> Result<Self, String> {
        let mut window = Window::new(
            &cfg.title,
            cfg.width, cfg.height,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        ).map_err(|e| e.to_string())?;

        window.limit_update_rate(Some(frame_interval(cfg.fps)));

        let background = 0xFF000000 | cfg.background;
        Ok(Visualizer {
            window,
            canvas: Canvas::new(cfg.width, cfg.height, background),
            background,
            branch_color: 0xFF000000 | cfg.branch_color,
            show_hud: cfg.hud,
            sim_tx,
        })
    }

    pub fn is_open(&self) -> bool { self.window.is_open() }

    /// Poll the window once.  Returns false when the user asked to quit.
    pub fn poll_input(&mut self) -> bool {
        if !self.window.is_open() { return false; }

        let pressed = |k: Key| self.window.is_key_pressed(k, KeyRepeat::No);
        if pressed(Key::Q) || pressed(Key::Escape) {
            return false;
        }
        if pressed(Key::H) {
            self.show_hud = !self.show_hud;
        }

        if let Some(tx) = &self.sim_tx {
            let pos = self.window.get_mouse_pos(MouseMode::Discard);
            let _ = tx.send(SimInput::Pointer(pos));
        }
        true
    }

    /// Draw one frame: segments in order (trunk first), then the HUD, then
    /// present.
    pub fn render<I>(&mut self, segments: I, status: &str) -> Result<(), String>
    where
        I: IntoIterator<Item = Segment>,
    {
        self.canvas.clear(self.background);
        for seg in segments {
            self.canvas.draw_segment(self.branch_color, &seg);
        }

        if self.show_hud {
            self.canvas.draw_label(status, 10, 10, HUD_SCALE, HUD_COLOR);
            let legend_y = self.canvas.height().saturating_sub(5 * HUD_SCALE + 10);
            self.canvas.draw_label("H=hud  Q/Esc=quit", 10, legend_y, HUD_SCALE, LEGEND_COLOR);
        }

        self.window
            .update_with_buffer(self.canvas.pixels(), self.canvas.width(), self.canvas.height())
            .map_err(|e| e.to_string())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// PreviewWindow — captured frames
// ════════════════════════════════════════════════════════════════════════════

/// A second window showing the latest captured frame.
pub struct PreviewWindow {
    window: Window,
    canvas: Canvas,
}

impl PreviewWindow {
    pub fn new(width: u32, height: u32) -> Result<Self, String> {
        let (w, h) = (width as usize, height as usize);
        let window = Window::new("Image", w, h, WindowOptions::default())
            .map_err(|e| e.to_string())?;
        Ok(PreviewWindow { window, canvas: Canvas::new(w, h, 0xFF000000) })
    }

    pub fn is_open(&self) -> bool { self.window.is_open() }

    pub fn show(&mut self, frame: &RgbImage) -> Result<(), String> {
        self.canvas.blit_scaled(frame);
        self.window
            .update_with_buffer(self.canvas.pixels(), self.canvas.width(), self.canvas.height())
            .map_err(|e| e.to_string())
    }
}

fn frame_interval(fps: u32) -> Duration {
    Duration::from_micros(1_000_000 / fps.max(1) as u64)
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

fn char_glyph(c: char) -> [u8; 5] {
    match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'a' | 'A' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'b' | 'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'c' | 'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'd' | 'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'e' | 'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'f' | 'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'g' | 'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'h' | 'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'i' | 'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'j' | 'J' => [0b001, 0b001, 0b001, 0b101, 0b111],
        'k' | 'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'l' | 'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'm' | 'M' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'n' | 'N' => [0b111, 0b101, 0b101, 0b101, 0b101],
        'o' | 'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'p' | 'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'q' | 'Q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'r' | 'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        's' | 'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        't' | 'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'u' | 'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'v' | 'V' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'w' | 'W' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'x' | 'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'y' | 'Y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        'z' | 'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '(' => [0b001, 0b010, 0b010, 0b010, 0b001],
        ')' => [0b100, 0b010, 0b010, 0b010, 0b100],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _   => [0b000, 0b000, 0b010, 0b000, 0b000],
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
