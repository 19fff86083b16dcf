/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// The 800×800 pixel playfield is scaled to fit the terminal. Every
/// terminal cell shows two square "sub-pixels" stacked vertically with an
/// upper half block: foreground = top, background = bottom.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{
        DisableMouseCapture, EnableMouseCapture, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};
use tracing::{debug, info};

use crate::domain::body::Rgb;
use crate::domain::rect::Rect;
use crate::sim::flow::{FlowController, Outcome, Phase, RenderFrame};
use crate::sim::level::{PLAYFIELD_HEIGHT, PLAYFIELD_WIDTH};
use crate::sim::menu::Button;

const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };
const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const MSG_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };

const PLAYFIELD_BG: Rgb = Rgb(255, 255, 255);
const PLATFORM: Rgb = Rgb(0, 0, 0);
const GOAL: Rgb = Rgb(255, 246, 0);
const IDLE_BUTTON: Rgb = Rgb(205, 205, 205);
const LABEL: Color = Color::Black;

/// Vertical layout
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;
const FOOTER_ROWS: usize = 3; // gap + message + help

const HALF_BLOCK: char = '▀';

fn color(c: Rgb) -> Color {
    Color::Rgb { r: c.0, g: c.1, b: c.2 }
}

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: BASE_BG };

    /// Differs from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width {
                break;
            }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', Color::White, bg));
        }
    }
}

// ── Viewport: playfield pixels ↔ terminal cells ──

fn div_ceil(a: i32, b: i32) -> i32 {
    (a + b - 1) / b
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Viewport {
    origin_col: usize,
    origin_row: usize,
    cols: usize,
    rows: usize,
    /// Side of one square sub-pixel, in playfield pixels.
    px: i32,
}

impl Viewport {
    /// Largest scale at which the whole playfield fits the terminal.
    pub fn fit(term_w: usize, term_h: usize) -> Self {
        let avail_w = term_w.max(1) as i32;
        let avail_h = term_h.saturating_sub(MAP_ROW + FOOTER_ROWS).max(1) as i32;
        let px = div_ceil(PLAYFIELD_WIDTH, avail_w)
            .max(div_ceil(PLAYFIELD_HEIGHT, avail_h * 2))
            .max(1);
        let cols = div_ceil(PLAYFIELD_WIDTH, px) as usize;
        let rows = div_ceil(PLAYFIELD_HEIGHT, px * 2) as usize;
        Viewport {
            origin_col: term_w.saturating_sub(cols) / 2,
            origin_row: MAP_ROW,
            cols,
            rows,
            px,
        }
    }

    /// Playfield area covered by sub-pixel (col, sub_row).
    fn pixel(&self, col: usize, sub_row: usize) -> Rect {
        Rect::from_raw(col as i32 * self.px, sub_row as i32 * self.px, self.px, self.px)
    }

    /// Playfield point at the centre of a terminal cell, if it is inside
    /// the viewport.
    pub fn to_world(&self, term_col: u16, term_row: u16) -> Option<(i32, i32)> {
        let col = (term_col as usize).checked_sub(self.origin_col)?;
        let row = (term_row as usize).checked_sub(self.origin_row)?;
        if col >= self.cols || row >= self.rows {
            return None;
        }
        Some((col as i32 * self.px + self.px / 2, row as i32 * self.px * 2 + self.px))
    }

    /// Terminal cell holding a playfield point.
    fn to_cell(&self, x: i32, y: i32) -> (usize, usize) {
        let col = (x.max(0) / self.px) as usize;
        let row = (y.max(0) / (self.px * 2)) as usize;
        (self.origin_col + col.min(self.cols.saturating_sub(1)), self.origin_row + row.min(self.rows.saturating_sub(1)))
    }

    fn footer_row(&self) -> usize {
        self.origin_row + self.rows + 1
    }
}

// ── Compose: build front buffer content ──

fn paint<F: Fn(Rect) -> Rgb>(buf: &mut FrameBuffer, vp: &Viewport, shade: F) {
    for row in 0..vp.rows {
        for col in 0..vp.cols {
            let top = shade(vp.pixel(col, row * 2));
            let bottom = shade(vp.pixel(col, row * 2 + 1));
            buf.set(vp.origin_col + col, vp.origin_row + row, Cell::new(HALF_BLOCK, color(top), color(bottom)));
        }
    }
}

/// Body over goal over platforms.
fn compose_playfield(buf: &mut FrameBuffer, vp: &Viewport, frame: &RenderFrame<'_>) {
    paint(buf, vp, |px| {
        if frame.body.overlaps(&px) {
            frame.body_color
        } else if frame.goal.is_some_and(|g| g.overlaps(&px)) {
            GOAL
        } else if frame.colliders.iter().any(|c| c.overlaps(&px)) {
            PLATFORM
        } else {
            PLAYFIELD_BG
        }
    });
}

fn button_fill(buttons: &[Button], cursor: usize, index: usize) -> Rgb {
    if index == cursor { buttons[index].color } else { IDLE_BUTTON }
}

fn compose_menu(buf: &mut FrameBuffer, vp: &Viewport, buttons: &[Button], cursor: usize) {
    paint(buf, vp, |px| {
        match buttons.iter().position(|b| b.rect.overlaps(&px)) {
            Some(i) => button_fill(buttons, cursor, i),
            None => PLAYFIELD_BG,
        }
    });

    for (i, b) in buttons.iter().enumerate() {
        let label = format!("{} [{}]", b.label, b.hotkey.to_ascii_uppercase());
        let (cx, cy) = vp.to_cell(b.rect.x + b.rect.width() / 2, b.rect.y + b.rect.height() / 2);
        let (left, _) = vp.to_cell(b.rect.left(), b.rect.top());
        let (right, _) = vp.to_cell(b.rect.right() - 1, b.rect.top());
        // Fall back to the bare label when the hotkey suffix does not fit
        let text = if label.chars().count() <= right + 1 - left { label } else { b.label.clone() };
        let x = cx.saturating_sub(text.chars().count() / 2).max(left);
        buf.put_str(x, cy, &text, LABEL, color(button_fill(buttons, cursor, i)));
    }
}

fn hud_text(flow: &FlowController) -> String {
    let name = flow.level_name().unwrap_or("");
    match flow.phase() {
        Phase::MainMenu => " WALLHOP ".to_string(),
        Phase::LevelSelect => " Select a level ".to_string(),
        Phase::Playing => format!(" Level {}: {} ", flow.level(), name),
        Phase::PostGame => match flow.outcome() {
            Some(Outcome::Won) => format!(" Level {} cleared! ", flow.level()),
            _ => format!(" Level {} failed ", flow.level()),
        },
        Phase::Exited => String::new(),
    }
}

fn help_text(phase: Phase) -> &'static str {
    match phase {
        Phase::Playing => " ←→/AD move   ↑/W/Space jump (again against a wall)   Esc give up",
        _ => " Arrows move   Enter select   Esc back   Mouse click   [key] hotkey",
    }
}

fn compose_chrome(buf: &mut FrameBuffer, vp: &Viewport, flow: &FlowController) {
    buf.fill_row(HUD_ROW, HUD_BG);
    buf.put_str(0, HUD_ROW, &hud_text(flow), Color::White, HUD_BG);

    let msg_row = vp.footer_row();
    if !flow.message.is_empty() {
        buf.fill_row(msg_row, MSG_BG);
        buf.put_str(0, msg_row, &format!(" ◈ {} ", flow.message), Color::Black, MSG_BG);
    }
    buf.put_str(0, msg_row + 1, help_text(flow.phase()), Color::DarkGrey, BASE_BG);
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    viewport: Viewport,
    last_phase: Option<Phase>,
    keyboard_enhanced: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            viewport: Viewport::fit(80, 24),
            last_phase: None,
            keyboard_enhanced: false,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            EnableMouseCapture,
            SetBackgroundColor(BASE_BG),
            Clear(ClearType::All)
        )?;

        // Release events make held keys exact; without them input falls back to timeouts
        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
            self.keyboard_enhanced = true;
        }

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.resize(tw as usize, th as usize);
        info!(cols = tw, rows = th, keyboard_enhanced = self.keyboard_enhanced, "terminal ready");
        Ok(())
    }

    pub fn keyboard_enhanced(&self) -> bool {
        self.keyboard_enhanced
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.keyboard_enhanced {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
        }
        execute!(
            self.writer,
            DisableMouseCapture,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    /// Playfield point under a terminal cell (for mouse hit-testing).
    pub fn screen_to_world(&self, col: u16, row: u16) -> Option<(i32, i32)> {
        self.viewport.to_world(col, row)
    }

    fn resize(&mut self, w: usize, h: usize) {
        self.term_w = w;
        self.term_h = h;
        self.front.resize(w, h);
        self.back.resize(w, h);
        self.viewport = Viewport::fit(w, h);
        // Force full repaint: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);
        debug!(viewport = ?self.viewport, "viewport fitted");
    }

    pub fn render(&mut self, flow: &FlowController) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.resize(tw as usize, th as usize);
            queue!(self.writer, SetBackgroundColor(BASE_BG), Clear(ClearType::All))?;
        }

        if self.last_phase != Some(flow.phase()) {
            self.back.cells.fill(Cell::INVALID);
            self.last_phase = Some(flow.phase());
        }

        self.front.clear();
        match flow.phase() {
            Phase::Playing => compose_playfield(&mut self.front, &self.viewport, &flow.render_frame()),
            Phase::Exited => {}
            _ => compose_menu(&mut self.front, &self.viewport, &flow.buttons(), flow.cursor()),
        }
        compose_chrome(&mut self.front, &self.viewport, flow);

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        // Explicit base colors; ResetColor would fall back to the terminal default
        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }
                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }
}
