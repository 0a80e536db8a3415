/// Double-buffered terminal renderer for the facility and puzzle screens.
///
/// Each frame is composed into a front buffer of plain cells, diffed
/// against the previous frame, and only changed cells are emitted. All
/// commands are batched with `queue!` and flushed once, which keeps the
/// phosphor flicker-free even while the glitch effect is shaking rows.
///
/// Everything drawn here is derived from `SurfaceView` (the render
/// contract): the renderer holds no puzzle state of its own beyond the
/// back buffer and the transient-effect counters passed in per frame.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::grid::{self, Column, GRID_COLS, GRID_ROWS};
use crate::host::object::WorldObject;
use crate::host::registry::SurfaceView;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for every cell, matching the Clear color
    /// so inter-row gap pixels never show a different terminal default.
    const BASE_BG: Color = Color::Rgb { r: 10, g: 14, b: 10 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel used to invalidate the back buffer so every position diffs.
    const INVALID: Cell = Cell { ch: '\u{0}', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color) -> Cell {
        Cell { ch, fg, bg: Cell::BASE_BG }
    }

    fn on(ch: char, fg: Color, bg: Color) -> Cell {
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

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color) {
        let mut cx = x;
        for ch in s.chars() {
            if cx >= self.width {
                break;
            }
            self.set(cx, y, Cell::new(ch, fg));
            cx += 1;
        }
    }

    fn put_str_on(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        let mut cx = x;
        for ch in s.chars() {
            if cx >= self.width {
                break;
            }
            self.set(cx, y, Cell::on(ch, fg, bg));
            cx += 1;
        }
    }
}

// ── Layout constants ──

const HEADER_ROW: usize = 0;
const STATUS_ROW: usize = 2;
const GRID_ROW: usize = 4;
const ADDR_W: usize = 7; // "0xF964 "
const COL_GAP: usize = 2;

/// What the renderer needs for one puzzle frame beyond the view itself.
pub struct PuzzleScreen<'a> {
    pub view: &'a SurfaceView,
    pub title: &'a str,
    pub object: &'a str,
    pub selected: usize,
    /// Frames left of the reset glitch shake.
    pub glitch: u32,
    /// Frames left of the win/lockout flash.
    pub flash: u32,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Screen {
    Facility,
    Puzzle,
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_screen: Option<Screen>,
    tint: Color,
    dim: Color,
    faint: Color,
}

impl Renderer {
    pub fn new(tint: (u8, u8, u8)) -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_screen: None,
            tint: rgb(tint, 1.0),
            dim: rgb(tint, 0.55),
            faint: rgb(tint, 0.3),
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    // ── Facility screen ──

    pub fn render_facility(
        &mut self,
        objects: &[WorldObject],
        cursor: usize,
        message: &str,
    ) -> io::Result<()> {
        self.begin_frame(Screen::Facility)?;

        let tint = self.tint;
        let dim = self.dim;
        self.front.put_str(2, HEADER_ROW, "TERMBREACH // FACILITY ACCESS", tint);
        self.front.put_str(2, HEADER_ROW + 1, &"=".repeat(44), self.faint);

        for (i, obj) in objects.iter().enumerate() {
            let y = 3 + i * 2;
            let marker = if i == cursor { "> " } else { "  " };
            let state = if obj.locked { "LOCKED" } else { "OPEN" };
            let line = format!(
                "{marker}{:<24} [{:<8}] {state}",
                obj.name,
                obj.kind.label()
            );
            let fg = if i == cursor { tint } else { dim };
            self.front.put_str(2, y, &line, fg);
            if !obj.puzzle_enabled {
                self.front.put_str(2 + line.chars().count() + 2, y, "(puzzle offline)", self.faint);
            }
        }

        let help_y = self.term_h.saturating_sub(2);
        self.front
            .put_str(2, help_y, "UP/DOWN select   ENTER breach   Q quit", self.faint);
        if !message.is_empty() {
            self.front.put_str(2, help_y.saturating_sub(2), message, Color::White);
        }

        self.end_frame()
    }

    // ── Puzzle screen ──

    pub fn render_puzzle(&mut self, screen: &PuzzleScreen) -> io::Result<()> {
        self.begin_frame(Screen::Puzzle)?;

        let v = screen.view;
        let tint = self.tint;
        let dim = self.dim;

        // Header
        self.front.put_str(2, HEADER_ROW, screen.title, tint);
        let obj = format!("TARGET: {}", screen.object);
        self.front.put_str(30, HEADER_ROW, &obj, dim);
        self.front.put_str(2, HEADER_ROW + 1, &"=".repeat(74), self.faint);

        // Status row: attempts, resets, timer
        let mut pips = String::from("ATTEMPTS: ");
        for i in 0..v.attempts {
            pips.push(if i < v.remaining { '\u{25a0}' } else { '\u{25a1}' });
            pips.push(' ');
        }
        let low = v.remaining <= 1 && !v.over;
        self.front.put_str(2, STATUS_ROW, &pips, if low { Color::Red } else { tint });

        if let Some(left) = v.resets_left {
            let quota = format!("RESETS: {left}");
            self.front.put_str(34, STATUS_ROW, &quota, dim);
        }
        if let Some(secs) = v.countdown {
            let clock = format!("TIME {:02}:{:02}", secs / 60, secs % 60);
            let urgent = secs <= 10 && !v.over;
            self.front
                .put_str(48, STATUS_ROW, &clock, if urgent { Color::Red } else { tint });
        }

        // Grid columns with addresses, transcript to the right
        self.draw_column(v, Column::Left, &v.left, 2, screen);
        let right_x = 2 + ADDR_W + GRID_COLS + COL_GAP;
        self.draw_column(v, Column::Right, &v.right, right_x, screen);

        let log_x = right_x + ADDR_W + GRID_COLS + COL_GAP + 1;
        let log_h = GRID_ROWS;
        let skip = v.log.len().saturating_sub(log_h);
        for (i, line) in v.log.iter().skip(skip).enumerate() {
            self.front.put_str(log_x, GRID_ROW + i, line, dim);
        }

        // Idle / terminal overlays
        if !v.started {
            self.banner("[ PRESS ANY KEY TO BEGIN ]", tint);
        } else if v.over {
            let (text, color) = if v.locked {
                ("  TERMINAL LOCKED  ", Color::Red)
            } else {
                ("  ACCESS GRANTED  ", tint)
            };
            if screen.flash % 4 < 2 {
                self.banner_on(text, Color::Black, color);
            } else {
                self.banner(text, color);
            }
            let hint_y = self.term_h.saturating_sub(2);
            self.front.put_str(2, hint_y, "ESC close", self.faint);
            return self.end_frame();
        }

        let help_y = self.term_h.saturating_sub(2);
        self.front.put_str(
            2,
            help_y,
            "ARROWS select   ENTER guess   R reset   ESC close",
            self.faint,
        );

        self.end_frame()
    }

    fn draw_column(
        &mut self,
        v: &SurfaceView,
        column: Column,
        rows: &[String],
        x: usize,
        screen: &PuzzleScreen,
    ) {
        let addr_base = match column {
            Column::Left => 0xF4A0usize,
            Column::Right => 0xF4A0 + GRID_ROWS * GRID_COLS,
        };
        for (row, text) in rows.iter().enumerate() {
            let y = GRID_ROW + row;
            // Reset glitch: rows shiver sideways while the effect runs.
            let jitter = if screen.glitch > 0 {
                (lcg(screen.glitch as usize * 31 + row) % 3) as usize
            } else {
                0
            };
            let x = x + jitter;

            let addr = format!("0x{:04X}", addr_base + row * GRID_COLS);
            self.front.put_str(x, y, &addr, self.faint);

            let mut cx = x + ADDR_W;
            let mut offset = 0;
            for (run, is_word) in grid::segments(text) {
                if is_word {
                    let idx = v.targets.iter().position(|t| {
                        t.column == column && t.row == row && t.start == offset
                    });
                    let disabled = idx
                        .map(|i| v.targets[i].disabled)
                        .unwrap_or(false);
                    if idx == Some(screen.selected) && !v.over {
                        self.front.put_str_on(cx, y, &run, Color::Black, self.tint);
                    } else if disabled {
                        self.front.put_str(cx, y, &run, Color::DarkGrey);
                    } else {
                        self.front.put_str(cx, y, &run, Color::White);
                    }
                } else {
                    self.front.put_str(cx, y, &run, self.dim);
                }
                let n = run.chars().count();
                cx += n;
                offset += n;
            }
        }
    }

    fn banner(&mut self, text: &str, fg: Color) {
        let y = GRID_ROW + GRID_ROWS / 2;
        let x = self.term_w.saturating_sub(text.chars().count()) / 2;
        self.front.put_str(x, y, text, fg);
    }

    fn banner_on(&mut self, text: &str, fg: Color, bg: Color) {
        let y = GRID_ROW + GRID_ROWS / 2;
        let x = self.term_w.saturating_sub(text.chars().count()) / 2;
        self.front.put_str_on(x, y, text, fg, bg);
    }

    // ── Frame plumbing ──

    fn begin_frame(&mut self, screen: Screen) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        if self.last_screen != Some(screen) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_screen = Some(screen);
        }

        self.front.clear();
        Ok(())
    }

    fn end_frame(&mut self) -> io::Result<()> {
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    /// Emit only the cells that changed since the previous frame.
    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        queue!(
            self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
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
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }
}

fn rgb(base: (u8, u8, u8), scale: f32) -> Color {
    Color::Rgb {
        r: (base.0 as f32 * scale) as u8,
        g: (base.1 as f32 * scale) as u8,
        b: (base.2 as f32 * scale) as u8,
    }
}

/// Tiny deterministic jitter source for the glitch effect.
fn lcg(seed: usize) -> usize {
    seed.wrapping_mul(1103515245).wrapping_add(12345) >> 8
}
