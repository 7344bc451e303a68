/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` (a grid of Cells)
///   2. Compare each cell with `back` (the previous frame)
///   3. Emit terminal commands only for cells that changed
///   4. Batch everything with `queue!`, flush once, swap buffers
///
/// Game cells are drawn two terminal columns wide so the playfield is
/// roughly square on common fonts.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::entity::{Element, LifeState};
use crate::domain::tile::Tile;
use crate::sim::ranking::RankingBoard;
use crate::sim::world::World;

const CELL_W: usize = 2;
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

const BASE_BG: Color = Color::Rgb { r: 18, g: 18, b: 28 };
const FIRE_COLOR: Color = Color::Rgb { r: 255, g: 110, b: 60 };
const WATER_COLOR: Color = Color::Rgb { r: 80, g: 180, b: 255 };

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: BASE_BG };

    /// Different from any drawable cell, so every position re-renders.
    const INVALID: Cell = Cell { ch: '\0', fg: Color::Magenta, bg: Color::Magenta };
}

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

    fn fill(&mut self, cell: Cell) {
        self.cells.fill(cell);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        let mut cx = x;
        for ch in s.chars() {
            if cx >= self.width {
                break;
            }
            self.set(cx, y, Cell { ch, fg, bg });
            cx += 1;
        }
    }

    fn put_centered(&mut self, y: usize, s: &str, fg: Color, bg: Color) {
        let len = s.chars().count();
        let x = self.width.saturating_sub(len) / 2;
        self.put_str(x, y, s, fg, bg);
    }
}

// ── HUD data handed over by the game loop ──

pub struct Hud<'a> {
    pub stage_name: &'a str,
    pub stage_idx: usize,
    pub stage_count: usize,
    pub elapsed: f32,
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(BASE_BG),
            Clear(ClearType::All),
        )
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            cursor::Show,
            terminal::LeaveAlternateScreen,
        )?;
        terminal::disable_raw_mode()
    }

    fn begin_frame(&mut self) -> io::Result<()> {
        let (w, h) = terminal::size()?;
        let (w, h) = (w as usize, h as usize);
        if (w, h) != (self.term_w, self.term_h) {
            self.term_w = w;
            self.term_h = h;
            self.front.resize(w, h);
            self.back.resize(w, h);
            self.back.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(BASE_BG), Clear(ClearType::All))?;
        }
        self.front.clear();
        Ok(())
    }

    /// Diff front against back, emit changed cells, swap.
    fn flush_frame(&mut self) -> io::Result<()> {
        let mut fg = Color::Reset;
        let mut bg = Color::Reset;
        for y in 0..self.front.height {
            let mut x = 0;
            while x < self.front.width {
                let idx = y * self.front.width + x;
                let cell = self.front.cells[idx];
                if cell == self.back.cells[idx] {
                    x += 1;
                    continue;
                }
                queue!(self.writer, MoveTo(x as u16, y as u16))?;
                // Run of changed cells from here.
                while x < self.front.width {
                    let idx = y * self.front.width + x;
                    let cell = self.front.cells[idx];
                    if cell == self.back.cells[idx] {
                        break;
                    }
                    if cell.fg != fg {
                        queue!(self.writer, SetForegroundColor(cell.fg))?;
                        fg = cell.fg;
                    }
                    if cell.bg != bg {
                        queue!(self.writer, SetBackgroundColor(cell.bg))?;
                        bg = cell.bg;
                    }
                    queue!(self.writer, Print(cell.ch))?;
                    x += 1;
                }
            }
        }
        std::mem::swap(&mut self.front, &mut self.back);
        self.writer.flush()
    }

    // ── Playfield ──

    pub fn render_playing(
        &mut self,
        world: &World,
        hud: &Hud,
        banner: Option<&str>,
    ) -> io::Result<()> {
        self.begin_frame()?;

        let hud_line = format!(
            "EMBER & TIDE  {} ({}/{})   gems {}:{}   deaths {}   {}   [R]estart  [Esc] menu",
            hud.stage_name,
            hud.stage_idx + 1,
            hud.stage_count,
            world.gem_count(Element::Fire),
            world.gem_count(Element::Water),
            world.deaths,
            format_time(hud.elapsed),
        );
        self.front.put_str(1, HUD_ROW, &hud_line, Color::White, BASE_BG);

        let off_x = self
            .term_w
            .saturating_sub(world.width as usize * CELL_W)
            / 2;

        // Terrain.
        for y in 0..world.height {
            for x in 0..world.width {
                let (s, fg) = self.tile_glyph(world, x, y);
                self.front.put_str(
                    off_x + x as usize * CELL_W,
                    MAP_ROW + y as usize,
                    s,
                    fg,
                    BASE_BG,
                );
            }
        }

        // Overlay: lifts, platforms, then characters on top.
        for lift in &world.lifts {
            let row = lift.row();
            for i in 0..lift.width {
                self.front.put_str(
                    off_x + (lift.x + i) as usize * CELL_W,
                    MAP_ROW + row as usize,
                    "──",
                    Color::White,
                    BASE_BG,
                );
            }
        }
        for plat in &world.platforms {
            if !plat.active {
                continue;
            }
            let (px, py) = plat.rounded();
            self.front.put_str(
                off_x + px as usize * CELL_W,
                MAP_ROW + py as usize,
                "══",
                Color::DarkGreen,
                BASE_BG,
            );
        }
        for p in &world.players {
            let (glyph, color) = match (p.elem, p.state) {
                (_, LifeState::Dead) => ("x ", Color::DarkGrey),
                (Element::Fire, _) => ("@ ", FIRE_COLOR),
                (Element::Water, _) => ("@ ", WATER_COLOR),
            };
            if p.x >= 0 && p.y >= 0 {
                self.front.put_str(
                    off_x + p.x as usize * CELL_W,
                    MAP_ROW + p.y as usize,
                    glyph,
                    color,
                    BASE_BG,
                );
            }
        }

        if let Some(text) = banner {
            let row = MAP_ROW + world.height as usize + 1;
            self.front.put_centered(row, text, Color::Yellow, BASE_BG);
        }

        self.flush_frame()
    }

    fn tile_glyph(&self, world: &World, x: i32, y: i32) -> (&'static str, Color) {
        match world.tile_at(x, y) {
            Tile::Empty | Tile::Platform | Tile::Lift | Tile::BarrierMark => ("  ", Color::White),
            Tile::Wall => ("██", Color::DarkGrey),
            Tile::Floor => ("▒▒", Color::Grey),
            Tile::FireTerrain => ("~~", FIRE_COLOR),
            Tile::WaterTerrain => ("~~", WATER_COLOR),
            Tile::Crate => ("[]", Color::Yellow),
            Tile::Switch => {
                let lit = world
                    .switch_at(x, y)
                    .map_or(false, |i| world.switches[i].activated);
                ("oo", if lit { Color::Green } else { Color::DarkYellow })
            }
            Tile::Door => ("▐▌", Color::Magenta),
            Tile::Barrier => ("||", Color::DarkCyan),
            Tile::FireGem => ("**", FIRE_COLOR),
            Tile::WaterGem => ("**", WATER_COLOR),
            Tile::FireSpawn => (". ", Color::DarkRed),
            Tile::WaterSpawn => (". ", Color::DarkBlue),
            Tile::Exit => ("◊◊", Color::Green),
        }
    }

    // ── Menu screens ──

    pub fn render_title(&mut self, cursor: usize, stage_count: usize) -> io::Result<()> {
        self.begin_frame()?;

        let art = [
            "▄▄▄▄▄ ▄   ▄ ▄▄▄▄  ▄▄▄▄▄ ▄▄▄▄        ▄▄▄",
            "█     ██ ██ █   █ █     █   █       █   █",
            "█▄▄▄  █ █ █ █▄▄▄▀ █▄▄▄  █▄▄▄▀       ▀▄▀▄▀",
            "█     █   █ █   █ █     █  █         █ █",
            "█▄▄▄▄ █   █ █▄▄▄▀ █▄▄▄▄ █   █        ▀▄▀",
            "",
            "▄▄▄▄▄ ▄▄▄ ▄▄▄▄   ▄▄▄▄▄",
            "  █    █  █   █  █",
            "  █    █  █   █  █▄▄▄",
            "  █    █  █   █  █",
            "  █   ▄█▄ █▄▄▄▀  █▄▄▄▄",
        ];
        for (i, line) in art.iter().enumerate() {
            let color = if i < 5 { FIRE_COLOR } else { WATER_COLOR };
            self.front.put_centered(2 + i, line, color, BASE_BG);
        }

        let menu = ["Play", "How to Play", "Rankings", "Quit"];
        let base = 2 + art.len() + 2;
        for (i, item) in menu.iter().enumerate() {
            let (text, color) = if i == cursor {
                (format!("▶ {item} ◀"), Color::Yellow)
            } else {
                (format!("  {item}  "), Color::White)
            };
            self.front.put_centered(base + i * 2, &text, color, BASE_BG);
        }

        self.front.put_centered(
            base + menu.len() * 2 + 1,
            &format!("↑/↓ + Enter ⋅ 1-{} jumps straight to a stage", stage_count.min(9)),
            Color::DarkGrey,
            BASE_BG,
        );

        self.flush_frame()
    }

    pub fn render_howto(&mut self) -> io::Result<()> {
        self.begin_frame()?;

        let lines = [
            ("HOW TO PLAY", Color::Yellow),
            ("", Color::White),
            ("Two characters, one keyboard, one exit.", Color::White),
            ("", Color::White),
            ("Ember (red)   ← → move, ↑ jump. Walks on ~fire~, dies in water.", FIRE_COLOR),
            ("Tide  (blue)  A D move,  W jump. Swims in ~water~, dies in fire.", WATER_COLOR),
            ("", Color::White),
            ("** gems    are collected only by the matching character.", Color::White),
            ("[] crates  can be pushed, stack, and hold switches down.", Color::White),
            ("oo switches open every ▐▌ door while anything stands on them.", Color::White),
            ("|| barriers retract only while a crate rests on their switch.", Color::White),
            ("── lifts glide to their far stop while their switch is held.", Color::White),
            ("══ moving platforms carry whoever rides them.", Color::White),
            ("", Color::White),
            ("Bring BOTH characters to the ◊◊ exit. Fastest runs enter the", Color::White),
            ("leaderboard. R restarts a stage, Esc returns to this menu.", Color::White),
            ("", Color::White),
            ("Press Esc or Enter to go back.", Color::DarkGrey),
        ];
        for (i, (line, color)) in lines.iter().enumerate() {
            self.front.put_centered(2 + i, line, *color, BASE_BG);
        }

        self.flush_frame()
    }

    pub fn render_ranking(&mut self, board: &RankingBoard) -> io::Result<()> {
        self.begin_frame()?;

        self.front.put_centered(2, "TOP RUNS", Color::Yellow, BASE_BG);
        self.front.put_centered(
            4,
            "  #  name              time     deaths",
            Color::DarkCyan,
            BASE_BG,
        );
        self.front.put_centered(
            5,
            "───────────────────────────────────────",
            Color::DarkCyan,
            BASE_BG,
        );

        if board.entries.is_empty() {
            self.front.put_centered(7, "No runs recorded yet.", Color::White, BASE_BG);
        } else {
            for (i, e) in board.entries.iter().enumerate() {
                let color = match i {
                    0 => Color::Yellow,
                    1 => Color::White,
                    2 => Color::DarkYellow,
                    _ => Color::Grey,
                };
                let line = format!(
                    " {:2}  {:<16}  {}   {:3}",
                    i + 1,
                    e.name,
                    format_time(e.clear_time),
                    e.deaths,
                );
                self.front.put_centered(6 + i, &line, color, BASE_BG);
            }
        }

        self.front.put_centered(
            8 + board.entries.len().max(1),
            "Press Esc or Enter to go back.",
            Color::DarkGrey,
            BASE_BG,
        );

        self.flush_frame()
    }

    pub fn render_name_entry(&mut self, name: &str, elapsed: f32, deaths: u32) -> io::Result<()> {
        self.begin_frame()?;

        self.front.put_centered(3, "A RUN FOR THE BOOKS", Color::Yellow, BASE_BG);
        self.front.put_centered(
            5,
            &format!("cleared in {}  ⋅  {} deaths", format_time(elapsed), deaths),
            Color::White,
            BASE_BG,
        );
        self.front.put_centered(8, "Enter your name:", Color::White, BASE_BG);
        self.front
            .put_centered(10, &format!("[ {:<16} ]", name), Color::Green, BASE_BG);
        self.front.put_centered(
            13,
            "Enter to record ⋅ Esc to skip",
            Color::DarkGrey,
            BASE_BG,
        );

        self.flush_frame()
    }

    pub fn render_finale(&mut self, elapsed: f32, deaths: u32, gems: u32) -> io::Result<()> {
        self.begin_frame()?;

        self.front.put_centered(4, "BOTH MADE IT OUT", Color::Green, BASE_BG);
        self.front.put_centered(
            6,
            &format!(
                "time {}  ⋅  gems {}  ⋅  deaths {}",
                format_time(elapsed),
                gems,
                deaths
            ),
            Color::White,
            BASE_BG,
        );
        self.front.put_centered(
            9,
            "Enter: back to the title ⋅ Esc: quit",
            Color::DarkGrey,
            BASE_BG,
        );

        self.flush_frame()
    }
}

fn format_time(seconds: f32) -> String {
    let total = seconds.max(0.0) as u32;
    format!("{:02}:{:02}", total / 60, total % 60)
}
