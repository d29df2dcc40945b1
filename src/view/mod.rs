mod shared;
mod title_bar;
mod vms;

use std::io::{self, Write};
use crossterm::{
    cursor, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal,
};

use crate::config::ColorConfig;
use crate::model::{Viewport, VmRecord};

pub use shared::{clip, cpu_seconds, size_abr, truncate_str};
pub use title_bar::Summary;
pub use vms::{build_table, columns, Area, Table, HEADERS, NAME_COLUMN};

/// Foreground/background colour pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pair {
    pub fg: Color,
    pub bg: Color,
}

impl Pair {
    pub fn from_codes(fg: u8, bg: u8) -> Self {
        Self {
            fg: Color::AnsiValue(fg),
            bg: Color::AnsiValue(bg),
        }
    }

    pub fn fg(&self) -> SetForegroundColor {
        SetForegroundColor(self.fg)
    }

    pub fn bg(&self) -> SetBackgroundColor {
        SetBackgroundColor(self.bg)
    }
}

/// Colours per screen role, from the `[color]` config table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette {
    pub name_column: Pair,
    pub active_row: Pair,
    pub inactive_row: Pair,
    pub frame: Pair,
    pub selected: Pair,
}

impl From<&ColorConfig> for Palette {
    fn from(c: &ColorConfig) -> Self {
        Self {
            name_column: Pair::from_codes(c.name_column_fg, c.name_column_bg),
            active_row: Pair::from_codes(c.active_row_fg, c.active_row_bg),
            inactive_row: Pair::from_codes(c.inactive_row_fg, c.inactive_row_bg),
            frame: Pair::from_codes(c.box_fg, c.box_bg),
            selected: Pair::from_codes(c.selected_fg, c.selected_bg),
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::from(&ColorConfig::default())
    }
}

pub struct Presenter;

/// Minimum terminal dimensions for usable rendering.
pub const MIN_COLS: u16 = 40;
pub const MIN_ROWS: u16 = 8;

/// Lines taken by everything but table rows: title, top border, header,
/// bottom border, status, footer.
pub const CHROME_ROWS: u16 = 6;

const HELP: &str = "q: Quit | j/k ↑/↓: Move | g/G: First/Last | s: Start | h: Shutdown | d: Destroy";

/// Table rows that fit on a terminal `rows` lines tall.
pub fn body_height(rows: u16) -> usize {
    rows.saturating_sub(CHROME_ROWS) as usize
}

impl Presenter {
    /// Check if the terminal is large enough. If not, render a "too small"
    /// message and return `true` (meaning "skip normal rendering").
    pub fn render_size_guard(out: &mut impl Write, (cols, rows): (u16, u16)) -> io::Result<bool> {
        if cols < MIN_COLS || rows < MIN_ROWS {
            queue!(out, terminal::Clear(terminal::ClearType::All), cursor::MoveTo(0, 0))?;
            let msg = format!(
                "Terminal too small ({}x{}). Resize to at least {}x{}.",
                cols, rows, MIN_COLS, MIN_ROWS
            );
            let y = rows / 2;
            let x = cols.saturating_sub(msg.len() as u16) / 2;
            queue!(out, cursor::MoveTo(x, y), SetForegroundColor(Color::Yellow))?;
            write!(out, "{}", clip(&msg, cols as usize))?;
            queue!(out, ResetColor)?;
            out.flush()?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Paint one full frame.
    pub fn render(
        out: &mut impl Write,
        (cols, rows): (u16, u16),
        summary: &Summary<'_>,
        records: &[VmRecord],
        viewport: &Viewport,
        palette: &Palette,
        status: Option<&str>,
    ) -> io::Result<()> {
        queue!(out, terminal::Clear(terminal::ClearType::All))?;
        title_bar::render_title_bar(out, summary, cols)?;

        let inner_width = cols.saturating_sub(2) as usize;
        let inner_height = rows.saturating_sub(CHROME_ROWS - 1) as usize;
        draw_box(out, palette.frame, 1, cols, inner_height as u16)?;

        let table = build_table(records);
        let area = Area { x: 1, y: 2, width: inner_width, height: inner_height };
        vms::render_table(out, &table, records, viewport, palette, area)?;

        if let Some(msg) = status {
            queue!(
                out,
                cursor::MoveTo(1, rows.saturating_sub(2)),
                SetForegroundColor(Color::Yellow),
                Print(truncate_str(msg, cols.saturating_sub(2) as usize)),
                ResetColor
            )?;
        }

        queue!(
            out,
            cursor::MoveTo(1, rows.saturating_sub(1)),
            SetForegroundColor(Color::DarkGrey),
            Print(clip(HELP, cols.saturating_sub(1) as usize)),
            ResetColor
        )?;

        out.flush()
    }
}

/// Frame `inner_height` lines starting below row `top`.
fn draw_box(out: &mut impl Write, pair: Pair, top: u16, cols: u16, inner_height: u16) -> io::Result<()> {
    let horizontal = "─".repeat(cols.saturating_sub(2) as usize);
    queue!(out, pair.fg(), pair.bg())?;
    queue!(out, cursor::MoveTo(0, top), Print(format!("┌{}┐", horizontal)))?;
    for y in top + 1..=top + inner_height {
        queue!(out, cursor::MoveTo(0, y), Print("│"), cursor::MoveTo(cols.saturating_sub(1), y), Print("│"))?;
    }
    queue!(out, cursor::MoveTo(0, top + inner_height + 1), Print(format!("└{}┘", horizontal)))?;
    queue!(out, ResetColor)
}
