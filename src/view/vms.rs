use std::io::{self, Write};

use crossterm::{
    cursor::MoveTo,
    queue,
    style::{Print, ResetColor, SetAttribute, Attribute},
};

use crate::layout::{column_widths, tabulate};
use crate::model::{Viewport, VmRecord};
use super::shared::{clip, cpu_seconds, size_abr};
use super::{Palette, Pair};

pub const HEADERS: [&str; 14] = [
    "ID",
    "NAME",
    "CPU",
    "MEM_ACTUAL",
    "MEM_AVAIL",
    "NET_WRITE_B",
    "NET_READ_B",
    "MAC",
    "IP",
    "IO_READ_B",
    "IO_WRITE_B",
    "SNAPSHOTS",
    "URI",
    "STORAGE_POOL",
];

/// Index of the NAME column in `HEADERS`.
pub const NAME_COLUMN: usize = 1;

/// Padding after every column.
pub const COLUMN_PADDING: usize = 2;

/// Memory stats come in KiB.
const KIB: u64 = 1024;

/// The table laid out once per frame, over every row, so column widths do
/// not jump while scrolling.
pub struct Table {
    pub header: String,
    pub lines: Vec<String>,
    pub widths: Vec<usize>,
}

/// One stringified column per header, one cell per record.
pub fn columns(rows: &[VmRecord]) -> Vec<Vec<String>> {
    let mut cols: Vec<Vec<String>> = HEADERS.iter().map(|_| Vec::with_capacity(rows.len())).collect();
    for r in rows {
        let cells = [
            r.id.map_or_else(|| "-".to_string(), |id| id.to_string()),
            r.name.clone(),
            r.cpu_seconds.render(|s| cpu_seconds(*s)),
            r.mem_actual_kib.render(|k| size_abr(*k, KIB)),
            r.mem_available_kib.render(|k| size_abr(*k, KIB)),
            r.net_tx_bytes.render(|b| size_abr(*b, 1)),
            r.net_rx_bytes.render(|b| size_abr(*b, 1)),
            r.mac.to_string(),
            r.ip.to_string(),
            r.disk_read_bytes.render(|b| size_abr(*b, 1)),
            r.disk_write_bytes.render(|b| size_abr(*b, 1)),
            r.snapshots.to_string(),
            r.uri.clone(),
            r.storage_pool.to_string(),
        ];
        for (col, cell) in cols.iter_mut().zip(cells) {
            col.push(cell);
        }
    }
    cols
}

pub fn build_table(rows: &[VmRecord]) -> Table {
    let cols = columns(rows);
    let mut lines = tabulate(COLUMN_PADDING, Some(&HEADERS[..]), false, &cols);
    let header = lines.remove(0);
    Table {
        header,
        lines,
        widths: column_widths(COLUMN_PADDING, Some(&HEADERS[..]), false, &cols),
    }
}

/// Char range of the NAME column within a table line.
fn name_span(widths: &[usize]) -> (usize, usize) {
    let start: usize = widths[..NAME_COLUMN].iter().sum();
    (start, start + widths[NAME_COLUMN])
}

fn split_chars(s: &str, at: usize) -> (&str, &str) {
    match s.char_indices().nth(at) {
        Some((idx, _)) => s.split_at(idx),
        None => (s, ""),
    }
}

fn paint(out: &mut impl Write, text: &str, pair: Pair) -> io::Result<()> {
    queue!(out, pair.fg(), pair.bg(), Print(text), ResetColor)
}

/// Screen area of the table body, inside the box.
#[derive(Clone, Copy, Debug)]
pub struct Area {
    pub x: u16,
    pub y: u16,
    pub width: usize,
    pub height: usize,
}

/// Paint the header line and the visible window of rows.
pub fn render_table(
    out: &mut impl Write,
    table: &Table,
    rows: &[VmRecord],
    viewport: &Viewport,
    palette: &Palette,
    area: Area,
) -> io::Result<()> {
    let width = area.width;
    queue!(out, MoveTo(area.x, area.y), SetAttribute(Attribute::Bold))?;
    paint(out, &format!("{:<width$}", clip(&table.header, width), width = width), palette.active_row)?;
    queue!(out, SetAttribute(Attribute::Reset))?;

    let body_height = area.height.saturating_sub(1);
    if rows.is_empty() {
        queue!(out, MoveTo(area.x, area.y + 1))?;
        paint(out, &format!("{:<width$}", clip("  No domains found.", width), width = width), palette.inactive_row)?;
        return Ok(());
    }

    let (name_start, name_end) = name_span(&table.widths);
    for (line_no, idx) in viewport.window(rows.len(), body_height).enumerate() {
        let line = format!("{:<width$}", clip(&table.lines[idx], width), width = width);
        queue!(out, MoveTo(area.x, area.y + 1 + line_no as u16))?;

        if idx == viewport.selected {
            paint(out, &line, palette.selected)?;
            continue;
        }

        let row_pair = if rows[idx].is_active() { palette.active_row } else { palette.inactive_row };
        let (before, rest) = split_chars(&line, name_start);
        let (name, after) = split_chars(rest, name_end - name_start);
        paint(out, before, row_pair)?;
        paint(out, name, palette.name_column)?;
        paint(out, after, row_pair)?;
    }
    Ok(())
}
