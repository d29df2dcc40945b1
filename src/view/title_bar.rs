use std::io::{self, Write};
use crossterm::{
    cursor, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
};

use super::shared::clip;

/// Counts shown in the title bar.
pub struct Summary<'a> {
    pub endpoints: usize,
    pub failed_endpoints: &'a [String],
    pub active: usize,
    pub total: usize,
    pub time: &'a str,
}

pub fn render_title_bar(out: &mut impl Write, summary: &Summary<'_>, cols: u16) -> io::Result<()> {
    queue!(out, cursor::MoveTo(0, 0))?;
    queue!(out, SetBackgroundColor(Color::DarkBlue), SetForegroundColor(Color::White))?;
    let left = format!(
        " virttop  {} endpoint{}  {} running / {} domains ",
        summary.endpoints,
        if summary.endpoints == 1 { "" } else { "s" },
        summary.active,
        summary.total,
    );
    write!(out, "{}", clip(&left, cols as usize))?;
    queue!(out, ResetColor)?;

    let mut used = left.chars().count();
    if !summary.failed_endpoints.is_empty() {
        let warn = format!("  unreachable: {} ", summary.failed_endpoints.join(", "));
        let room = (cols as usize).saturating_sub(used);
        queue!(out, SetForegroundColor(Color::Yellow), Print(clip(&warn, room)), ResetColor)?;
        used += warn.chars().count().min(room);
    }

    // Right-align the time
    let time_str = format!(" {} ", summary.time);
    let col = (cols as usize).saturating_sub(time_str.len());
    if col >= used {
        queue!(out, cursor::MoveTo(col as u16, 0), SetForegroundColor(Color::DarkGrey))?;
        write!(out, "{}", time_str)?;
        queue!(out, ResetColor)?;
    }
    Ok(())
}
