use std::io::{self, Write};

use crate::view::{Presenter, Summary};

use super::App;

pub fn render(app: &App, out: &mut impl Write, size: (u16, u16)) -> io::Result<()> {
    let monitor = &app.monitor;
    let time_str = monitor.last_update.as_deref().unwrap_or("...");
    let summary = Summary {
        endpoints: monitor.endpoints().len(),
        failed_endpoints: &monitor.failed_endpoints,
        active: monitor.active_count(),
        total: monitor.rows.len(),
        time: time_str,
    };

    Presenter::render(
        out,
        size,
        &summary,
        &monitor.rows,
        &monitor.viewport,
        &app.palette,
        app.status_message.as_deref(),
    )
}
