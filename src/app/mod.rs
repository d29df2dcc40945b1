mod event_loop;
mod input;
mod render;
mod terminal;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::controller::VmMonitor;
use crate::hypervisor::{Connector, Credentials};
use crate::lifecycle::{LifecycleDispatcher, DRAIN_GRACE};
use crate::view::{Palette, Presenter};

pub use input::{handle_key, keymap, Command, InputResult};
pub use terminal::{restore_terminal, TerminalGuard};

/// Shortest and longest accepted sampling interval, in seconds.
pub const MIN_DELAY_SECS: f64 = 0.1;
pub const MAX_DELAY_SECS: f64 = 86_400.0;

/// Sampling interval for a `--delay` value. Fractions are allowed; values
/// outside the accepted range are clamped.
pub fn tick_interval(secs: f64) -> Duration {
    if secs.is_nan() {
        return Duration::from_secs_f64(MIN_DELAY_SECS);
    }
    Duration::from_secs_f64(secs.clamp(MIN_DELAY_SECS, MAX_DELAY_SECS))
}

/// Everything `run` needs from the command line and config file.
pub struct RunOptions {
    pub connector: Arc<dyn Connector>,
    pub endpoints: Vec<String>,
    pub credentials: Credentials,
    pub neighbor_table: PathBuf,
    pub active_only: bool,
    pub delay: Duration,
    pub palette: Palette,
}

/// Main application state and event loop.
pub struct App {
    pub monitor: VmMonitor,
    pub dispatcher: LifecycleDispatcher,
    pub palette: Palette,
    pub status_message: Option<String>,
    pub last_tick: Instant,
    pub tick_rate: Duration,
}

impl App {
    pub fn new(options: RunOptions, rt: Arc<tokio::runtime::Runtime>) -> Self {
        let RunOptions {
            connector,
            endpoints,
            credentials,
            neighbor_table,
            active_only,
            delay,
            palette,
        } = options;

        let dispatcher = LifecycleDispatcher::new(Arc::clone(&connector), credentials.clone(), rt);
        let monitor = VmMonitor::new(connector, endpoints, credentials, neighbor_table, active_only);

        Self {
            monitor,
            dispatcher,
            palette,
            status_message: None,
            last_tick: Instant::now().checked_sub(delay).unwrap_or_else(Instant::now),
            tick_rate: delay,
        }
    }
}

/// Run the application. Sets up terminal, runs the main loop, restores terminal on exit.
pub fn run(options: RunOptions, should_quit: Arc<AtomicBool>) -> io::Result<()> {
    let rt = Arc::new(
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .worker_threads(2)
            .build()?,
    );

    let guard = TerminalGuard::acquire()?;
    let mut app = App::new(options, Arc::clone(&rt));
    tracing::info!(endpoints = ?app.monitor.endpoints(), tick = ?app.tick_rate, "dashboard started");

    let result = main_loop(&mut app, &should_quit);
    drop(guard);
    if let Err(ref e) = result {
        tracing::error!(error = %e, "main loop failed");
    }
    shutdown(app, rt, DRAIN_GRACE);
    result
}

fn main_loop(app: &mut App, should_quit: &AtomicBool) -> io::Result<()> {
    let mut stdout = io::stdout();
    let mut needs_render = true;

    loop {
        if should_quit.load(Ordering::Relaxed) {
            tracing::info!("signal received");
            return Ok(());
        }

        let now = Instant::now();

        if app.process_tick() {
            needs_render = true;
        }
        if app.poll_actions() {
            needs_render = true;
        }

        if needs_render {
            let size = crossterm::terminal::size()?;
            if !Presenter::render_size_guard(&mut stdout, size)? {
                render::render(app, &mut stdout, size)?;
            }
            needs_render = false;
        }

        let timeout = app.tick_rate.saturating_sub(now.elapsed());
        if crossterm::event::poll(timeout.min(Duration::from_millis(100)))? {
            match crossterm::event::read()? {
                crossterm::event::Event::Key(key_event) => match handle_key(app, key_event) {
                    Some(InputResult::Quit) => return Ok(()),
                    Some(InputResult::Consumed) => needs_render = true,
                    None => {}
                },
                crossterm::event::Event::Resize(_, _) => needs_render = true,
                _ => {}
            }
        }
    }
}

/// Drain lifecycle requests for at most `grace`, then stop the runtime
/// without waiting on abandoned blocking tasks.
fn shutdown(mut app: App, rt: Arc<tokio::runtime::Runtime>, grace: Duration) {
    let abandoned = app.dispatcher.drain(grace);
    tracing::info!(abandoned, "dashboard stopped");

    drop(app);
    match Arc::try_unwrap(rt) {
        Ok(rt) => rt.shutdown_background(),
        Err(_) => tracing::warn!("runtime still shared at exit"),
    }
}
