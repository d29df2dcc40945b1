use std::time::Instant;

use super::App;

impl App {
    /// Resample every endpoint once `tick_rate` has elapsed.
    pub fn process_tick(&mut self) -> bool {
        let now = Instant::now();
        if now.duration_since(self.last_tick) < self.tick_rate {
            return false;
        }

        self.monitor.update();
        tracing::debug!(rows = self.monitor.rows.len(), failed = self.monitor.failed_endpoints.len(), "sampled");

        self.last_tick = now;
        true
    }

    /// Reap finished lifecycle requests; the last outcome becomes the status line.
    pub fn poll_actions(&mut self) -> bool {
        if self.dispatcher.in_flight() == 0 {
            return false;
        }
        let finished = self.dispatcher.reap();
        let Some(last) = finished.last() else {
            return false;
        };
        self.status_message = Some(match &last.result {
            Ok(()) => format!("{} {}: done", last.action, last.target.name),
            Err(e) => format!("{} {} failed: {}", last.action, last.target.name, e),
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    use crate::app::{handle_key, App, InputResult, RunOptions};
    use crate::hypervisor::mock::{MockCall, MockConnector, MockDomain};
    use crate::hypervisor::Credentials;
    use crate::view::Palette;

    const URI: &str = "qemu:///system";

    fn runtime() -> Arc<tokio::runtime::Runtime> {
        Arc::new(
            tokio::runtime::Builder::new_multi_thread()
                .worker_threads(1)
                .enable_all()
                .build()
                .unwrap(),
        )
    }

    fn app(hv: &MockConnector) -> App {
        let options = RunOptions {
            connector: Arc::new(hv.clone()),
            endpoints: vec![URI.to_string()],
            credentials: Credentials::default(),
            neighbor_table: "/nonexistent/arp".into(),
            active_only: false,
            delay: Duration::from_secs(5),
            palette: Palette::default(),
        };
        App::new(options, runtime())
    }

    fn press(app: &mut App, c: char) -> Option<InputResult> {
        handle_key(app, KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
    }

    fn wait_for_reap(app: &mut App) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !app.poll_actions() {
            assert!(Instant::now() < deadline, "lifecycle task never finished");
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    #[test]
    fn first_tick_samples_immediately() {
        let hv = MockConnector::new();
        hv.add_domain(URI, MockDomain::running(1, "web1"));
        let mut app = app(&hv);
        assert!(app.process_tick());
        assert_eq!(app.monitor.rows.len(), 1);
        assert!(!app.process_tick());
    }

    #[test]
    fn navigation_wraps() {
        let hv = MockConnector::new();
        hv.add_domain(URI, MockDomain::running(1, "web1"));
        hv.add_domain(URI, MockDomain::stopped("web2"));
        let mut app = app(&hv);
        app.process_tick();

        assert_eq!(press(&mut app, 'j'), Some(InputResult::Consumed));
        assert_eq!(app.monitor.viewport.selected, 1);
        press(&mut app, 'j');
        assert_eq!(app.monitor.viewport.selected, 0);
        press(&mut app, 'k');
        assert_eq!(app.monitor.viewport.selected, 1);
        press(&mut app, 'g');
        assert_eq!(app.monitor.viewport.selected, 0);
        press(&mut app, 'G');
        assert_eq!(app.monitor.viewport.selected, 1);
        assert_eq!(press(&mut app, 'q'), Some(InputResult::Quit));
        assert_eq!(press(&mut app, 'x'), None);
    }

    #[test]
    fn start_reaches_backend_for_selected_row() {
        let hv = MockConnector::new();
        hv.add_domain(URI, MockDomain::running(1, "web1"));
        hv.add_domain(URI, MockDomain::stopped("web2"));
        let mut app = app(&hv);
        app.process_tick();

        press(&mut app, 'G');
        press(&mut app, 's');
        assert_eq!(app.status_message.as_deref(), Some("start requested: web2"));
        wait_for_reap(&mut app);

        assert_eq!(app.status_message.as_deref(), Some("start web2: done"));
        assert!(hv.calls().contains(&MockCall::Lifecycle {
            uri: URI.into(),
            domain: "web2".into(),
            action: "start".into(),
        }));
        assert!(hv.domain_id(URI, "web2").is_some());
    }

    #[test]
    fn failed_request_is_reported_in_status() {
        let hv = MockConnector::new();
        hv.add_domain(URI, MockDomain::stopped("web2"));
        let mut app = app(&hv);
        app.process_tick();
        hv.refuse(URI);

        press(&mut app, 'h');
        wait_for_reap(&mut app);
        let status = app.status_message.clone().unwrap();
        assert!(status.starts_with("shutdown web2 failed"), "{}", status);
    }

    #[test]
    fn lifecycle_without_rows_is_a_no_op() {
        let hv = MockConnector::new();
        let mut app = app(&hv);
        app.process_tick();
        press(&mut app, 'd');
        assert_eq!(app.dispatcher.in_flight(), 0);
        assert_eq!(app.status_message.as_deref(), Some("destroy: no domain selected"));
    }
}
