use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::lifecycle::{LifecycleAction, Target};

use super::App;

/// Result of handling a key: Quit the app, or key was consumed (needs render).
/// None means the key was not handled.
#[derive(Debug, PartialEq, Eq)]
pub enum InputResult {
    Quit,
    Consumed,
}

/// What a key asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    NextRow,
    PreviousRow,
    FirstRow,
    LastRow,
    Quit,
    Lifecycle(LifecycleAction),
}

pub fn keymap(key_event: KeyEvent) -> Option<Command> {
    let KeyEvent { code, modifiers, .. } = key_event;

    if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
        return Some(Command::Quit);
    }

    match code {
        KeyCode::Char('q') | KeyCode::Esc => Some(Command::Quit),
        KeyCode::Char('j') | KeyCode::Down => Some(Command::NextRow),
        KeyCode::Char('k') | KeyCode::Up => Some(Command::PreviousRow),
        KeyCode::Char('g') | KeyCode::Home => Some(Command::FirstRow),
        KeyCode::Char('G') | KeyCode::End => Some(Command::LastRow),
        KeyCode::Char('s') => Some(Command::Lifecycle(LifecycleAction::Start)),
        KeyCode::Char('h') => Some(Command::Lifecycle(LifecycleAction::Shutdown)),
        KeyCode::Char('d') => Some(Command::Lifecycle(LifecycleAction::Destroy)),
        _ => None,
    }
}

/// Handle a key event. Returns Some(Quit) to exit, Some(Consumed) if key was handled and
/// a render is needed, None if the key was not handled.
pub fn handle_key(app: &mut App, key_event: KeyEvent) -> Option<InputResult> {
    let command = keymap(key_event)?;
    let total = app.monitor.rows.len();
    let viewport = &mut app.monitor.viewport;

    match command {
        Command::Quit => return Some(InputResult::Quit),
        Command::NextRow => viewport.next(total),
        Command::PreviousRow => viewport.previous(total),
        Command::FirstRow => viewport.first(),
        Command::LastRow => viewport.last(total),
        Command::Lifecycle(action) => {
            let Some(row) = app.monitor.selected() else {
                app.status_message = Some(format!("{}: no domain selected", action));
                return Some(InputResult::Consumed);
            };
            let target = Target {
                uri: row.uri.clone(),
                name: row.name.clone(),
            };
            app.status_message = Some(format!("{} requested: {}", action, target.name));
            app.dispatcher.dispatch(target, action);
        }
    }
    Some(InputResult::Consumed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventKind, KeyEventState};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn every_command_has_a_key() {
        let cases = [
            (KeyCode::Char('j'), Command::NextRow),
            (KeyCode::Down, Command::NextRow),
            (KeyCode::Char('k'), Command::PreviousRow),
            (KeyCode::Up, Command::PreviousRow),
            (KeyCode::Char('g'), Command::FirstRow),
            (KeyCode::Home, Command::FirstRow),
            (KeyCode::Char('G'), Command::LastRow),
            (KeyCode::End, Command::LastRow),
            (KeyCode::Char('q'), Command::Quit),
            (KeyCode::Esc, Command::Quit),
            (KeyCode::Char('s'), Command::Lifecycle(LifecycleAction::Start)),
            (KeyCode::Char('h'), Command::Lifecycle(LifecycleAction::Shutdown)),
            (KeyCode::Char('d'), Command::Lifecycle(LifecycleAction::Destroy)),
        ];
        for (code, expected) in cases {
            assert_eq!(keymap(key(code)), Some(expected), "{:?}", code);
        }
    }

    #[test]
    fn ctrl_c_quits() {
        let ev = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(keymap(ev), Some(Command::Quit));
        assert_eq!(keymap(key(KeyCode::Char('c'))), None);
    }

    #[test]
    fn unbound_keys_are_ignored() {
        assert_eq!(keymap(key(KeyCode::Char('x'))), None);
        assert_eq!(keymap(key(KeyCode::Tab)), None);
    }
}
