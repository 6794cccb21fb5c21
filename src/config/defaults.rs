use crossterm::event::KeyCode;

use crate::config::key::{Key, KeyBinding};
use crate::config::keybindings::*;

impl Default for GlobalKeybindings {
    fn default() -> Self {
        Self {
            quit: Key::char('q').into(),
            back: Key::new(KeyCode::Esc).into(),
            debug: KeyBinding::keys(&[Key::char('D'), Key::new(KeyCode::F(12))]),
            projects: Key::char('p').into(),
            next_product: Key::new(KeyCode::Tab).into(),
            prev_product: Key::new(KeyCode::BackTab).into(),
        }
    }
}

impl Default for NavigationKeybindings {
    fn default() -> Self {
        Self {
            up: KeyBinding::keys(&[Key::char('k'), Key::new(KeyCode::Up)]),
            down: KeyBinding::keys(&[Key::char('j'), Key::new(KeyCode::Down)]),
            page_up: Key::new(KeyCode::PageUp).into(),
            page_down: Key::new(KeyCode::PageDown).into(),
            home: KeyBinding::keys(&[Key::char('g'), Key::new(KeyCode::Home)]),
            end: KeyBinding::keys(&[Key::char('G'), Key::new(KeyCode::End)]),
            select: Key::new(KeyCode::Enter).into(),
        }
    }
}

impl Default for FilterKeybindings {
    fn default() -> Self {
        Self {
            toggle: Key::char('/').into(),
            exit: Key::new(KeyCode::Esc).into(),
        }
    }
}

impl Default for ResourceKeybindings {
    fn default() -> Self {
        Self {
            reload: Key::char('r').into(),
            create: Key::char('n').into(),
            delete: KeyBinding::keys(&[Key::char('d'), Key::new(KeyCode::Delete)]),
            copy: Key::char('y').into(),
            ssh: Key::char('s').into(),
            ssh_on_exit: Key::char('S').into(),
        }
    }
}

impl Default for DialogKeybindings {
    fn default() -> Self {
        Self {
            confirm: KeyBinding::keys(&[Key::char('y'), Key::char('Y'), Key::new(KeyCode::Enter)]),
            cancel: KeyBinding::keys(&[Key::char('n'), Key::char('N'), Key::new(KeyCode::Esc)]),
            dismiss: KeyBinding::keys(&[
                Key::new(KeyCode::Enter),
                Key::new(KeyCode::Esc),
                Key::char('q'),
            ]),
        }
    }
}

impl Default for FormKeybindings {
    fn default() -> Self {
        Self {
            next_field: KeyBinding::keys(&[Key::new(KeyCode::Tab), Key::new(KeyCode::Down)]),
            prev_field: KeyBinding::keys(&[Key::new(KeyCode::BackTab), Key::new(KeyCode::Up)]),
            toggle: Key::char(' ').into(),
        }
    }
}

impl Default for DebugKeybindings {
    fn default() -> Self {
        Self {
            clear: Key::char('c').into(),
        }
    }
}
