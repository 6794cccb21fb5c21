use std::sync::Arc;

use crossterm::event::KeyEvent;

use crate::config::actions::Action;
use crate::config::keybindings::KeybindingsConfig;

/// Maps key events onto configured actions.
#[derive(Debug, Default)]
pub struct KeyResolver {
    pub keybindings: Arc<KeybindingsConfig>,
}

impl KeyResolver {
    pub const fn new(keybindings: Arc<KeybindingsConfig>) -> Self {
        Self { keybindings }
    }

    pub fn matches<A: Action>(&self, event: &KeyEvent, action: A) -> bool {
        action.binding(&self.keybindings).matches(event)
    }

    /// Human-readable keys for an action, for the hint line.
    pub fn display<A: Action>(&self, action: A) -> String {
        action.binding(&self.keybindings).display()
    }
}
