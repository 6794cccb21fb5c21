use crate::config::key::KeyBinding;
use crate::config::keybindings::KeybindingsConfig;

/// An action that can be looked up in the keybinding configuration.
pub trait Action: Copy {
    fn binding(self, keybindings: &KeybindingsConfig) -> &KeyBinding;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalAction {
    Quit,
    Back,
    Debug,
    Projects,
    NextProduct,
    PrevProduct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavAction {
    Up,
    Down,
    PageUp,
    PageDown,
    Home,
    End,
    Select,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterAction {
    Toggle,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceAction {
    Reload,
    Create,
    Delete,
    Copy,
    Ssh,
    SshOnExit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogAction {
    Confirm,
    Cancel,
    Dismiss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormAction {
    NextField,
    PrevField,
    Toggle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugAction {
    Clear,
}

impl Action for GlobalAction {
    fn binding(self, kb: &KeybindingsConfig) -> &KeyBinding {
        let kb = &kb.global;
        match self {
            Self::Quit => &kb.quit,
            Self::Back => &kb.back,
            Self::Debug => &kb.debug,
            Self::Projects => &kb.projects,
            Self::NextProduct => &kb.next_product,
            Self::PrevProduct => &kb.prev_product,
        }
    }
}

impl Action for NavAction {
    fn binding(self, kb: &KeybindingsConfig) -> &KeyBinding {
        let kb = &kb.navigation;
        match self {
            Self::Up => &kb.up,
            Self::Down => &kb.down,
            Self::PageUp => &kb.page_up,
            Self::PageDown => &kb.page_down,
            Self::Home => &kb.home,
            Self::End => &kb.end,
            Self::Select => &kb.select,
        }
    }
}

impl Action for FilterAction {
    fn binding(self, kb: &KeybindingsConfig) -> &KeyBinding {
        match self {
            Self::Toggle => &kb.filter.toggle,
            Self::Exit => &kb.filter.exit,
        }
    }
}

impl Action for ResourceAction {
    fn binding(self, kb: &KeybindingsConfig) -> &KeyBinding {
        let kb = &kb.resource;
        match self {
            Self::Reload => &kb.reload,
            Self::Create => &kb.create,
            Self::Delete => &kb.delete,
            Self::Copy => &kb.copy,
            Self::Ssh => &kb.ssh,
            Self::SshOnExit => &kb.ssh_on_exit,
        }
    }
}

impl Action for DialogAction {
    fn binding(self, kb: &KeybindingsConfig) -> &KeyBinding {
        let kb = &kb.dialog;
        match self {
            Self::Confirm => &kb.confirm,
            Self::Cancel => &kb.cancel,
            Self::Dismiss => &kb.dismiss,
        }
    }
}

impl Action for FormAction {
    fn binding(self, kb: &KeybindingsConfig) -> &KeyBinding {
        let kb = &kb.form;
        match self {
            Self::NextField => &kb.next_field,
            Self::PrevField => &kb.prev_field,
            Self::Toggle => &kb.toggle,
        }
    }
}

impl Action for DebugAction {
    fn binding(self, kb: &KeybindingsConfig) -> &KeyBinding {
        match self {
            Self::Clear => &kb.debug.clear,
        }
    }
}
