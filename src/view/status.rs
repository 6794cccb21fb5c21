use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::Theme;
use crate::browser::model::NotificationKind;
use crate::browser::{Mode, Model, Product};
use crate::config::{
    DebugAction, DialogAction, FilterAction, GlobalAction, KeyResolver, NavAction, ResourceAction,
};

pub fn render(frame: &mut Frame, area: Rect, model: &Model, theme: &Theme) {
    let notification = model.notification.as_ref().map_or_else(
        || Line::from(""),
        |n| {
            let (icon, color) = match n.kind {
                NotificationKind::Success => ("✓", theme.success),
                NotificationKind::Info => ("•", theme.info),
                NotificationKind::Error => ("✗", theme.error),
            };
            Line::from(vec![
                Span::styled(format!(" {icon} "), Style::default().fg(color).add_modifier(Modifier::BOLD)),
                Span::styled(n.text.clone(), Style::default().fg(color)),
            ])
        },
    );

    let hints = hints(model);
    let mut spans = Vec::with_capacity(hints.len() * 3);
    for (key, label) in hints {
        spans.push(Span::styled(format!(" {key}"), Style::default().fg(theme.warning)));
        spans.push(Span::styled(format!(" {label}"), Style::default().fg(theme.muted)));
        spans.push(Span::styled("  ", Style::default()));
    }

    frame.render_widget(Paragraph::new(vec![notification, Line::from(spans)]), area);
}

/// Key hints for the active input handler.
fn hints(model: &Model) -> Vec<(String, &'static str)> {
    let keys: &KeyResolver = &model.keys;
    let nav = format!("{}/{}", keys.display(NavAction::Up), keys.display(NavAction::Down));

    if model.mode == Mode::Debug {
        return vec![
            (nav, "scroll"),
            (keys.display(DebugAction::Clear), "clear"),
            (keys.display(GlobalAction::Back), "close"),
        ];
    }
    if model.filter.active {
        return vec![
            ("Enter".to_string(), "apply"),
            (keys.display(FilterAction::Exit), "clear"),
        ];
    }

    let products = (
        format!(
            "{}/{}",
            keys.display(GlobalAction::NextProduct),
            keys.display(GlobalAction::PrevProduct)
        ),
        "product",
    );
    let debug = (keys.display(GlobalAction::Debug), "debug");
    let quit = (keys.display(GlobalAction::Quit), "quit");

    match model.mode {
        Mode::ProjectSelect => vec![
            (nav, "move"),
            (keys.display(NavAction::Select), "open"),
            (keys.display(ResourceAction::Reload), "reload"),
            debug,
            quit,
        ],
        Mode::Table => {
            let mut hints = vec![
                (nav, "move"),
                (keys.display(NavAction::Select), "detail"),
                (keys.display(FilterAction::Toggle), "filter"),
                (keys.display(ResourceAction::Reload), "reload"),
                (keys.display(ResourceAction::Delete), "delete"),
                (keys.display(ResourceAction::Copy), "copy id"),
            ];
            if model.current_product == Product::Instances {
                hints.push((keys.display(ResourceAction::Create), "create"));
                hints.push((keys.display(ResourceAction::Ssh), "ssh"));
            }
            hints.extend([products, (keys.display(GlobalAction::Projects), "projects"), debug, quit]);
            hints
        }
        Mode::Detail => {
            let mut hints = vec![
                (keys.display(GlobalAction::Back), "back"),
                (keys.display(ResourceAction::Reload), "reload"),
                (keys.display(ResourceAction::Delete), "delete"),
                (keys.display(ResourceAction::Copy), "copy id"),
            ];
            if model.current_product == Product::Instances {
                hints.push((keys.display(ResourceAction::Ssh), "ssh"));
                hints.push((keys.display(ResourceAction::SshOnExit), "ssh after exit"));
            }
            hints.extend([debug, quit]);
            hints
        }
        Mode::Loading => vec![(keys.display(GlobalAction::Back), "back"), products, debug, quit],
        Mode::Error | Mode::Empty => vec![
            (keys.display(ResourceAction::Reload), "retry"),
            (keys.display(GlobalAction::Back), "back"),
            products,
            (keys.display(GlobalAction::Projects), "projects"),
            debug,
            quit,
        ],
        Mode::DeleteConfirm => vec![
            (keys.display(DialogAction::Confirm), "delete"),
            (keys.display(DialogAction::Cancel), "cancel"),
        ],
        Mode::Wizard => wizard_hints(model, keys, nav),
        Mode::Debug => Vec::new(),
    }
}

fn wizard_hints(model: &Model, keys: &KeyResolver, nav: String) -> Vec<(String, &'static str)> {
    use crate::browser::wizard::{WizardPhase, WizardStep};

    let Some(wizard) = model.wizard.as_ref() else {
        return Vec::new();
    };
    match &wizard.phase {
        WizardPhase::Editing if wizard.form.is_some() => vec![
            ("Tab/BackTab".to_string(), "field"),
            ("Enter".to_string(), "activate"),
            (keys.display(GlobalAction::Back), "cancel"),
        ],
        WizardPhase::Editing => match wizard.step {
            WizardStep::Name => vec![
                ("Enter".to_string(), "next"),
                (keys.display(GlobalAction::Back), "back"),
            ],
            WizardStep::Confirm => vec![
                ("Enter".to_string(), "create"),
                (keys.display(GlobalAction::Back), "back"),
            ],
            _ => vec![
                (nav, "move"),
                (keys.display(NavAction::Select), "choose"),
                (keys.display(FilterAction::Toggle), "filter"),
                (keys.display(GlobalAction::Back), "back"),
                (keys.display(GlobalAction::Quit), "cancel"),
            ],
        },
        WizardPhase::CleanupPending { .. } => vec![
            (keys.display(DialogAction::Confirm), "delete all"),
            (keys.display(DialogAction::Cancel), "keep"),
        ],
        WizardPhase::CleanupReport { .. } => vec![("any key".to_string(), "close")],
        WizardPhase::Provisioning { .. } | WizardPhase::CleaningUp { .. } => Vec::new(),
    }
}
