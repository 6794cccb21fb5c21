use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{List, ListItem, ListState, Paragraph, Wrap};

use super::{Spinner, highlight_style, panel, truncate};
use crate::Theme;
use crate::browser::Model;
use crate::browser::saga::FloatingIpChoice;
use crate::browser::wizard::{
    InlineForm, NetworkField, SshKeyField, WizardData, WizardPhase, WizardRow, WizardStep,
};

const STEPS: [WizardStep; 8] = [
    WizardStep::Region,
    WizardStep::Flavor,
    WizardStep::Image,
    WizardStep::SshKey,
    WizardStep::Network,
    WizardStep::FloatingIp,
    WizardStep::Name,
    WizardStep::Confirm,
];

pub fn render(frame: &mut Frame, area: Rect, model: &Model, theme: &Theme, spinner: &mut Spinner) {
    let Some(wizard) = model.wizard.as_ref() else {
        return;
    };
    let [steps_area, content_area] =
        Layout::horizontal([Constraint::Length(34), Constraint::Min(20)]).areas(area);

    render_steps(frame, steps_area, wizard, theme);

    match &wizard.phase {
        WizardPhase::Editing => match (&wizard.form, wizard.step) {
            (Some(form), _) => render_form(frame, content_area, wizard, form, theme),
            (None, WizardStep::Name) => render_name(frame, content_area, wizard, theme),
            (None, WizardStep::Confirm) => render_summary(frame, content_area, wizard, theme),
            (None, _) => render_list(frame, content_area, wizard, theme, spinner),
        },
        WizardPhase::Provisioning { plan, index, .. } => {
            let block = panel(" Creating instance ", theme);
            let inner = block.inner(content_area);
            frame.render_widget(block, content_area);
            let [list_area, spinner_area] =
                Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(inner);

            let lines: Vec<Line> = plan
                .iter()
                .enumerate()
                .map(|(i, step)| {
                    let (mark, style) = match i.cmp(index) {
                        std::cmp::Ordering::Less => ("✓", Style::default().fg(theme.success)),
                        std::cmp::Ordering::Equal => ("▶", Style::default().fg(theme.border_focused)),
                        std::cmp::Ordering::Greater => (" ", Style::default().fg(theme.muted)),
                    };
                    Line::from(Span::styled(format!(" {mark} {}", step.label()), style))
                })
                .collect();
            frame.render_widget(Paragraph::new(lines), list_area);
            if let Some(step) = plan.get(*index) {
                spinner.render(frame, spinner_area, theme, step.label());
            }
        }
        WizardPhase::CleanupPending { error } => {
            render_cleanup_prompt(frame, content_area, model, wizard, error, theme);
        }
        WizardPhase::CleaningUp { .. } => {
            let label = format!("Deleting {} resource(s)", wizard.ledger.len());
            frame.render_widget(panel(" Cleaning up ", theme), content_area);
            spinner.render(frame, content_area, theme, &label);
        }
        WizardPhase::CleanupReport { error, outcomes } => {
            let mut lines = failure_lines(error, theme);
            for outcome in outcomes {
                let entry = &outcome.entry;
                let what = format!("{} {} ({})", entry.kind.label(), entry.name, entry.id);
                lines.push(match &outcome.error {
                    None => Line::from(Span::styled(
                        format!(" ✓ deleted {what}"),
                        Style::default().fg(theme.success),
                    )),
                    Some(err) => Line::from(Span::styled(
                        format!(" ✗ {what}: {err}; delete it manually"),
                        Style::default().fg(theme.error),
                    )),
                });
            }
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "Press any key to return to the instance list",
                Style::default().fg(theme.muted),
            )));
            let paragraph = Paragraph::new(lines)
                .block(panel(" Cleanup report ", theme))
                .wrap(Wrap { trim: false });
            frame.render_widget(paragraph, content_area);
        }
    }
}

fn render_steps(frame: &mut Frame, area: Rect, wizard: &WizardData, theme: &Theme) {
    let current = STEPS.iter().position(|s| *s == wizard.step).unwrap_or(0);
    let lines: Vec<Line> = STEPS
        .iter()
        .enumerate()
        .filter(|(_, step)| **step != WizardStep::FloatingIp || wizard.needs_floating_ip_step())
        .map(|(i, step)| {
            let style = if i == current {
                Style::default().fg(theme.border_focused).add_modifier(Modifier::BOLD)
            } else if i < current {
                Style::default().fg(theme.text)
            } else {
                Style::default().fg(theme.muted)
            };
            let mark = if i == current { "▶" } else if i < current { "✓" } else { " " };
            let choice = truncate(&step_choice(wizard, *step), 18);
            Line::from(vec![
                Span::styled(format!(" {mark} {:<12}", step.title()), style),
                Span::styled(choice, Style::default().fg(theme.subtle)),
            ])
        })
        .collect();
    frame.render_widget(Paragraph::new(lines).block(panel(" New instance ", theme)), area);
}

/// What has been chosen for `step` so far.
fn step_choice(wizard: &WizardData, step: WizardStep) -> String {
    match step {
        WizardStep::Region => wizard.selected_region.clone().unwrap_or_default(),
        WizardStep::Flavor => wizard
            .selected_flavor
            .as_ref()
            .map(|f| f.name.clone())
            .unwrap_or_default(),
        WizardStep::Image => wizard
            .selected_image
            .as_ref()
            .map(|i| i.name.clone())
            .unwrap_or_default(),
        WizardStep::SshKey => wizard
            .selected_ssh_key
            .as_ref()
            .map(|k| k.name.clone())
            .unwrap_or_default(),
        WizardStep::Network => wizard
            .private_network
            .as_ref()
            .map_or_else(String::new, |n| n.network.name.clone()),
        WizardStep::FloatingIp => match &wizard.floating_ip {
            FloatingIpChoice::None => String::new(),
            FloatingIpChoice::New => "new".to_string(),
            FloatingIpChoice::Existing { ip, .. } => ip.clone(),
        },
        WizardStep::Name => wizard.name.clone(),
        WizardStep::Confirm => String::new(),
    }
}

fn render_list(
    frame: &mut Frame,
    area: Rect,
    wizard: &WizardData,
    theme: &Theme,
    spinner: &mut Spinner,
) {
    let block = panel(format!(" {} ", wizard.step.title()), theme);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let show_filter = wizard.filter_active || !wizard.filter_input.is_empty();
    let [list_area, filter_area, error_area] = Layout::vertical([
        Constraint::Min(1),
        Constraint::Length(u16::from(show_filter)),
        Constraint::Length(u16::from(wizard.error.is_some()) * 2),
    ])
    .areas(inner);

    if wizard.loading {
        spinner.render(frame, list_area, theme, &format!("Loading {}", wizard.step.title().to_lowercase()));
    } else {
        let items: Vec<ListItem> = wizard
            .visible_rows()
            .into_iter()
            .map(|row| ListItem::new(row_line(wizard, row, theme)))
            .collect();
        let list = List::new(items)
            .highlight_style(highlight_style(theme))
            .highlight_symbol("▶ ");
        let mut state = ListState::default().with_selected(Some(wizard.selected_index));
        frame.render_stateful_widget(list, list_area, &mut state);
    }

    if show_filter {
        let line = Line::from(vec![
            Span::styled(" / ", Style::default().fg(theme.warning).add_modifier(Modifier::BOLD)),
            Span::styled(wizard.filter_input.clone(), Style::default().fg(theme.text)),
        ]);
        frame.render_widget(Paragraph::new(line), filter_area);
    }
    render_error(frame, error_area, wizard, theme);
}

fn radio(on: bool) -> &'static str {
    if on { "(•) " } else { "( ) " }
}

fn row_line(wizard: &WizardData, row: WizardRow, theme: &Theme) -> Line<'static> {
    let text = Style::default().fg(theme.text);
    let muted = Style::default().fg(theme.muted);
    let action = Style::default().fg(theme.accent);
    match row {
        WizardRow::Region(i) => Line::from(Span::styled(wizard.regions[i].clone(), text)),
        WizardRow::Flavor(i) => {
            let f = &wizard.flavors[i];
            Line::from(vec![
                Span::styled(format!("{:<16}", f.name), text),
                Span::styled(
                    format!(
                        "{} vCPU  {} GB RAM  {} GB disk",
                        f.vcpus,
                        f.ram / 1024,
                        f.disk
                    ),
                    muted,
                ),
            ])
        }
        WizardRow::Image(i) => Line::from(Span::styled(wizard.images[i].name.clone(), text)),
        WizardRow::SshKey(i) => Line::from(Span::styled(wizard.ssh_keys[i].name.clone(), text)),
        WizardRow::CreateSshKey => Line::from(Span::styled("+ Create SSH key", action)),
        WizardRow::PublicToggle => {
            let mark = if wizard.public_network { "[x] " } else { "[ ] " };
            let suffix = if wizard.public_network_id.is_none() {
                "  (unavailable)"
            } else {
                ""
            };
            Line::from(vec![
                Span::styled(format!("{mark}Public network"), text),
                Span::styled(suffix, muted),
            ])
        }
        WizardRow::NoPrivateNetwork => Line::from(Span::styled(
            format!("{}No private network", radio(wizard.private_network.is_none())),
            text,
        )),
        WizardRow::Network(i) => {
            let n = &wizard.networks[i];
            let chosen = wizard
                .private_network
                .as_ref()
                .is_some_and(|c| c.network.id == n.id);
            Line::from(vec![
                Span::styled(format!("{}{}", radio(chosen), n.name), text),
                Span::styled(
                    n.vlan_id.map(|v| format!("  vlan {v}")).unwrap_or_default(),
                    muted,
                ),
            ])
        }
        WizardRow::CreateNetwork => Line::from(Span::styled("+ Create private network", action)),
        WizardRow::NoFloatingIp => Line::from(Span::styled(
            format!("{}No floating IP", radio(wizard.floating_ip == FloatingIpChoice::None)),
            text,
        )),
        WizardRow::NewFloatingIp => Line::from(Span::styled(
            format!("{}New floating IP", radio(wizard.floating_ip == FloatingIpChoice::New)),
            text,
        )),
        WizardRow::FloatingIp(i) => {
            let ip = &wizard.floating_ips[i];
            let chosen =
                matches!(&wizard.floating_ip, FloatingIpChoice::Existing { id, .. } if *id == ip.id);
            Line::from(Span::styled(format!("{}{}", radio(chosen), ip.ip), text))
        }
    }
}

fn render_error(frame: &mut Frame, area: Rect, wizard: &WizardData, theme: &Theme) {
    if let Some(err) = &wizard.error {
        let paragraph = Paragraph::new(Line::from(Span::styled(
            format!(" ✗ {err}"),
            Style::default().fg(theme.error),
        )))
        .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
    }
}

fn field_line(label: &str, value: &str, focused: bool, theme: &Theme) -> Line<'static> {
    let value_style = if focused {
        Style::default().fg(theme.text).bg(theme.selection_bg)
    } else {
        Style::default().fg(theme.text)
    };
    let mut spans = vec![
        Span::styled(
            format!(" {label:>12}  "),
            Style::default().fg(if focused { theme.border_focused } else { theme.muted }),
        ),
        Span::styled(value.to_string(), value_style),
    ];
    if focused {
        spans.push(Span::styled(" ", Style::default().bg(theme.text)));
    }
    Line::from(spans)
}

fn button(label: &str, focused: bool, theme: &Theme) -> Span<'static> {
    let style = if focused {
        Style::default()
            .fg(theme.base)
            .bg(theme.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.muted)
    };
    Span::styled(format!(" {label} "), style)
}

fn render_form(frame: &mut Frame, area: Rect, wizard: &WizardData, form: &InlineForm, theme: &Theme) {
    let (title, mut lines, create, cancel, submitting) = match form {
        InlineForm::SshKey(f) => (
            " New SSH key ",
            vec![
                field_line("Name", &f.name, f.focus == SshKeyField::Name, theme),
                field_line("Public key", &f.public_key, f.focus == SshKeyField::PublicKey, theme),
            ],
            f.focus == SshKeyField::Create,
            f.focus == SshKeyField::Cancel,
            f.submitting,
        ),
        InlineForm::Network(f) => (
            " New private network ",
            vec![
                field_line("Name", &f.name, f.focus == NetworkField::Name, theme),
                field_line("VLAN id", &f.vlan, f.focus == NetworkField::Vlan, theme),
                field_line("Subnet", &f.cidr, f.focus == NetworkField::Cidr, theme),
            ],
            f.focus == NetworkField::Create,
            f.focus == NetworkField::Cancel,
            f.submitting,
        ),
    };
    lines.push(Line::from(""));
    if submitting {
        lines.push(Line::from(Span::styled(
            "   Creating...",
            Style::default().fg(theme.info),
        )));
    } else {
        lines.push(Line::from(vec![
            Span::raw("   "),
            button("Create", create, theme),
            Span::raw("  "),
            button("Cancel", cancel, theme),
        ]));
    }
    if let Some(err) = &wizard.error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(" ✗ {err}"),
            Style::default().fg(theme.error),
        )));
    }
    let paragraph = Paragraph::new(lines)
        .block(panel(title, theme).border_style(Style::default().fg(theme.border_focused)))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_name(frame: &mut Frame, area: Rect, wizard: &WizardData, theme: &Theme) {
    let mut lines = vec![
        Line::from(""),
        field_line("Name", &wizard.name, true, theme),
        Line::from(""),
        Line::from(Span::styled(
            "   Letters, digits, '.', '_' and '-' only",
            Style::default().fg(theme.muted),
        )),
    ];
    if let Some(err) = &wizard.error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(" ✗ {err}"),
            Style::default().fg(theme.error),
        )));
    }
    frame.render_widget(Paragraph::new(lines).block(panel(" Name ", theme)), area);
}

fn render_summary(frame: &mut Frame, area: Rect, wizard: &WizardData, theme: &Theme) {
    let label = Style::default().fg(theme.muted);
    let value = Style::default().fg(theme.text);
    let line = |l: &str, v: String| {
        Line::from(vec![
            Span::styled(format!(" {l:>16}  "), label),
            Span::styled(v, value),
        ])
    };

    let private = wizard.private_network.as_ref().map_or_else(
        || "none".to_string(),
        |n| match &n.new_subnet {
            Some(subnet) => format!("{} (new subnet {})", n.network.name, subnet.cidr),
            None => n.network.name.clone(),
        },
    );
    let floating = match &wizard.floating_ip {
        FloatingIpChoice::None => "none".to_string(),
        FloatingIpChoice::New => "new".to_string(),
        FloatingIpChoice::Existing { ip, .. } => ip.clone(),
    };

    let mut lines = vec![
        Line::from(""),
        line("Name", wizard.name.clone()),
        line("Region", step_choice(wizard, WizardStep::Region)),
        line("Flavor", step_choice(wizard, WizardStep::Flavor)),
        line("Image", step_choice(wizard, WizardStep::Image)),
        line(
            "SSH key",
            wizard
                .selected_ssh_key
                .as_ref()
                .map_or_else(|| "none".to_string(), |k| k.name.clone()),
        ),
        line(
            "Public network",
            if wizard.public_network { "yes" } else { "no" }.to_string(),
        ),
        line("Private network", private),
        line("Floating IP", floating),
        Line::from(""),
        Line::from(Span::styled(
            "   Press Enter to create the instance",
            Style::default().fg(theme.success).add_modifier(Modifier::BOLD),
        )),
    ];
    if let Some(err) = &wizard.error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(" ✗ {err}"),
            Style::default().fg(theme.error),
        )));
    }
    let paragraph = Paragraph::new(lines)
        .block(panel(" Confirm ", theme))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn failure_lines(error: &str, theme: &Theme) -> Vec<Line<'static>> {
    vec![
        Line::from(""),
        Line::from(Span::styled(
            format!(" Creation failed: {error}"),
            Style::default().fg(theme.error).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ]
}

fn render_cleanup_prompt(
    frame: &mut Frame,
    area: Rect,
    model: &Model,
    wizard: &WizardData,
    error: &str,
    theme: &Theme,
) {
    use crate::config::DialogAction;

    let mut lines = failure_lines(error, theme);
    lines.push(Line::from(Span::styled(
        " These resources were created and are still billed:",
        Style::default().fg(theme.text),
    )));
    for entry in wizard.ledger.entries() {
        lines.push(Line::from(vec![
            Span::styled(format!("   • {} ", entry.kind.label()), Style::default().fg(theme.warning)),
            Span::styled(entry.name.clone(), Style::default().fg(theme.text)),
            Span::styled(format!("  {}", entry.id), Style::default().fg(theme.muted)),
        ]));
    }
    let key_style = Style::default().fg(theme.warning).add_modifier(Modifier::BOLD);
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled(format!(" [{}]", model.keys.display(DialogAction::Confirm)), key_style),
        Span::styled(" Delete all", Style::default().fg(theme.error)),
        Span::raw("    "),
        Span::styled(format!("[{}]", model.keys.display(DialogAction::Cancel)), key_style),
        Span::styled(" Keep them", Style::default().fg(theme.muted)),
    ]));
    let paragraph = Paragraph::new(lines)
        .block(panel(" Clean up? ", theme).border_style(Style::default().fg(theme.error)))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}
