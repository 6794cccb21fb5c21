//! Rendering of the browser [`Model`].
//!
//! Every function here reads the model and draws; none of them mutate
//! browser state. The only state owned by the renderer is the spinner frame.

mod debug;
mod detail;
mod dialog;
mod projects;
mod spinner;
mod status;
mod table;
mod wizard;

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Tabs, Wrap};

pub use spinner::Spinner;

use crate::Theme;
use crate::browser::{Mode, Model, Product};
use crate::config::{GlobalAction, ResourceAction};

pub fn render(frame: &mut Frame, model: &Model, theme: &Theme, spinner: &mut Spinner) {
    let area = frame.area();
    frame.render_widget(Block::default().style(Style::default().bg(theme.base)), area);

    let [header, body, footer] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(2),
    ])
    .areas(area);

    render_header(frame, header, model, theme);

    match model.effective_mode() {
        Mode::ProjectSelect => projects::render(frame, body, model, theme),
        Mode::Table | Mode::Empty => table::render(frame, body, model, theme),
        Mode::Detail => detail::render(frame, body, model, theme),
        Mode::Loading => spinner.render(frame, body, theme, &model.loading_label),
        Mode::Error => render_error(frame, body, model, theme),
        Mode::Wizard => wizard::render(frame, body, model, theme, spinner),
        Mode::DeleteConfirm => {
            match model.delete_target.as_ref().map(|t| t.return_mode) {
                Some(Mode::Detail) => detail::render(frame, body, model, theme),
                _ => table::render(frame, body, model, theme),
            }
            dialog::render_delete(frame, body, model, theme);
        }
        Mode::Debug => {}
    }

    if model.mode == Mode::Debug {
        debug::render(frame, body, model, theme);
    }

    status::render(frame, footer, model, theme);
}

fn render_header(frame: &mut Frame, area: Rect, model: &Model, theme: &Theme) {
    let [title_area, tabs_area] =
        Layout::horizontal([Constraint::Length(36), Constraint::Min(0)]).areas(area);

    let project = model.project.as_deref().map_or_else(
        || "no project".to_string(),
        |id| {
            model
                .projects
                .iter()
                .find(|p| p.id == id)
                .map_or_else(|| id.to_string(), |p| p.description.clone())
        },
    );
    let title = Line::from(vec![
        Span::styled(
            " cloudnav ",
            Style::default()
                .fg(theme.base)
                .bg(theme.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(project, Style::default().fg(theme.subtle)),
    ]);
    frame.render_widget(Paragraph::new(title), title_area);

    if model.project.is_none() {
        return;
    }
    let titles = Product::ALL
        .iter()
        .enumerate()
        .map(|(i, p)| format!("{} {}", i + 1, p.title()));
    let tabs = Tabs::new(titles)
        .select(model.current_product.index())
        .style(Style::default().fg(theme.muted))
        .highlight_style(
            Style::default()
                .fg(theme.border_focused)
                .add_modifier(Modifier::BOLD),
        )
        .divider(Span::styled("│", Style::default().fg(theme.border)));
    frame.render_widget(tabs, tabs_area);
}

fn render_error(frame: &mut Frame, area: Rect, model: &Model, theme: &Theme) {
    let keys = &model.keys;
    let message = model.error.as_deref().unwrap_or("Something went wrong");
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Request failed",
            Style::default().fg(theme.error).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(message, Style::default().fg(theme.text))),
        Line::from(""),
        Line::from(Span::styled(
            format!(
                "{} retry · {} back · {} projects",
                keys.display(ResourceAction::Reload),
                keys.display(GlobalAction::Back),
                keys.display(GlobalAction::Projects),
            ),
            Style::default().fg(theme.muted),
        )),
    ];
    let paragraph = Paragraph::new(lines)
        .block(panel(" Error ", theme).border_style(Style::default().fg(theme.error)))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

/// The rounded, titled block every pane is drawn in.
fn panel<'a>(title: impl Into<Line<'a>>, theme: &Theme) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(theme.border_type)
        .border_style(Style::default().fg(theme.border))
        .title(title)
        .title_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
}

fn highlight_style(theme: &Theme) -> Style {
    Style::default()
        .bg(theme.selection_bg)
        .fg(theme.border_focused)
        .add_modifier(Modifier::BOLD)
}

/// Truncate to `max` characters, marking the cut with `…`.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let keep = max.saturating_sub(1);
    let mut out: String = s.chars().take(keep).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use super::*;
    use crate::browser::model::test_model;
    use crate::browser::resource::row;

    fn draw(model: &Model) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        let mut spinner = Spinner::new();
        terminal
            .draw(|frame| render(frame, model, &Theme::default(), &mut spinner))
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(ratatui::buffer::Cell::symbol)
            .collect()
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a-very-long-name", 6), "a-ver…");
    }

    #[test]
    fn test_table_shows_rows_and_tabs() {
        let mut model = test_model();
        model.mode = Mode::Table;
        model.data_product = Some(Product::Instances);
        model.current_data = vec![
            row(Product::Instances, "i1", "web-1"),
            row(Product::Instances, "i2", "db-1"),
        ];
        let screen = draw(&model);
        assert!(screen.contains("web-1"));
        assert!(screen.contains("db-1"));
        assert!(screen.contains("1 Instances"));
        assert!(screen.contains("6 SSH Keys"));
    }

    #[test]
    fn test_error_view_shows_message() {
        let mut model = test_model();
        model.mode = Mode::Error;
        model.error = Some("HTTP 403 forbidden".into());
        assert!(draw(&model).contains("HTTP 403 forbidden"));
    }

    #[test]
    fn test_debug_overlay_draws_over_the_table() {
        let mut model = test_model();
        model.mode = Mode::Debug;
        model.debug_return = Mode::Table;
        model.data_product = Some(Product::Instances);
        model
            .debug_log
            .add_entry(crate::debug::entry("https://eu.api.ovh.com/v1/cloud/project"));
        let screen = draw(&model);
        assert!(screen.contains("/v1/cloud/project"));
        assert!(screen.contains("Debug"));
    }

    #[test]
    fn test_cleanup_prompt_lists_the_ledger() {
        use crate::browser::saga::{LedgerEntry, ResourceKind};
        use crate::browser::wizard::{WizardData, WizardPhase};

        let mut model = test_model();
        let mut wizard = WizardData::new(1, "p1".into(), model.settings.poll);
        wizard.ledger.record(LedgerEntry::new(ResourceKind::Network, "n-1", "backend", "GRA11"));
        wizard.ledger.record(LedgerEntry::new(ResourceKind::Instance, "i-1", "web-7", "GRA11"));
        wizard.phase = WizardPhase::CleanupPending {
            error: "quota exceeded".into(),
        };
        model.wizard = Some(wizard);
        model.mode = Mode::Wizard;

        let screen = draw(&model);
        assert!(screen.contains("quota exceeded"));
        assert!(screen.contains("backend"));
        assert!(screen.contains("web-7"));
    }
}
