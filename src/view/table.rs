use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Cell, Paragraph, Row, Table, TableState};

use super::{highlight_style, panel, truncate};
use crate::Theme;
use crate::browser::{Mode, Model, Product};
use crate::config::ResourceAction;

pub fn render(frame: &mut Frame, area: Rect, model: &Model, theme: &Theme) {
    let product = model.current_product;
    let show_filter = model.filter.active || !model.filter.input.is_empty();
    let [table_area, filter_area] = Layout::vertical([
        Constraint::Min(3),
        Constraint::Length(u16::from(show_filter)),
    ])
    .areas(area);

    let rows = model.visible_rows();
    let title = if show_filter {
        format!(" {} ({}/{}) ", product.title(), rows.len(), model.current_data.len())
    } else {
        format!(" {} ({}) ", product.title(), rows.len())
    };
    let block = panel(title, theme);

    if model.effective_mode() == Mode::Empty || !model.has_cached_table() {
        let inner = block.inner(table_area);
        frame.render_widget(block, table_area);
        render_empty(frame, inner, model, theme);
    } else {
        let columns = product.columns();
        let header = Row::new(columns.iter().map(|c| {
            Cell::from(c.title).style(Style::default().fg(theme.header).add_modifier(Modifier::BOLD))
        }))
        .style(Style::default().bg(theme.surface));

        let body = rows.iter().map(|resource| {
            Row::new(columns.iter().map(|c| {
                Cell::from(truncate(&(c.value)(resource), usize::from(c.width)))
            }))
            .style(Style::default().fg(theme.text))
        });
        let widths = columns.iter().map(|c| Constraint::Length(c.width));

        let table = Table::new(body, widths)
            .header(header)
            .block(block)
            .column_spacing(2)
            .row_highlight_style(highlight_style(theme))
            .highlight_symbol("▶ ");

        let mut state = TableState::default().with_selected(Some(model.selected));
        frame.render_stateful_widget(table, table_area, &mut state);
    }

    if show_filter {
        render_filter(frame, filter_area, model, theme);
    }
}

fn render_empty(frame: &mut Frame, area: Rect, model: &Model, theme: &Theme) {
    if model.project.is_none() {
        let line = Line::from(Span::styled(
            "No cloud projects on this account",
            Style::default().fg(theme.muted),
        ));
        frame.render_widget(Paragraph::new(vec![Line::from(""), line]).centered(), area);
        return;
    }

    let product = model.current_product;
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            if model.filter.input.is_empty() {
                format!("No {} in this project", product.title().to_lowercase())
            } else {
                format!("Nothing matches \"{}\"", model.filter.input)
            },
            Style::default().fg(theme.muted),
        )),
    ];
    if product == Product::Instances && model.filter.input.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(
                "Press {} to create one",
                model.keys.display(ResourceAction::Create)
            ),
            Style::default().fg(theme.subtle),
        )));
    }
    frame.render_widget(Paragraph::new(lines).centered(), area);
}

fn render_filter(frame: &mut Frame, area: Rect, model: &Model, theme: &Theme) {
    let mut spans = vec![
        Span::styled(" / ", Style::default().fg(theme.warning).add_modifier(Modifier::BOLD)),
        Span::styled(model.filter.input.clone(), Style::default().fg(theme.text)),
    ];
    if model.filter.active {
        spans.push(Span::styled(" ", Style::default().bg(theme.text)));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
