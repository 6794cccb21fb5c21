use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Row, Table};

use crate::Theme;
use crate::browser::Model;
use crate::debug::{DebugLogEntry, TraceOutcome};

pub fn render(frame: &mut Frame, area: Rect, model: &Model, theme: &Theme) {
    let popup_area = area.centered(Constraint::Percentage(96), Constraint::Percentage(90));
    frame.render_widget(Clear, popup_area);

    // Copy taken once; the transport keeps writing while we draw.
    let entries = model.debug_log.entries();
    let header = Row::new(["Time", "Method", "Status", "Took", "URL", "Request id"].map(|h| {
        Cell::from(h).style(Style::default().fg(theme.header).add_modifier(Modifier::BOLD))
    }))
    .style(Style::default().bg(theme.surface));

    let rows = entries
        .iter()
        .skip(model.debug_scroll)
        .map(|entry| entry_row(entry, theme));

    let widths = [
        Constraint::Length(12),
        Constraint::Length(6),
        Constraint::Length(6),
        Constraint::Length(7),
        Constraint::Min(30),
        Constraint::Length(24),
    ];

    let title = format!(
        " Debug · {} of {} requests ",
        entries.len(),
        model.debug_log.capacity()
    );
    let block = Block::default()
        .title(title)
        .title_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_type(theme.border_type)
        .border_style(Style::default().fg(theme.border_focused))
        .style(Style::default().bg(theme.base));

    let table = Table::new(rows, widths).header(header).block(block);
    frame.render_widget(table, popup_area);
}

fn entry_row<'a>(entry: &'a DebugLogEntry, theme: &Theme) -> Row<'a> {
    let (status, status_style) = match &entry.outcome {
        TraceOutcome::Status(code) if entry.is_error() => {
            (code.to_string(), Style::default().fg(theme.error))
        }
        TraceOutcome::Status(code) => (code.to_string(), Style::default().fg(theme.success)),
        TraceOutcome::Error(_) => ("ERR".to_string(), Style::default().fg(theme.error)),
    };
    let url = match &entry.outcome {
        TraceOutcome::Error(e) => format!("{} ({e})", entry.url),
        TraceOutcome::Status(_) => entry.url.clone(),
    };

    Row::new([
        Cell::from(entry.timestamp.format("%H:%M:%S%.3f").to_string())
            .style(Style::default().fg(theme.muted)),
        Cell::from(entry.method.as_str()).style(Style::default().fg(theme.info)),
        Cell::from(status).style(status_style),
        Cell::from(format!("{}ms", entry.duration.as_millis()))
            .style(Style::default().fg(theme.subtle)),
        Cell::from(url).style(Style::default().fg(theme.text)),
        Cell::from(entry.request_id.as_str()).style(Style::default().fg(theme.muted)),
    ])
}
