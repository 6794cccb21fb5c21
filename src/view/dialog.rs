use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::Theme;
use crate::browser::Model;
use crate::config::DialogAction;

pub fn render_delete(frame: &mut Frame, area: Rect, model: &Model, theme: &Theme) {
    let Some(target) = model.delete_target.as_ref() else {
        return;
    };
    let keys = &model.keys;
    let popup_area = area.centered(Constraint::Percentage(50), Constraint::Length(8));
    frame.render_widget(Clear, popup_area);

    let key_style = Style::default().fg(theme.warning).add_modifier(Modifier::BOLD);
    let lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("Delete ", Style::default().fg(theme.text)),
            Span::styled(
                target.resource.name.clone(),
                Style::default().fg(theme.error).add_modifier(Modifier::BOLD),
            ),
            Span::styled("?", Style::default().fg(theme.text)),
        ]),
        Line::from(Span::styled(
            target.resource.id.clone(),
            Style::default().fg(theme.muted),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled(format!("[{}]", keys.display(DialogAction::Confirm)), key_style),
            Span::styled(" Delete", Style::default().fg(theme.error).add_modifier(Modifier::BOLD)),
            Span::raw("    "),
            Span::styled(format!("[{}]", keys.display(DialogAction::Cancel)), key_style),
            Span::styled(" Keep", Style::default().fg(theme.muted).add_modifier(Modifier::BOLD)),
        ]),
    ];

    let block = Block::default()
        .title(format!(" Delete {} ", target.product.title().trim_end_matches('s')))
        .title_style(Style::default().fg(theme.error).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_type(theme.border_type)
        .border_style(Style::default().fg(theme.error))
        .style(Style::default().bg(theme.base));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, popup_area);
}
