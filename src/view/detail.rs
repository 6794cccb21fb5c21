use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};

use super::panel;
use crate::Theme;
use crate::browser::Model;

pub fn render(frame: &mut Frame, area: Rect, model: &Model, theme: &Theme) {
    let Some(resource) = model.detail_data.as_ref() else {
        frame.render_widget(panel(" Detail ", theme), area);
        return;
    };

    let label = Style::default().fg(theme.muted);
    let value = Style::default().fg(theme.text);
    let mut lines = vec![Line::from(vec![
        Span::styled("id  ", label),
        Span::styled(resource.id.clone(), value),
    ])];
    if let Some(image) = &resource.enrichment.image_name {
        lines.push(Line::from(vec![
            Span::styled("image  ", label),
            Span::styled(image.clone(), value),
        ]));
    }
    if let Some(ip) = &resource.enrichment.floating_ip {
        lines.push(Line::from(vec![
            Span::styled("floating IP  ", label),
            Span::styled(ip.clone(), Style::default().fg(theme.success)),
        ]));
    }
    lines.push(Line::from(""));

    let json = serde_json::to_string_pretty(&resource.raw).unwrap_or_default();
    lines.extend(json.lines().map(|l| json_line(l, theme)));

    let title = Line::from(vec![
        Span::raw(" "),
        Span::styled(
            resource.name.clone(),
            Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" · {} ", model.current_product.title()),
            Style::default().fg(theme.muted),
        ),
    ]);
    let paragraph = Paragraph::new(lines)
        .block(panel(title, theme))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

/// Colour object keys apart from their values.
fn json_line(line: &str, theme: &Theme) -> Line<'static> {
    match line.split_once("\": ") {
        Some((key, rest)) => Line::from(vec![
            Span::styled(format!("{key}\":"), Style::default().fg(theme.info)),
            Span::styled(format!(" {rest}"), Style::default().fg(theme.text)),
        ]),
        None => Line::from(Span::styled(line.to_string(), Style::default().fg(theme.subtle))),
    }
}
