use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{List, ListItem, ListState};

use super::{highlight_style, panel};
use crate::Theme;
use crate::browser::Model;

pub fn render(frame: &mut Frame, area: Rect, model: &Model, theme: &Theme) {
    let items: Vec<ListItem> = model
        .projects
        .iter()
        .map(|p| {
            ListItem::new(Line::from(vec![
                Span::styled(p.description.clone(), Style::default().fg(theme.text)),
                Span::styled(format!("  {}", p.id), Style::default().fg(theme.muted)),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(panel(" Select a project ", theme))
        .highlight_style(highlight_style(theme))
        .highlight_symbol("▶ ");

    let mut state = ListState::default().with_selected(Some(model.selected));
    frame.render_stateful_widget(list, area, &mut state);
}
