use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::Style;
use throbber_widgets_tui::WhichUse::Spin;
use throbber_widgets_tui::{BRAILLE_SIX, Throbber, ThrobberState};

use crate::Theme;

/// Animated loading indicator. Advanced by terminal ticks, not by messages.
#[derive(Default)]
pub struct Spinner {
    throbber_state: ThrobberState,
}

impl Spinner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(&mut self) {
        self.throbber_state.calc_next();
    }

    /// Draw the spinner and `label` centered in `area`.
    pub fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme, label: &str) {
        let label = if label.is_empty() { "Loading..." } else { label };
        let throbber = Throbber::default()
            .throbber_set(BRAILLE_SIX)
            .use_type(Spin)
            .throbber_style(Style::default().fg(theme.border_focused))
            .style(Style::default().fg(theme.subtle))
            .label(label);

        // One cell for the glyph, one for the gap.
        let width = u16::try_from(label.chars().count() + 2).unwrap_or(area.width);
        let area = area.centered(Constraint::Length(width), Constraint::Length(1));

        frame.render_stateful_widget(throbber, area, &mut self.throbber_state);
    }
}
