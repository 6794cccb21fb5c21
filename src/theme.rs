use catppuccin::PALETTE;
use ratatui::style::Color;
use ratatui::widgets::BorderType;

const fn catppuccin_to_color(c: &catppuccin::Color) -> Color {
    Color::Rgb(c.rgb.r, c.rgb.g, c.rgb.b)
}

/// Colors by role. Passed explicitly to every render function.
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub base: Color,
    pub surface: Color,
    pub text: Color,
    pub muted: Color,
    pub subtle: Color,
    pub border: Color,
    pub border_focused: Color,
    pub accent: Color,
    pub header: Color,
    pub selection_bg: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,
    pub border_type: BorderType,
}

impl Theme {
    const fn from_catppuccin(flavor: &catppuccin::Flavor) -> Self {
        let c = &flavor.colors;
        Self {
            base: catppuccin_to_color(&c.base),
            surface: catppuccin_to_color(&c.surface0),
            text: catppuccin_to_color(&c.text),
            muted: catppuccin_to_color(&c.overlay1),
            subtle: catppuccin_to_color(&c.subtext1),
            border: catppuccin_to_color(&c.surface2),
            border_focused: catppuccin_to_color(&c.lavender),
            accent: catppuccin_to_color(&c.mauve),
            header: catppuccin_to_color(&c.yellow),
            selection_bg: catppuccin_to_color(&c.surface1),
            success: catppuccin_to_color(&c.green),
            warning: catppuccin_to_color(&c.peach),
            error: catppuccin_to_color(&c.red),
            info: catppuccin_to_color(&c.blue),
            border_type: BorderType::Rounded,
        }
    }

    #[must_use]
    pub fn catppuccin_mocha() -> Self {
        Self::from_catppuccin(&PALETTE.mocha)
    }

    #[must_use]
    pub fn catppuccin_macchiato() -> Self {
        Self::from_catppuccin(&PALETTE.macchiato)
    }

    #[must_use]
    pub fn catppuccin_frappe() -> Self {
        Self::from_catppuccin(&PALETTE.frappe)
    }

    #[must_use]
    pub fn catppuccin_latte() -> Self {
        Self::from_catppuccin(&PALETTE.latte)
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::catppuccin_mocha()
    }
}

const THEMES: &[(&str, fn() -> Theme)] = &[
    ("Catppuccin Mocha", Theme::catppuccin_mocha),
    ("Catppuccin Macchiato", Theme::catppuccin_macchiato),
    ("Catppuccin Frappé", Theme::catppuccin_frappe),
    ("Catppuccin Latte", Theme::catppuccin_latte),
];

/// Look up a theme by name, falling back to the default.
pub fn theme_from_name(name: &str) -> Theme {
    THEMES
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map_or_else(Theme::default, |(_, build)| build())
}
