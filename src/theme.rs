use ratatui::style::{Color, Modifier, Style};

/// Theme configuration for the editor
#[derive(Clone, Debug)]
pub struct Theme {
    /// Foreground (text) color for the status bar
    pub status_bar_fg: Color,

    /// Background color for the status bar
    pub status_bar_bg: Color,

    /// Color for the current file name in the status bar
    pub filename_color: Color,

    /// Foreground color for the debug line
    pub debug_fg: Color,

    /// Foreground color for token chips
    pub token_fg: Color,

    /// Background color for token chips
    pub token_bg: Color,

    /// Foreground color for the token chip under the caret
    pub token_focused_fg: Color,

    /// Background color for the token chip under the caret
    pub token_focused_bg: Color,

    /// Foreground color for suggestion entries
    pub menu_fg: Color,

    /// Background color for the suggestion popup
    pub menu_bg: Color,

    /// Foreground color for the "no matches" placeholder
    pub menu_disabled_fg: Color,

    /// Foreground color for the highlighted suggestion
    pub menu_selected_fg: Color,

    /// Background color for the highlighted suggestion
    pub menu_selected_bg: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            status_bar_fg: Color::White,
            status_bar_bg: Color::Blue,
            filename_color: Color::LightYellow,
            debug_fg: Color::DarkGray,
            token_fg: Color::Black,
            token_bg: Color::LightCyan,
            token_focused_fg: Color::White,
            token_focused_bg: Color::Blue,
            menu_fg: Color::White,
            menu_bg: Color::Black,
            menu_disabled_fg: Color::DarkGray,
            menu_selected_fg: Color::White,
            menu_selected_bg: Color::LightBlue,
        }
    }
}

impl Theme {
    /// Create a new theme with default colors
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the style for the status bar
    pub fn status_bar_style(&self) -> Style {
        Style::default()
            .fg(self.status_bar_fg)
            .bg(self.status_bar_bg)
    }

    /// Get the style for the filename in the status bar
    pub fn filename_style(&self) -> Style {
        Style::default().fg(self.filename_color)
    }

    pub fn debug_style(&self) -> Style {
        Style::default().fg(self.debug_fg)
    }

    /// Get the style for a token chip. The chip under the caret is drawn bold
    /// in its own colors.
    pub fn token_style(&self, focused: bool) -> Style {
        if focused {
            Style::default()
                .fg(self.token_focused_fg)
                .bg(self.token_focused_bg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(self.token_fg).bg(self.token_bg)
        }
    }

    /// Get the style for the suggestion popup
    pub fn menu_style(&self) -> Style {
        Style::default().fg(self.menu_fg).bg(self.menu_bg)
    }

    /// Get the style for the "no matches" placeholder
    pub fn menu_disabled_style(&self) -> Style {
        Style::default().fg(self.menu_disabled_fg).bg(self.menu_bg)
    }

    /// Get the style for the highlighted suggestion
    pub fn menu_selected_style(&self) -> Style {
        Style::default()
            .fg(self.menu_selected_fg)
            .bg(self.menu_selected_bg)
    }
}
