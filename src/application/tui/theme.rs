use crossterm::style::{Color as CrosstermColor, Stylize};
use ratatui::style::{Color as RatatuiColor, Modifier, Style as RatatuiStyle};

#[derive(Debug, Clone)]
pub struct Theme {
    pub name: String,
    pub colors: ThemeColors,
}

#[derive(Debug, Clone)]
pub struct ThemeColors {
    pub primary: ColorPair,
    pub accent: ColorPair,

    // Cell states
    pub selected: ColorPair,
    pub today: ColorPair,
    pub done: ColorPair,
    pub missed: ColorPair,
    pub dimmed: ColorPair,

    pub border: ColorPair,
    pub header: ColorPair,
    pub weekend: ColorPair,

    pub help_text: ColorPair,
    pub error_text: ColorPair,

    /// Minimal themes ignore per-habit colours.
    pub use_habit_colors: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorPair {
    pub fg: CrosstermColor,
    pub bg: Option<CrosstermColor>,
}

impl ColorPair {
    pub fn new(fg: CrosstermColor) -> Self {
        Self { fg, bg: None }
    }

    pub fn with_bg(fg: CrosstermColor, bg: CrosstermColor) -> Self {
        Self { fg, bg: Some(bg) }
    }

    pub fn to_ratatui(&self) -> RatatuiStyle {
        let mut style = RatatuiStyle::default().fg(crossterm_to_ratatui(self.fg));
        if let Some(bg) = self.bg {
            style = style.bg(crossterm_to_ratatui(bg));
        }
        style
    }

    pub fn to_ratatui_with_modifier(&self, modifier: Modifier) -> RatatuiStyle {
        self.to_ratatui().add_modifier(modifier)
    }

    /// Apply color to text for terminal output
    pub fn colorize(&self, text: &str) -> String {
        let mut styled = text.with(self.fg);
        if let Some(bg) = self.bg {
            styled = styled.on(bg);
        }
        format!("{}", styled)
    }

    pub fn colorize_bold(&self, text: &str) -> String {
        let mut styled = text.with(self.fg).bold();
        if let Some(bg) = self.bg {
            styled = styled.on(bg);
        }
        format!("{}", styled)
    }
}

pub fn crossterm_to_ratatui(color: CrosstermColor) -> RatatuiColor {
    match color {
        CrosstermColor::Black => RatatuiColor::Black,
        CrosstermColor::DarkRed => RatatuiColor::Red,
        CrosstermColor::DarkGreen => RatatuiColor::Green,
        CrosstermColor::DarkYellow => RatatuiColor::Yellow,
        CrosstermColor::DarkBlue => RatatuiColor::Blue,
        CrosstermColor::DarkMagenta => RatatuiColor::Magenta,
        CrosstermColor::DarkCyan => RatatuiColor::Cyan,
        CrosstermColor::Grey => RatatuiColor::Gray,
        CrosstermColor::DarkGrey => RatatuiColor::DarkGray,
        CrosstermColor::Red => RatatuiColor::LightRed,
        CrosstermColor::Green => RatatuiColor::LightGreen,
        CrosstermColor::Yellow => RatatuiColor::LightYellow,
        CrosstermColor::Blue => RatatuiColor::LightBlue,
        CrosstermColor::Magenta => RatatuiColor::LightMagenta,
        CrosstermColor::Cyan => RatatuiColor::LightCyan,
        CrosstermColor::White => RatatuiColor::White,
        CrosstermColor::Rgb { r, g, b } => RatatuiColor::Rgb(r, g, b),
        CrosstermColor::AnsiValue(v) => RatatuiColor::Indexed(v),
        _ => RatatuiColor::White,
    }
}

/// Parse a `#rrggbb` habit colour.
pub fn parse_hex_color(hex: &str) -> Option<CrosstermColor> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 || !digits.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    Some(CrosstermColor::Rgb {
        r: channel(0)?,
        g: channel(2)?,
        b: channel(4)?,
    })
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            name: "Dark".to_string(),
            colors: ThemeColors {
                primary: ColorPair::new(CrosstermColor::White),
                accent: ColorPair::new(CrosstermColor::Blue),

                selected: ColorPair::with_bg(
                    CrosstermColor::White,
                    CrosstermColor::Rgb { r: 40, g: 40, b: 40 },
                ),
                today: ColorPair::with_bg(CrosstermColor::Black, CrosstermColor::Yellow),
                done: ColorPair::new(CrosstermColor::Green),
                missed: ColorPair::new(CrosstermColor::DarkGrey),
                dimmed: ColorPair::new(CrosstermColor::DarkGrey),

                border: ColorPair::new(CrosstermColor::DarkCyan),
                header: ColorPair::new(CrosstermColor::DarkCyan),
                weekend: ColorPair::new(CrosstermColor::Rgb { r: 150, g: 150, b: 150 }),

                help_text: ColorPair::new(CrosstermColor::DarkCyan),
                error_text: ColorPair::new(CrosstermColor::Red),
                use_habit_colors: true,
            },
        }
    }

    pub fn light() -> Self {
        Self {
            name: "Light".to_string(),
            colors: ThemeColors {
                primary: ColorPair::new(CrosstermColor::Black),
                accent: ColorPair::new(CrosstermColor::DarkBlue),

                selected: ColorPair::with_bg(CrosstermColor::White, CrosstermColor::DarkBlue),
                today: ColorPair::with_bg(CrosstermColor::Black, CrosstermColor::Yellow),
                done: ColorPair::new(CrosstermColor::DarkGreen),
                missed: ColorPair::new(CrosstermColor::Grey),
                dimmed: ColorPair::new(CrosstermColor::Grey),

                border: ColorPair::new(CrosstermColor::DarkBlue),
                header: ColorPair::new(CrosstermColor::DarkBlue),
                weekend: ColorPair::new(CrosstermColor::Grey),

                help_text: ColorPair::new(CrosstermColor::DarkBlue),
                error_text: ColorPair::new(CrosstermColor::DarkRed),
                use_habit_colors: true,
            },
        }
    }

    pub fn minimal() -> Self {
        Self {
            name: "Minimal".to_string(),
            colors: ThemeColors {
                primary: ColorPair::new(CrosstermColor::White),
                accent: ColorPair::new(CrosstermColor::White),

                selected: ColorPair::with_bg(CrosstermColor::Black, CrosstermColor::White),
                today: ColorPair::new(CrosstermColor::White),
                done: ColorPair::new(CrosstermColor::White),
                missed: ColorPair::new(CrosstermColor::DarkGrey),
                dimmed: ColorPair::new(CrosstermColor::DarkGrey),

                border: ColorPair::new(CrosstermColor::White),
                header: ColorPair::new(CrosstermColor::White),
                weekend: ColorPair::new(CrosstermColor::DarkGrey),

                help_text: ColorPair::new(CrosstermColor::Grey),
                error_text: ColorPair::new(CrosstermColor::White),
                use_habit_colors: false,
            },
        }
    }

    pub fn by_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "light" => Self::light(),
            "minimal" => Self::minimal(),
            _ => Self::dark(),
        }
    }

    pub fn available_themes() -> Vec<String> {
        vec!["dark".to_string(), "light".to_string(), "minimal".to_string()]
    }

    /// The colour a habit is drawn in, falling back to the accent.
    pub fn habit_color(&self, hex: &str) -> ColorPair {
        if !self.colors.use_habit_colors {
            return self.colors.accent;
        }
        parse_hex_color(hex)
            .map(ColorPair::new)
            .unwrap_or(self.colors.accent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_by_name_falls_back_to_dark() {
        assert_eq!(Theme::by_name("LIGHT").name, "Light");
        assert_eq!(Theme::by_name("minimal").name, "Minimal");
        assert_eq!(Theme::by_name("neon").name, "Dark");
        assert_eq!(Theme::available_themes().len(), 3);
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(
            parse_hex_color("#3b82f6"),
            Some(CrosstermColor::Rgb { r: 0x3b, g: 0x82, b: 0xf6 })
        );
        assert_eq!(parse_hex_color("3b82f6"), None);
        assert_eq!(parse_hex_color("#3b82f"), None);
        assert_eq!(parse_hex_color("#zz82f6"), None);
    }

    #[test]
    fn test_habit_color_respects_theme() {
        let dark = Theme::dark();
        assert_eq!(
            dark.habit_color("#10b981").to_ratatui().fg,
            Some(RatatuiColor::Rgb(0x10, 0xb9, 0x81))
        );
        assert_eq!(dark.habit_color("garbage"), dark.colors.accent);

        let minimal = Theme::minimal();
        assert_eq!(minimal.habit_color("#10b981"), minimal.colors.accent);
    }

    #[test]
    fn test_colorize_keeps_text() {
        let pair = ColorPair::with_bg(CrosstermColor::Black, CrosstermColor::Yellow);
        assert!(pair.colorize("Run").contains("Run"));
        assert!(pair.colorize_bold("Read").contains("Read"));
    }
}
