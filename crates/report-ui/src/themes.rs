use ratatui::style::{Color, Modifier, Style};
use report_runtime::chart_manager::ChartId;

/// Terminal background type detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackgroundType {
    Dark,
    Light,
    Unknown,
}

/// Detect terminal background type from the `COLORFGBG` environment variable.
///
/// The variable has the format `"foreground;background"`.  Background values
/// 0–6 are considered dark; 7–15 are considered light.  If the variable is
/// absent or unparseable, `BackgroundType::Dark` is returned.
pub fn detect_background() -> BackgroundType {
    if let Ok(val) = std::env::var("COLORFGBG") {
        if let Some(bg) = val.split(';').next_back() {
            if let Ok(bg_num) = bg.parse::<u8>() {
                return if bg_num <= 6 {
                    BackgroundType::Dark
                } else {
                    BackgroundType::Light
                };
            }
        }
    }
    BackgroundType::Dark
}

/// Styles used by the report views.
#[derive(Debug, Clone)]
pub struct Theme {
    // ── Frame ────────────────────────────────────────────────────────────────
    pub header: Style,
    pub border: Style,
    pub tab_active: Style,
    pub tab_inactive: Style,

    // ── Text ─────────────────────────────────────────────────────────────────
    pub text: Style,
    pub dim: Style,
    pub label: Style,
    pub value: Style,

    // ── Status ───────────────────────────────────────────────────────────────
    pub info: Style,
    pub success: Style,
    pub warning: Style,
    pub error: Style,

    // ── Charts ───────────────────────────────────────────────────────────────
    pub bar_overdue: Style,
    pub bar_duration: Style,
    pub bar_variation: Style,
    /// The bar whose tooltip is shown.
    pub bar_selected: Style,
    pub bar_value: Style,
}

impl Theme {
    /// Dark-background terminal theme (default).
    pub fn dark() -> Self {
        Self {
            header: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            border: Style::default().fg(Color::DarkGray),
            tab_active: Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::Gray),

            text: Style::default().fg(Color::White),
            dim: Style::default().fg(Color::DarkGray),
            label: Style::default().fg(Color::Gray),
            value: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),

            info: Style::default().fg(Color::Cyan),
            success: Style::default().fg(Color::Green),
            warning: Style::default().fg(Color::Yellow),
            error: Style::default().fg(Color::Red),

            bar_overdue: Style::default().fg(Color::Red),
            bar_duration: Style::default().fg(Color::Cyan),
            bar_variation: Style::default().fg(Color::Magenta),
            bar_selected: Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
            bar_value: Style::default().fg(Color::Black).bg(Color::Gray),
        }
    }

    /// Light-background terminal theme.
    ///
    /// Dark text and saturated bars so charts stay legible on a white canvas.
    pub fn light() -> Self {
        Self {
            header: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            border: Style::default().fg(Color::Gray),
            tab_active: Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::DarkGray),

            text: Style::default().fg(Color::Black),
            dim: Style::default().fg(Color::Gray),
            label: Style::default().fg(Color::DarkGray),
            value: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),

            info: Style::default().fg(Color::Blue),
            success: Style::default().fg(Color::Green),
            warning: Style::default().fg(Color::Yellow),
            error: Style::default().fg(Color::Red),

            bar_overdue: Style::default().fg(Color::Red),
            bar_duration: Style::default().fg(Color::Blue),
            bar_variation: Style::default().fg(Color::Magenta),
            bar_selected: Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
            bar_value: Style::default().fg(Color::White).bg(Color::DarkGray),
        }
    }

    /// Classic terminal theme using only the basic 8-colour ANSI palette,
    /// without bold modifiers.
    pub fn classic() -> Self {
        Self {
            header: Style::default().fg(Color::Cyan),
            border: Style::default().fg(Color::DarkGray),
            tab_active: Style::default().fg(Color::Yellow),
            tab_inactive: Style::default().fg(Color::White),

            text: Style::default().fg(Color::White),
            dim: Style::default().fg(Color::DarkGray),
            label: Style::default().fg(Color::Gray),
            value: Style::default().fg(Color::White),

            info: Style::default().fg(Color::Cyan),
            success: Style::default().fg(Color::Green),
            warning: Style::default().fg(Color::Yellow),
            error: Style::default().fg(Color::Red),

            bar_overdue: Style::default().fg(Color::Red),
            bar_duration: Style::default().fg(Color::Cyan),
            bar_variation: Style::default().fg(Color::Magenta),
            bar_selected: Style::default().fg(Color::Yellow),
            bar_value: Style::default().fg(Color::Black).bg(Color::White),
        }
    }

    /// Choose a theme automatically based on the detected terminal background.
    pub fn auto_detect() -> Self {
        match detect_background() {
            BackgroundType::Light => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Construct a theme by name.  Falls back to `auto_detect` for unknown
    /// names.
    pub fn from_name(name: &str) -> Self {
        match name {
            "light" => Self::light(),
            "dark" => Self::dark(),
            "classic" => Self::classic(),
            _ => Self::auto_detect(),
        }
    }

    /// Bar colour of a chart.
    pub fn bar_style(&self, chart: ChartId) -> Style {
        match chart {
            ChartId::Overdue => self.bar_overdue,
            ChartId::Duration => self.bar_duration,
            ChartId::Variation => self.bar_variation,
        }
    }

    /// Colour for an overdue percentage: green under 25 %, yellow under
    /// 50 %, red from there on.
    pub fn overdue_style(&self, percentage: f64) -> Style {
        if percentage >= 50.0 {
            self.error
        } else if percentage >= 25.0 {
            self.warning
        } else {
            self.success
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dark_theme_creation() {
        let t = Theme::dark();
        assert_eq!(t.header.fg, Some(Color::Cyan));
        assert_eq!(t.error.fg, Some(Color::Red));
        assert_eq!(t.bar_duration.fg, Some(Color::Cyan));
    }

    #[test]
    fn test_light_theme_creation() {
        let t = Theme::light();
        assert_eq!(t.header.fg, Some(Color::Blue));
        assert_eq!(t.text.fg, Some(Color::Black));
        assert_eq!(t.bar_duration.fg, Some(Color::Blue));
    }

    #[test]
    fn test_classic_theme_has_no_bold() {
        let t = Theme::classic();
        assert!(!t.header.add_modifier.contains(Modifier::BOLD));
        assert!(!t.tab_active.add_modifier.contains(Modifier::BOLD));
        assert!(!t.bar_selected.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_from_name() {
        assert_eq!(Theme::from_name("dark").header.fg, Some(Color::Cyan));
        assert_eq!(Theme::from_name("light").header.fg, Some(Color::Blue));
        assert!(Theme::from_name("does-not-exist").header.fg.is_some());
    }

    #[test]
    fn test_bar_style_per_chart() {
        let t = Theme::dark();
        assert_eq!(t.bar_style(ChartId::Overdue).fg, Some(Color::Red));
        assert_eq!(t.bar_style(ChartId::Variation).fg, Some(Color::Magenta));
    }

    #[test]
    fn test_overdue_style_thresholds() {
        let t = Theme::dark();
        assert_eq!(t.overdue_style(10.0).fg, Some(Color::Green));
        assert_eq!(t.overdue_style(25.0).fg, Some(Color::Yellow));
        assert_eq!(t.overdue_style(100.0).fg, Some(Color::Red));
    }
}
