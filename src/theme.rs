use std::path::PathBuf;
use std::sync::OnceLock;

use ratatui::style::{Color, Modifier, Style};
use serde::Deserialize;

use crate::calendar::Priority;
use crate::layout::ChipStyle;

static THEME: OnceLock<Theme> = OnceLock::new();

/// Active theme, loaded from `theme.toml` on first use.
pub fn current() -> &'static Theme {
    THEME.get_or_init(|| Theme::load().unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub name: String,
    pub header: Style,
    pub weekday: Style,
    pub dim: Style,
    pub border: Style,
    pub status: Style,
    pub selected: Style,
    pub day_number: Style,
    pub other_month_number: Style,
    pub today_bg: Color,
    pub month_bg: Color,
    pub other_month_bg: Color,
    pub chip_normal: Color,
    pub chip_high: Color,
    pub chip_low: Color,
    pub chip_done: Color,
    pub chip_text: Color,
    pub chip_done_text: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            header: Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            weekday: Style::default().fg(Color::Gray),
            dim: Style::default().fg(Color::DarkGray),
            border: Style::default().fg(Color::Gray),
            status: Style::default().fg(Color::White).bg(Color::DarkGray),
            selected: Style::default().fg(Color::Black).bg(Color::Cyan),
            day_number: Style::default().fg(Color::White),
            other_month_number: Style::default().fg(Color::DarkGray),
            today_bg: Color::Rgb(59, 66, 97),
            month_bg: Color::Reset,
            other_month_bg: Color::Rgb(24, 24, 27),
            chip_normal: Color::Rgb(92, 107, 192),
            chip_high: Color::Rgb(220, 38, 38),
            chip_low: Color::Rgb(100, 116, 139),
            chip_done: Color::Rgb(203, 213, 225),
            chip_text: Color::White,
            chip_done_text: Color::Rgb(100, 116, 139),
        }
    }
}

impl Theme {
    pub fn load() -> Option<Self> {
        let path = config_path()?;
        let content = std::fs::read_to_string(&path).ok()?;
        let config: ThemeConfig = toml::from_str(&content).ok()?;
        Some(config.into_theme())
    }

    pub fn preset(name: &str) -> Self {
        match name {
            "nord" => Self::nord(),
            "dracula" => Self::dracula(),
            _ => Self::default(),
        }
    }

    fn nord() -> Self {
        Self {
            name: "nord".to_string(),
            header: Style::default().fg(Color::Rgb(229, 233, 240)).add_modifier(Modifier::BOLD),
            dim: Style::default().fg(Color::Rgb(76, 86, 106)),
            border: Style::default().fg(Color::Rgb(67, 76, 94)),
            status: Style::default().fg(Color::Rgb(229, 233, 240)).bg(Color::Rgb(67, 76, 94)),
            selected: Style::default().fg(Color::Black).bg(Color::Rgb(136, 192, 208)),
            today_bg: Color::Rgb(67, 76, 94),
            other_month_bg: Color::Rgb(46, 52, 64),
            chip_normal: Color::Rgb(94, 129, 172),
            chip_high: Color::Rgb(191, 97, 106),
            chip_low: Color::Rgb(76, 86, 106),
            chip_done: Color::Rgb(216, 222, 233),
            ..Self::default()
        }
    }

    fn dracula() -> Self {
        Self {
            name: "dracula".to_string(),
            header: Style::default().fg(Color::Rgb(248, 248, 242)).add_modifier(Modifier::BOLD),
            dim: Style::default().fg(Color::Rgb(98, 114, 164)),
            border: Style::default().fg(Color::Rgb(68, 71, 90)),
            status: Style::default().fg(Color::Rgb(248, 248, 242)).bg(Color::Rgb(68, 71, 90)),
            selected: Style::default().fg(Color::Black).bg(Color::Rgb(139, 233, 253)),
            today_bg: Color::Rgb(68, 71, 90),
            other_month_bg: Color::Rgb(33, 34, 44),
            chip_normal: Color::Rgb(189, 147, 249),
            chip_high: Color::Rgb(255, 85, 85),
            chip_low: Color::Rgb(98, 114, 164),
            ..Self::default()
        }
    }

    pub fn cell_bg(&self, in_month: bool, is_today: bool) -> Color {
        if is_today {
            self.today_bg
        } else if in_month {
            self.month_bg
        } else {
            self.other_month_bg
        }
    }

    /// Chip colours: completed lines use the muted palette and strike-through.
    pub fn chip(&self, chip: &ChipStyle) -> Style {
        if chip.completed {
            return Style::default()
                .fg(self.chip_done_text)
                .bg(self.chip_done)
                .add_modifier(Modifier::CROSSED_OUT);
        }
        let bg = match chip.priority {
            Priority::High => self.chip_high,
            Priority::Low => self.chip_low,
            Priority::Normal => self.chip_normal,
        };
        Style::default().fg(self.chip_text).bg(bg)
    }

    /// Rounded end of a chip: the chip colour drawn over the cell background.
    pub fn chip_cap(&self, chip: &ChipStyle, cell_bg: Color) -> Style {
        let fill = self.chip(chip).bg.unwrap_or(Color::Reset);
        Style::default().fg(fill).bg(cell_bg)
    }
}

fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("widget-calendar").join("theme.toml"))
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ThemeConfig {
    preset: Option<String>,
    today_bg: Option<String>,
    other_month_bg: Option<String>,
    selected_fg: Option<String>,
    selected_bg: Option<String>,
    header_fg: Option<String>,
    border_fg: Option<String>,
    status_fg: Option<String>,
    status_bg: Option<String>,
    chip_normal: Option<String>,
    chip_high: Option<String>,
    chip_low: Option<String>,
    chip_done: Option<String>,
    chip_text: Option<String>,
}

impl ThemeConfig {
    fn into_theme(self) -> Theme {
        let mut theme = self
            .preset
            .as_deref()
            .map(Theme::preset)
            .unwrap_or_default();

        let color = |value: &Option<String>| value.as_deref().and_then(parse_color);

        if let Some(c) = color(&self.selected_fg) {
            theme.selected = theme.selected.fg(c);
        }
        if let Some(c) = color(&self.selected_bg) {
            theme.selected = theme.selected.bg(c);
        }
        if let Some(c) = color(&self.header_fg) {
            theme.header = theme.header.fg(c);
        }
        if let Some(c) = color(&self.border_fg) {
            theme.border = theme.border.fg(c);
        }
        if let Some(c) = color(&self.status_fg) {
            theme.status = theme.status.fg(c);
        }
        if let Some(c) = color(&self.status_bg) {
            theme.status = theme.status.bg(c);
        }

        let plain = [
            (&self.today_bg, &mut theme.today_bg),
            (&self.other_month_bg, &mut theme.other_month_bg),
            (&self.chip_normal, &mut theme.chip_normal),
            (&self.chip_high, &mut theme.chip_high),
            (&self.chip_low, &mut theme.chip_low),
            (&self.chip_done, &mut theme.chip_done),
            (&self.chip_text, &mut theme.chip_text),
        ];
        for (value, slot) in plain {
            if let Some(c) = color(value) {
                *slot = c;
            }
        }

        theme
    }
}

/// Parse "#rrggbb" or a basic colour name.
fn parse_color(s: &str) -> Option<Color> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix('#').filter(|h| h.len() == 6) {
        let r = u8::from_str_radix(hex.get(0..2)?, 16).ok()?;
        let g = u8::from_str_radix(hex.get(2..4)?, 16).ok()?;
        let b = u8::from_str_radix(hex.get(4..6)?, 16).ok()?;
        return Some(Color::Rgb(r, g, b));
    }
    match s.to_lowercase().as_str() {
        "black" => Some(Color::Black),
        "red" => Some(Color::Red),
        "green" => Some(Color::Green),
        "yellow" => Some(Color::Yellow),
        "blue" => Some(Color::Blue),
        "magenta" => Some(Color::Magenta),
        "cyan" => Some(Color::Cyan),
        "white" => Some(Color::White),
        "gray" | "grey" => Some(Color::Gray),
        "darkgray" | "darkgrey" => Some(Color::DarkGray),
        "reset" | "none" => Some(Color::Reset),
        _ => None,
    }
}
