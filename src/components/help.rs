use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::theme;

const SECTIONS: [(&str, &[(&str, &str)]); 4] = [
    (
        "Navigation",
        &[
            ("h/l \u{2190}/\u{2192}", "Previous/next day"),
            ("j/k \u{2191}/\u{2193}", "Previous/next week, or item in day view"),
            ("[ / ]", "Previous/next month"),
            ("t", "Back to the current month"),
            ("Enter", "Open the selected day"),
        ],
    ),
    (
        "Items",
        &[
            ("n", "New item"),
            ("e", "Edit item (whole series)"),
            ("Space", "Toggle completion"),
            ("d", "Delete item (whole series)"),
        ],
    ),
    (
        "Import / export",
        &[
            ("i / x", "Import / export .ics"),
            ("H", "Import public holidays"),
            ("R", "Remove imported holidays"),
        ],
    ),
    (
        "Preferences",
        &[("L", "Cycle language"), ("S", "Toggle completion sound"), ("q / Esc", "Quit / close popup")],
    ),
];

pub struct Help;

impl Help {
    pub fn render(frame: &mut Frame, area: Rect) {
        let popup_w = area.width.clamp(30, 58).min(area.width);
        let popup_h = area.height.clamp(12, 24).min(area.height);
        let x = area.x + area.width.saturating_sub(popup_w) / 2;
        let y = area.y + area.height.saturating_sub(popup_h) / 2;
        let popup_area = Rect::new(x, y, popup_w, popup_h);

        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title(" Keybindings ")
            .title_style(Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green));
        let inner = block.inner(popup_area);
        frame.render_widget(block, popup_area);

        let key_style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
        let section_style = Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED);

        let mut lines = Vec::new();
        for (i, (section, keys)) in SECTIONS.iter().enumerate() {
            if i > 0 {
                lines.push(Line::from(""));
            }
            lines.push(Line::from(Span::styled(*section, section_style)));
            for (key, desc) in keys.iter() {
                lines.push(Line::from(vec![
                    Span::styled(format!("  {key:<10}"), key_style),
                    Span::styled(*desc, theme::current().dim),
                ]));
            }
        }

        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
    }
}
