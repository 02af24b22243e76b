use chrono::NaiveDate;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::calendar::SpanPosition;
use crate::layout::{CellMeasure, DayCell, DayLine, GridWindow, TextMeasure};
use crate::locale::Locale;
use crate::theme::{self, Theme};

pub struct MonthGrid;

impl MonthGrid {
    pub fn render(
        frame: &mut Frame,
        area: Rect,
        window: &GridWindow,
        cells: &[DayCell],
        selected: NaiveDate,
        locale: &Locale,
    ) {
        let theme = theme::current();
        let block = Block::default()
            .title(format!(" {} ", locale.month_title(window.month)))
            .title_style(theme.header)
            .borders(Borders::ALL)
            .border_style(theme.border);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let [header, body] = Layout::vertical([Constraint::Length(1), Constraint::Min(0)]).areas(inner);
        let columns = Layout::horizontal([Constraint::Ratio(1, 7); 7]);

        for (i, col) in columns.split(header).iter().enumerate() {
            let label = format!("{:^width$}", locale.weekday(i), width = col.width as usize);
            frame.render_widget(Paragraph::new(label).style(theme.weekday), *col);
        }

        let row_areas = Layout::vertical(vec![Constraint::Ratio(1, window.rows as u32); window.rows]).split(body);
        for (row, row_area) in row_areas.iter().enumerate() {
            for (col, cell_area) in columns.split(*row_area).iter().enumerate() {
                if let Some(cell) = cells.get(row * 7 + col) {
                    render_cell(frame, *cell_area, cell, cell.date == selected, theme);
                }
            }
        }
    }
}

fn render_cell(frame: &mut Frame, area: Rect, cell: &DayCell, selected: bool, theme: &Theme) {
    let bg = theme.cell_bg(cell.in_month, cell.is_today);
    let number_style = if selected {
        theme.selected
    } else if cell.in_month {
        theme.day_number
    } else {
        theme.other_month_number
    };
    let number_style = if cell.is_today {
        number_style.add_modifier(Modifier::BOLD)
    } else {
        number_style
    };

    let width = area.width as usize;
    let mut lines = vec![Line::from(Span::styled(format!("{:>2}", cell.day_number), number_style))];
    for line in &cell.lines {
        lines.push(match line {
            Some(line) => Line::from(chip_spans(line, width, bg, theme)),
            None => Line::raw(""),
        });
    }

    frame.render_widget(Paragraph::new(lines).style(Style::default().bg(bg)), area);
}

const LEFT_CAP: char = '\u{2590}';
const RIGHT_CAP: char = '\u{258C}';

/// Which ends of a chip are rounded. Multi-day bars are capped only where
/// the row segment starts or ends so adjacent days join into one bar;
/// single-day items are always pills.
pub fn chip_caps(line: &DayLine) -> (bool, bool) {
    if !line.style.multi_day {
        return (true, true);
    }
    match line.style.position {
        SpanPosition::Single => (true, true),
        SpanPosition::Start => (true, false),
        SpanPosition::Middle => (false, false),
        SpanPosition::End => (false, true),
    }
}

/// Chip body for one lane, between its caps. Multi-day bodies fill the rest
/// of the cell; single items stay as wide as their label.
pub fn chip_text(line: &DayLine, width: usize) -> String {
    let (left, right) = chip_caps(line);
    let inner = width.saturating_sub(usize::from(left) + usize::from(right));
    let text = CellMeasure.ellipsize(&line.text, inner as f32);
    if line.style.multi_day {
        pad(&text, inner)
    } else {
        text
    }
}

fn pad(text: &str, width: usize) -> String {
    let used = CellMeasure.width(text) as usize;
    format!("{text}{}", " ".repeat(width.saturating_sub(used)))
}

fn chip_spans(line: &DayLine, width: usize, cell_bg: Color, theme: &Theme) -> Vec<Span<'static>> {
    let (left, right) = chip_caps(line);
    let cap = theme.chip_cap(&line.style, cell_bg);
    let mut spans = Vec::with_capacity(3);
    if left {
        spans.push(Span::styled(LEFT_CAP.to_string(), cap));
    }
    spans.push(Span::styled(chip_text(line, width), theme.chip(&line.style)));
    if right {
        spans.push(Span::styled(RIGHT_CAP.to_string(), cap));
    }
    spans
}
