use chrono::NaiveDate;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::calendar::{SpanPosition, TodoItem};
use crate::layout::{CellMeasure, ChipStyle, TextMeasure};
use crate::locale::{Locale, Msg};
use crate::theme;

/// Detail list of every item covering one day.
pub struct DayView;

impl DayView {
    pub fn render(
        frame: &mut Frame,
        area: Rect,
        date: NaiveDate,
        items: &[TodoItem],
        selected: usize,
        locale: &Locale,
    ) {
        frame.render_widget(Clear, area);

        let count = format!(" {} ", items.len());
        let block = Block::default()
            .title(format!(" {} ", locale.pretty_date(date)))
            .title_style(theme::current().header)
            .title_bottom(Line::from(Span::styled(count, theme::current().dim)))
            .borders(Borders::ALL)
            .border_style(theme::current().border);

        if items.is_empty() {
            let inner = block.inner(area);
            frame.render_widget(block, area);
            frame.render_widget(
                Paragraph::new(locale.text(Msg::NoItems)).style(theme::current().dim),
                inner,
            );
            return;
        }

        let width = f32::from(area.width.saturating_sub(8));
        let rows: Vec<ListItem> = items.iter().map(|item| item_row(item, width, locale)).collect();
        let list = List::new(rows)
            .block(block)
            .highlight_style(theme::current().selected);
        let mut state = ListState::default().with_selected(Some(selected.min(items.len() - 1)));
        frame.render_stateful_widget(list, area, &mut state);
    }
}

fn item_row(item: &TodoItem, width: f32, locale: &Locale) -> ListItem<'static> {
    let chip = theme::current().chip(&ChipStyle {
        position: SpanPosition::Single,
        completed: item.completed,
        priority: item.priority,
        multi_day: item.is_multi_day(),
    });
    let check = if item.completed { "[x] " } else { "[ ] " };
    let title_style = if item.completed {
        Style::default().add_modifier(Modifier::CROSSED_OUT)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };

    let mut lines = vec![Line::from(vec![
        Span::styled(" ", chip),
        Span::raw(" "),
        Span::raw(check),
        Span::styled(CellMeasure.ellipsize(&item.title, width), title_style),
    ])];

    let mut meta = locale.item_meta(item);
    if item.recurrence.is_recurring() {
        meta.push_str(&format!(" | {}", locale.recurrence(item.recurrence)));
    }
    if !item.source_tag.is_empty() {
        meta.push_str(&format!(" | {}", item.source_tag));
    }
    lines.push(Line::from(Span::styled(
        format!("      {}", CellMeasure.ellipsize(&meta, width)),
        theme::current().dim,
    )));
    if !item.description.is_empty() {
        lines.push(Line::from(Span::styled(
            format!("      {}", CellMeasure.ellipsize(&item.description, width)),
            theme::current().dim,
        )));
    }

    ListItem::new(lines)
}
