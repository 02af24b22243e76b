use chrono::{NaiveDate, NaiveTime, Timelike};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::calendar::{date_key, format_minute, normalize_title, Priority, Recurrence, TimeSpan, TodoItem};
use crate::locale::{Locale, Msg};
use crate::theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Title,
    Description,
    StartDate,
    EndDate,
    HasTime,
    StartTime,
    EndTime,
    Priority,
    Recurrence,
    Until,
}

const FIELDS: [FormField; 10] = [
    FormField::Title,
    FormField::Description,
    FormField::StartDate,
    FormField::EndDate,
    FormField::HasTime,
    FormField::StartTime,
    FormField::EndTime,
    FormField::Priority,
    FormField::Recurrence,
    FormField::Until,
];

impl FormField {
    fn position(self) -> usize {
        FIELDS.iter().position(|f| *f == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        FIELDS[(self.position() + 1) % FIELDS.len()]
    }

    pub fn prev(self) -> Self {
        FIELDS[(self.position() + FIELDS.len() - 1) % FIELDS.len()]
    }

    /// Fields edited by cycling with Space instead of typing.
    pub fn is_choice(self) -> bool {
        matches!(self, FormField::HasTime | FormField::Priority | FormField::Recurrence)
    }
}

#[derive(Debug, Clone)]
pub struct ItemFormState {
    /// Id of the stored item being edited; `None` for a new item.
    pub editing: Option<String>,
    pub title: String,
    pub description: String,
    pub start_date: String,
    pub end_date: String,
    pub has_time: bool,
    pub start_time: String,
    pub end_time: String,
    pub priority: Priority,
    pub recurrence: Recurrence,
    pub until: String,
    pub completed: bool,
    pub source_tag: String,
    pub active_field: FormField,
}

impl ItemFormState {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            editing: None,
            title: String::new(),
            description: String::new(),
            start_date: date_key(date),
            end_date: date_key(date),
            has_time: false,
            start_time: "09:00".to_string(),
            end_time: "10:00".to_string(),
            priority: Priority::Normal,
            recurrence: Recurrence::None,
            until: String::new(),
            completed: false,
            source_tag: String::new(),
            active_field: FormField::Title,
        }
    }

    pub fn from_item(item: &TodoItem) -> Self {
        let mut state = Self::new(item.start_date);
        state.editing = Some(item.id.clone());
        state.title = item.title.clone();
        state.description = item.description.clone();
        state.end_date = date_key(item.end_date);
        if let Some(t) = item.time {
            state.has_time = true;
            state.start_time = format_minute(t.start_minute);
            state.end_time = format_minute(t.end_minute);
        }
        state.priority = item.priority;
        state.recurrence = item.recurrence;
        state.until = item.recurrence_until.map(date_key).unwrap_or_default();
        state.completed = item.completed;
        state.source_tag = item.source_tag.clone();
        state
    }

    fn text_mut(&mut self) -> Option<&mut String> {
        match self.active_field {
            FormField::Title => Some(&mut self.title),
            FormField::Description => Some(&mut self.description),
            FormField::StartDate => Some(&mut self.start_date),
            FormField::EndDate => Some(&mut self.end_date),
            FormField::StartTime => Some(&mut self.start_time),
            FormField::EndTime => Some(&mut self.end_time),
            FormField::Until => Some(&mut self.until),
            FormField::HasTime | FormField::Priority | FormField::Recurrence => None,
        }
    }

    pub fn input_char(&mut self, c: char) {
        if self.active_field.is_choice() {
            if c == ' ' {
                self.cycle_choice();
            }
            return;
        }
        if let Some(text) = self.text_mut() {
            text.push(c);
        }
    }

    pub fn backspace(&mut self) {
        if let Some(text) = self.text_mut() {
            text.pop();
        }
    }

    pub fn cycle_choice(&mut self) {
        match self.active_field {
            FormField::HasTime => self.has_time = !self.has_time,
            FormField::Priority => self.priority = self.priority.cycle(),
            FormField::Recurrence => self.recurrence = self.recurrence.cycle(),
            _ => {}
        }
    }

    /// Build the item to store, or the reason the input is rejected.
    pub fn build(&self, new_id: impl FnOnce() -> String) -> Result<TodoItem, Msg> {
        let title = normalize_title(&self.title);
        if title.is_empty() {
            return Err(Msg::BlankTitle);
        }
        let start = parse_date(&self.start_date).ok_or(Msg::BadDate)?;
        let end = parse_date(&self.end_date).ok_or(Msg::BadDate)?;
        if end < start {
            return Err(Msg::EndBeforeStart);
        }

        let time = if self.has_time {
            let start_minute = parse_minute(&self.start_time).ok_or(Msg::BadTime)?;
            let end_minute = parse_minute(&self.end_time).ok_or(Msg::BadTime)?;
            if start == end && end_minute < start_minute {
                return Err(Msg::EndTimeBeforeStart);
            }
            Some(TimeSpan {
                start_minute,
                end_minute,
            })
        } else {
            None
        };

        let until = if self.until.trim().is_empty() {
            None
        } else {
            Some(parse_date(&self.until).ok_or(Msg::BadDate)?)
        };

        let id = self.editing.clone().unwrap_or_else(new_id);
        let mut item = TodoItem::new(id, title, start);
        item.description = self.description.trim().to_string();
        item.end_date = end;
        item.time = time;
        item.completed = self.completed;
        item.source_tag = self.source_tag.clone();
        item.priority = self.priority;
        item.recurrence = self.recurrence;
        item.recurrence_until = until;
        Ok(item.normalized())
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

fn parse_minute(value: &str) -> Option<u16> {
    let time = NaiveTime::parse_from_str(value.trim(), "%H:%M").ok()?;
    u16::try_from(time.hour() * 60 + time.minute()).ok()
}

pub struct ItemForm;

impl ItemForm {
    pub fn render(frame: &mut Frame, area: Rect, state: &ItemFormState, locale: &Locale, error: Option<Msg>) {
        let form_w = area.width.clamp(30, 56);
        let form_h = area.height.clamp(10, 16);
        let x = area.x + area.width.saturating_sub(form_w) / 2;
        let y = area.y + area.height.saturating_sub(form_h) / 2;
        let form_area = Rect::new(x, y, form_w.min(area.width), form_h.min(area.height));

        frame.render_widget(Clear, form_area);

        let title = if state.editing.is_some() { " Edit " } else { " New " };
        let block = Block::default()
            .title(title)
            .title_style(Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green));
        let inner = block.inner(form_area);
        frame.render_widget(block, form_area);

        let mut constraints = vec![Constraint::Length(1); FIELDS.len() + 2];
        constraints.push(Constraint::Min(0));
        let rows = Layout::vertical(constraints).split(inner);

        for (row, field) in rows.iter().zip(FIELDS) {
            let (label, value) = field_text(state, field, locale);
            let enabled = state.has_time || !matches!(field, FormField::StartTime | FormField::EndTime);
            let value = if enabled { value } else { "--:--".to_string() };
            render_field(frame, *row, label, &value, enabled && state.active_field == field);
        }

        let footer = match error {
            Some(msg) => Line::from(Span::styled(locale.text(msg), Style::default().fg(Color::Red))),
            None => Line::from(vec![
                Span::styled("Tab", Style::default().add_modifier(Modifier::BOLD)),
                Span::styled(":Next ", theme::current().dim),
                Span::styled("Space", Style::default().add_modifier(Modifier::BOLD)),
                Span::styled(":Toggle ", theme::current().dim),
                Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
                Span::styled(":Save ", theme::current().dim),
                Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
                Span::styled(":Cancel", theme::current().dim),
            ]),
        };
        if let Some(row) = rows.get(FIELDS.len() + 1) {
            frame.render_widget(Paragraph::new(footer), *row);
        }
    }
}

fn field_text(state: &ItemFormState, field: FormField, locale: &Locale) -> (&'static str, String) {
    match field {
        FormField::Title => (locale.text(Msg::Title), state.title.clone()),
        FormField::Description => (locale.text(Msg::Description), state.description.clone()),
        FormField::StartDate => (locale.text(Msg::StartDate), state.start_date.clone()),
        FormField::EndDate => (locale.text(Msg::EndDate), state.end_date.clone()),
        FormField::HasTime => (
            locale.text(Msg::HasTime),
            if state.has_time { "[x]" } else { "[ ]" }.to_string(),
        ),
        FormField::StartTime => (locale.text(Msg::StartTime), state.start_time.clone()),
        FormField::EndTime => (locale.text(Msg::EndTime), state.end_time.clone()),
        FormField::Priority => (locale.text(Msg::Priority), locale.priority(state.priority).to_string()),
        FormField::Recurrence => (locale.text(Msg::Recurrence), locale.recurrence(state.recurrence).to_string()),
        FormField::Until => (locale.text(Msg::Until), state.until.clone()),
    }
}

fn render_field(frame: &mut Frame, area: Rect, label: &str, value: &str, active: bool) {
    let cursor = if active { "_" } else { "" };
    let style = if active {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let line = Line::from(vec![
        Span::styled(format!("{label:<14}"), theme::current().dim),
        Span::styled(format!("{value}{cursor}"), style),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}
