use std::cmp::Ordering;

use chrono::NaiveDate;

pub const MAX_TITLE_LENGTH: usize = 60;
pub const MINUTES_PER_DAY: u16 = 1440;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

impl Priority {
    /// Integer code used in the persisted blob and `X-WIDGET-PRIORITY`.
    pub fn code(self) -> i64 {
        match self {
            Priority::Low => 0,
            Priority::Normal => 1,
            Priority::High => 2,
        }
    }

    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Priority::Low,
            2 => Priority::High,
            _ => Priority::Normal,
        }
    }

    /// Accepts either the integer code or a case-insensitive name.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if let Ok(code) = value.parse::<i64>() {
            return Self::from_code(code);
        }
        match value.to_ascii_uppercase().as_str() {
            "LOW" => Priority::Low,
            "HIGH" => Priority::High,
            _ => Priority::Normal,
        }
    }

    /// RFC 5545 PRIORITY value (1 highest, 9 lowest).
    pub fn to_ics(self) -> u8 {
        match self {
            Priority::High => 1,
            Priority::Normal => 5,
            Priority::Low => 9,
        }
    }

    pub fn from_ics(value: u8) -> Self {
        match value {
            1..=3 => Priority::High,
            7..=9 => Priority::Low,
            _ => Priority::Normal,
        }
    }

    fn rank(self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Normal => 1,
            Priority::Low => 2,
        }
    }

    pub fn cycle(self) -> Self {
        match self {
            Priority::Low => Priority::Normal,
            Priority::Normal => Priority::High,
            Priority::High => Priority::Low,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Recurrence {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Recurrence {
    pub fn as_str(self) -> &'static str {
        match self {
            Recurrence::None => "NONE",
            Recurrence::Daily => "DAILY",
            Recurrence::Weekly => "WEEKLY",
            Recurrence::Monthly => "MONTHLY",
            Recurrence::Yearly => "YEARLY",
        }
    }

    /// Unknown strings coerce to `None`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "DAILY" => Recurrence::Daily,
            "WEEKLY" => Recurrence::Weekly,
            "MONTHLY" => Recurrence::Monthly,
            "YEARLY" => Recurrence::Yearly,
            _ => Recurrence::None,
        }
    }

    pub fn is_recurring(self) -> bool {
        self != Recurrence::None
    }

    pub fn cycle(self) -> Self {
        match self {
            Recurrence::None => Recurrence::Daily,
            Recurrence::Daily => Recurrence::Weekly,
            Recurrence::Weekly => Recurrence::Monthly,
            Recurrence::Monthly => Recurrence::Yearly,
            Recurrence::Yearly => Recurrence::None,
        }
    }
}

/// Where a day cell falls within a rendered chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpanPosition {
    Single,
    Start,
    Middle,
    End,
}

impl SpanPosition {
    pub fn within(first: usize, last: usize, index: usize) -> Self {
        if first == last {
            SpanPosition::Single
        } else if index == first {
            SpanPosition::Start
        } else if index == last {
            SpanPosition::End
        } else {
            SpanPosition::Middle
        }
    }
}

/// Time-of-day window in minutes after midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSpan {
    pub start_minute: u16,
    pub end_minute: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub time: Option<TimeSpan>,
    pub completed: bool,
    pub source_tag: String,
    pub priority: Priority,
    pub recurrence: Recurrence,
    pub recurrence_until: Option<NaiveDate>,
    /// Template id for expanded occurrences; `None` for stored items.
    pub series_id: Option<String>,
}

impl TodoItem {
    /// An untimed single-day item with default priority.
    pub fn new(id: impl Into<String>, title: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            start_date: date,
            end_date: date,
            time: None,
            completed: false,
            source_tag: String::new(),
            priority: Priority::Normal,
            recurrence: Recurrence::None,
            recurrence_until: None,
            series_id: None,
        }
    }

    pub fn is_multi_day(&self) -> bool {
        self.start_date != self.end_date
    }

    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    pub fn duration_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days().max(0)
    }

    pub fn is_generated(&self) -> bool {
        self.series_id.is_some()
    }

    /// Id of the stored item this instance belongs to.
    pub fn series_key(&self) -> &str {
        self.series_id.as_deref().unwrap_or(&self.id)
    }

    pub fn time_prefix(&self) -> Option<String> {
        self.time.map(|t| format!("{} ", format_minute(t.start_minute)))
    }

    /// Title with the `HH:MM ` prefix for timed items.
    pub fn label(&self) -> String {
        match self.time_prefix() {
            Some(prefix) => format!("{}{}", prefix, self.title),
            None => self.title.clone(),
        }
    }

    /// Clamp every field into its valid range.
    pub fn normalized(mut self) -> Self {
        self.title = normalize_title(&self.title);
        self.source_tag = self.source_tag.trim().to_string();

        if self.end_date < self.start_date {
            std::mem::swap(&mut self.start_date, &mut self.end_date);
        }

        self.time = self
            .time
            .filter(|t| t.start_minute < MINUTES_PER_DAY && t.end_minute < MINUTES_PER_DAY)
            .map(|t| {
                if self.start_date == self.end_date && t.end_minute < t.start_minute {
                    TimeSpan {
                        start_minute: t.end_minute,
                        end_minute: t.start_minute,
                    }
                } else {
                    t
                }
            });

        self.recurrence_until = if self.recurrence.is_recurring() {
            self.recurrence_until.map(|until| until.max(self.start_date))
        } else {
            None
        };

        self
    }
}

/// Collapse whitespace runs and cap the title at [`MAX_TITLE_LENGTH`] characters.
pub fn normalize_title(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= MAX_TITLE_LENGTH {
        collapsed
    } else {
        collapsed.chars().take(MAX_TITLE_LENGTH).collect()
    }
}

pub fn format_minute(minute: u16) -> String {
    let safe = minute.min(MINUTES_PER_DAY - 1);
    format!("{:02}:{:02}", safe / 60, safe % 60)
}

pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Display order: open before completed, higher priority first, timed before
/// untimed, earlier start minute first, then title.
pub fn display_order(a: &TodoItem, b: &TodoItem) -> Ordering {
    a.completed
        .cmp(&b.completed)
        .then_with(|| a.priority.rank().cmp(&b.priority.rank()))
        .then_with(|| a.time.is_none().cmp(&b.time.is_none()))
        .then_with(|| {
            let a_minute = a.time.map_or(u16::MAX, |t| t.start_minute);
            let b_minute = b.time.map_or(u16::MAX, |t| t.start_minute);
            a_minute.cmp(&b_minute)
        })
        .then_with(|| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
}

pub fn sort_for_display(items: &mut [TodoItem]) {
    items.sort_by(display_order);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn normalize_title_collapses_whitespace() {
        assert_eq!(normalize_title("  buy \t milk \n and  eggs "), "buy milk and eggs");
    }

    #[test]
    fn normalize_title_truncates_to_sixty_chars() {
        let long = "x".repeat(75);
        assert_eq!(normalize_title(&long).chars().count(), MAX_TITLE_LENGTH);

        let wide = "日".repeat(61);
        assert_eq!(normalize_title(&wide), "日".repeat(60));
    }

    #[test]
    fn normalized_swaps_reversed_dates() {
        let mut item = TodoItem::new("a", "Trip", day(2026, 3, 10));
        item.end_date = day(2026, 3, 7);
        let item = item.normalized();
        assert_eq!(item.start_date, day(2026, 3, 7));
        assert_eq!(item.end_date, day(2026, 3, 10));
    }

    #[test]
    fn normalized_swaps_same_day_minutes() {
        let mut item = TodoItem::new("a", "Call", day(2026, 3, 10));
        item.time = Some(TimeSpan {
            start_minute: 600,
            end_minute: 540,
        });
        let item = item.normalized();
        assert_eq!(
            item.time,
            Some(TimeSpan {
                start_minute: 540,
                end_minute: 600
            })
        );
    }

    #[test]
    fn normalized_keeps_minutes_across_days() {
        let mut item = TodoItem::new("a", "Night shift", day(2026, 3, 10));
        item.end_date = day(2026, 3, 11);
        item.time = Some(TimeSpan {
            start_minute: 1320,
            end_minute: 360,
        });
        let item = item.normalized();
        assert_eq!(item.time.map(|t| t.start_minute), Some(1320));
    }

    #[test]
    fn normalized_drops_out_of_range_time() {
        let mut item = TodoItem::new("a", "Call", day(2026, 3, 10));
        item.time = Some(TimeSpan {
            start_minute: 1500,
            end_minute: 30,
        });
        assert_eq!(item.normalized().time, None);
    }

    #[test]
    fn normalized_clamps_recurrence_until() {
        let mut item = TodoItem::new("a", "Standup", day(2026, 3, 10));
        item.recurrence = Recurrence::Daily;
        item.recurrence_until = Some(day(2026, 3, 1));
        assert_eq!(item.normalized().recurrence_until, Some(day(2026, 3, 10)));

        let mut item = TodoItem::new("b", "Once", day(2026, 3, 10));
        item.recurrence_until = Some(day(2026, 4, 1));
        assert_eq!(item.normalized().recurrence_until, None);
    }

    #[test]
    fn invalid_enum_strings_coerce_to_defaults() {
        assert_eq!(Priority::parse("urgent"), Priority::Normal);
        assert_eq!(Priority::parse("2"), Priority::High);
        assert_eq!(Priority::parse("low"), Priority::Low);
        assert_eq!(Recurrence::parse("fortnightly"), Recurrence::None);
        assert_eq!(Recurrence::parse(" weekly "), Recurrence::Weekly);
    }

    #[test]
    fn display_order_ranks_completion_priority_and_time() {
        let date = day(2026, 3, 10);
        let mut done = TodoItem::new("1", "a done", date);
        done.completed = true;
        let mut high = TodoItem::new("2", "z high", date);
        high.priority = Priority::High;
        let mut early = TodoItem::new("3", "timed early", date);
        early.time = Some(TimeSpan {
            start_minute: 480,
            end_minute: 540,
        });
        let mut late = TodoItem::new("4", "timed late", date);
        late.time = Some(TimeSpan {
            start_minute: 900,
            end_minute: 960,
        });
        let plain_b = TodoItem::new("5", "B plain", date);
        let plain_a = TodoItem::new("6", "a plain", date);

        let mut items = vec![
            done.clone(),
            plain_b.clone(),
            late.clone(),
            plain_a.clone(),
            high.clone(),
            early.clone(),
        ];
        sort_for_display(&mut items);
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "3", "4", "6", "5", "1"]);
    }

    #[test]
    fn span_position_within_segment() {
        assert_eq!(SpanPosition::within(3, 3, 3), SpanPosition::Single);
        assert_eq!(SpanPosition::within(3, 6, 3), SpanPosition::Start);
        assert_eq!(SpanPosition::within(3, 6, 5), SpanPosition::Middle);
        assert_eq!(SpanPosition::within(3, 6, 6), SpanPosition::End);
    }

    #[test]
    fn label_prefixes_start_time() {
        let mut item = TodoItem::new("a", "Dentist", day(2026, 3, 10));
        assert_eq!(item.label(), "Dentist");
        item.time = Some(TimeSpan {
            start_minute: 545,
            end_minute: 600,
        });
        assert_eq!(item.label(), "09:05 Dentist");
    }
}
