use std::collections::HashSet;

use chrono::{Datelike, Days, Months, NaiveDate};
use tracing::debug;

use crate::calendar::{expand_items_for_range, Priority, SpanPosition, TodoItem};

use super::lanes::{assign_lanes, Placement, LANE_COUNT};
use super::measure::{estimate_day_width, TextMeasure};
use super::segment::{segment_for_day, segment_line_text, DAYS_PER_ROW};

/// Visual treatment of a line: chip caps, palette and strike-through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChipStyle {
    pub position: SpanPosition,
    pub completed: bool,
    pub priority: Priority,
    pub multi_day: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayLine {
    pub text: String,
    pub style: ChipStyle,
}

pub type LaneSlots = [Option<DayLine>; LANE_COUNT];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayCell {
    pub date: NaiveDate,
    pub day_number: u32,
    pub lines: LaneSlots,
    pub in_month: bool,
    pub is_today: bool,
}

/// The Sunday-aligned run of days shown for one month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridWindow {
    pub month: NaiveDate,
    pub first_day: NaiveDate,
    pub rows: usize,
}

impl GridWindow {
    /// Window for the month containing `date`.
    pub fn for_month(date: NaiveDate) -> Self {
        let month = first_of_month(date);
        let lead = u64::from(month.weekday().num_days_from_sunday());
        Self {
            month,
            first_day: month - Days::new(lead),
            rows: visible_row_count(month),
        }
    }

    pub fn total_days(&self) -> usize {
        self.rows * DAYS_PER_ROW
    }

    pub fn date_at(&self, index: usize) -> NaiveDate {
        self.first_day + Days::new(index as u64)
    }

    pub fn last_day(&self) -> NaiveDate {
        self.date_at(self.total_days() - 1)
    }

    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        let offset = (date - self.first_day).num_days();
        usize::try_from(offset).ok().filter(|&i| i < self.total_days())
    }

    pub fn in_month(&self, date: NaiveDate) -> bool {
        date.year() == self.month.year() && date.month() == self.month.month()
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn days_in_month(month: NaiveDate) -> u32 {
    let first = first_of_month(month);
    first
        .checked_add_months(Months::new(1))
        .map_or(31, |next| (next - first).num_days() as u32)
}

/// Five rows when the month fits in 35 cells, otherwise six.
pub fn visible_row_count(month: NaiveDate) -> usize {
    let first = first_of_month(month);
    let lead = first.weekday().num_days_from_sunday();
    let needed = (lead + days_in_month(first) + 6) / 7;
    needed.clamp(5, 6) as usize
}

/// First day of the month `offset` months away from `today`'s month.
pub fn displayed_month(today: NaiveDate, offset: i32) -> NaiveDate {
    let base = first_of_month(today);
    let shifted = if offset >= 0 {
        base.checked_add_months(Months::new(offset.unsigned_abs()))
    } else {
        base.checked_sub_months(Months::new(offset.unsigned_abs()))
    };
    shifted.unwrap_or(base)
}

/// Lane lines for every day of the window, from the multi-day placements only.
pub fn lane_slots<M: TextMeasure + ?Sized>(
    placements: &[Placement<'_>],
    total_days: usize,
    day_width: f32,
    measure: &M,
) -> Vec<LaneSlots> {
    let mut slots: Vec<LaneSlots> = vec![Default::default(); total_days];
    for placement in placements {
        for day in placement.start..=placement.end.min(total_days.saturating_sub(1)) {
            let segment = segment_for_day(placement.start, placement.end, day);
            slots[day][placement.lane] = Some(DayLine {
                text: segment_line_text(placement, day, day_width, measure),
                style: ChipStyle {
                    position: segment.position(day),
                    completed: placement.item.completed,
                    priority: placement.item.priority,
                    multi_day: true,
                },
            });
        }
    }
    slots
}

/// Line for an item drawn on its own in one day cell.
fn day_line(item: &TodoItem, date: NaiveDate) -> DayLine {
    let position = if item.start_date == item.end_date {
        SpanPosition::Single
    } else if date == item.start_date {
        SpanPosition::Start
    } else if date == item.end_date {
        SpanPosition::End
    } else {
        SpanPosition::Middle
    };
    DayLine {
        text: item.label(),
        style: ChipStyle {
            position,
            completed: item.completed,
            priority: item.priority,
            multi_day: false,
        },
    }
}

/// Put `extras` into free lanes and mark how many did not fit.
fn fill_extras(lines: &mut LaneSlots, extras: &[&TodoItem], date: NaiveDate) {
    let free: Vec<usize> = (0..LANE_COUNT).filter(|&lane| lines[lane].is_none()).collect();
    for (&lane, item) in free.iter().zip(extras) {
        lines[lane] = Some(day_line(item, date));
    }

    let hidden = extras.len().saturating_sub(free.len());
    if hidden == 0 {
        return;
    }
    let target = (0..LANE_COUNT)
        .rev()
        .find(|&lane| lines[lane].as_ref().is_some_and(|l| !l.style.multi_day))
        .or_else(|| (0..LANE_COUNT).rev().find(|&lane| lines[lane].is_some()));
    if let Some(line) = target.and_then(|lane| lines[lane].as_mut()) {
        line.text.push_str(&format!(" +{hidden}"));
    }
}

/// Build every day cell of `window`.
pub fn build_cells<M: TextMeasure + ?Sized>(
    items: &[TodoItem],
    window: &GridWindow,
    today: NaiveDate,
    day_width: f32,
    measure: &M,
) -> Vec<DayCell> {
    let total_days = window.total_days();
    let visible = expand_items_for_range(items, window.first_day, window.last_day());
    let placements = assign_lanes(&visible, window.first_day, total_days);
    let slots = lane_slots(&placements, total_days, day_width, measure);

    debug!(
        occurrences = visible.len(),
        placed = placements.len(),
        days = total_days,
        "built grid"
    );

    slots
        .into_iter()
        .enumerate()
        .map(|(index, mut lines)| {
            let date = window.date_at(index);
            let in_lane: HashSet<&str> = placements
                .iter()
                .filter(|p| p.covers(index))
                .map(|p| p.item.id.as_str())
                .collect();
            let extras: Vec<&TodoItem> = visible
                .iter()
                .filter(|item| item.covers(date) && !in_lane.contains(item.id.as_str()))
                .collect();
            fill_extras(&mut lines, &extras, date);

            DayCell {
                date,
                day_number: date.day(),
                lines,
                in_month: window.in_month(date),
                is_today: date == today,
            }
        })
        .collect()
}

/// Holds the cell list for one widget instance and rebuilds it on demand.
#[derive(Debug)]
pub struct GridFactory<M> {
    measure: M,
    widget_width: u16,
    day_width: Option<f32>,
    window: GridWindow,
    cells: Vec<DayCell>,
}

impl<M: TextMeasure> GridFactory<M> {
    pub fn new(measure: M, widget_width: u16, month: NaiveDate) -> Self {
        Self {
            measure,
            widget_width,
            day_width: None,
            window: GridWindow::for_month(month),
            cells: Vec::new(),
        }
    }

    pub fn widget_width(&self) -> u16 {
        self.widget_width
    }

    pub fn set_widget_width(&mut self, width: u16) {
        self.widget_width = width;
    }

    pub fn day_width(&self) -> f32 {
        self.day_width
            .unwrap_or_else(|| estimate_day_width(self.widget_width))
    }

    /// Drop every cached value and rebuild the cells from scratch.
    pub fn on_data_set_changed(&mut self, items: &[TodoItem], month: NaiveDate, today: NaiveDate) {
        let day_width = estimate_day_width(self.widget_width);
        self.day_width = Some(day_width);
        self.window = GridWindow::for_month(month);
        self.cells = build_cells(items, &self.window, today, day_width, &self.measure);
    }

    pub fn window(&self) -> &GridWindow {
        &self.window
    }

    pub fn cells(&self) -> &[DayCell] {
        &self.cells
    }
}
