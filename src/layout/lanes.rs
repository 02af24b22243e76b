use chrono::NaiveDate;

use crate::calendar::TodoItem;

pub const LANE_COUNT: usize = 3;

/// A multi-day occurrence pinned to a lane over a clipped day-index range.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement<'a> {
    pub item: &'a TodoItem,
    pub start: usize,
    pub end: usize,
    pub lane: usize,
}

impl Placement<'_> {
    pub fn covers(&self, day: usize) -> bool {
        self.start <= day && day <= self.end
    }
}

pub fn overlaps(a: (usize, usize), b: (usize, usize)) -> bool {
    a.0 <= b.1 && b.0 <= a.1
}

/// Day index of `date` in a window of `total_days` days, clamped into it.
pub fn day_index(date: NaiveDate, window_start: NaiveDate, total_days: usize) -> usize {
    let last = total_days.saturating_sub(1) as i64;
    (date - window_start).num_days().clamp(0, last) as usize
}

/// Greedy first-fit lane assignment for multi-day occurrences.
///
/// Occurrences are taken in (start, end, id) order and put in the lowest
/// lane with no overlapping interval. When all lanes are taken the
/// occurrence is left out. Single-day occurrences never get a lane.
pub fn assign_lanes<'a>(
    occurrences: &'a [TodoItem],
    window_start: NaiveDate,
    total_days: usize,
) -> Vec<Placement<'a>> {
    if total_days == 0 {
        return Vec::new();
    }

    let mut multi: Vec<&TodoItem> = occurrences.iter().filter(|o| o.is_multi_day()).collect();
    multi.sort_by(|a, b| {
        a.start_date
            .cmp(&b.start_date)
            .then_with(|| a.end_date.cmp(&b.end_date))
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut lane_intervals: [Vec<(usize, usize)>; LANE_COUNT] = Default::default();
    let mut placements = Vec::new();

    for item in multi {
        let interval = (
            day_index(item.start_date, window_start, total_days),
            day_index(item.end_date, window_start, total_days),
        );
        let free = lane_intervals
            .iter()
            .position(|taken| taken.iter().all(|&other| !overlaps(other, interval)));
        let Some(lane) = free else {
            continue;
        };
        lane_intervals[lane].push(interval);
        placements.push(Placement {
            item,
            start: interval.0,
            end: interval.1,
            lane,
        });
    }

    placements
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn span(id: &str, start: u32, end: u32) -> TodoItem {
        let mut item = TodoItem::new(id, id, day(start));
        item.end_date = day(end);
        item
    }

    fn lanes<'a>(placements: &'a [Placement<'a>]) -> Vec<(&'a str, usize)> {
        placements.iter().map(|p| (p.item.id.as_str(), p.lane)).collect()
    }

    #[test]
    fn fourth_overlapping_span_is_dropped() {
        let items = vec![span("a", 2, 4), span("b", 3, 5), span("c", 1, 6), span("d", 3, 3), span("e", 4, 8)];
        let placed = assign_lanes(&items, day(1), 35);
        assert_eq!(lanes(&placed), vec![("c", 0), ("a", 1), ("b", 2)]);
    }

    #[test]
    fn lanes_are_reused_once_free() {
        let items = vec![span("a", 1, 3), span("b", 4, 6), span("c", 2, 5)];
        let placed = assign_lanes(&items, day(1), 35);
        assert_eq!(lanes(&placed), vec![("a", 0), ("c", 1), ("b", 0)]);
    }

    #[test]
    fn ties_break_on_id() {
        let items = vec![span("z", 2, 4), span("m", 2, 4)];
        let placed = assign_lanes(&items, day(1), 35);
        assert_eq!(lanes(&placed), vec![("m", 0), ("z", 1)]);
    }

    #[test]
    fn spans_outside_window_are_clipped() {
        let items = vec![span("early", 1, 5), span("late", 9, 20)];
        let placed = assign_lanes(&items, day(3), 7);
        let ranges: Vec<(usize, usize)> = placed.iter().map(|p| (p.start, p.end)).collect();
        assert_eq!(ranges, vec![(0, 2), (6, 6)]);
    }

    #[test]
    fn no_two_placements_in_a_lane_overlap() {
        let items: Vec<TodoItem> = (1..=20)
            .map(|i| span(&format!("s{i:02}"), i, (i + (i * 7) % 5 + 1).min(28)))
            .collect();
        let placed = assign_lanes(&items, day(1), 35);
        for (i, a) in placed.iter().enumerate() {
            for b in &placed[i + 1..] {
                if a.lane == b.lane {
                    assert!(!overlaps((a.start, a.end), (b.start, b.end)), "{} vs {}", a.item.id, b.item.id);
                }
            }
        }
    }
}
