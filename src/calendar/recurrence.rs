use chrono::{Days, Months, NaiveDate};

use super::item::{date_key, sort_for_display, Recurrence, TodoItem};

/// Upper bound on period steps per item, guarding against malformed data.
pub const MAX_EXPANSION_STEPS: usize = 2000;

/// Start of the period after `current`, using calendar arithmetic for
/// months and years (Jan 31 + 1 month lands on the last day of February).
pub fn next_start(current: NaiveDate, recurrence: Recurrence) -> Option<NaiveDate> {
    match recurrence {
        Recurrence::None => None,
        Recurrence::Daily => current.checked_add_days(Days::new(1)),
        Recurrence::Weekly => current.checked_add_days(Days::new(7)),
        Recurrence::Monthly => current.checked_add_months(Months::new(1)),
        Recurrence::Yearly => current.checked_add_months(Months::new(12)),
    }
}

/// Every occurrence of `item` whose span intersects `[range_start, range_end]`.
pub fn occurrences(item: &TodoItem, range_start: NaiveDate, range_end: NaiveDate) -> Vec<TodoItem> {
    if !item.recurrence.is_recurring() {
        return if item.end_date >= range_start && item.start_date <= range_end {
            vec![item.clone()]
        } else {
            Vec::new()
        };
    }

    let duration = Days::new(item.duration_days().unsigned_abs());
    let mut result = Vec::new();
    let mut start = item.start_date;

    for _ in 0..MAX_EXPANSION_STEPS {
        if start > range_end {
            break;
        }
        if item.recurrence_until.is_some_and(|until| start > until) {
            break;
        }
        let Some(end) = start.checked_add_days(duration) else {
            break;
        };
        if end >= range_start {
            result.push(occurrence(item, start, end));
        }
        match next_start(start, item.recurrence) {
            Some(next) if next > start => start = next,
            _ => break,
        }
    }

    result
}

fn occurrence(template: &TodoItem, start: NaiveDate, end: NaiveDate) -> TodoItem {
    TodoItem {
        id: format!("{}#{}", template.id, date_key(start)),
        start_date: start,
        end_date: end,
        series_id: Some(template.id.clone()),
        ..template.clone()
    }
}

/// Expand all items over an inclusive date range, in display order.
pub fn expand_items_for_range(
    items: &[TodoItem],
    range_start: NaiveDate,
    range_end: NaiveDate,
) -> Vec<TodoItem> {
    let mut expanded: Vec<TodoItem> = items
        .iter()
        .flat_map(|item| occurrences(item, range_start, range_end))
        .collect();
    sort_for_display(&mut expanded);
    expanded
}

/// Occurrences covering a single day, in display order.
pub fn items_for_date(items: &[TodoItem], date: NaiveDate) -> Vec<TodoItem> {
    expand_items_for_range(items, date, date)
        .into_iter()
        .filter(|item| item.covers(date))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn recurring(id: &str, start: NaiveDate, end: NaiveDate, kind: Recurrence) -> TodoItem {
        let mut item = TodoItem::new(id, id, start);
        item.end_date = end;
        item.recurrence = kind;
        item
    }

    #[test]
    fn next_start_steps_each_kind() {
        let start = day(2026, 3, 10);
        assert_eq!(next_start(start, Recurrence::None), None);
        assert_eq!(next_start(start, Recurrence::Daily), Some(day(2026, 3, 11)));
        assert_eq!(next_start(start, Recurrence::Weekly), Some(day(2026, 3, 17)));
        assert_eq!(next_start(start, Recurrence::Monthly), Some(day(2026, 4, 10)));
        assert_eq!(next_start(start, Recurrence::Yearly), Some(day(2027, 3, 10)));
    }

    #[test]
    fn monthly_from_jan_31_lands_on_end_of_february() {
        assert_eq!(
            next_start(day(2026, 1, 31), Recurrence::Monthly),
            Some(day(2026, 2, 28))
        );
        assert_eq!(
            next_start(day(2028, 1, 31), Recurrence::Monthly),
            Some(day(2028, 2, 29))
        );
    }

    #[test]
    fn monthly_series_continues_from_clamped_day() {
        let item = recurring("rent", day(2026, 1, 31), day(2026, 1, 31), Recurrence::Monthly);
        let starts: Vec<NaiveDate> = occurrences(&item, day(2026, 1, 1), day(2026, 4, 30))
            .iter()
            .map(|o| o.start_date)
            .collect();
        assert_eq!(
            starts,
            vec![day(2026, 1, 31), day(2026, 2, 28), day(2026, 3, 28), day(2026, 4, 28)]
        );
    }

    #[test]
    fn yearly_from_leap_day() {
        assert_eq!(
            next_start(day(2028, 2, 29), Recurrence::Yearly),
            Some(day(2029, 2, 28))
        );
    }

    #[test]
    fn non_recurring_included_iff_intersecting() {
        let item = recurring("trip", day(2026, 3, 5), day(2026, 3, 9), Recurrence::None);
        let cases = [
            (day(2026, 3, 1), day(2026, 3, 4), false),
            (day(2026, 3, 1), day(2026, 3, 5), true),
            (day(2026, 3, 9), day(2026, 3, 20), true),
            (day(2026, 3, 10), day(2026, 3, 20), false),
            (day(2026, 3, 6), day(2026, 3, 7), true),
        ];
        for (start, end, expected) in cases {
            let hit = !expand_items_for_range(std::slice::from_ref(&item), start, end).is_empty();
            assert_eq!(hit, expected, "range {start}..={end}");
        }
    }

    #[test]
    fn occurrence_ids_reference_template() {
        let item = recurring("gym", day(2026, 3, 2), day(2026, 3, 2), Recurrence::Weekly);
        let found = occurrences(&item, day(2026, 3, 8), day(2026, 3, 16));
        let ids: Vec<&str> = found.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["gym#2026-03-09", "gym#2026-03-16"]);
        assert!(found.iter().all(|o| o.series_id.as_deref() == Some("gym")));
        assert!(found.iter().all(TodoItem::is_generated));
    }

    #[test]
    fn occurrence_starting_before_range_but_ending_inside_is_included() {
        let item = recurring("camp", day(2026, 3, 1), day(2026, 3, 4), Recurrence::Weekly);
        let found = occurrences(&item, day(2026, 3, 10), day(2026, 3, 12));
        let spans: Vec<(NaiveDate, NaiveDate)> =
            found.iter().map(|o| (o.start_date, o.end_date)).collect();
        assert_eq!(spans, vec![(day(2026, 3, 8), day(2026, 3, 11))]);
    }

    #[test]
    fn cutoff_stops_expansion() {
        let mut item = recurring("pill", day(2026, 3, 1), day(2026, 3, 1), Recurrence::Daily);
        item.recurrence_until = Some(day(2026, 3, 4));
        let found = occurrences(&item, day(2026, 2, 1), day(2026, 4, 1));
        assert_eq!(found.len(), 4);
        assert!(found.iter().all(|o| o.start_date <= day(2026, 3, 4)));
    }

    #[test]
    fn expansion_is_capped() {
        let item = recurring("old", day(2000, 1, 1), day(2000, 1, 1), Recurrence::Daily);
        let found = occurrences(&item, day(2000, 1, 1), day(2030, 1, 1));
        assert_eq!(found.len(), MAX_EXPANSION_STEPS);
    }

    #[test]
    fn items_for_date_filters_to_covering_occurrences() {
        let weekly = recurring("yoga", day(2026, 3, 3), day(2026, 3, 3), Recurrence::Weekly);
        let once = recurring("trip", day(2026, 3, 9), day(2026, 3, 11), Recurrence::None);
        let items = vec![weekly, once];

        let on_tenth = items_for_date(&items, day(2026, 3, 10));
        let ids: Vec<&str> = on_tenth.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["trip", "yoga#2026-03-10"]);

        assert!(items_for_date(&items, day(2026, 3, 12)).is_empty());
    }
}
