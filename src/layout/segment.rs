use crate::calendar::SpanPosition;

use super::lanes::Placement;
use super::measure::TextMeasure;

pub const DAYS_PER_ROW: usize = 7;

/// The part of a placement confined to one week row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowSegment {
    pub start: usize,
    pub end: usize,
}

impl RowSegment {
    pub fn days(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn position(&self, day: usize) -> SpanPosition {
        SpanPosition::within(self.start, self.end, day)
    }
}

/// Row segment of the span `[start, end]` that contains `day`.
pub fn segment_for_day(start: usize, end: usize, day: usize) -> RowSegment {
    let row_start = (day / DAYS_PER_ROW) * DAYS_PER_ROW;
    let row_end = row_start + DAYS_PER_ROW - 1;
    RowSegment {
        start: start.max(row_start),
        end: end.min(row_end),
    }
}

/// Break `[start, end]` at week-row boundaries.
pub fn row_segments(start: usize, end: usize) -> Vec<RowSegment> {
    let mut segments = Vec::new();
    let mut cursor = start;
    while cursor <= end {
        let segment = segment_for_day(start, end, cursor);
        cursor = segment.end + 1;
        segments.push(segment);
    }
    segments
}

/// Label for a row segment. Only the segment holding the item's true first
/// day carries the time prefix.
pub fn segment_source_text(placement: &Placement<'_>, segment: RowSegment) -> String {
    if segment.start == placement.start {
        placement.item.label()
    } else {
        placement.item.title.clone()
    }
}

/// Divide `source` across `days` cells of `day_width` each.
///
/// Each cell greedily takes the longest run that fits (at least one
/// character). When text is left over, the last cell that received text is
/// replaced by the whole remaining tail from its own offset, ellipsized.
pub fn split_text<M: TextMeasure + ?Sized>(
    source: &str,
    days: usize,
    day_width: f32,
    measure: &M,
) -> Vec<String> {
    let mut slices = vec![String::new(); days];
    if source.is_empty() || days == 0 {
        return slices;
    }

    let chars: Vec<char> = source.chars().collect();
    let mut starts: Vec<Option<usize>> = vec![None; days];
    let mut cursor = 0;

    for (slot, start) in slices.iter_mut().zip(starts.iter_mut()) {
        if cursor >= chars.len() {
            break;
        }
        *start = Some(cursor);
        let remaining: String = chars[cursor..].iter().collect();
        let take = measure
            .break_text(&remaining, day_width)
            .max(1)
            .min(chars.len() - cursor);
        *slot = chars[cursor..cursor + take].iter().collect();
        cursor += take;
    }

    if cursor < chars.len() {
        let last_used = starts.iter().rposition(Option::is_some).unwrap_or(0);
        let overflow_start = starts[last_used].unwrap_or(0);
        let tail: String = chars[overflow_start..].iter().collect();
        slices[last_used] = measure.ellipsize(&tail, day_width);
    }

    slices
}

/// Text shown in `day` for a placement's lane.
pub fn segment_line_text<M: TextMeasure + ?Sized>(
    placement: &Placement<'_>,
    day: usize,
    day_width: f32,
    measure: &M,
) -> String {
    let segment = segment_for_day(placement.start, placement.end, day);
    if day < segment.start || day > segment.end {
        return String::new();
    }
    let source = segment_source_text(placement, segment);
    split_text(&source, segment.days(), day_width, measure)
        .swap_remove(day - segment.start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{TimeSpan, TodoItem};
    use crate::layout::measure::{CellMeasure, ELLIPSIS};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn placement(item: &TodoItem, start: usize, end: usize) -> Placement<'_> {
        Placement {
            item,
            start,
            end,
            lane: 0,
        }
    }

    fn item(title: &str) -> TodoItem {
        TodoItem::new("x", title, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap())
    }

    #[test]
    fn spans_break_at_week_rows() {
        assert_eq!(
            row_segments(5, 16),
            vec![
                RowSegment { start: 5, end: 6 },
                RowSegment { start: 7, end: 13 },
                RowSegment { start: 14, end: 16 },
            ]
        );
        assert_eq!(row_segments(3, 3), vec![RowSegment { start: 3, end: 3 }]);
    }

    #[test]
    fn positions_restart_each_row() {
        let segments = row_segments(5, 8);
        assert_eq!(segments[0].position(5), SpanPosition::Start);
        assert_eq!(segments[0].position(6), SpanPosition::End);
        assert_eq!(segments[1].position(7), SpanPosition::Start);
        assert_eq!(segments[1].position(8), SpanPosition::End);
        assert_eq!(row_segments(6, 7)[0].position(6), SpanPosition::Single);
    }

    #[test]
    fn text_fills_cells_in_order() {
        assert_eq!(
            split_text("Trip to Oslo", 3, 5.0, &CellMeasure),
            vec!["Trip ", "to Os", "lo"]
        );
        assert_eq!(split_text("Ski", 3, 5.0, &CellMeasure), vec!["Ski", "", ""]);
    }

    #[test]
    fn overflow_ellipsizes_last_used_cell_from_its_offset() {
        let slices = split_text("Conference in Berlin", 3, 4.0, &CellMeasure);
        assert_eq!(slices, vec!["Conf", "eren", "ce \u{2026}"]);
    }

    #[test]
    fn narrow_cells_still_advance() {
        let slices = split_text("ab", 2, 0.0, &CellMeasure);
        assert_eq!(slices, vec!["a", "b"]);
    }

    #[test]
    fn split_is_a_prefix_of_the_source() {
        let source = "Quarterly planning offsite with the whole team";
        for days in 1..=7 {
            for width in [1.0, 2.5, 4.0, 6.25, 11.0] {
                let slices = split_text(source, days, width, &CellMeasure);
                let joined: String = slices
                    .iter()
                    .filter(|s| !s.ends_with(ELLIPSIS))
                    .map(String::as_str)
                    .collect();
                assert!(source.starts_with(&joined), "days={days} width={width}: {joined:?}");
            }
        }
    }

    #[test]
    fn time_prefix_only_on_first_segment() {
        let mut timed = item("Retreat");
        timed.time = Some(TimeSpan {
            start_minute: 9 * 60,
            end_minute: 17 * 60,
        });
        let p = placement(&timed, 5, 8);
        assert_eq!(segment_line_text(&p, 5, 20.0, &CellMeasure), "09:00 Retreat");
        assert_eq!(segment_line_text(&p, 6, 20.0, &CellMeasure), "");
        assert_eq!(segment_line_text(&p, 7, 20.0, &CellMeasure), "Retreat");
    }
}
