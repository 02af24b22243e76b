use unicode_width::UnicodeWidthChar;

pub const ELLIPSIS: char = '…';

/// Horizontal space reserved by the grid border, in columns.
const GRID_CHROME: u16 = 2;
const MIN_CONTENT_WIDTH: u16 = 14;
/// Extra width granted to each day column so chips bridge neighbouring cells.
pub const STITCH_BONUS: f32 = 0.25;
pub const MIN_DAY_WIDTH: f32 = 2.0;

/// Text measurement used by the segment splitter.
pub trait TextMeasure {
    fn char_width(&self, c: char) -> f32;

    fn width(&self, text: &str) -> f32 {
        text.chars().map(|c| self.char_width(c)).sum()
    }

    /// Number of leading characters of `text` that fit in `max_width`.
    fn break_text(&self, text: &str, max_width: f32) -> usize {
        let mut used = 0.0;
        let mut count = 0;
        for c in text.chars() {
            used += self.char_width(c);
            if used > max_width {
                break;
            }
            count += 1;
        }
        count
    }

    /// Truncate `text` to `max_width`, ending it with an ellipsis when cut.
    fn ellipsize(&self, text: &str, max_width: f32) -> String {
        if self.width(text) <= max_width {
            return text.to_string();
        }
        let room = (max_width - self.char_width(ELLIPSIS)).max(0.0);
        let keep = self.break_text(text, room);
        let mut out: String = text.chars().take(keep).collect();
        out.push(ELLIPSIS);
        out
    }
}

/// Terminal column measurement.
#[derive(Debug, Clone, Copy, Default)]
pub struct CellMeasure;

impl TextMeasure for CellMeasure {
    fn char_width(&self, c: char) -> f32 {
        c.width().unwrap_or(0) as f32
    }
}

/// Width of one day column for a widget `widget_width` columns wide.
pub fn estimate_day_width(widget_width: u16) -> f32 {
    let content = widget_width.saturating_sub(GRID_CHROME).max(MIN_CONTENT_WIDTH);
    (f32::from(content) / 7.0 + STITCH_BONUS).max(MIN_DAY_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn break_text_counts_fitting_chars() {
        let m = CellMeasure;
        assert_eq!(m.break_text("holiday", 4.0), 4);
        assert_eq!(m.break_text("hi", 4.0), 2);
        assert_eq!(m.break_text("春节假期", 5.0), 2);
        assert_eq!(m.break_text("abc", 0.5), 0);
    }

    #[test]
    fn ellipsize_only_when_too_wide() {
        let m = CellMeasure;
        assert_eq!(m.ellipsize("trip", 4.0), "trip");
        assert_eq!(m.ellipsize("vacation", 4.0), "vac…");
        assert_eq!(m.ellipsize("vacation", 0.0), "…");
    }

    #[test]
    fn day_width_has_floor_and_bonus() {
        assert_eq!(estimate_day_width(72), 10.25);
        assert_eq!(estimate_day_width(0), 2.25);
    }
}
