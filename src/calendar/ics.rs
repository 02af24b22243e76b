//! Import/export of items as iCalendar VEVENT blocks.
//!
//! Export emits both the standard `PRIORITY`/`RRULE` properties and
//! `X-WIDGET-*` extensions so a round trip keeps app-specific fields.
//! Import is tolerant: case-insensitive property names, events without a
//! usable SUMMARY or DTSTART are skipped.

use chrono::{DateTime, Days, Local, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use icalendar::parser::{read_calendar, unfold, Component as ParsedComponent, Property as ParsedProperty};
use icalendar::{Calendar, CalendarDateTime, Component, DatePerhapsTime, EventLike, Property, ValueType};

use super::error::{CalendarError, Result};
use super::item::{normalize_title, Priority, Recurrence, TimeSpan, TodoItem};

const PRODID: &str = "-//WidgetCalendar//EN";
const UID_DOMAIN: &str = "widgetcalendar";
const DATE_FORMAT: &str = "%Y%m%d";
const DATE_TIME_FORMAT: &str = "%Y%m%dT%H%M%S";

pub fn export(items: &[TodoItem], now: DateTime<Utc>) -> String {
    let mut calendar = Calendar::new();
    calendar.append_property(Property::new("METHOD", "PUBLISH"));

    let stamp = now.format("%Y%m%dT%H%M%SZ").to_string();
    for item in items {
        calendar.push(to_event(item, &stamp));
    }
    with_prodid(&calendar.done().to_string())
}

fn to_event(item: &TodoItem, stamp: &str) -> icalendar::Event {
    let mut event = icalendar::Event::new();
    event.uid(&format!("{}@{UID_DOMAIN}", item.id));
    event.add_property("DTSTAMP", stamp);
    event.summary(&item.title);
    if !item.description.is_empty() {
        event.description(&item.description);
    }
    event.add_property("STATUS", if item.completed { "COMPLETED" } else { "CONFIRMED" });
    if !item.source_tag.trim().is_empty() {
        event.add_property("X-WIDGET-SOURCE", &item.source_tag);
    }
    event.add_property("PRIORITY", item.priority.to_ics().to_string());
    event.add_property("X-WIDGET-PRIORITY", item.priority.code().to_string());

    if item.recurrence.is_recurring() {
        event.add_property("RRULE", build_rrule(item));
        event.add_property("X-WIDGET-RECURRENCE", item.recurrence.as_str());
        if let Some(until) = item.recurrence_until {
            event.add_property("X-WIDGET-RECURRENCE-UNTIL", until.format(DATE_FORMAT).to_string());
        }
    }

    match item.time {
        Some(time) => {
            event.add_property("DTSTART", timed_value(item.start_date, time.start_minute));
            event.add_property("DTEND", timed_value(item.end_date, time.end_minute));
        }
        None => {
            let end_exclusive = item.end_date.checked_add_days(Days::new(1)).unwrap_or(item.end_date);
            event.append_property(date_property("DTSTART", item.start_date));
            event.append_property(date_property("DTEND", end_exclusive));
        }
    }
    event.done()
}

fn date_property(name: &str, date: NaiveDate) -> Property {
    let mut prop = Property::new(name, date.format(DATE_FORMAT).to_string());
    prop.append_parameter(ValueType::Date);
    prop
}

/// Swap the serializer's default PRODID for ours.
fn with_prodid(ics: &str) -> String {
    let mut out = String::with_capacity(ics.len());
    for line in ics.lines() {
        if line.starts_with("PRODID:") {
            out.push_str("PRODID:");
            out.push_str(PRODID);
        } else {
            out.push_str(line);
        }
        out.push_str("\r\n");
    }
    out
}

fn timed_value(date: NaiveDate, minute: u16) -> String {
    let minute = u32::from(minute);
    date.and_hms_opt(minute / 60, minute % 60, 0)
        .map(|dt| dt.format(DATE_TIME_FORMAT).to_string())
        .unwrap_or_else(|| format!("{}T000000", date.format(DATE_FORMAT)))
}

fn build_rrule(item: &TodoItem) -> String {
    let freq = match item.recurrence {
        Recurrence::Weekly => "WEEKLY",
        Recurrence::Monthly => "MONTHLY",
        Recurrence::Yearly => "YEARLY",
        Recurrence::Daily | Recurrence::None => "DAILY",
    };
    match item.recurrence_until {
        Some(until) => format!("FREQ={freq};UNTIL={}", until.format(DATE_FORMAT)),
        None => format!("FREQ={freq}"),
    }
}

/// Parse a calendar document into items.
///
/// Fails when the content is not a VCALENDAR document or the parser rejects
/// it; individual unusable events are skipped.
pub fn import(content: &str) -> Result<Vec<TodoItem>> {
    if !content
        .lines()
        .any(|l| l.trim().eq_ignore_ascii_case("BEGIN:VCALENDAR"))
    {
        return Err(CalendarError::Ics("missing BEGIN:VCALENDAR".into()));
    }

    let unfolded = unfold(content);
    let calendar = read_calendar(&unfolded).map_err(|err| CalendarError::Ics(err.to_string()))?;
    let mut events = Vec::new();
    collect_events(&calendar.components, &mut events);
    Ok(events.into_iter().filter_map(todo_from_event).collect())
}

fn collect_events<'a, 'b>(components: &'b [ParsedComponent<'a>], out: &mut Vec<&'b ParsedComponent<'a>>) {
    for component in components {
        if component.name.as_ref().eq_ignore_ascii_case("VEVENT") {
            out.push(component);
        } else {
            collect_events(&component.components, out);
        }
    }
}

fn prop<'a, 'b>(event: &'b ParsedComponent<'a>, name: &str) -> Option<&'b ParsedProperty<'a>> {
    event
        .properties
        .iter()
        .find(|p| p.name.as_ref().eq_ignore_ascii_case(name))
}

fn text<'a>(event: &ParsedComponent<'a>, name: &str) -> Option<String> {
    prop(event, name).map(|p| unescape_text(p.val.as_ref()))
}

fn todo_from_event(event: &ParsedComponent<'_>) -> Option<TodoItem> {
    let title = normalize_title(&text(event, "SUMMARY")?);
    if title.is_empty() {
        return None;
    }

    let uid = text(event, "UID").unwrap_or_default();
    let id = match uid.split('@').next().map(str::trim) {
        Some(local) if !local.is_empty() => local.to_string(),
        _ => uuid::Uuid::new_v4().to_string(),
    };

    let completed = prop(event, "STATUS").is_some_and(|p| p.val.as_ref().trim().eq_ignore_ascii_case("COMPLETED"));
    let start = DatePerhapsTime::try_from(prop(event, "DTSTART")?).ok()?;
    let end = prop(event, "DTEND").and_then(|p| DatePerhapsTime::try_from(p).ok());

    let (start_date, end_date, time) = match start {
        DatePerhapsTime::Date(start) => {
            let end = match end {
                Some(DatePerhapsTime::Date(exclusive)) => exclusive.pred_opt().unwrap_or(start),
                Some(DatePerhapsTime::DateTime(dt)) => local_wall_clock(dt).date(),
                None => start,
            };
            (start, end, None)
        }
        DatePerhapsTime::DateTime(start) => {
            let start = local_wall_clock(start);
            let end = match end {
                Some(DatePerhapsTime::DateTime(dt)) => local_wall_clock(dt),
                Some(DatePerhapsTime::Date(date)) => date.and_time(start.time()),
                None => start,
            };
            let minute_of = |dt: NaiveDateTime| (dt.hour() * 60 + dt.minute()) as u16;
            let time = TimeSpan {
                start_minute: minute_of(start),
                end_minute: minute_of(end),
            };
            (start.date(), end.date(), Some(time))
        }
    };

    let item = TodoItem {
        id,
        title,
        description: text(event, "DESCRIPTION").unwrap_or_default(),
        start_date,
        end_date,
        time,
        completed,
        source_tag: text(event, "X-WIDGET-SOURCE").unwrap_or_default(),
        priority: parse_priority(event),
        recurrence: parse_recurrence(event),
        recurrence_until: parse_recurrence_until(event),
        series_id: None,
    };
    Some(item.normalized())
}

/// UTC values become local wall-clock time; zoned values keep their own
/// wall clock since no zone database is loaded.
fn local_wall_clock(value: CalendarDateTime) -> NaiveDateTime {
    match value {
        CalendarDateTime::Utc(utc) => utc.with_timezone(&Local).naive_local(),
        CalendarDateTime::Floating(naive) => naive,
        CalendarDateTime::WithTimezone { date_time, .. } => date_time,
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}

/// `yyyymmdd`, or a date-time (`Z` suffixed values read as UTC) cut to its day.
fn parse_flexible_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.len() == 8 {
        return parse_date(value);
    }
    match value.strip_suffix(['Z', 'z']) {
        Some(utc) => {
            let naive = NaiveDateTime::parse_from_str(utc, DATE_TIME_FORMAT).ok()?;
            Some(Utc.from_utc_datetime(&naive).with_timezone(&Local).date_naive())
        }
        None => NaiveDateTime::parse_from_str(value, DATE_TIME_FORMAT).ok().map(|dt| dt.date()),
    }
}

fn rrule_part(event: &ParsedComponent<'_>, key: &str) -> Option<String> {
    prop(event, "RRULE")?.val.as_ref().split(';').find_map(|part| {
        let (k, v) = part.split_once('=')?;
        k.trim().eq_ignore_ascii_case(key).then(|| v.trim().to_string())
    })
}

fn parse_priority(event: &ParsedComponent<'_>) -> Priority {
    if let Some(code) = prop(event, "X-WIDGET-PRIORITY").and_then(|p| p.val.as_ref().trim().parse::<i64>().ok()) {
        return Priority::from_code(code);
    }
    prop(event, "PRIORITY")
        .and_then(|p| p.val.as_ref().trim().parse::<u8>().ok())
        .map_or(Priority::Normal, Priority::from_ics)
}

fn parse_recurrence(event: &ParsedComponent<'_>) -> Recurrence {
    let custom = text(event, "X-WIDGET-RECURRENCE")
        .map(|value| Recurrence::parse(&value))
        .unwrap_or_default();
    if custom.is_recurring() {
        return custom;
    }
    rrule_part(event, "FREQ").map_or(Recurrence::None, |freq| Recurrence::parse(&freq))
}

fn parse_recurrence_until(event: &ParsedComponent<'_>) -> Option<NaiveDate> {
    prop(event, "X-WIDGET-RECURRENCE-UNTIL")
        .and_then(|p| parse_flexible_date(p.val.as_ref()))
        .or_else(|| rrule_part(event, "UNTIL").and_then(|until| parse_flexible_date(&until)))
}

/// Reverse RFC 5545 text escaping; unknown escapes keep their backslash.
fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some(&next @ (',' | ';' | '\\')) => {
                out.push(next);
                chars.next();
            }
            Some('n' | 'N') => {
                out.push('\n');
                chars.next();
            }
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn stamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn calendar(events: &[&str]) -> String {
        let mut doc = String::from("BEGIN:VCALENDAR\r\nVERSION:2.0\r\n");
        for event in events {
            doc.push_str("BEGIN:VEVENT\r\n");
            for line in event.lines() {
                doc.push_str(line.trim_start_matches('|'));
                doc.push_str("\r\n");
            }
            doc.push_str("END:VEVENT\r\n");
        }
        doc.push_str("END:VCALENDAR\r\n");
        doc
    }

    #[test]
    fn export_writes_all_day_event_with_exclusive_end() {
        let mut item = TodoItem::new("trip", "Ski trip, north", day(2026, 2, 14));
        item.end_date = day(2026, 2, 16);
        let ics = export(&[item], stamp());

        assert!(ics.starts_with("BEGIN:VCALENDAR\r\n"));
        assert!(ics.contains("VERSION:2.0\r\n"));
        assert!(ics.contains("PRODID:-//WidgetCalendar//EN\r\n"));
        assert!(ics.contains("METHOD:PUBLISH\r\n"));
        assert!(ics.contains("UID:trip@widgetcalendar\r\n"));
        assert!(ics.contains("DTSTAMP:20260301T120000Z\r\n"));
        assert!(ics.contains("DTSTART;VALUE=DATE:20260214\r\n"));
        assert!(ics.contains("DTEND;VALUE=DATE:20260217\r\n"));
        assert!(ics.contains("STATUS:CONFIRMED\r\n"));
        assert!(ics.contains("PRIORITY:5\r\n"));
        assert!(!ics.contains("RRULE"));
        assert!(ics.ends_with("END:VCALENDAR\r\n"));

        let back = import(&ics).unwrap();
        assert_eq!(back[0].title, "Ski trip, north");
    }

    #[test]
    fn export_writes_recurrence_and_time() {
        let mut item = TodoItem::new("gym", "Gym", day(2026, 3, 2));
        item.time = Some(TimeSpan {
            start_minute: 1080,
            end_minute: 1140,
        });
        item.recurrence = Recurrence::Weekly;
        item.recurrence_until = Some(day(2026, 6, 1));
        item.priority = Priority::High;
        item.completed = true;
        let ics = export(&[item], stamp());

        assert!(ics.contains("RRULE:FREQ=WEEKLY;UNTIL=20260601\r\n"));
        assert!(ics.contains("X-WIDGET-RECURRENCE:WEEKLY\r\n"));
        assert!(ics.contains("X-WIDGET-RECURRENCE-UNTIL:20260601\r\n"));
        assert!(ics.contains("DTSTART:20260302T180000\r\n"));
        assert!(ics.contains("DTEND:20260302T190000\r\n"));
        assert!(ics.contains("PRIORITY:1\r\n"));
        assert!(ics.contains("STATUS:COMPLETED\r\n"));
    }

    #[test]
    fn long_lines_are_folded_and_restored() {
        let mut item = TodoItem::new("notes", "Reading list", day(2026, 3, 9));
        item.description = "chapter ".repeat(30).trim_end().to_string();
        let ics = export(std::slice::from_ref(&item), stamp());

        assert!(ics.lines().all(|line| line.len() <= 75));
        let back = import(&ics).unwrap();
        assert_eq!(back, vec![item]);
    }

    #[test]
    fn round_trip_preserves_core_fields() {
        let mut timed = TodoItem::new("a", "Dentist; bring card", day(2026, 3, 10));
        timed.time = Some(TimeSpan {
            start_minute: 545,
            end_minute: 600,
        });
        timed.priority = Priority::Low;
        timed.completed = true;
        timed.description = "line one\nline two".to_string();

        let mut span = TodoItem::new("b", "Conference", day(2026, 4, 1));
        span.end_date = day(2026, 4, 3);
        span.recurrence = Recurrence::Yearly;
        span.source_tag = "work".to_string();

        let originals = vec![timed, span];
        let imported = import(&export(&originals, stamp())).unwrap();
        assert_eq!(imported, originals);
    }

    #[test]
    fn import_unfolds_and_ignores_property_case() {
        let content = "BEGIN:VCALENDAR\r\n\
            BEGIN:VEVENT\r\n\
            uid:abc@example.com\r\n\
            summary:Long title that was\r\n  folded by the writer\r\n\
            DTSTART;VALUE=DATE:20260305\r\n\
            END:VEVENT\r\n\
            END:VCALENDAR\r\n";
        let items = import(content).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "abc");
        assert_eq!(items[0].title, "Long title that was folded by the writer");
        assert_eq!(items[0].start_date, day(2026, 3, 5));
        assert_eq!(items[0].end_date, day(2026, 3, 5));
    }

    #[test]
    fn quoted_parameters_may_contain_colons() {
        let content = calendar(&[
            "SUMMARY;ALTREP=\"http://example.com/a\":Team sync\n|DTSTART;VALUE=DATE:20260305",
        ]);
        let items = import(&content).unwrap();
        assert_eq!(items[0].title, "Team sync");
    }

    #[test]
    fn import_falls_back_to_standard_fields() {
        let content = calendar(&["SUMMARY:Team sync\n\
            |PRIORITY:2\n\
            |RRULE:FREQ=MONTHLY;UNTIL=20261231T000000Z\n\
            |DTSTART:20260305T090000\n\
            |DTEND:20260305T093000"]);
        let items = import(&content).unwrap();
        let item = &items[0];
        assert_eq!(item.priority, Priority::High);
        assert_eq!(item.recurrence, Recurrence::Monthly);
        assert!(item.recurrence_until.is_some());
        assert_eq!(
            item.time,
            Some(TimeSpan {
                start_minute: 540,
                end_minute: 570
            })
        );
        assert!(!item.id.is_empty());
    }

    #[test]
    fn import_skips_unusable_events() {
        let content = calendar(&[
            "SUMMARY:No start",
            "SUMMARY:   \n|DTSTART;VALUE=DATE:20260301",
            "SUMMARY:Bad date\n|DTSTART:2026-03-01",
            "SUMMARY:Good\n|DTSTART;VALUE=DATE:20260301",
        ]);
        let items = import(&content).unwrap();
        let titles: Vec<&str> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["Good"]);
    }

    #[test]
    fn import_rejects_non_calendar_documents() {
        assert!(import("hello world").is_err());
        assert!(import("BEGIN:VEVENT\r\nSUMMARY:x\r\nEND:VEVENT\r\n").is_err());
    }

    #[test]
    fn unescape_reverses_text_escapes() {
        assert_eq!(unescape_text(r"a\\b\;c\,d\ne"), "a\\b;c,d\ne");
        assert_eq!(unescape_text(r"C:\temp"), r"C:\temp");
    }
}
