use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::calendar::{format_minute, Priority, Recurrence, TodoItem};

/// User-selected language override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "system")]
    System,
    #[serde(rename = "en")]
    English,
    #[serde(rename = "zh")]
    Chinese,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::System => "system",
            Language::English => "en",
            Language::Chinese => "zh",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "system" => Some(Language::System),
            "en" | "english" => Some(Language::English),
            "zh" | "chinese" => Some(Language::Chinese),
            _ => None,
        }
    }

    pub fn cycle(self) -> Self {
        match self {
            Language::System => Language::English,
            Language::English => Language::Chinese,
            Language::Chinese => Language::System,
        }
    }

    /// Concrete language, reading `LC_ALL` then `LANG` for `System`.
    pub fn resolve(self) -> Language {
        match self {
            Language::System => {
                let env = std::env::var("LC_ALL")
                    .ok()
                    .filter(|v| !v.is_empty())
                    .or_else(|| std::env::var("LANG").ok());
                Self::from_locale_name(env.as_deref().unwrap_or(""))
            }
            other => other,
        }
    }

    fn from_locale_name(name: &str) -> Language {
        if name.to_ascii_lowercase().starts_with("zh") {
            Language::Chinese
        } else {
            Language::English
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Msg {
    AllDay,
    NoItems,
    Today,
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
    Saved,
    Deleted,
    Completed,
    Reopened,
    ImportFailed,
    ExportFailed,
    Imported,
    Exported,
    HolidaysBusy,
    HolidaysImported,
    HolidaysRemoved,
    SoundOn,
    SoundOff,
    Language,
    BlankTitle,
    EndBeforeStart,
    EndTimeBeforeStart,
    BadDate,
    BadTime,
    ImportPath,
    ExportPath,
}

const MONTHS_EN: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September", "October", "November",
    "December",
];
const WEEKDAYS_EN: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
const WEEKDAYS_ZH: [&str; 7] = ["日", "一", "二", "三", "四", "五", "六"];

/// Formatting and UI strings for one resolved language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Locale {
    language: Language,
}

impl Locale {
    pub fn new(language: Language) -> Self {
        Self {
            language: language.resolve(),
        }
    }

    fn zh(&self) -> bool {
        self.language == Language::Chinese
    }

    /// Weekday header label, Sunday first.
    pub fn weekday(&self, index: usize) -> &'static str {
        let labels = if self.zh() { &WEEKDAYS_ZH } else { &WEEKDAYS_EN };
        labels[index % 7]
    }

    fn short_month(&self, date: NaiveDate) -> String {
        if self.zh() {
            format!("{}月{}日", date.month(), date.day())
        } else {
            format!("{} {}", &MONTHS_EN[date.month0() as usize][..3], date.day())
        }
    }

    /// "March 2026" or "2026年3月".
    pub fn month_title(&self, month: NaiveDate) -> String {
        if self.zh() {
            format!("{}年{}月", month.year(), month.month())
        } else {
            format!("{} {}", MONTHS_EN[month.month0() as usize], month.year())
        }
    }

    /// "Wed, Mar 11, 2026" or "2026年3月11日 星期三".
    pub fn pretty_date(&self, date: NaiveDate) -> String {
        let weekday = date.weekday().num_days_from_sunday() as usize;
        if self.zh() {
            format!("{}年{} 星期{}", date.year(), self.short_month(date), WEEKDAYS_ZH[weekday])
        } else {
            format!("{}, {}, {}", WEEKDAYS_EN[weekday], self.short_month(date), date.year())
        }
    }

    /// "Mar 3 - Mar 5 | 09:00 - 10:00" or "Mar 3 | All day".
    pub fn item_meta(&self, item: &TodoItem) -> String {
        let dates = if item.is_multi_day() {
            format!("{} - {}", self.short_month(item.start_date), self.short_month(item.end_date))
        } else {
            self.short_month(item.start_date)
        };
        let schedule = match item.time {
            Some(t) => format!("{} - {}", format_minute(t.start_minute), format_minute(t.end_minute)),
            None => self.text(Msg::AllDay).to_string(),
        };
        format!("{dates} | {schedule}")
    }

    pub fn priority(&self, priority: Priority) -> &'static str {
        match (priority, self.zh()) {
            (Priority::Low, false) => "Low",
            (Priority::Normal, false) => "Normal",
            (Priority::High, false) => "High",
            (Priority::Low, true) => "低",
            (Priority::Normal, true) => "普通",
            (Priority::High, true) => "高",
        }
    }

    pub fn recurrence(&self, recurrence: Recurrence) -> &'static str {
        match (recurrence, self.zh()) {
            (Recurrence::None, false) => "Never",
            (Recurrence::Daily, false) => "Daily",
            (Recurrence::Weekly, false) => "Weekly",
            (Recurrence::Monthly, false) => "Monthly",
            (Recurrence::Yearly, false) => "Yearly",
            (Recurrence::None, true) => "不重复",
            (Recurrence::Daily, true) => "每天",
            (Recurrence::Weekly, true) => "每周",
            (Recurrence::Monthly, true) => "每月",
            (Recurrence::Yearly, true) => "每年",
        }
    }

    pub fn text(&self, msg: Msg) -> &'static str {
        let (en, zh) = match msg {
            Msg::AllDay => ("All day", "全天"),
            Msg::NoItems => ("Nothing planned", "没有待办事项"),
            Msg::Today => ("Today", "今天"),
            Msg::Title => ("Title", "标题"),
            Msg::Description => ("Description", "描述"),
            Msg::StartDate => ("Start date", "开始日期"),
            Msg::EndDate => ("End date", "结束日期"),
            Msg::HasTime => ("Timed", "指定时间"),
            Msg::StartTime => ("Start time", "开始时间"),
            Msg::EndTime => ("End time", "结束时间"),
            Msg::Priority => ("Priority", "优先级"),
            Msg::Recurrence => ("Repeat", "重复"),
            Msg::Until => ("Repeat until", "重复截止"),
            Msg::Saved => ("Saved", "已保存"),
            Msg::Deleted => ("Deleted", "已删除"),
            Msg::Completed => ("Completed", "已完成"),
            Msg::Reopened => ("Marked as open", "已标记为未完成"),
            Msg::ImportFailed => ("Import failed", "导入失败"),
            Msg::ExportFailed => ("Export failed", "导出失败"),
            Msg::Imported => ("Imported items:", "已导入事项:"),
            Msg::Exported => ("Exported to", "已导出到"),
            Msg::HolidaysBusy => ("Importing holidays...", "正在导入节假日..."),
            Msg::HolidaysImported => ("Holidays imported:", "已导入节假日:"),
            Msg::HolidaysRemoved => ("Holidays removed:", "已删除节假日:"),
            Msg::SoundOn => ("Sound on", "音效已开启"),
            Msg::SoundOff => ("Sound off", "音效已关闭"),
            Msg::Language => ("Language:", "语言:"),
            Msg::BlankTitle => ("Title must not be empty", "标题不能为空"),
            Msg::EndBeforeStart => ("End date is before start date", "结束日期早于开始日期"),
            Msg::EndTimeBeforeStart => ("End time is before start time", "结束时间早于开始时间"),
            Msg::BadDate => ("Dates use yyyy-mm-dd", "日期格式为 yyyy-mm-dd"),
            Msg::BadTime => ("Times use HH:MM", "时间格式为 HH:MM"),
            Msg::ImportPath => ("Import .ics from:", "从此路径导入 .ics:"),
            Msg::ExportPath => ("Export .ics to:", "导出 .ics 到:"),
        };
        if self.zh() {
            zh
        } else {
            en
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::TimeSpan;
    use pretty_assertions::assert_eq;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn titles_and_weekdays() {
        let en = Locale::new(Language::English);
        let zh = Locale::new(Language::Chinese);
        assert_eq!(en.month_title(day(2026, 3, 1)), "March 2026");
        assert_eq!(zh.month_title(day(2026, 3, 1)), "2026年3月");
        assert_eq!(en.weekday(0), "Sun");
        assert_eq!(zh.weekday(6), "六");
        assert_eq!(en.pretty_date(day(2026, 3, 11)), "Wed, Mar 11, 2026");
    }

    #[test]
    fn item_meta_formats() {
        let en = Locale::new(Language::English);
        let mut item = TodoItem::new("a", "Trip", day(2026, 3, 3));
        assert_eq!(en.item_meta(&item), "Mar 3 | All day");

        item.end_date = day(2026, 3, 5);
        item.time = Some(TimeSpan {
            start_minute: 9 * 60,
            end_minute: 10 * 60,
        });
        assert_eq!(en.item_meta(&item), "Mar 3 - Mar 5 | 09:00 - 10:00");
        assert_eq!(Locale::new(Language::Chinese).item_meta(&item), "3月3日 - 3月5日 | 09:00 - 10:00");
    }

    #[test]
    fn language_codes() {
        assert_eq!(Language::parse("ZH"), Some(Language::Chinese));
        assert_eq!(Language::parse("fr"), None);
        assert_eq!(Language::from_locale_name("zh_CN.UTF-8"), Language::Chinese);
        assert_eq!(Language::from_locale_name("sv_SE.UTF-8"), Language::English);
        assert_eq!(Language::System.cycle().cycle().cycle(), Language::System);
    }
}
