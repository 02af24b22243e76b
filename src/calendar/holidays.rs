use std::time::Duration;

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{info, warn};

use super::error::{CalendarError, Result};
use super::item::{normalize_title, TodoItem};
use super::store::Store;

pub const HOLIDAY_API: &str = "https://date.nager.at/api/v3/PublicHolidays";
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Countries offered by the interactive importer.
pub const BUILTIN_COUNTRIES: [&str; 2] = ["CN", "SE"];

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PublicHoliday {
    pub date: String,
    #[serde(rename = "localName")]
    pub local_name: String,
    pub name: String,
}

/// Tolerant payload parse: the document must be an array, odd elements are skipped.
pub fn parse_holidays(payload: &str) -> Result<Vec<PublicHoliday>> {
    let elements: Vec<Value> = serde_json::from_str(payload)?;
    Ok(elements
        .into_iter()
        .filter_map(|v| serde_json::from_value(v).ok())
        .collect())
}

/// All-day items tagged `holiday:<CC>` so they can be removed in bulk later.
pub fn holidays_to_items(country: &str, holidays: &[PublicHoliday]) -> Vec<TodoItem> {
    let country = country.to_ascii_uppercase();
    holidays
        .iter()
        .filter_map(|holiday| {
            let date = NaiveDate::parse_from_str(holiday.date.trim(), "%Y-%m-%d").ok()?;
            let name = if holiday.local_name.trim().is_empty() {
                &holiday.name
            } else {
                &holiday.local_name
            };
            let title = normalize_title(name);
            if title.is_empty() {
                return None;
            }
            let mut item = TodoItem::new(format!("holiday_{country}_{}", holiday.date.trim()), title, date);
            item.source_tag = format!("holiday:{country}");
            Some(item)
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct HolidayClient {
    http: reqwest::Client,
    base_url: String,
}

impl HolidayClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(HOLIDAY_API)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(HTTP_TIMEOUT)
            .read_timeout(HTTP_TIMEOUT)
            .user_agent(concat!("widget-calendar/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    pub async fn fetch(&self, year: i32, country: &str) -> Result<Vec<PublicHoliday>> {
        let url = format!("{}/{year}/{}", self.base_url, country.to_ascii_uppercase());
        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CalendarError::HttpStatus(status.as_u16()));
        }
        let body = response.text().await?;
        parse_holidays(&body)
    }
}

/// Import each country in order. A failure stops the batch; countries
/// already imported stay in the store.
pub async fn import_countries(
    store: &Store,
    client: &HolidayClient,
    year: i32,
    countries: &[String],
) -> Result<usize> {
    let mut total = 0;
    for country in countries {
        let holidays = client.fetch(year, country).await?;
        let items = holidays_to_items(country, &holidays);
        let count = items.len();
        store.upsert_all(items)?;
        info!(country = %country, year, count, "imported public holidays");
        total += count;
    }
    Ok(total)
}

/// Run an import on a detached thread; the receiver resolves once it finishes.
pub fn spawn_import(store: Store, year: i32, countries: Vec<String>) -> oneshot::Receiver<Result<usize>> {
    let (tx, rx) = oneshot::channel();
    std::thread::spawn(move || {
        let result = run_blocking(&store, year, &countries);
        if let Err(ref err) = result {
            warn!(%err, "holiday import failed");
        }
        let _ = tx.send(result);
    });
    rx
}

/// Blocking wrapper used by the CLI and the background importer.
pub fn run_blocking(store: &Store, year: i32, countries: &[String]) -> Result<usize> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async {
        let client = HolidayClient::new()?;
        import_countries(store, &client, year, countries).await
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PAYLOAD: &str = r#"[
        {"date": "2026-01-01", "localName": "Nyårsdagen", "name": "New Year's Day"},
        {"date": "2026-06-06", "localName": "", "name": "National Day of Sweden"},
        {"date": "not a date", "localName": "Broken", "name": "Broken"},
        {"date": "2026-12-25", "localName": "  ", "name": ""},
        42
    ]"#;

    #[test]
    fn parses_payload_and_builds_tagged_items() {
        let holidays = parse_holidays(PAYLOAD).unwrap();
        assert_eq!(holidays.len(), 4);

        let items = holidays_to_items("se", &holidays);
        let summary: Vec<(&str, &str, &str)> = items
            .iter()
            .map(|i| (i.id.as_str(), i.title.as_str(), i.source_tag.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("holiday_SE_2026-01-01", "Nyårsdagen", "holiday:SE"),
                ("holiday_SE_2026-06-06", "National Day of Sweden", "holiday:SE"),
            ]
        );
        assert!(items.iter().all(|i| !i.is_multi_day() && i.time.is_none()));
    }

    #[test]
    fn rejects_non_array_payload() {
        assert!(parse_holidays(r#"{"error": "rate limited"}"#).is_err());
    }

    #[test]
    fn reimport_is_idempotent() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let items = holidays_to_items("SE", &parse_holidays(PAYLOAD).unwrap());
        store.upsert_all(items.clone()).unwrap();
        store.upsert_all(items).unwrap();
        assert_eq!(store.count_imported("SE"), 2);
    }
}
