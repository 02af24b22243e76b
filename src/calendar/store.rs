use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::error::{CalendarError, Result};
use super::item::{normalize_title, sort_for_display, Priority, Recurrence, TimeSpan, TodoItem};

pub const ITEMS_FILE: &str = "todo_items.json";

/// Flat JSON-blob item store. Every mutation rewrites the whole file.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    pub fn open(data_dir: &Path) -> Result<Self> {
        fs::create_dir_all(data_dir)?;
        Ok(Self {
            path: data_dir.join(ITEMS_FILE),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_raw(&self) -> String {
        fs::read_to_string(&self.path).unwrap_or_else(|_| "[]".to_string())
    }

    /// All stored items in display order. A malformed blob reads as empty.
    pub fn load_all(&self) -> Vec<TodoItem> {
        let mut items = parse_items(&self.read_raw());
        sort_for_display(&mut items);
        items
    }

    fn save(&self, items: &[TodoItem]) -> Result<()> {
        fs::write(&self.path, to_json(items)?)?;
        debug!(count = items.len(), path = %self.path.display(), "saved items");
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<TodoItem> {
        self.load_all().into_iter().find(|item| item.id == id)
    }

    pub fn upsert(&self, item: TodoItem) -> Result<()> {
        self.upsert_all(vec![item])
    }

    /// Insert or replace by id, writing once for the whole batch.
    pub fn upsert_all(&self, batch: Vec<TodoItem>) -> Result<()> {
        let mut items = self.load_all();
        for item in batch {
            let item = item.normalized();
            match items.iter_mut().find(|existing| existing.id == item.id) {
                Some(existing) => *existing = item,
                None => items.push(item),
            }
        }
        self.save(&items)
    }

    pub fn delete(&self, id: &str) -> Result<bool> {
        let mut items = self.load_all();
        let before = items.len();
        items.retain(|item| item.id != id);
        if items.len() == before {
            return Ok(false);
        }
        info!(id, "deleted item");
        self.save(&items)?;
        Ok(true)
    }

    pub fn set_completed(&self, id: &str, completed: bool) -> Result<bool> {
        let mut items = self.load_all();
        let Some(item) = items.iter_mut().find(|item| item.id == id) else {
            return Ok(false);
        };
        item.completed = completed;
        self.save(&items)?;
        Ok(true)
    }

    pub fn replace_all(&self, items: Vec<TodoItem>) -> Result<usize> {
        let mut items: Vec<TodoItem> = items.into_iter().map(TodoItem::normalized).collect();
        sort_for_display(&mut items);
        self.save(&items)?;
        info!(count = items.len(), "replaced all items");
        Ok(items.len())
    }

    /// The raw persisted blob.
    pub fn export_json(&self) -> String {
        self.read_raw()
    }

    /// Replace the store from a JSON blob; fails without writing if malformed.
    pub fn import_json(&self, raw: &str) -> Result<usize> {
        let items = parse_items_strict(raw)?;
        self.replace_all(items)
    }

    pub fn count_imported(&self, country: &str) -> usize {
        let country = country.to_ascii_uppercase();
        self.load_all()
            .iter()
            .filter(|item| is_imported_for_country(item, &country))
            .count()
    }

    /// Bulk-remove holiday items imported for `country`.
    pub fn remove_imported(&self, country: &str) -> Result<usize> {
        let country = country.to_ascii_uppercase();
        let mut items = self.load_all();
        let before = items.len();
        items.retain(|item| !is_imported_for_country(item, &country));
        let removed = before - items.len();
        if removed > 0 {
            self.save(&items)?;
            info!(country = %country, removed, "removed imported items");
        }
        Ok(removed)
    }
}

fn is_imported_for_country(item: &TodoItem, country_upper: &str) -> bool {
    item.source_tag
        .to_ascii_uppercase()
        .starts_with(&format!("HOLIDAY:{country_upper}"))
        || item
            .id
            .to_ascii_uppercase()
            .starts_with(&format!("HOLIDAY_{country_upper}_"))
}

/// Local-midnight epoch milliseconds for a calendar day.
pub fn date_to_millis(date: NaiveDate) -> i64 {
    let midnight = date.and_time(NaiveTime::MIN);
    Local
        .from_local_datetime(&midnight)
        .earliest()
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| midnight.and_utc().timestamp_millis())
}

pub fn millis_to_date(millis: i64) -> NaiveDate {
    match Local.timestamp_millis_opt(millis).earliest() {
        Some(dt) => dt.date_naive(),
        None => DateTime::<Utc>::from_timestamp_millis(millis)
            .unwrap_or_default()
            .date_naive(),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StoredItem<'a> {
    id: &'a str,
    title: &'a str,
    description: &'a str,
    start_date_millis: i64,
    end_date_millis: i64,
    has_time: bool,
    start_minute: i32,
    end_minute: i32,
    completed: bool,
    source_tag: &'a str,
    priority: i64,
    recurrence: &'static str,
    recurrence_until_millis: i64,
}

impl<'a> From<&'a TodoItem> for StoredItem<'a> {
    fn from(item: &'a TodoItem) -> Self {
        Self {
            id: &item.id,
            title: &item.title,
            description: &item.description,
            start_date_millis: date_to_millis(item.start_date),
            end_date_millis: date_to_millis(item.end_date),
            has_time: item.time.is_some(),
            start_minute: item.time.map_or(-1, |t| i32::from(t.start_minute)),
            end_minute: item.time.map_or(-1, |t| i32::from(t.end_minute)),
            completed: item.completed,
            source_tag: &item.source_tag,
            priority: item.priority.code(),
            recurrence: item.recurrence.as_str(),
            recurrence_until_millis: item.recurrence_until.map_or(0, date_to_millis),
        }
    }
}

pub fn to_json(items: &[TodoItem]) -> Result<String> {
    let stored: Vec<StoredItem<'_>> = items.iter().map(StoredItem::from).collect();
    Ok(serde_json::to_string(&stored)?)
}

/// Permissive read: anything unparsable yields an empty list.
pub fn parse_items(raw: &str) -> Vec<TodoItem> {
    parse_items_strict(raw).unwrap_or_else(|err| {
        warn!(%err, "discarding malformed item blob");
        Vec::new()
    })
}

/// Fails only when the blob is not a JSON array; bad elements are skipped.
pub fn parse_items_strict(raw: &str) -> Result<Vec<TodoItem>> {
    let value: Value = serde_json::from_str(raw)?;
    let Value::Array(elements) = value else {
        return Err(CalendarError::Json(serde::de::Error::custom(
            "expected a JSON array of items",
        )));
    };
    Ok(elements.into_iter().filter_map(item_from_value).collect())
}

/// One element of the blob as written by any version of the app. Missing or
/// null fields fall back to their defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct StoredInput {
    id: Option<String>,
    title: Option<String>,
    description: Option<String>,
    start_date_millis: i64,
    end_date_millis: i64,
    has_time: bool,
    start_minute: Option<i64>,
    end_minute: Option<i64>,
    completed: bool,
    source_tag: Option<String>,
    priority: Option<StoredPriority>,
    recurrence: Option<String>,
    recurrence_until_millis: i64,
}

/// Older blobs store the priority name instead of its code.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredPriority {
    Code(i64),
    Name(String),
    Other(IgnoredAny),
}

impl From<StoredPriority> for Priority {
    fn from(stored: StoredPriority) -> Self {
        match stored {
            StoredPriority::Code(code) => Priority::from_code(code),
            StoredPriority::Name(name) => Priority::parse(&name),
            StoredPriority::Other(_) => Priority::Normal,
        }
    }
}

impl StoredInput {
    fn into_item(self) -> Option<TodoItem> {
        let id = self.id.unwrap_or_default();
        let title = normalize_title(self.title.as_deref().unwrap_or_default());
        if id.trim().is_empty() || title.is_empty() {
            return None;
        }

        let minute = |value: Option<i64>| value.and_then(|m| u16::try_from(m).ok());
        let time = match (self.has_time, minute(self.start_minute), minute(self.end_minute)) {
            (true, Some(start_minute), Some(end_minute)) => Some(TimeSpan {
                start_minute,
                end_minute,
            }),
            _ => None,
        };
        let until = self.recurrence_until_millis;

        let item = TodoItem {
            id,
            title,
            description: self.description.unwrap_or_default(),
            start_date: millis_to_date(self.start_date_millis),
            end_date: millis_to_date(self.end_date_millis),
            time,
            completed: self.completed,
            source_tag: self.source_tag.unwrap_or_default(),
            priority: self.priority.map_or(Priority::Normal, Priority::from),
            recurrence: Recurrence::parse(self.recurrence.as_deref().unwrap_or_default()),
            recurrence_until: (until > 0).then(|| millis_to_date(until)),
            series_id: None,
        };
        Some(item.normalized())
    }
}

fn item_from_value(value: Value) -> Option<TodoItem> {
    match serde_json::from_value::<StoredInput>(value) {
        Ok(input) => input.into_item(),
        Err(err) => {
            debug!(%err, "skipping unreadable item");
            None
        }
    }
}
