pub mod error;
pub mod holidays;
pub mod ics;
pub mod item;
pub mod prefs;
pub mod recurrence;
pub mod store;

pub use error::Result;
pub use item::{
    date_key, format_minute, normalize_title, sort_for_display, Priority, Recurrence, SpanPosition, TimeSpan,
    TodoItem,
};
pub use prefs::PrefsStore;
pub use recurrence::{expand_items_for_range, items_for_date};
pub use store::Store;
