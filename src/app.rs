use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Datelike, Days, Months, NaiveDate, Utc};
use tokio::sync::oneshot::{self, error::TryRecvError};
use tracing::{info, warn};
use uuid::Uuid;

use crate::calendar::holidays::{self, BUILTIN_COUNTRIES};
use crate::calendar::{ics, items_for_date, PrefsStore, Result, Store, TodoItem};
use crate::components::item_form::ItemFormState;
use crate::layout::{displayed_month, CellMeasure, GridFactory};
use crate::locale::{Locale, Msg};
use crate::sound::SoundPlayer;

/// Default widget width used before the first frame reports the real one.
const FALLBACK_WIDTH: u16 = 80;
pub const DEFAULT_ICS_FILE: &str = "widget-calendar.ics";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Grid,
    Day,
    Form,
    Prompt(PromptKind),
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    ImportIcs,
    ExportIcs,
}

pub struct App {
    pub running: bool,
    pub mode: Mode,
    pub today: NaiveDate,
    pub selected: NaiveDate,
    pub instance: String,
    pub month_offset: i32,
    pub locale: Locale,
    pub sound: SoundPlayer,
    pub status_message: Option<String>,
    pub day_items: Vec<TodoItem>,
    pub day_cursor: usize,
    pub form: Option<ItemFormState>,
    pub form_error: Option<Msg>,
    pub prompt: String,
    pub grid: GridFactory<CellMeasure>,
    items: Vec<TodoItem>,
    fixed_width: Option<u16>,
    data_dir: PathBuf,
    store: Store,
    prefs: PrefsStore,
    holiday_job: Option<oneshot::Receiver<Result<usize>>>,
}

impl App {
    pub fn new(data_dir: &Path, instance: impl Into<String>, today: NaiveDate) -> Result<Self> {
        let store = Store::open(data_dir)?;
        let prefs = PrefsStore::open(data_dir)?;
        info!(store = %store.path().display(), "opened item store");
        let instance = instance.into();
        let saved = prefs.load();
        let month_offset = saved.month_offset(&instance);
        let width = saved.widget_width.unwrap_or(FALLBACK_WIDTH);

        let mut app = Self {
            running: true,
            mode: Mode::Grid,
            today,
            selected: today,
            instance,
            month_offset,
            locale: Locale::new(saved.language),
            sound: SoundPlayer::new(saved.sound_enabled),
            status_message: None,
            day_items: Vec::new(),
            day_cursor: 0,
            form: None,
            form_error: None,
            prompt: String::new(),
            grid: GridFactory::new(CellMeasure, width, displayed_month(today, month_offset)),
            items: Vec::new(),
            fixed_width: saved.widget_width,
            data_dir: data_dir.to_path_buf(),
            store,
            prefs,
            holiday_job: None,
        };
        if month_offset != 0 {
            app.selected = app.displayed_month();
        }
        app.rebuild();
        Ok(app)
    }

    pub fn displayed_month(&self) -> NaiveDate {
        displayed_month(self.today, self.month_offset)
    }

    /// Reload every item and rebuild the grid from scratch.
    pub fn rebuild(&mut self) {
        self.items = self.store.load_all();
        let month = self.displayed_month();
        self.grid.on_data_set_changed(&self.items, month, self.today);
        self.refresh_day_items();
    }

    fn refresh_day_items(&mut self) {
        self.day_items = items_for_date(&self.items, self.selected);
        self.day_cursor = self.day_cursor.min(self.day_items.len().saturating_sub(1));
    }

    /// Track the live terminal width unless a width is pinned in preferences.
    pub fn set_viewport_width(&mut self, width: u16) {
        if self.fixed_width.is_some() || self.grid.widget_width() == width {
            return;
        }
        self.grid.set_widget_width(width);
        self.rebuild();
    }

    fn set_status(&mut self, text: impl Into<String>) {
        self.status_message = Some(text.into());
    }

    fn report(&mut self, failure: Msg, result: Result<()>) {
        if let Err(err) = result {
            warn!(%err, "action failed");
            self.set_status(format!("{}: {err}", self.locale.text(failure)));
        }
    }

    fn persist_offset(&mut self) {
        let (instance, offset) = (self.instance.clone(), self.month_offset);
        let result = self.prefs.update(|p| p.set_month_offset(&instance, offset)).map(|_| ());
        if let Err(err) = result {
            warn!(%err, "failed to store month offset");
        }
    }

    // ── navigation ──

    pub fn shift_month(&mut self, delta: i32) {
        let (instance, current) = (self.instance.clone(), self.month_offset);
        match self.prefs.update(|p| {
            p.set_month_offset(&instance, current);
            p.shift_month_offset(&instance, delta)
        }) {
            Ok(offset) => self.month_offset = offset,
            Err(err) => {
                warn!(%err, "failed to store month offset");
                self.month_offset = self.month_offset.saturating_add(delta);
            }
        }
        let month = self.displayed_month();
        self.selected = clamp_day_into(month, self.selected.day());
        self.rebuild();
    }

    pub fn go_to_today(&mut self) {
        self.month_offset = 0;
        self.persist_offset();
        self.selected = self.today;
        self.rebuild();
    }

    /// Move the selection; the displayed month follows it.
    pub fn move_selection(&mut self, days: i64) {
        let next = if days >= 0 {
            self.selected.checked_add_days(Days::new(days.unsigned_abs()))
        } else {
            self.selected.checked_sub_days(Days::new(days.unsigned_abs()))
        };
        let Some(next) = next else {
            return;
        };
        self.selected = next;
        let offset = months_between(self.today, next);
        if offset != self.month_offset {
            self.month_offset = offset;
            self.persist_offset();
            self.rebuild();
        } else {
            self.refresh_day_items();
        }
    }

    pub fn select_date(&mut self, date: NaiveDate) {
        let days = (date - self.selected).num_days();
        self.move_selection(days);
    }

    pub fn open_day(&mut self) {
        self.day_cursor = 0;
        self.mode = Mode::Day;
    }

    pub fn close_overlay(&mut self) {
        self.mode = Mode::Grid;
        self.form = None;
        self.form_error = None;
    }

    pub fn cursor_down(&mut self) {
        if self.day_cursor + 1 < self.day_items.len() {
            self.day_cursor += 1;
        }
    }

    pub fn cursor_up(&mut self) {
        self.day_cursor = self.day_cursor.saturating_sub(1);
    }

    pub fn selected_item(&self) -> Option<&TodoItem> {
        self.day_items.get(self.day_cursor)
    }

    // ── item actions ──

    /// Flip completion on the stored item behind the selected occurrence.
    pub fn toggle_selected(&mut self, bell: &mut impl Write) {
        let Some(template_id) = self.selected_item().map(|i| i.series_key().to_string()) else {
            return;
        };
        let Some(template) = self.store.get(&template_id) else {
            return;
        };
        let completed = !template.completed;
        let result = self.store.set_completed(&template_id, completed).map(|_| ());
        if result.is_ok() {
            if completed {
                if let Err(err) = self.sound.play_completion(bell) {
                    warn!(%err, "completion sound failed");
                }
            }
            let msg = if completed { Msg::Completed } else { Msg::Reopened };
            self.set_status(self.locale.text(msg));
        }
        self.report(Msg::Saved, result);
        self.rebuild();
    }

    pub fn delete_selected(&mut self) {
        let Some(template_id) = self.selected_item().map(|i| i.series_key().to_string()) else {
            return;
        };
        let result = self.store.delete(&template_id).map(|_| ());
        if result.is_ok() {
            self.set_status(self.locale.text(Msg::Deleted));
        }
        self.report(Msg::Deleted, result);
        self.rebuild();
    }

    pub fn open_new_form(&mut self) {
        self.form = Some(ItemFormState::new(self.selected));
        self.form_error = None;
        self.mode = Mode::Form;
    }

    /// Edit the stored item behind the selection; occurrences edit their series.
    pub fn open_edit_form(&mut self) {
        let template = self
            .selected_item()
            .and_then(|item| self.store.get(item.series_key()));
        if let Some(template) = template {
            self.form = Some(ItemFormState::from_item(&template));
            self.form_error = None;
            self.mode = Mode::Form;
        }
    }

    pub fn submit_form(&mut self) {
        let Some(form) = self.form.as_ref() else {
            return;
        };
        match form.build(|| Uuid::new_v4().to_string()) {
            Ok(item) => {
                let result = self.store.upsert(item);
                if result.is_ok() {
                    self.set_status(self.locale.text(Msg::Saved));
                    self.close_overlay();
                }
                self.report(Msg::Saved, result);
                self.rebuild();
            }
            Err(msg) => self.form_error = Some(msg),
        }
    }

    // ── import / export ──

    pub fn open_prompt(&mut self, kind: PromptKind) {
        self.prompt = self.data_dir.join(DEFAULT_ICS_FILE).display().to_string();
        self.mode = Mode::Prompt(kind);
    }

    pub fn submit_prompt(&mut self) {
        let Mode::Prompt(kind) = self.mode else {
            return;
        };
        let path = PathBuf::from(self.prompt.trim());
        self.mode = Mode::Grid;
        match kind {
            PromptKind::ImportIcs => match self.import_ics(&path) {
                Ok(count) => self.set_status(format!("{} {count}", self.locale.text(Msg::Imported))),
                Err(err) => self.report(Msg::ImportFailed, Err(err)),
            },
            PromptKind::ExportIcs => match self.export_ics(&path) {
                Ok(()) => self.set_status(format!("{} {}", self.locale.text(Msg::Exported), path.display())),
                Err(err) => self.report(Msg::ExportFailed, Err(err)),
            },
        }
        self.rebuild();
    }

    fn import_ics(&self, path: &Path) -> Result<usize> {
        let content = fs::read_to_string(path)?;
        let items = ics::import(&content)?;
        let count = self.store.replace_all(items)?;
        info!(count, path = %path.display(), "imported calendar file");
        Ok(count)
    }

    fn export_ics(&self, path: &Path) -> Result<()> {
        fs::write(path, ics::export(&self.store.load_all(), Utc::now()))?;
        info!(path = %path.display(), "exported calendar file");
        Ok(())
    }

    // ── holidays ──

    pub fn holidays_in_flight(&self) -> bool {
        self.holiday_job.is_some()
    }

    pub fn start_holiday_import(&mut self) {
        if self.holidays_in_flight() {
            self.set_status(self.locale.text(Msg::HolidaysBusy));
            return;
        }
        let countries = BUILTIN_COUNTRIES.iter().map(|c| c.to_string()).collect();
        self.holiday_job = Some(holidays::spawn_import(self.store.clone(), self.today.year(), countries));
        self.set_status(self.locale.text(Msg::HolidaysBusy));
    }

    /// Pick up a finished holiday import; called on every UI tick.
    pub fn poll_jobs(&mut self) {
        let Some(job) = self.holiday_job.as_mut() else {
            return;
        };
        match job.try_recv() {
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Closed) => self.holiday_job = None,
            Ok(result) => {
                self.holiday_job = None;
                match result {
                    Ok(count) => {
                        self.set_status(format!("{} {count}", self.locale.text(Msg::HolidaysImported)))
                    }
                    Err(err) => self.report(Msg::ImportFailed, Err(err)),
                }
                self.rebuild();
            }
        }
    }

    pub fn remove_holidays(&mut self) {
        let mut removed = 0;
        for country in BUILTIN_COUNTRIES {
            match self.store.remove_imported(country) {
                Ok(n) => removed += n,
                Err(err) => {
                    self.report(Msg::Deleted, Err(err));
                    self.rebuild();
                    return;
                }
            }
        }
        self.set_status(format!("{} {removed}", self.locale.text(Msg::HolidaysRemoved)));
        self.rebuild();
    }

    // ── preferences ──

    pub fn cycle_language(&mut self) {
        let result = self.prefs.update(|p| {
            p.language = p.language.cycle();
            p.language
        });
        match result {
            Ok(language) => {
                self.locale = Locale::new(language);
                self.set_status(format!("{} {}", self.locale.text(Msg::Language), language.code()));
            }
            Err(err) => self.report(Msg::Saved, Err(err)),
        }
    }

    pub fn toggle_sound(&mut self) {
        let result = self.prefs.update(|p| {
            p.sound_enabled = !p.sound_enabled;
            p.sound_enabled
        });
        match result {
            Ok(enabled) => {
                self.sound.set_enabled(enabled);
                let msg = if enabled { Msg::SoundOn } else { Msg::SoundOff };
                self.set_status(self.locale.text(msg));
            }
            Err(err) => self.report(Msg::Saved, Err(err)),
        }
    }
}

/// Whole months from `from`'s month to `to`'s month.
pub fn months_between(from: NaiveDate, to: NaiveDate) -> i32 {
    (to.year() - from.year()) * 12 + to.month() as i32 - from.month() as i32
}

/// `day` in `month`, clamped to the month's last day.
fn clamp_day_into(month: NaiveDate, day: u32) -> NaiveDate {
    let last = month
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .map_or(28, |d| d.day());
    month.with_day(day.min(last)).unwrap_or(month)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::Recurrence;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn app(dir: &TempDir) -> App {
        App::new(dir.path(), "7", day(2026, 3, 11)).unwrap()
    }

    #[test]
    fn month_offset_persists_per_instance() {
        let dir = TempDir::new().unwrap();
        let mut first = app(&dir);
        first.shift_month(-1);
        assert_eq!(first.displayed_month(), day(2026, 2, 1));
        assert_eq!(first.selected, day(2026, 2, 11));

        let reopened = app(&dir);
        assert_eq!(reopened.month_offset, -1);
        assert_eq!(reopened.grid.window().month, day(2026, 2, 1));

        let other = App::new(dir.path(), "8", day(2026, 3, 11)).unwrap();
        assert_eq!(other.month_offset, 0);
    }

    #[test]
    fn selection_drags_the_month_along() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        app.select_date(day(2026, 4, 2));
        assert_eq!(app.month_offset, 1);
        app.go_to_today();
        assert_eq!(app.month_offset, 0);
        assert_eq!(app.selected, day(2026, 3, 11));
    }

    #[test]
    fn shifting_from_month_end_clamps_the_day() {
        assert_eq!(clamp_day_into(day(2026, 2, 1), 31), day(2026, 2, 28));
        assert_eq!(months_between(day(2026, 3, 11), day(2025, 12, 31)), -3);
    }

    #[test]
    fn toggling_an_occurrence_completes_the_series() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        let mut weekly = TodoItem::new("gym", "Gym", day(2026, 3, 4));
        weekly.recurrence = Recurrence::Weekly;
        app.store.upsert(weekly).unwrap();
        app.rebuild();

        app.select_date(day(2026, 3, 18));
        assert_eq!(app.selected_item().map(|i| i.id.as_str()), Some("gym#2026-03-18"));

        let mut bell = Vec::new();
        app.toggle_selected(&mut bell);
        assert!(app.store.get("gym").unwrap().completed);
        assert_eq!(bell, b"\x07");

        bell.clear();
        app.toggle_selected(&mut bell);
        assert!(!app.store.get("gym").unwrap().completed);
        assert!(bell.is_empty());
    }

    #[test]
    fn sound_toggle_silences_completion() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        app.store.upsert(TodoItem::new("a", "Call", day(2026, 3, 11))).unwrap();
        app.rebuild();
        app.toggle_sound();
        assert!(!app.prefs.load().sound_enabled);

        let mut bell = Vec::new();
        app.toggle_selected(&mut bell);
        assert!(bell.is_empty());
        assert!(app.store.get("a").unwrap().completed);
    }

    #[test]
    fn form_submit_validates_then_saves() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        app.open_new_form();
        app.submit_form();
        assert_eq!(app.form_error, Some(Msg::BlankTitle));
        assert_eq!(app.mode, Mode::Form);

        if let Some(form) = app.form.as_mut() {
            form.title = "Dentist".to_string();
        }
        app.submit_form();
        assert_eq!(app.mode, Mode::Grid);
        let titles: Vec<&str> = app.day_items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["Dentist"]);
    }

    #[test]
    fn edit_and_delete_act_on_the_template() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        let mut daily = TodoItem::new("pill", "Pill", day(2026, 3, 1));
        daily.recurrence = Recurrence::Daily;
        app.store.upsert(daily).unwrap();
        app.rebuild();

        app.open_edit_form();
        assert_eq!(app.form.as_ref().and_then(|f| f.editing.clone()), Some("pill".to_string()));
        app.close_overlay();

        app.delete_selected();
        assert!(app.store.load_all().is_empty());
        assert!(app.day_items.is_empty());
    }

    #[test]
    fn ics_prompt_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        app.store.upsert(TodoItem::new("a", "Standup", day(2026, 3, 11))).unwrap();

        app.open_prompt(PromptKind::ExportIcs);
        app.submit_prompt();
        app.store.replace_all(Vec::new()).unwrap();

        app.open_prompt(PromptKind::ImportIcs);
        app.submit_prompt();
        let titles: Vec<String> = app.store.load_all().into_iter().map(|i| i.title).collect();
        assert_eq!(titles, vec!["Standup".to_string()]);

        app.prompt = dir.path().join("missing.ics").display().to_string();
        app.mode = Mode::Prompt(PromptKind::ImportIcs);
        app.submit_prompt();
        assert!(app.status_message.as_deref().is_some_and(|m| m.starts_with("Import failed")
            || m.starts_with("导入失败")));
        assert_eq!(app.store.load_all().len(), 1);
    }
}
