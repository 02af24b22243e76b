use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Datelike, Local, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{bail, WrapErr};
use color_eyre::Result;

use crate::calendar::{holidays, ics, items_for_date, PrefsStore, Store};
use crate::layout::{displayed_month, CellMeasure, DayCell, GridFactory, GridWindow};
use crate::locale::{Language, Locale};

#[derive(Parser)]
#[command(name = "wcal", about = "Month-grid to-do calendar for the terminal", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Directory holding items, preferences and the log file
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Widget instance whose month offset is used
    #[arg(long, default_value = "0", global = true)]
    pub instance: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Replace all items with the events of an .ics file
    Import(PathArg),
    /// Write all items to an .ics file
    Export(PathArg),
    /// Replace all items with a JSON backup
    ImportJson(PathArg),
    /// Write the raw JSON item blob
    ExportJson(PathArg),
    /// Import this year's public holidays for the given countries
    Holidays(CountriesArg),
    /// Remove holiday items imported for the given countries
    RemoveHolidays(CountriesArg),
    /// List items on a day
    List(ListArgs),
    /// Print the month grid as text
    Grid(GridArgs),
    /// Set the display language
    Language(LanguageArgs),
    /// Turn the completion sound on or off
    Sound(SoundArgs),
    /// Forget the stored month offset of the --instance widget
    Forget,
}

#[derive(Args)]
pub struct PathArg {
    pub path: PathBuf,
}

#[derive(Args)]
pub struct CountriesArg {
    /// Two-letter country codes, e.g. SE CN
    #[arg(required = true)]
    pub countries: Vec<String>,
}

#[derive(Args)]
pub struct ListArgs {
    /// Day to list (yyyy-mm-dd), defaults to today
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

#[derive(Args)]
pub struct GridArgs {
    /// Months from the current month; defaults to the instance's stored offset
    #[arg(long, allow_hyphen_values = true)]
    pub offset: Option<i32>,
    /// Width in columns used to split multi-day labels
    #[arg(long, default_value_t = 112)]
    pub width: u16,
}

#[derive(Args)]
pub struct LanguageArgs {
    /// system, en or zh
    #[arg(value_parser = parse_language)]
    pub language: Language,
}

fn parse_language(value: &str) -> std::result::Result<Language, String> {
    Language::parse(value).ok_or_else(|| format!("unknown language `{value}`, expected system, en or zh"))
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

#[derive(Args)]
pub struct SoundArgs {
    pub state: Toggle,
}

pub fn default_data_dir() -> Result<PathBuf> {
    match dirs::data_dir() {
        Some(dir) => Ok(dir.join("widget-calendar")),
        None => bail!("could not determine a data directory; pass --data-dir"),
    }
}

pub fn run(command: Commands, data_dir: &Path, instance: &str) -> Result<()> {
    let store = Store::open(data_dir)?;
    let prefs = PrefsStore::open(data_dir)?;
    let today = Local::now().date_naive();

    match command {
        Commands::Import(args) => {
            let content = fs::read_to_string(&args.path)
                .wrap_err_with(|| format!("reading {}", args.path.display()))?;
            let items = ics::import(&content)?;
            let count = store.replace_all(items)?;
            println!("Imported {count} items");
        }
        Commands::Export(args) => {
            let items = store.load_all();
            fs::write(&args.path, ics::export(&items, Utc::now()))
                .wrap_err_with(|| format!("writing {}", args.path.display()))?;
            println!("Exported {} items to {}", items.len(), args.path.display());
        }
        Commands::ImportJson(args) => {
            let raw = fs::read_to_string(&args.path)
                .wrap_err_with(|| format!("reading {}", args.path.display()))?;
            let count = store.import_json(&raw)?;
            println!("Imported {count} items");
        }
        Commands::ExportJson(args) => {
            fs::write(&args.path, store.export_json())
                .wrap_err_with(|| format!("writing {}", args.path.display()))?;
            println!("Exported to {}", args.path.display());
        }
        Commands::Holidays(args) => {
            let year = today.year();
            let count = holidays::run_blocking(&store, year, &args.countries)?;
            println!("Imported {count} holidays for {year}");
        }
        Commands::RemoveHolidays(args) => {
            let mut removed = 0;
            for country in &args.countries {
                removed += store.remove_imported(country)?;
            }
            println!("Removed {removed} holiday items");
        }
        Commands::List(args) => {
            let locale = Locale::new(prefs.load().language);
            let date = args.date.unwrap_or(today);
            let items = items_for_date(&store.load_all(), date);
            println!("{}", locale.pretty_date(date));
            for item in items {
                let mark = if item.completed { "x" } else { " " };
                println!("[{mark}] {}  ({})", item.title, locale.item_meta(&item));
            }
        }
        Commands::Grid(args) => {
            let saved = prefs.load();
            let locale = Locale::new(saved.language);
            let offset = args.offset.unwrap_or_else(|| saved.month_offset(instance));
            let month = displayed_month(today, offset);
            let mut grid = GridFactory::new(CellMeasure, args.width, month);
            grid.on_data_set_changed(&store.load_all(), month, today);
            print!("{}", grid_text(grid.window(), grid.cells(), &locale, args.width));
        }
        Commands::Language(args) => {
            let language = args.language;
            prefs.update(|p| p.language = language)?;
            println!("Language set to {}", language.code());
        }
        Commands::Sound(args) => {
            let enabled = matches!(args.state, Toggle::On);
            prefs.update(|p| p.sound_enabled = enabled)?;
            println!("Sound {}", if enabled { "on" } else { "off" });
        }
        Commands::Forget => {
            prefs.update(|p| p.remove_month_offset(instance))?;
            println!("Forgot widget instance {instance}");
        }
    }
    Ok(())
}

/// Plain-text rendering of a built grid: one block of four lines per week.
pub fn grid_text(window: &GridWindow, cells: &[DayCell], locale: &Locale, width: u16) -> String {
    let col = (usize::from(width) / 7).max(4);
    let cut = |text: &str| -> String {
        let clipped: String = text.chars().take(col - 1).collect();
        format!("{clipped:<w$}|", w = col - 1)
    };

    let mut out = format!("{}\n", locale.month_title(window.month));
    out.push_str(&(0..7).map(|i| cut(locale.weekday(i))).collect::<String>());
    out.push('\n');

    for week in cells.chunks(7) {
        let numbers: String = week
            .iter()
            .map(|cell| {
                let mark = if cell.is_today { "*" } else if cell.in_month { "" } else { "." };
                cut(&format!("{:>2}{mark}", cell.day_number))
            })
            .collect();
        out.push_str(&numbers);
        out.push('\n');
        for lane in 0..crate::layout::LANE_COUNT {
            let row: String = week
                .iter()
                .map(|cell| cut(cell.lines[lane].as_ref().map_or("", |l| l.text.as_str())))
                .collect();
            out.push_str(&row);
            out.push('\n');
        }
    }
    out
}
