mod app;
mod calendar;
mod cli;
mod components;
mod event;
mod layout;
mod locale;
mod logging;
mod sound;
mod theme;
mod tui;

use std::io;
use std::time::Duration;

use app::{App, Mode, PromptKind};
use chrono::Local;
use clap::Parser;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::Frame;
use tracing::info;

use crate::cli::Cli;

const TICK: Duration = Duration::from_millis(100);

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => cli::default_data_dir()?,
    };
    logging::init(&data_dir)?;

    if let Some(command) = cli.command {
        return cli::run(command, &data_dir, &cli.instance);
    }

    let mut app = App::new(&data_dir, cli.instance, Local::now().date_naive())?;
    info!(data_dir = %data_dir.display(), "starting calendar");

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut app);
    tui::restore()?;
    result
}

fn run(terminal: &mut tui::Tui, app: &mut App) -> Result<()> {
    while app.running {
        app.poll_jobs();
        let size = terminal.size()?;
        app.set_viewport_width(size.width);

        terminal.draw(|frame| draw(frame, app))?;

        if let Some(key) = event::next_key_press(TICK)? {
            app.status_message = None;
            match app.mode {
                Mode::Help => {
                    if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                        app.close_overlay();
                    }
                }
                Mode::Form => handle_form_input(app, key),
                Mode::Prompt(_) => handle_prompt_input(app, key),
                Mode::Grid | Mode::Day => handle_normal_input(app, key),
            }
        }
    }
    Ok(())
}

fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let [content, status] = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(area);

    components::MonthGrid::render(
        frame,
        content,
        app.grid.window(),
        app.grid.cells(),
        app.selected,
        &app.locale,
    );

    match app.mode {
        Mode::Day => components::DayView::render(
            frame,
            centered(content, 64, 20),
            app.selected,
            &app.day_items,
            app.day_cursor,
            &app.locale,
        ),
        Mode::Form => {
            if let Some(form) = app.form.as_ref() {
                components::ItemForm::render(frame, content, form, &app.locale, app.form_error);
            }
        }
        Mode::Help => components::Help::render(frame, content),
        Mode::Grid | Mode::Prompt(_) => {}
    }

    components::StatusBar::render(
        frame,
        status,
        app.mode,
        app.status_message.as_deref(),
        &app.prompt,
        app.holidays_in_flight(),
        &app.locale,
    );
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    Rect::new(
        area.x + area.width.saturating_sub(w) / 2,
        area.y + area.height.saturating_sub(h) / 2,
        w,
        h,
    )
}

fn handle_normal_input(app: &mut App, key: KeyEvent) {
    let in_day = app.mode == Mode::Day;
    match (key.code, key.modifiers) {
        (KeyCode::Char('c'), KeyModifiers::CONTROL) | (KeyCode::Char('q'), _) => app.running = false,
        (KeyCode::Esc, _) if in_day => app.close_overlay(),
        (KeyCode::Esc, _) => app.running = false,
        (KeyCode::Char('['), _) => app.shift_month(-1),
        (KeyCode::Char(']'), _) => app.shift_month(1),
        (KeyCode::Char('t'), _) => app.go_to_today(),
        (KeyCode::Left | KeyCode::Char('h'), _) => app.move_selection(-1),
        (KeyCode::Right | KeyCode::Char('l'), _) => app.move_selection(1),
        (KeyCode::Up | KeyCode::Char('k'), _) if in_day => app.cursor_up(),
        (KeyCode::Down | KeyCode::Char('j'), _) if in_day => app.cursor_down(),
        (KeyCode::Up | KeyCode::Char('k'), _) => app.move_selection(-7),
        (KeyCode::Down | KeyCode::Char('j'), _) => app.move_selection(7),
        (KeyCode::Enter, _) if !in_day => app.open_day(),
        (KeyCode::Enter | KeyCode::Char('e'), _) if in_day => app.open_edit_form(),
        (KeyCode::Char(' '), _) if in_day => app.toggle_selected(&mut io::stdout()),
        (KeyCode::Char('d'), _) if in_day => app.delete_selected(),
        (KeyCode::Char('n'), _) => app.open_new_form(),
        (KeyCode::Char('i'), _) => app.open_prompt(PromptKind::ImportIcs),
        (KeyCode::Char('x'), _) => app.open_prompt(PromptKind::ExportIcs),
        (KeyCode::Char('H'), _) => app.start_holiday_import(),
        (KeyCode::Char('R'), _) => app.remove_holidays(),
        (KeyCode::Char('L'), _) => app.cycle_language(),
        (KeyCode::Char('S'), _) => app.toggle_sound(),
        (KeyCode::Char('?'), _) => app.mode = Mode::Help,
        _ => {}
    }
}

fn handle_form_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.close_overlay(),
        KeyCode::Enter => app.submit_form(),
        _ => {
            let Some(form) = app.form.as_mut() else {
                return;
            };
            match key.code {
                KeyCode::Tab | KeyCode::Down => form.active_field = form.active_field.next(),
                KeyCode::BackTab | KeyCode::Up => form.active_field = form.active_field.prev(),
                KeyCode::Backspace => form.backspace(),
                KeyCode::Char(c) => form.input_char(c),
                _ => {}
            }
        }
    }
}

fn handle_prompt_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.close_overlay(),
        KeyCode::Enter => app.submit_prompt(),
        KeyCode::Backspace => {
            app.prompt.pop();
        }
        KeyCode::Char(c) => app.prompt.push(c),
        _ => {}
    }
}
