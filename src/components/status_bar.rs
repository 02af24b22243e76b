use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app::{Mode, PromptKind};
use crate::locale::{Locale, Msg};
use crate::theme;

pub struct StatusBar;

impl StatusBar {
    pub fn render(
        frame: &mut Frame,
        area: Rect,
        mode: Mode,
        message: Option<&str>,
        prompt: &str,
        busy: bool,
        locale: &Locale,
    ) {
        let style = theme::current().status;
        let w = area.width as usize;

        if let Mode::Prompt(kind) = mode {
            let label = match kind {
                PromptKind::ImportIcs => locale.text(Msg::ImportPath),
                PromptKind::ExportIcs => locale.text(Msg::ExportPath),
            };
            let line = Line::from(vec![
                Span::styled(format!(" {label} "), style),
                Span::styled(format!("{prompt}_"), style),
            ]);
            frame.render_widget(Paragraph::new(line).style(style), area);
            return;
        }

        let mode_str = match mode {
            Mode::Grid => "Month",
            Mode::Day => "Day",
            Mode::Form => "Edit",
            Mode::Help => "Help",
            Mode::Prompt(_) => "",
        };
        let left = if busy {
            format!(" {mode_str} | {} ", locale.text(Msg::HolidaysBusy))
        } else {
            format!(" {mode_str} ")
        };

        let right = match message {
            Some(msg) => format!(" {msg} "),
            None => hints(mode, w).to_string(),
        };

        let padding = " ".repeat(w.saturating_sub(left.chars().count() + right.chars().count()));
        let line = Line::from(vec![
            Span::styled(left, style),
            Span::styled(padding, style),
            Span::styled(right, style),
        ]);
        frame.render_widget(Paragraph::new(line).style(style), area);
    }
}

fn hints(mode: Mode, width: usize) -> &'static str {
    match mode {
        Mode::Grid if width >= 90 => " hjkl:Nav [/]:Month t:Today Enter:Day n:New Sp:Done i/x:ICS H:Holidays ?:Help q:Quit ",
        Mode::Grid if width >= 50 => " hjkl:Nav [/]:Month n:New ?:Help q:Quit ",
        Mode::Day if width >= 60 => " jk:Select Sp:Done e:Edit d:Delete n:New Esc:Back ",
        Mode::Form => " Tab:Next Enter:Save Esc:Cancel ",
        _ => " ?:Help q:Quit ",
    }
}
