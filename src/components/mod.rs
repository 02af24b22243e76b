pub mod day_view;
pub mod help;
pub mod item_form;
pub mod month_grid;
pub mod status_bar;

pub use day_view::DayView;
pub use help::Help;
pub use item_form::ItemForm;
pub use month_grid::MonthGrid;
pub use status_bar::StatusBar;
