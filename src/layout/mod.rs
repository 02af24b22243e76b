//! Month grid layout: lane assignment, text segmentation and cell assembly.

pub mod grid;
pub mod lanes;
pub mod measure;
pub mod segment;

pub use grid::{displayed_month, ChipStyle, DayCell, DayLine, GridFactory, GridWindow};
pub use lanes::LANE_COUNT;
pub use measure::{CellMeasure, TextMeasure};
