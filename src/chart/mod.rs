//! # Chart Planning
//!
//! Turns a [`crate::table::Table`] into bar chart specifications: the
//! [`classify`] step decides which column labels the categories and which
//! columns are plotted, and [`build`] lays out one [`ChartSpec`] per plotted
//! column using the run's [`Palette`] and [`ChartStyle`].

mod builder;
mod classify;
mod palette;
mod spec;
mod style;

pub use builder::build;
pub use builder::BuildError;
pub use classify::classify;
pub use classify::Category;
pub use classify::ColumnClassification;
pub use classify::ERROR_COLUMN_SUFFIXES;
pub use palette::Color;
pub use palette::ColorError;
pub use palette::Palette;
pub use spec::ChartSpec;
pub use spec::Legend;
pub use spec::LegendPosition;
pub use spec::YRange;
pub use style::ChartStyle;
