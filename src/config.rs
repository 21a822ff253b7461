//! Chart style overrides loaded from a TOML file.
//!
//! ```toml
//! title_size = 14
//! grid_color = "#D9D9D9"
//! error_bar_alpha = 0.6
//! ```

use crate::chart::ChartStyle;
use log::debug;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read style file '{0}': {1}")]
    ReadError(String, std::io::Error),

    #[error("Invalid style file '{0}': {1}")]
    ParseError(String, toml::de::Error),

    #[error("Invalid style value '{0}': {1}")]
    InvalidValueError(&'static str, String),
}

/// Reads a style file; fields it leaves out keep their default values.
pub fn load_style<P: AsRef<Path>>(path: P) -> Result<ChartStyle, ConfigError> {
    let path = path.as_ref();
    let name = path.display().to_string();
    let text = fs::read_to_string(path).map_err(|error| ConfigError::ReadError(name.clone(), error))?;
    let style = parse_style(&text).map_err(|error| match error {
        ConfigError::ParseError(_, error) => ConfigError::ParseError(name.clone(), error),
        error => error,
    })?;
    debug!("loaded chart style from '{}'", name);
    Ok(style)
}

/// Parses and validates style overrides.
pub fn parse_style(text: &str) -> Result<ChartStyle, ConfigError> {
    let style: ChartStyle = toml::from_str(text).map_err(|error| ConfigError::ParseError(String::new(), error))?;
    validate(&style)?;
    Ok(style)
}

fn validate(style: &ChartStyle) -> Result<(), ConfigError> {
    let positive = [
        ("width", style.width),
        ("height", style.height),
        ("title_size", style.title_size),
        ("x_tick_label_size", style.x_tick_label_size),
        ("y_tick_label_size", style.y_tick_label_size),
        ("legend_font_size", style.legend_font_size),
    ];
    for (name, value) in positive {
        if !(value.is_finite() && value > 0.0) {
            return Err(ConfigError::InvalidValueError(name, format!("{value} is not positive")));
        }
    }

    let non_negative = [
        ("spine_width", style.spine_width),
        ("grid_width", style.grid_width),
        ("title_pad", style.title_pad),
        ("error_bar_width", style.error_bar_width),
        ("error_bar_cap_size", style.error_bar_cap_size),
    ];
    for (name, value) in non_negative {
        if !(value.is_finite() && value >= 0.0) {
            return Err(ConfigError::InvalidValueError(name, format!("{value} is negative")));
        }
    }

    if !(0.0..=1.0).contains(&style.error_bar_alpha) {
        return Err(ConfigError::InvalidValueError(
            "error_bar_alpha",
            format!("{} is outside 0..=1", style.error_bar_alpha),
        ));
    }
    if !(style.bar_width > 0.0 && style.bar_width <= 1.0) {
        return Err(ConfigError::InvalidValueError(
            "bar_width",
            format!("{} is outside (0, 1]", style.bar_width),
        ));
    }
    Ok(())
}
