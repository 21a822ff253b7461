use crate::chart::palette::Color;
use serde::Deserialize;
use serde::Serialize;

/// Visual parameters shared by every chart of a run.
///
/// Sizes are in points unless noted. Missing fields of a deserialized style take
/// their default value, and unknown fields are rejected.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChartStyle {
    /// Figure width in inches
    pub width: f64,
    /// Figure height in inches
    pub height: f64,
    /// Raster resolution the figure size was chosen for
    pub dpi: u32,

    /// Color of the left and bottom spines and of the tick marks
    pub spine_color: Color,
    pub spine_width: f64,
    /// Horizontal gridlines along the value axis
    pub grid_color: Color,
    pub grid_width: f64,

    /// Category tick label size
    pub x_tick_label_size: f64,
    /// Value tick label size
    pub y_tick_label_size: f64,
    pub tick_label_color: Color,

    pub title_size: f64,
    pub title_bold: bool,
    /// Gap between the title baseline and the top of the plot area
    pub title_pad: f64,

    pub legend_font_size: f64,

    pub error_bar_color: Color,
    pub error_bar_width: f64,
    pub error_bar_alpha: f64,
    /// Half width of the error bar caps
    pub error_bar_cap_size: f64,

    /// Bar width as a fraction of the category slot
    pub bar_width: f64,
}

impl Default for ChartStyle {
    fn default() -> Self {
        ChartStyle {
            width: 7.0,
            height: 4.5,
            dpi: 150,
            spine_color: Color::rgb(0x99, 0x99, 0x99),
            spine_width: 0.8,
            grid_color: Color::rgb(0xE0, 0xE0, 0xE0),
            grid_width: 0.8,
            x_tick_label_size: 10.0,
            y_tick_label_size: 9.0,
            tick_label_color: Color::rgb(0x00, 0x00, 0x00),
            title_size: 12.0,
            title_bold: true,
            title_pad: 12.0,
            legend_font_size: 9.0,
            error_bar_color: Color::rgb(0x80, 0x80, 0x80),
            error_bar_width: 1.0,
            error_bar_alpha: 0.8,
            error_bar_cap_size: 4.0,
            bar_width: 0.8,
        }
    }
}

impl ChartStyle {
    /// Page width in points.
    pub fn page_width(&self) -> f64 {
        self.width * 72.0
    }

    /// Page height in points.
    pub fn page_height(&self) -> f64 {
        self.height * 72.0
    }

    /// Error bar color after applying its opacity on a white page.
    pub fn error_bar_paint(&self) -> Color {
        self.error_bar_color.over_white(self.error_bar_alpha)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_style_matches_the_house_layout() {
        let style = ChartStyle::default();
        assert_eq!(style.page_width(), 504.0);
        assert_eq!(style.page_height(), 324.0);
        assert_eq!(style.spine_color.to_string(), "#999999");
        assert_eq!(style.grid_color.to_string(), "#E0E0E0");
        assert_eq!(style.error_bar_paint().to_string(), "#999999");
        assert!(style.title_bold);
    }

    #[test]
    fn partial_styles_keep_defaults() {
        let style: ChartStyle = serde_json::from_str(r##"{"title_size": 14, "grid_color": "#CCCCCC"}"##).unwrap();
        assert_eq!(style.title_size, 14.0);
        assert_eq!(style.grid_color, Color::rgb(0xCC, 0xCC, 0xCC));
        assert_eq!(style.legend_font_size, 9.0);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(serde_json::from_str::<ChartStyle>(r##"{"colour": "#000000"}"##).is_err());
    }
}
