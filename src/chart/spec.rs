use crate::chart::palette::Color;
use crate::chart::style::ChartStyle;
use serde::Deserialize;
use serde::Serialize;

/// Visible range of the value axis.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct YRange {
    pub min: f64,
    pub max: f64,
}

impl YRange {
    /// `[0, 1.2 × max]` over the finite values, or `[0, 1]` when there are none.
    ///
    /// A negative maximum yields an inverted range, so bars of an all-negative
    /// series grow upwards from zero like positive ones.
    pub fn headroom(values: &[Option<f64>]) -> YRange {
        let max = values
            .iter()
            .flatten()
            .copied()
            .filter(|value| value.is_finite())
            .fold(None, |max: Option<f64>, value| Some(max.map_or(value, |max| max.max(value))));
        match max {
            Some(max) => YRange { min: 0.0, max: max * 1.2 },
            None => YRange { min: 0.0, max: 1.0 },
        }
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    pub fn is_inverted(&self) -> bool {
        self.max < self.min
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LegendPosition {
    BelowPlot,
}

/// Legend laid out as one row of entries under the plot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Legend {
    pub entries: Vec<String>,
    pub position: LegendPosition,
    pub columns: usize,
    pub frame: bool,
}

impl Legend {
    pub fn below(entries: Vec<String>) -> Legend {
        Legend {
            columns: entries.len(),
            entries,
            position: LegendPosition::BelowPlot,
            frame: false,
        }
    }
}

/// Everything needed to draw one bar chart page.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub title: String,
    pub sheet: String,
    pub series: String,
    pub categories: Vec<String>,
    /// One value per category; missing cells draw no bar
    pub values: Vec<Option<f64>>,
    /// Symmetric error per category, when the series has an error column
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub errors: Option<Vec<Option<f64>>>,
    /// Bar color per category
    pub colors: Vec<Color>,
    pub legend: Legend,
    pub y_range: YRange,
    pub style: ChartStyle,
}

impl ChartSpec {
    pub fn error(&self, index: usize) -> Option<f64> {
        self.errors.as_ref().and_then(|errors| errors.get(index).copied().flatten())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headroom_above_the_largest_value() {
        assert_eq!(YRange::headroom(&[Some(100.0), Some(80.0)]), YRange { min: 0.0, max: 120.0 });
        assert_eq!(YRange::headroom(&[None, Some(5.0), Some(f64::NAN)]), YRange { min: 0.0, max: 6.0 });
    }

    #[test]
    fn degenerate_values_use_the_unit_range() {
        assert_eq!(YRange::headroom(&[]), YRange { min: 0.0, max: 1.0 });
        assert_eq!(YRange::headroom(&[None, None]), YRange { min: 0.0, max: 1.0 });
        assert_eq!(YRange::headroom(&[Some(f64::INFINITY), Some(f64::NAN)]), YRange { min: 0.0, max: 1.0 });
    }

    #[test]
    fn non_positive_maxima_keep_the_headroom_factor() {
        let losses = YRange::headroom(&[Some(-10.0), Some(-20.0)]);
        assert_eq!(losses, YRange { min: 0.0, max: -12.0 });
        assert!(losses.is_inverted());
        assert_eq!(YRange::headroom(&[Some(-3.0), Some(0.0)]), YRange { min: 0.0, max: 0.0 });
    }

    #[test]
    fn legend_is_a_single_row() {
        let legend = Legend::below(vec!["North".to_owned(), "South".to_owned(), "East".to_owned()]);
        assert_eq!(legend.columns, 3);
        assert_eq!(legend.position, LegendPosition::BelowPlot);
        assert!(!legend.frame);
    }
}
