use crate::chart::ChartSpec;
use serde::Deserialize;
use serde::Serialize;

/// Stands in for the charts of a sheet that could not be charted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPlaceholder {
    /// Name of the failed sheet
    pub subject: String,
    pub message: String,
}

/// One page of the output document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PageSpec {
    Chart(ChartSpec),
    Error(ErrorPlaceholder),
}

impl PageSpec {
    pub fn is_error(&self) -> bool {
        matches!(self, PageSpec::Error(_))
    }
}
