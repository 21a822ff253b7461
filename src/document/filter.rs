use crate::error::RustyChartsError;
use glob::Pattern;

/// Selects sheets by name using glob patterns.
#[derive(Clone, Debug, Default)]
pub struct SheetFilter {
    /// Sheet name patterns; `None` accepts every sheet
    patterns: Option<Vec<Pattern>>,
}

impl SheetFilter {
    /// Compiles the patterns; an empty list accepts every sheet.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<SheetFilter, RustyChartsError> {
        if patterns.is_empty() {
            return Ok(SheetFilter::default());
        }
        let mut compiled = Vec::<Pattern>::with_capacity(patterns.len());
        for pattern in patterns {
            compiled.push(Pattern::new(pattern.as_ref())?);
        }
        Ok(SheetFilter {
            patterns: Some(compiled),
        })
    }

    /// Checks if a sheet name matches any pattern.
    /// Returns true if no patterns are specified.
    pub fn accept(&self, sheet_name: &str) -> bool {
        match &self.patterns {
            Some(patterns) => patterns.iter().any(|pattern| pattern.matches(sheet_name)),
            None => true,
        }
    }
}
