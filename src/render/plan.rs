use crate::document::Document;
use crate::render::Paginator;
use crate::render::RenderError;

/// Writes the chart plan as pretty-printed JSON, pages tagged by `kind`.
#[derive(Clone, Debug, Default)]
pub struct PlanWriter;

impl Paginator for PlanWriter {
    fn paginate(&self, document: &Document) -> Result<Vec<u8>, RenderError> {
        let mut bytes = serde_json::to_vec_pretty(document)?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    fn media_type(&self) -> &'static str {
        "application/json"
    }
}
