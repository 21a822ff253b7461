//! # Document Assembly
//!
//! Walks a [`crate::table::Workbook`] sheet by sheet and collects the pages of
//! the output document. A sheet that cannot be charted contributes a single
//! error page; other sheets are unaffected.

mod assemble;
mod filter;
mod page;
mod sheet;

pub use assemble::assemble;
pub use assemble::assemble_filtered;
pub use assemble::Document;
pub use filter::SheetFilter;
pub use page::ErrorPlaceholder;
pub use page::PageSpec;
pub use sheet::render;
pub use sheet::try_render;
pub use sheet::SheetError;
