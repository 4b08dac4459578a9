//! Page counting with a size-based fallback estimate

use super::config::PdfEngine;
use super::error::{IntoChunkingError, PdfChunkingError, Result};
use super::types::PageCount;
use crate::pdf::SourceDocument;
use std::sync::Arc;
use tracing::{debug, warn};

/// Counts pages of source documents through a `PdfEngine`
pub struct PageCounter<E: PdfEngine> {
    engine: Arc<E>,
    avg_bytes_per_page: u64,
}

impl<E: PdfEngine> PageCounter<E> {
    pub fn new(engine: Arc<E>, avg_bytes_per_page: u64) -> Self {
        Self {
            engine,
            avg_bytes_per_page: avg_bytes_per_page.max(1),
        }
    }

    /// Pages implied by a byte size: `ceil(size / avg_bytes_per_page)`
    pub fn estimate_from_size(&self, size_bytes: u64) -> usize {
        size_bytes.div_ceil(self.avg_bytes_per_page) as usize
    }

    /// Count pages, falling back to a size estimate when the structure cannot be read
    ///
    /// Never fails; an estimate is flagged with `is_estimate`.
    pub fn count(&self, document: &SourceDocument) -> PageCount {
        match self.count_exact(document) {
            Ok(page_count) => PageCount::exact(page_count),
            Err(e) => {
                let page_count = self.estimate_from_size(document.declared_size());
                warn!(
                    file_name = document.file_name(),
                    error = %e,
                    "structural page count failed, estimated {} pages from {} bytes",
                    page_count,
                    document.declared_size()
                );
                PageCount::estimated(page_count)
            }
        }
    }

    /// Count pages from the document structure only
    pub fn count_exact(&self, document: &SourceDocument) -> Result<usize> {
        let opened = self.engine.open(document.bytes()).into_open_error()?;
        self.count_opened(&opened)
    }

    /// Count pages of an already opened document
    pub fn count_opened(&self, opened: &E::Document) -> Result<usize> {
        let page_count = self.engine.page_count(opened);
        if page_count == 0 {
            return Err(PdfChunkingError::document_open("page tree has no pages"));
        }
        debug!("counted {} pages", page_count);
        Ok(page_count)
    }
}
