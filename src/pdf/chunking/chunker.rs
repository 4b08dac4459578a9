//! Entry points used by the upload flow: page counting for early estimates and
//! the full count, plan and split pipeline

use super::{
    config::{ChunkingConfig, PdfEngine, SplitOptions},
    error::{IntoChunkingError, PdfChunkingError, Result},
    page_counter::PageCounter,
    planner::ChunkPlanner,
    splitter::DocumentSplitter,
    types::{Chunk, ChunkPlan, PageCount, SplitOutcome, SplitPhase},
};
use crate::pdf::{LopdfEngine, SourceDocument};
use crate::util::cancel::CancelToken;
use std::sync::Arc;
use tracing::{Instrument, debug, info, info_span, warn};

/// Page counter, planner and splitter sharing one configuration and engine
pub struct PdfChunker<E: PdfEngine = LopdfEngine> {
    config: ChunkingConfig,
    engine: Arc<E>,
    page_counter: PageCounter<E>,
    planner: ChunkPlanner,
    splitter: DocumentSplitter<E>,
}

impl PdfChunker<LopdfEngine> {
    pub fn with_lopdf(config: ChunkingConfig) -> Result<Self> {
        Self::new(config, LopdfEngine)
    }

    /// Chunker on the lopdf engine configured from `PDF_CHUNK_*` variables
    pub fn from_env() -> Result<Self> {
        Self::new(ChunkingConfig::from_env()?, LopdfEngine)
    }
}

impl<E: PdfEngine> PdfChunker<E> {
    pub fn new(config: ChunkingConfig, engine: E) -> Result<Self> {
        let planner = ChunkPlanner::new(config.clone())?;
        let engine = Arc::new(engine);
        let page_counter = PageCounter::new(engine.clone(), config.avg_bytes_per_page);
        let splitter = DocumentSplitter::new(
            engine.clone(),
            config.max_chunk_size_bytes,
            config.max_parallel_chunks,
        )?;
        Ok(Self {
            config,
            engine,
            page_counter,
            planner,
            splitter,
        })
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Page count for early estimates; falls back to a size estimate and never fails
    pub fn page_count(&self, document: &SourceDocument) -> PageCount {
        self.page_counter.count(document)
    }

    pub fn plan(&self, total_pages: usize, file_size_bytes: u64) -> Result<ChunkPlan> {
        self.planner.plan(total_pages, file_size_bytes)
    }

    /// Plan from a possibly estimated page count and the declared size, before any split
    pub fn estimate_plan(&self, document: &SourceDocument) -> Result<(PageCount, ChunkPlan)> {
        let page_count = self.page_count(document);
        let plan = self
            .planner
            .plan(page_count.page_count, document.declared_size())?;
        Ok((page_count, plan))
    }

    /// Count, plan and split sequentially without cancellation
    pub fn split_document(&self, document: &SourceDocument, with_overlap: bool) -> Result<Vec<Chunk>> {
        self.split_document_with(
            document,
            &SplitOptions::new(with_overlap),
            &CancelToken::never(),
        )
        .map(|outcome| outcome.chunks)
    }

    pub fn split_document_with(
        &self,
        document: &SourceDocument,
        options: &SplitOptions,
        cancel: &CancelToken,
    ) -> Result<SplitOutcome> {
        let span = info_span!("split_document", file_name = document.file_name());
        let _enter = span.enter();

        let (opened, plan) = self.prepare(document)?;
        self.splitter.split(document, &opened, &plan, options, cancel)
    }

    /// Open the source, count its pages structurally and plan the split
    fn prepare(&self, document: &SourceDocument) -> Result<(E::Document, ChunkPlan)> {
        info!(
            phase = %SplitPhase::Idle,
            "split requested: {} bytes", document.actual_size()
        );
        self.check_load_limit(document)
            .and_then(|_| {
                debug!(phase = %SplitPhase::Counting, "opening source document");
                let opened = self.engine.open(document.bytes()).into_open_error()?;
                let total_pages = self.page_counter.count_opened(&opened)?;

                debug!(phase = %SplitPhase::Planning, "planning {} pages", total_pages);
                let plan = self.planner.plan(total_pages, document.actual_size())?;
                info!(
                    "{} pages into {} chunks of up to {} pages ({}, {})",
                    plan.total_pages,
                    plan.total_chunks,
                    plan.chunk_size_pages,
                    plan.size_tier,
                    plan.estimate_label()
                );
                Ok((opened, plan))
            })
            .inspect_err(|e| {
                warn!(phase = %SplitPhase::Failed, category = e.category(), "{}", e);
            })
    }

    fn check_load_limit(&self, document: &SourceDocument) -> Result<()> {
        match self.config.max_full_load_bytes {
            Some(max) if document.actual_size() > max => Err(PdfChunkingError::FileTooLarge {
                size: document.actual_size(),
                max,
            }),
            _ => Ok(()),
        }
    }
}

impl<E> PdfChunker<E>
where
    E: PdfEngine + 'static,
    E::Document: 'static,
{
    /// Count and plan, then materialize up to `max_parallel_chunks` chunks at once
    pub async fn split_document_parallel(
        &self,
        document: &SourceDocument,
        options: &SplitOptions,
        cancel: &CancelToken,
    ) -> Result<SplitOutcome> {
        let span = info_span!("split_document_parallel", file_name = document.file_name());
        async move {
            let (opened, plan) = self.prepare(document)?;
            self.splitter
                .split_parallel(document, Arc::new(opened), &plan, options, cancel)
                .await
        }
        .instrument(span)
        .await
    }
}
