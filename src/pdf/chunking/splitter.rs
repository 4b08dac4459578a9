//! Materialization of chunk plans into standalone sub-documents

use super::config::{PdfEngine, SplitOptions, SplitStatistics};
use super::error::{IntoChunkingError, PdfChunkingError, Result};
use super::types::{Chunk, ChunkPlan, ChunkWindow, SplitOutcome, SplitPhase};
use crate::pdf::SourceDocument;
use crate::util::cancel::CancelToken;
use futures::StreamExt;
use regex::Regex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Derives deterministic, orderable chunk file names
#[derive(Debug, Clone)]
pub struct ChunkNamer {
    pdf_suffix: Regex,
    reserved_chars: Regex,
    whitespace: Regex,
}

impl ChunkNamer {
    pub const FALLBACK_BASE_NAME: &'static str = "document";

    pub fn new() -> Result<Self> {
        Ok(Self {
            pdf_suffix: Regex::new(r"(?i)\.pdf$")?,
            reserved_chars: Regex::new(r#"[\x00-\x1f\x7f-\x9f/\\?%*:|"<>]"#)?,
            whitespace: Regex::new(r"\s+")?,
        })
    }

    /// Source file name without `.pdf`, stripped of path-hostile characters
    pub fn base_name(&self, file_name: &str) -> String {
        let name = self.pdf_suffix.replace(file_name.trim(), "");
        let name = self.reserved_chars.replace_all(&name, "");
        let name = self.whitespace.replace_all(name.trim(), "-");
        if name.is_empty() {
            Self::FALLBACK_BASE_NAME.to_string()
        } else {
            name.into_owned()
        }
    }

    /// `{base}_chunk{N}of{Total}.pdf` with a 1-based `N`
    pub fn chunk_file_name(&self, base_name: &str, chunk_index: usize, total_chunks: usize) -> String {
        format!("{base_name}_chunk{}of{total_chunks}.pdf", chunk_index + 1)
    }
}

/// Copies planned page ranges out of an opened source document
pub struct DocumentSplitter<E: PdfEngine> {
    engine: Arc<E>,
    namer: ChunkNamer,
    max_chunk_size_bytes: u64,
    max_parallel_chunks: usize,
}

impl<E: PdfEngine> DocumentSplitter<E> {
    pub fn new(
        engine: Arc<E>,
        max_chunk_size_bytes: u64,
        max_parallel_chunks: usize,
    ) -> Result<Self> {
        Ok(Self {
            engine,
            namer: ChunkNamer::new()?,
            max_chunk_size_bytes,
            max_parallel_chunks: max_parallel_chunks.max(1),
        })
    }

    pub fn namer(&self) -> &ChunkNamer {
        &self.namer
    }

    /// Split sequentially: chunk `i + 1` starts after chunk `i` is serialized
    ///
    /// Any copy or serialization error aborts the whole split and no chunk is
    /// returned. Cancellation is checked before every chunk.
    pub fn split(
        &self,
        source: &SourceDocument,
        opened: &E::Document,
        plan: &ChunkPlan,
        options: &SplitOptions,
        cancel: &CancelToken,
    ) -> Result<SplitOutcome> {
        self.validate(opened, plan, options)?;

        let mut statistics = SplitStatistics::new();
        let total_start = statistics.start_total_timing();
        statistics.record_source(source.actual_size(), plan.total_pages);

        let base_name = self.namer.base_name(source.file_name());
        let windows = plan.windows(options.with_overlap);
        let mut chunks = Vec::with_capacity(windows.len() - options.start_from_chunk);

        for window in windows.iter().skip(options.start_from_chunk) {
            if cancel.is_cancelled() {
                return Err(self.cancelled(chunks.len()));
            }
            let phase = SplitPhase::Splitting {
                chunk_index: window.chunk_index,
            };
            debug!(
                %phase,
                "extracting pages {}..{} ({} new from {})",
                window.extract_start + 1,
                window.extract_end,
                window.end_page + 1 - window.start_page,
                window.start_page
            );

            let started = Instant::now();
            let bytes = if plan.is_single_chunk() {
                source.bytes().to_vec()
            } else {
                Self::materialize(&self.engine, opened, window)
                    .inspect_err(|e| self.log_failure(e))?
            };
            let chunk = self.finish_chunk(
                source,
                &base_name,
                plan,
                window,
                bytes,
                started.elapsed(),
                &mut statistics,
            );
            chunks.push(chunk);
        }

        statistics.finish_total_timing(total_start);
        info!(phase = %SplitPhase::Done, "{}", statistics.summary());
        Ok(SplitOutcome {
            plan: plan.clone(),
            chunks,
            statistics,
        })
    }

    /// Split with up to `max_parallel_chunks` chunks materialized at once
    ///
    /// Each chunk is built on the blocking pool from the shared, read-only
    /// source. Output order matches chunk order. The first failure aborts the
    /// split and chunks already built are dropped. A cancellation resolves
    /// every in-flight chunk immediately instead of waiting for its page copy.
    pub async fn split_parallel(
        &self,
        source: &SourceDocument,
        opened: Arc<E::Document>,
        plan: &ChunkPlan,
        options: &SplitOptions,
        cancel: &CancelToken,
    ) -> Result<SplitOutcome>
    where
        E: 'static,
        E::Document: 'static,
    {
        if plan.is_single_chunk() {
            return self.split(source, &opened, plan, options, cancel);
        }
        self.validate(&opened, plan, options)?;

        let mut statistics = SplitStatistics::new();
        let total_start = statistics.start_total_timing();
        statistics.record_source(source.actual_size(), plan.total_pages);

        let base_name = self.namer.base_name(source.file_name());
        let windows: Vec<ChunkWindow> = plan
            .windows(options.with_overlap)
            .into_iter()
            .skip(options.start_from_chunk)
            .collect();
        let mut chunks = Vec::with_capacity(windows.len());

        let mut results = futures::stream::iter(windows.into_iter().map(|window| {
            let engine = self.engine.clone();
            let opened = opened.clone();
            let mut cancel = cancel.clone();
            async move {
                if cancel.is_cancelled() {
                    return Err(PdfChunkingError::Cancelled {
                        completed_chunks: 0,
                    });
                }
                let started = Instant::now();
                let task = tokio::task::spawn_blocking(move || {
                    Self::materialize(&engine, &opened, &window).map(|bytes| (window, bytes))
                });
                // the blocking task runs to completion; its output is discarded
                let (window, bytes) = tokio::select! {
                    joined = task => joined??,
                    _ = cancel.cancelled() => {
                        return Err(PdfChunkingError::Cancelled {
                            completed_chunks: 0,
                        });
                    }
                };
                Ok((window, bytes, started.elapsed()))
            }
        }))
        .buffered(self.max_parallel_chunks);

        while let Some(result) = results.next().await {
            match result {
                Ok((window, bytes, elapsed)) => {
                    let chunk = self.finish_chunk(
                        source,
                        &base_name,
                        plan,
                        &window,
                        bytes,
                        elapsed,
                        &mut statistics,
                    );
                    chunks.push(chunk);
                }
                Err(PdfChunkingError::Cancelled { .. }) => {
                    return Err(self.cancelled(chunks.len()));
                }
                Err(e) => {
                    self.log_failure(&e);
                    return Err(e);
                }
            }
        }

        statistics.finish_total_timing(total_start);
        info!(phase = %SplitPhase::Done, "{}", statistics.summary());
        Ok(SplitOutcome {
            plan: plan.clone(),
            chunks,
            statistics,
        })
    }

    fn validate(&self, opened: &E::Document, plan: &ChunkPlan, options: &SplitOptions) -> Result<()> {
        let page_count = self.engine.page_count(opened);
        if page_count != plan.total_pages {
            return Err(PdfChunkingError::validation(format!(
                "plan covers {} pages but document has {}",
                plan.total_pages, page_count
            )));
        }
        if options.start_from_chunk >= plan.total_chunks {
            return Err(PdfChunkingError::validation(format!(
                "cannot resume from chunk {} of {}",
                options.start_from_chunk, plan.total_chunks
            )));
        }
        Ok(())
    }

    fn materialize(engine: &E, opened: &E::Document, window: &ChunkWindow) -> Result<Vec<u8>> {
        let sub_document = engine
            .copy_pages(opened, window.page_range())
            .into_copy_error(window.chunk_index)?;
        engine
            .serialize(sub_document)
            .into_serialization_error(window.chunk_index)
    }

    #[allow(clippy::too_many_arguments)]
    fn finish_chunk(
        &self,
        source: &SourceDocument,
        base_name: &str,
        plan: &ChunkPlan,
        window: &ChunkWindow,
        bytes: Vec<u8>,
        elapsed: Duration,
        statistics: &mut SplitStatistics,
    ) -> Chunk {
        // a single chunk is the source itself and keeps its name
        let file_name = if plan.is_single_chunk() {
            source.file_name().to_string()
        } else {
            self.namer
                .chunk_file_name(base_name, window.chunk_index, plan.total_chunks)
        };

        let size = bytes.len() as u64;
        if size > self.max_chunk_size_bytes {
            warn!(
                chunk_index = window.chunk_index,
                "chunk {} is {} bytes over the {} byte ceiling ({} pages)",
                file_name,
                size - self.max_chunk_size_bytes,
                self.max_chunk_size_bytes,
                window.extracted_page_count()
            );
        }

        statistics.record_extraction_time(elapsed);
        statistics.record_chunk(
            window.extracted_page_count(),
            window.overlap.map_or(0, |o| o.page_count()),
            size,
            self.max_chunk_size_bytes,
        );
        Chunk::from_window(window, bytes, plan.total_pages, plan.total_chunks, file_name)
    }

    fn cancelled(&self, completed_chunks: usize) -> PdfChunkingError {
        warn!(
            phase = %SplitPhase::Cancelled,
            "split cancelled after {} chunks, discarding output", completed_chunks
        );
        PdfChunkingError::Cancelled { completed_chunks }
    }

    fn log_failure(&self, error: &PdfChunkingError) {
        warn!(
            phase = %SplitPhase::Failed,
            category = error.category(),
            chunk_index = ?error.chunk_index(),
            "split aborted: {}", error
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::LopdfEngine;
    use crate::pdf::chunking::config::ChunkingConfig;
    use crate::pdf::chunking::planner::ChunkPlanner;
    use crate::pdf::testing::{build_pdf, page_labels};
    use crate::util::cancel::create_cancel_pair;
    use itertools::Itertools;
    use std::ops::Range;
    use std::sync::{Condvar, Mutex};

    /// Blocks page copies until released
    #[derive(Default)]
    struct Gate {
        open: Mutex<bool>,
        opened: Condvar,
    }

    impl Gate {
        fn wait(&self) {
            let mut open = self.open.lock().unwrap();
            while !*open {
                open = self.opened.wait(open).unwrap();
            }
        }

        fn release(&self) {
            *self.open.lock().unwrap() = true;
            self.opened.notify_all();
        }
    }

    /// In-memory engine: a document is a page count, a serialized chunk holds
    /// one byte per page equal to the page number modulo 256
    #[derive(Default)]
    struct FakeEngine {
        pages: usize,
        fail_copy_at: Option<usize>,
        fail_serialize_at: Option<usize>,
        bytes_per_page: usize,
        copied: Mutex<Vec<Range<usize>>>,
        gate: Option<Arc<Gate>>,
    }

    impl FakeEngine {
        fn new(pages: usize) -> Self {
            Self {
                pages,
                bytes_per_page: 1,
                ..Default::default()
            }
        }

        fn failing_copy(pages: usize, extract_start: usize) -> Self {
            Self {
                fail_copy_at: Some(extract_start),
                ..Self::new(pages)
            }
        }
    }

    impl PdfEngine for FakeEngine {
        type Document = usize;
        type SubDocument = Range<usize>;
        type Error = std::io::Error;

        fn open(&self, _bytes: &[u8]) -> std::result::Result<usize, std::io::Error> {
            Ok(self.pages)
        }

        fn page_count(&self, document: &usize) -> usize {
            *document
        }

        fn copy_pages(
            &self,
            _document: &usize,
            pages: Range<usize>,
        ) -> std::result::Result<Range<usize>, std::io::Error> {
            if let Some(gate) = &self.gate {
                gate.wait();
            }
            if self.fail_copy_at == Some(pages.start) {
                return Err(std::io::Error::new(std::io::ErrorKind::InvalidData, "broken xref"));
            }
            self.copied.lock().unwrap().push(pages.clone());
            Ok(pages)
        }

        fn serialize(
            &self,
            sub_document: Range<usize>,
        ) -> std::result::Result<Vec<u8>, std::io::Error> {
            if self.fail_serialize_at == Some(sub_document.start) {
                return Err(std::io::Error::new(std::io::ErrorKind::OutOfMemory, "oom"));
            }
            Ok(sub_document
                .flat_map(|p| std::iter::repeat_n((p + 1) as u8, self.bytes_per_page))
                .collect())
        }
    }

    fn plan(total_pages: usize, size: u64) -> ChunkPlan {
        ChunkPlanner::new(ChunkingConfig::default())
            .unwrap()
            .plan(total_pages, size)
            .unwrap()
    }

    fn splitter(engine: FakeEngine) -> DocumentSplitter<FakeEngine> {
        DocumentSplitter::new(Arc::new(engine), 15 * 1024 * 1024, 4).unwrap()
    }

    fn source(name: &str) -> SourceDocument {
        SourceDocument::new(name, b"%PDF-source".to_vec())
    }

    fn assert_partition(chunks: &[Chunk], total_pages: usize) {
        assert_eq!(chunks.first().unwrap().start_page, 1);
        assert_eq!(chunks.last().unwrap().end_page, total_pages);
        let sum: usize = chunks.iter().map(Chunk::page_count).sum();
        assert_eq!(sum, total_pages);
        for (a, b) in chunks.iter().tuple_windows() {
            assert_eq!(b.start_page, a.end_page + 1);
            assert_eq!(b.chunk_index, a.chunk_index + 1);
        }
        assert!(chunks.last().unwrap().is_last());
    }

    #[test]
    fn test_base_name_sanitizing() {
        let namer = ChunkNamer::new().unwrap();
        assert_eq!(namer.base_name("Processo 123.pdf"), "Processo-123");
        assert_eq!(namer.base_name("  brief.PDF "), "brief");
        assert_eq!(namer.base_name("a/b\\c:d*e?f\"g<h>i|j%.pdf"), "abcdefghij");
        assert_eq!(namer.base_name("tab\there\n.pdf"), "tabhere");
        assert_eq!(namer.base_name("multi   space  name.pdf"), "multi-space-name");
        assert_eq!(namer.base_name(".pdf"), "document");
        assert_eq!(namer.base_name("report.pdf.bak"), "report.pdf.bak");
        assert_eq!(namer.chunk_file_name("brief", 0, 14), "brief_chunk1of14.pdf");
        assert_eq!(namer.chunk_file_name("brief", 13, 14), "brief_chunk14of14.pdf");
    }

    #[test]
    fn test_single_chunk_passthrough() {
        let splitter = splitter(FakeEngine::new(500));
        let plan = plan(500, 5 * 1024 * 1024);
        let source = source("small.pdf");
        let outcome = splitter
            .split(&source, &500, &plan, &SplitOptions::new(true), &CancelToken::never())
            .unwrap();

        assert_eq!(outcome.chunks.len(), 1);
        let chunk = &outcome.chunks[0];
        assert_eq!((chunk.start_page, chunk.end_page), (1, 500));
        assert_eq!(chunk.overlap_start_page, None);
        assert_eq!(chunk.overlap_end_page, None);
        assert_eq!(chunk.file_name, "small.pdf");
        assert_eq!(chunk.bytes, source.bytes());
        assert!(splitter.engine.copied.lock().unwrap().is_empty());
    }

    #[test]
    fn test_split_without_overlap() {
        let splitter = splitter(FakeEngine::new(2500));
        let plan = plan(2500, 10 * 1024 * 1024);
        let outcome = splitter
            .split(&source("case file.pdf"), &2500, &plan, &SplitOptions::new(false), &CancelToken::never())
            .unwrap();

        assert_eq!(outcome.chunks.len(), 14);
        assert_partition(&outcome.chunks, 2500);
        assert!(outcome.chunks.iter().all(|c| !c.has_overlap()));
        assert_eq!(outcome.chunks[0].file_name, "case-file_chunk1of14.pdf");
        assert_eq!(outcome.chunks[13].file_name, "case-file_chunk14of14.pdf");
        assert_eq!((outcome.chunks[13].start_page, outcome.chunks[13].end_page), (2341, 2500));
        assert_eq!(outcome.chunks[0].bytes.len(), 180);
        assert_eq!(outcome.statistics.chunks_created, 14);
        assert_eq!(outcome.statistics.pages_extracted, 2500);
        assert_eq!(outcome.statistics.overlap_pages_duplicated, 0);
    }

    #[test]
    fn test_split_with_overlap() {
        let splitter = splitter(FakeEngine::new(1200));
        let plan = plan(1200, 1024 * 1024);
        let outcome = splitter
            .split(&source("a.pdf"), &1200, &plan, &SplitOptions::new(true), &CancelToken::never())
            .unwrap();

        let chunks = &outcome.chunks;
        assert_partition(chunks, 1200);
        assert!(!chunks[0].has_overlap());
        for chunk in &chunks[1..] {
            let end = chunk.overlap_end_page.unwrap();
            assert_eq!(end, chunk.start_page - 1);
            assert_eq!(chunk.overlap_start_page.unwrap(), (end + 1).saturating_sub(75).max(1));
        }

        // overlap pages are physically prepended, in order
        assert_eq!(chunks[1].bytes.len(), 475);
        assert_eq!(chunks[1].bytes[0], (326 % 256) as u8);
        assert_eq!(chunks[1].extracted_page_count(), 475);
        assert_eq!(
            *splitter.engine.copied.lock().unwrap(),
            vec![0..400, 325..800, 725..1200]
        );
        assert_eq!(outcome.statistics.overlap_pages_duplicated, 150);
    }

    #[test]
    fn test_failure_mid_split_returns_nothing() {
        // 5 chunks of 400 pages; chunk index 2 starts at page 800
        let splitter = splitter(FakeEngine::failing_copy(2000, 800));
        let plan = plan(2000, 1024 * 1024);
        assert_eq!(plan.total_chunks, 5);

        let err = splitter
            .split(&source("a.pdf"), &2000, &plan, &SplitOptions::new(false), &CancelToken::never())
            .unwrap_err();
        assert!(matches!(err, PdfChunkingError::PageCopy { chunk_index: 2, .. }));
        // chunks 3 and 4 were never attempted
        assert_eq!(splitter.engine.copied.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_serialization_failure() {
        let engine = FakeEngine {
            fail_serialize_at: Some(400),
            ..FakeEngine::new(1200)
        };
        let splitter = splitter(engine);
        let plan = plan(1200, 1024 * 1024);
        let err = splitter
            .split(&source("a.pdf"), &1200, &plan, &SplitOptions::new(false), &CancelToken::never())
            .unwrap_err();
        assert!(matches!(err, PdfChunkingError::Serialization { chunk_index: 1, .. }));
    }

    #[test]
    fn test_cancel_before_start() {
        let splitter = splitter(FakeEngine::new(2500));
        let plan = plan(2500, 1024 * 1024);
        let (handle, token) = create_cancel_pair();
        handle.cancel();
        let err = splitter
            .split(&source("a.pdf"), &2500, &plan, &SplitOptions::new(false), &token)
            .unwrap_err();
        assert!(matches!(err, PdfChunkingError::Cancelled { completed_chunks: 0 }));
        assert!(splitter.engine.copied.lock().unwrap().is_empty());
    }

    #[test]
    fn test_resume_from_chunk() {
        let splitter = splitter(FakeEngine::new(1200));
        let plan = plan(1200, 1024 * 1024);
        let outcome = splitter
            .split(
                &source("a.pdf"),
                &1200,
                &plan,
                &SplitOptions::new(true).resume_from(1),
                &CancelToken::never(),
            )
            .unwrap();
        assert_eq!(outcome.chunks.len(), 2);
        assert_eq!(outcome.chunks[0].chunk_index, 1);
        assert_eq!(outcome.chunks[0].start_page, 401);
        assert_eq!(outcome.chunks[0].overlap_start_page, Some(326));
        assert_eq!(outcome.chunks[0].file_name, "a_chunk2of3.pdf");

        let err = splitter
            .split(
                &source("a.pdf"),
                &1200,
                &plan,
                &SplitOptions::new(true).resume_from(3),
                &CancelToken::never(),
            )
            .unwrap_err();
        assert_eq!(err.category(), "validation");
    }

    #[test]
    fn test_plan_for_other_document_rejected() {
        let splitter = splitter(FakeEngine::new(1200));
        let plan = plan(1500, 1024 * 1024);
        let err = splitter
            .split(&source("a.pdf"), &1200, &plan, &SplitOptions::default(), &CancelToken::never())
            .unwrap_err();
        assert_eq!(err.category(), "validation");
    }

    #[test]
    fn test_oversized_chunks_are_counted() {
        let engine = FakeEngine {
            bytes_per_page: 1024,
            ..FakeEngine::new(1200)
        };
        let splitter = DocumentSplitter::new(Arc::new(engine), 300 * 1024, 2).unwrap();
        let plan = plan(1200, 1024 * 1024);
        let outcome = splitter
            .split(&source("a.pdf"), &1200, &plan, &SplitOptions::new(false), &CancelToken::never())
            .unwrap();
        assert_eq!(outcome.chunks.len(), 3);
        assert_eq!(outcome.statistics.oversized_chunks, 3);
        assert_eq!(outcome.statistics.max_chunk_bytes, 400 * 1024);
    }

    #[tokio::test]
    async fn test_parallel_matches_sequential() {
        let plan = plan(2500, 10 * 1024 * 1024);
        let source = source("big.pdf");
        let options = SplitOptions::new(true);

        let sequential = splitter(FakeEngine::new(2500))
            .split(&source, &2500, &plan, &options, &CancelToken::never())
            .unwrap();
        let parallel = splitter(FakeEngine::new(2500))
            .split_parallel(&source, Arc::new(2500), &plan, &options, &CancelToken::never())
            .await
            .unwrap();

        assert_eq!(parallel.chunks, sequential.chunks);
        assert_eq!(parallel.statistics.chunks_created, 14);
        assert_partition(&parallel.chunks, 2500);
    }

    #[tokio::test]
    async fn test_parallel_failure_returns_nothing() {
        let splitter = splitter(FakeEngine::failing_copy(2000, 800));
        let plan = plan(2000, 1024 * 1024);
        let err = splitter
            .split_parallel(&source("a.pdf"), Arc::new(2000), &plan, &SplitOptions::default(), &CancelToken::never())
            .await
            .unwrap_err();
        assert_eq!(err.chunk_index(), Some(2));
    }

    #[tokio::test]
    async fn test_parallel_cancelled() {
        let splitter = splitter(FakeEngine::new(2500));
        let plan = plan(2500, 1024 * 1024);
        let (handle, token) = create_cancel_pair();
        handle.cancel();
        let err = splitter
            .split_parallel(&source("a.pdf"), Arc::new(2500), &plan, &SplitOptions::default(), &token)
            .await
            .unwrap_err();
        assert!(matches!(err, PdfChunkingError::Cancelled { completed_chunks: 0 }));
    }

    #[tokio::test]
    async fn test_parallel_cancel_interrupts_running_chunks() {
        let gate = Arc::new(Gate::default());
        let splitter = splitter(FakeEngine {
            gate: Some(gate.clone()),
            ..FakeEngine::new(2500)
        });
        let plan = plan(2500, 1024 * 1024);
        let (handle, token) = create_cancel_pair();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            handle.cancel();
        });

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            splitter.split_parallel(&source("a.pdf"), Arc::new(2500), &plan, &SplitOptions::default(), &token),
        )
        .await;
        gate.release();

        let err = result.expect("cancellation must not wait for page copies").unwrap_err();
        assert!(matches!(err, PdfChunkingError::Cancelled { completed_chunks: 0 }));
    }

    #[test]
    fn test_lopdf_split_with_overlap() {
        let engine = Arc::new(LopdfEngine);
        let config = ChunkingConfig {
            page_split_threshold: 10,
            overlap_pages: 2,
            tiers: vec![crate::pdf::chunking::config::ChunkSizeTier::unbounded(4)],
            ..Default::default()
        };
        let plan = ChunkPlanner::new(config).unwrap().plan(10, 5000).unwrap();
        assert_eq!(plan.total_chunks, 3);

        let source = SourceDocument::new("real.pdf", build_pdf(10));
        let opened = engine.open(source.bytes()).unwrap();
        let splitter = DocumentSplitter::new(engine, 15 * 1024 * 1024, 2).unwrap();
        let outcome = splitter
            .split(&source, &opened, &plan, &SplitOptions::new(true), &CancelToken::never())
            .unwrap();

        let labels: Vec<Vec<String>> = outcome.chunks.iter().map(|c| page_labels(&c.bytes)).collect();
        assert_eq!(labels[0], vec!["Page 1", "Page 2", "Page 3", "Page 4"]);
        assert_eq!(labels[1], vec!["Page 3", "Page 4", "Page 5", "Page 6", "Page 7", "Page 8"]);
        assert_eq!(labels[2], vec!["Page 7", "Page 8", "Page 9", "Page 10"]);
        assert_eq!(outcome.chunks[2].overlap_start_page, Some(7));
        assert_eq!(outcome.chunks[2].overlap_end_page, Some(8));
        assert_eq!(outcome.chunks[2].file_name, "real_chunk3of3.pdf");
    }
}
