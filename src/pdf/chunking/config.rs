//! Configuration and engine traits for PDF chunk planning

use super::error::{PdfChunkingError, Result};
use serde::Deserialize;
use std::ops::Range;
use std::time::{Duration, Instant};

pub const MIB: u64 = 1024 * 1024;

/// Structural PDF backend used for counting and page extraction
///
/// This trait abstracts the PDF library so planning and splitting can run
/// against lopdf in production and against in-memory fakes in tests.
pub trait PdfEngine: Send + Sync {
    /// Parsed, read-only source document
    type Document: Send + Sync;
    /// Sub-document built from a page range, not yet serialized
    type SubDocument: Send;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Parse a complete PDF from memory
    fn open(&self, bytes: &[u8]) -> std::result::Result<Self::Document, Self::Error>;

    /// Number of pages in an opened document
    fn page_count(&self, document: &Self::Document) -> usize;

    /// Copy pages `[pages.start, pages.end)` (0-based) into a new sub-document, in order
    fn copy_pages(
        &self,
        document: &Self::Document,
        pages: Range<usize>,
    ) -> std::result::Result<Self::SubDocument, Self::Error>;

    /// Serialize a sub-document into standalone PDF bytes
    fn serialize(&self, sub_document: Self::SubDocument)
    -> std::result::Result<Vec<u8>, Self::Error>;
}

/// One row of the chunk size table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSizeTier {
    /// Documents with fewer pages than this fall in the tier; `None` is unbounded
    pub max_pages_exclusive: Option<usize>,
    /// Pages per chunk before byte-budget correction
    pub chunk_size_pages: usize,
}

impl ChunkSizeTier {
    pub const fn bounded(max_pages_exclusive: usize, chunk_size_pages: usize) -> Self {
        Self {
            max_pages_exclusive: Some(max_pages_exclusive),
            chunk_size_pages,
        }
    }

    pub const fn unbounded(chunk_size_pages: usize) -> Self {
        Self {
            max_pages_exclusive: None,
            chunk_size_pages,
        }
    }

    pub fn contains(&self, total_pages: usize) -> bool {
        self.max_pages_exclusive
            .is_none_or(|max| total_pages < max)
    }

    /// Default table, smallest documents first
    pub fn default_table() -> Vec<ChunkSizeTier> {
        vec![
            // also covers size-only splits under the page threshold
            ChunkSizeTier::bounded(2001, 400),
            ChunkSizeTier::bounded(10001, 180),
            ChunkSizeTier::bounded(20001, 180),
            ChunkSizeTier::unbounded(100),
        ]
    }
}

/// Configuration for chunk planning and splitting
///
/// Loadable from the environment with the `PDF_CHUNK_` prefix
/// (e.g. `PDF_CHUNK_OVERLAP_PAGES=50`). The tier table is code-only.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Page count at or above which splitting is mandatory
    pub page_split_threshold: usize,
    /// Byte size above which splitting is mandatory
    pub size_split_threshold_bytes: u64,
    /// Per-chunk serialized byte ceiling
    pub max_chunk_size_bytes: u64,
    /// Calibrated bytes per page for the page count estimator
    pub avg_bytes_per_page: u64,
    /// Trailing pages carried into the next chunk in overlap mode
    pub overlap_pages: usize,
    /// Lower bound for byte-corrected chunk sizes
    pub min_chunk_pages: usize,
    pub minutes_per_chunk: u64,
    pub base_processing_minutes: u64,
    /// Upper bound of chunks materialized concurrently in parallel mode
    pub max_parallel_chunks: usize,
    /// Refuse to load sources larger than this
    pub max_full_load_bytes: Option<u64>,
    #[serde(skip_deserializing, default = "ChunkSizeTier::default_table")]
    pub tiers: Vec<ChunkSizeTier>,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            page_split_threshold: 1000,
            size_split_threshold_bytes: 18 * MIB,
            max_chunk_size_bytes: 15 * MIB,
            avg_bytes_per_page: 80 * 1024,
            overlap_pages: 75,
            min_chunk_pages: 10,
            minutes_per_chunk: 1,
            base_processing_minutes: 5,
            max_parallel_chunks: 4,
            max_full_load_bytes: None,
            tiers: ChunkSizeTier::default_table(),
        }
    }
}

impl ChunkingConfig {
    /// Create configuration for server-side splitting with a bounded full load
    pub fn for_server() -> Self {
        Self {
            max_full_load_bytes: Some(80 * MIB),
            ..Default::default()
        }
    }

    /// Create configuration that never carries overlap pages
    pub fn without_overlap() -> Self {
        Self {
            overlap_pages: 0,
            ..Default::default()
        }
    }

    /// Load configuration from `PDF_CHUNK_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_vars(std::env::vars())
    }

    /// Load configuration from an explicit set of `PDF_CHUNK_*` variables
    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: Self = envy::prefixed("PDF_CHUNK_")
            .from_iter(vars)
            .map_err(|e| PdfChunkingError::configuration(format!("cannot read config: {e}")))?;
        config.validate().map_err(PdfChunkingError::configuration)?;
        Ok(config)
    }

    /// Validate configuration settings
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.page_split_threshold == 0 {
            return Err("page_split_threshold must be greater than 0".to_string());
        }
        if self.size_split_threshold_bytes == 0 {
            return Err("size_split_threshold_bytes must be greater than 0".to_string());
        }
        if self.max_chunk_size_bytes == 0 {
            return Err("max_chunk_size_bytes must be greater than 0".to_string());
        }
        if self.avg_bytes_per_page == 0 {
            return Err("avg_bytes_per_page must be greater than 0".to_string());
        }
        if self.min_chunk_pages == 0 {
            return Err("min_chunk_pages must be greater than 0".to_string());
        }
        if self.max_parallel_chunks == 0 {
            return Err("max_parallel_chunks must be greater than 0".to_string());
        }

        let Some(last) = self.tiers.last() else {
            return Err("tier table must not be empty".to_string());
        };
        if last.max_pages_exclusive.is_some() {
            return Err("last tier must be unbounded".to_string());
        }
        if self.tiers.iter().any(|t| t.chunk_size_pages == 0) {
            return Err("tier chunk sizes must be greater than 0".to_string());
        }
        let bounds: Vec<usize> = self
            .tiers
            .iter()
            .filter_map(|t| t.max_pages_exclusive)
            .collect();
        if bounds.len() != self.tiers.len() - 1 {
            return Err("only the last tier may be unbounded".to_string());
        }
        if bounds.windows(2).any(|w| w[0] >= w[1]) {
            return Err("tier bounds must be strictly increasing".to_string());
        }

        Ok(())
    }
}

/// Options for one split operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SplitOptions {
    /// Prepend trailing pages of the previous chunk to every chunk but the first
    pub with_overlap: bool,
    /// Resume: skip materializing chunks below this index
    pub start_from_chunk: usize,
}

impl SplitOptions {
    pub fn new(with_overlap: bool) -> Self {
        Self {
            with_overlap,
            start_from_chunk: 0,
        }
    }

    pub fn resume_from(mut self, chunk_index: usize) -> Self {
        self.start_from_chunk = chunk_index;
        self
    }
}

/// Performance and size information for one split operation
#[derive(Debug, Clone, Default)]
pub struct SplitStatistics {
    /// Total processing time
    pub total_processing_time: Duration,
    /// Time spent copying pages and serializing sub-documents
    pub extraction_time: Duration,

    pub source_bytes: u64,
    pub source_pages: usize,

    pub chunks_created: usize,
    /// Pages physically extracted, overlap included
    pub pages_extracted: usize,
    /// Pages duplicated from previous chunks for context
    pub overlap_pages_duplicated: usize,

    pub total_output_bytes: u64,
    pub max_chunk_bytes: u64,
    pub min_chunk_bytes: u64,
    /// Chunks whose serialized size exceeds the configured ceiling
    pub oversized_chunks: usize,
}

impl SplitStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_total_timing(&mut self) -> Instant {
        Instant::now()
    }

    pub fn finish_total_timing(&mut self, start: Instant) {
        self.total_processing_time = start.elapsed();
    }

    pub fn record_extraction_time(&mut self, duration: Duration) {
        self.extraction_time += duration;
    }

    pub fn record_source(&mut self, bytes: u64, pages: usize) {
        self.source_bytes = bytes;
        self.source_pages = pages;
    }

    /// Record one materialized chunk
    pub fn record_chunk(
        &mut self,
        extracted_pages: usize,
        overlap_pages: usize,
        bytes: u64,
        ceiling: u64,
    ) {
        self.chunks_created += 1;
        self.pages_extracted += extracted_pages;
        self.overlap_pages_duplicated += overlap_pages;
        self.total_output_bytes += bytes;

        if self.max_chunk_bytes == 0 || bytes > self.max_chunk_bytes {
            self.max_chunk_bytes = bytes;
        }
        if self.min_chunk_bytes == 0 || bytes < self.min_chunk_bytes {
            self.min_chunk_bytes = bytes;
        }
        if bytes > ceiling {
            self.oversized_chunks += 1;
        }
    }

    pub fn avg_chunk_bytes(&self) -> f64 {
        if self.chunks_created == 0 {
            0.0
        } else {
            self.total_output_bytes as f64 / self.chunks_created as f64
        }
    }

    /// Get summary as string for logging
    pub fn summary(&self) -> String {
        format!(
            "Split Stats: {} pages ({:.1} MiB) -> {} chunks in {}ms | \
            extracted {} pages ({} overlap) | \
            chunk size avg {:.1} MiB, max {:.1} MiB, {} over ceiling",
            self.source_pages,
            self.source_bytes as f64 / MIB as f64,
            self.chunks_created,
            self.total_processing_time.as_millis(),
            self.pages_extracted,
            self.overlap_pages_duplicated,
            self.avg_chunk_bytes() / MIB as f64,
            self.max_chunk_bytes as f64 / MIB as f64,
            self.oversized_chunks,
        )
    }
}
