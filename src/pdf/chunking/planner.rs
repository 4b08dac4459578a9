//! Chunk planning: split decision, chunk size and extraction windows
//!
//! Everything here is pure arithmetic over page counts and byte sizes, so
//! boundary tiers can be exercised without real documents.

use crate::pdf::chunking::config::{ChunkSizeTier, ChunkingConfig};
use crate::pdf::chunking::error::{PdfChunkingError, Result};
use crate::pdf::chunking::types::{ChunkPlan, ChunkWindow, OverlapRange, SizeTier};

/// Resolve the tier chunk size for a page count
///
/// Tiers are scanned in order and the first one containing `total_pages`
/// wins. Returns `None` only for a table without an unbounded tier.
pub fn resolve_tier_chunk_size(tiers: &[ChunkSizeTier], total_pages: usize) -> Option<usize> {
    tiers
        .iter()
        .find(|tier| tier.contains(total_pages))
        .map(|tier| tier.chunk_size_pages)
}

/// Pages per chunk that keep an average chunk under `max_chunk_bytes`
///
/// `floor(max_chunk_bytes / (file_size_bytes / total_pages))`, computed in
/// integers so exact ratios do not drift, floored at `min_chunk_pages`.
pub fn size_based_chunk_pages(
    total_pages: usize,
    file_size_bytes: u64,
    max_chunk_bytes: u64,
    min_chunk_pages: usize,
) -> usize {
    let pages = (max_chunk_bytes as u128 * total_pages as u128) / file_size_bytes.max(1) as u128;
    let pages = usize::try_from(pages).unwrap_or(usize::MAX);
    pages.max(min_chunk_pages)
}

/// Pure chunk planner
#[derive(Debug, Clone)]
pub struct ChunkPlanner {
    config: ChunkingConfig,
}

impl ChunkPlanner {
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        config
            .validate()
            .map_err(PdfChunkingError::configuration)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Whether a document of this shape must be split
    pub fn requires_split(&self, total_pages: usize, file_size_bytes: u64) -> bool {
        total_pages >= self.config.page_split_threshold
            || file_size_bytes > self.config.size_split_threshold_bytes
    }

    /// Plan how a document will be cut
    pub fn plan(&self, total_pages: usize, file_size_bytes: u64) -> Result<ChunkPlan> {
        if total_pages == 0 {
            return Err(PdfChunkingError::validation("document has no pages"));
        }
        if file_size_bytes == 0 {
            return Err(PdfChunkingError::validation("document size must be positive"));
        }

        let size_tier = SizeTier::detect(total_pages);

        if !self.requires_split(total_pages, file_size_bytes) {
            return Ok(ChunkPlan {
                total_pages,
                file_size_bytes,
                chunk_size_pages: total_pages,
                total_chunks: 1,
                overlap_pages: 0,
                is_complex: false,
                estimated_processing_minutes: self.estimate_minutes(1),
                size_tier,
                byte_corrected: false,
            });
        }

        let tier_chunk_size = resolve_tier_chunk_size(&self.config.tiers, total_pages)
            .ok_or_else(|| PdfChunkingError::configuration("tier table has no unbounded tier"))?;

        let (chunk_size_pages, byte_corrected) =
            if file_size_bytes > self.config.max_chunk_size_bytes {
                let size_based = size_based_chunk_pages(
                    total_pages,
                    file_size_bytes,
                    self.config.max_chunk_size_bytes,
                    self.config.min_chunk_pages,
                );
                (tier_chunk_size.min(size_based), size_based < tier_chunk_size)
            } else {
                (tier_chunk_size, false)
            };

        let total_chunks = total_pages.div_ceil(chunk_size_pages);

        Ok(ChunkPlan {
            total_pages,
            file_size_bytes,
            chunk_size_pages,
            total_chunks,
            overlap_pages: self.config.overlap_pages,
            is_complex: true,
            estimated_processing_minutes: self.estimate_minutes(total_chunks),
            size_tier,
            byte_corrected,
        })
    }

    fn estimate_minutes(&self, total_chunks: usize) -> u64 {
        total_chunks as u64 * self.config.minutes_per_chunk + self.config.base_processing_minutes
    }
}

/// Window calculation over a plan
pub struct ChunkWindowCalculator;

impl ChunkWindowCalculator {
    /// Calculate the extraction window of every chunk of a plan
    ///
    /// Chunks advance by `chunk_size_pages`. In overlap mode every chunk but
    /// the first starts extracting `overlap_pages` earlier (clamped at page 0);
    /// the reported `start_page..=end_page` ranges are unaffected.
    pub fn calculate_windows(plan: &ChunkPlan, with_overlap: bool) -> Vec<ChunkWindow> {
        let mut windows = Vec::with_capacity(plan.total_chunks);
        let mut current_page = 0;
        let mut chunk_index = 0;

        while current_page < plan.total_pages {
            let extract_start = if chunk_index > 0 && with_overlap {
                current_page.saturating_sub(plan.overlap_pages)
            } else {
                current_page
            };
            let extract_end = (current_page + plan.chunk_size_pages).min(plan.total_pages);

            let overlap = (extract_start < current_page).then(|| OverlapRange {
                start_page: extract_start + 1,
                end_page: current_page,
            });

            windows.push(ChunkWindow {
                chunk_index,
                extract_start,
                extract_end,
                start_page: current_page + 1,
                end_page: extract_end,
                overlap,
            });

            current_page += plan.chunk_size_pages;
            chunk_index += 1;
        }

        windows
    }
}

impl ChunkPlan {
    pub fn windows(&self, with_overlap: bool) -> Vec<ChunkWindow> {
        ChunkWindowCalculator::calculate_windows(self, with_overlap)
    }
}
