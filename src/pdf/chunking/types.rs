//! Core data structures for PDF chunk planning and splitting

use serde::{Deserialize, Serialize};

/// Result of counting the pages of a source document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageCount {
    pub page_count: usize,
    /// True when the count was derived from byte size instead of the page tree
    pub is_estimate: bool,
}

impl PageCount {
    pub fn exact(page_count: usize) -> Self {
        Self {
            page_count,
            is_estimate: false,
        }
    }

    pub fn estimated(page_count: usize) -> Self {
        Self {
            page_count,
            is_estimate: true,
        }
    }
}

/// Coarse page-count bracket used for user-facing estimates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SizeTier {
    Small,
    Medium,
    Large,
    VeryLarge,
    Massive,
}

impl SizeTier {
    pub fn detect(total_pages: usize) -> Self {
        match total_pages {
            0..=1000 => SizeTier::Small,
            1001..=2000 => SizeTier::Medium,
            2001..=5000 => SizeTier::Large,
            5001..=10000 => SizeTier::VeryLarge,
            _ => SizeTier::Massive,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            SizeTier::Small => "Small",
            SizeTier::Medium => "Medium",
            SizeTier::Large => "Large",
            SizeTier::VeryLarge => "Very large",
            SizeTier::Massive => "Massive",
        }
    }
}

impl std::fmt::Display for SizeTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Format a minute count as `~45 min`, `~2h` or `~1h 30min`
pub fn format_minutes(minutes: u64) -> String {
    if minutes < 60 {
        return format!("~{minutes} min");
    }
    let hours = minutes / 60;
    let rest = minutes % 60;
    if rest > 0 {
        format!("~{hours}h {rest}min")
    } else {
        format!("~{hours}h")
    }
}

/// Planning result: how a document will be cut
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkPlan {
    pub total_pages: usize,
    pub file_size_bytes: u64,
    pub chunk_size_pages: usize,
    pub total_chunks: usize,
    /// Configured overlap when a split is required, 0 otherwise
    pub overlap_pages: usize,
    /// True when the document must be split
    pub is_complex: bool,
    pub estimated_processing_minutes: u64,
    pub size_tier: SizeTier,
    /// True when the byte ceiling lowered the tier chunk size
    pub byte_corrected: bool,
}

impl ChunkPlan {
    pub fn is_single_chunk(&self) -> bool {
        self.total_chunks == 1
    }

    pub fn estimate_label(&self) -> String {
        format_minutes(self.estimated_processing_minutes)
    }
}

/// Leading page range duplicated from the previous chunk (1-based, inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlapRange {
    pub start_page: usize,
    pub end_page: usize,
}

impl OverlapRange {
    pub fn page_count(&self) -> usize {
        self.end_page + 1 - self.start_page
    }
}

/// Extraction window of one chunk, computed from a plan without I/O
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkWindow {
    pub chunk_index: usize,
    /// First page to copy (0-based)
    pub extract_start: usize,
    /// One past the last page to copy (0-based)
    pub extract_end: usize,
    /// First page this chunk reports on (1-based)
    pub start_page: usize,
    /// Last page this chunk reports on (1-based, inclusive)
    pub end_page: usize,
    pub overlap: Option<OverlapRange>,
}

impl ChunkWindow {
    pub fn extracted_page_count(&self) -> usize {
        self.extract_end - self.extract_start
    }

    pub fn page_range(&self) -> std::ops::Range<usize> {
        self.extract_start..self.extract_end
    }
}

/// One bounded sub-document produced by splitting
#[derive(Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Serialized sub-document
    pub bytes: Vec<u8>,
    pub start_page: usize,
    pub end_page: usize,
    pub total_pages: usize,
    pub chunk_index: usize,
    pub total_chunks: usize,
    pub overlap_start_page: Option<usize>,
    pub overlap_end_page: Option<usize>,
    pub file_name: String,
}

impl Chunk {
    pub fn from_window(
        window: &ChunkWindow,
        bytes: Vec<u8>,
        total_pages: usize,
        total_chunks: usize,
        file_name: String,
    ) -> Self {
        Self {
            bytes,
            start_page: window.start_page,
            end_page: window.end_page,
            total_pages,
            chunk_index: window.chunk_index,
            total_chunks,
            overlap_start_page: window.overlap.map(|o| o.start_page),
            overlap_end_page: window.overlap.map(|o| o.end_page),
            file_name,
        }
    }

    /// Pages this chunk is responsible for reporting
    pub fn page_count(&self) -> usize {
        self.end_page + 1 - self.start_page
    }

    /// Pages physically present in the sub-document
    pub fn extracted_page_count(&self) -> usize {
        self.page_count() + self.overlap().map_or(0, |o| o.page_count())
    }

    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn has_overlap(&self) -> bool {
        self.overlap_start_page.is_some()
    }

    pub fn overlap(&self) -> Option<OverlapRange> {
        match (self.overlap_start_page, self.overlap_end_page) {
            (Some(start_page), Some(end_page)) => Some(OverlapRange {
                start_page,
                end_page,
            }),
            _ => None,
        }
    }

    pub fn is_last(&self) -> bool {
        self.chunk_index + 1 == self.total_chunks
    }
}

// bytes are elided, chunks can be tens of megabytes
impl std::fmt::Debug for Chunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chunk")
            .field("file_name", &self.file_name)
            .field("chunk_index", &self.chunk_index)
            .field("total_chunks", &self.total_chunks)
            .field("start_page", &self.start_page)
            .field("end_page", &self.end_page)
            .field("total_pages", &self.total_pages)
            .field("overlap_start_page", &self.overlap_start_page)
            .field("overlap_end_page", &self.overlap_end_page)
            .field("size_bytes", &self.bytes.len())
            .finish()
    }
}

/// Stages of a split operation, reported in logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitPhase {
    Idle,
    Counting,
    Planning,
    Splitting { chunk_index: usize },
    Done,
    Failed,
    Cancelled,
}

impl std::fmt::Display for SplitPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SplitPhase::Idle => write!(f, "idle"),
            SplitPhase::Counting => write!(f, "counting"),
            SplitPhase::Planning => write!(f, "planning"),
            SplitPhase::Splitting { chunk_index } => write!(f, "splitting({chunk_index})"),
            SplitPhase::Done => write!(f, "done"),
            SplitPhase::Failed => write!(f, "failed"),
            SplitPhase::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Per-chunk entry of a manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub chunk_index: usize,
    pub file_name: String,
    pub start_page: usize,
    pub end_page: usize,
    pub pages_count: usize,
    pub overlap_start_page: Option<usize>,
    pub overlap_end_page: Option<usize>,
    pub file_size: u64,
}

/// Reassembly metadata for a finished split
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkManifest {
    pub source_file_name: String,
    pub total_pages: usize,
    pub total_chunks: usize,
    pub chunk_size_pages: usize,
    pub overlap_pages: usize,
    pub chunks: Vec<ManifestEntry>,
}

impl ChunkManifest {
    pub fn from_chunks(source_file_name: &str, plan: &ChunkPlan, chunks: &[Chunk]) -> Self {
        Self {
            source_file_name: source_file_name.to_string(),
            total_pages: plan.total_pages,
            total_chunks: plan.total_chunks,
            chunk_size_pages: plan.chunk_size_pages,
            overlap_pages: if chunks.iter().any(Chunk::has_overlap) {
                plan.overlap_pages
            } else {
                0
            },
            chunks: chunks
                .iter()
                .map(|c| ManifestEntry {
                    chunk_index: c.chunk_index,
                    file_name: c.file_name.clone(),
                    start_page: c.start_page,
                    end_page: c.end_page,
                    pages_count: c.extracted_page_count(),
                    overlap_start_page: c.overlap_start_page,
                    overlap_end_page: c.overlap_end_page,
                    file_size: c.size_bytes(),
                })
                .collect(),
        }
    }

    /// Chunk whose reported range contains the given 1-based page
    pub fn chunk_for_page(&self, page: usize) -> Option<&ManifestEntry> {
        self.chunks
            .iter()
            .find(|e| e.start_page <= page && page <= e.end_page)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Chunks of a completed split together with its plan and statistics
#[derive(Debug, Clone)]
pub struct SplitOutcome {
    pub plan: ChunkPlan,
    pub chunks: Vec<Chunk>,
    pub statistics: super::config::SplitStatistics,
}

impl SplitOutcome {
    pub fn manifest(&self, source_file_name: &str) -> ChunkManifest {
        ChunkManifest::from_chunks(source_file_name, &self.plan, &self.chunks)
    }
}
