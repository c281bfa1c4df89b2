pub mod classify;
pub mod merge;
pub mod table;
pub mod top_cells;

pub use classify::classify_fastq_range;
pub use classify::classify_pairs;
pub use classify::ChunkClassifier;

pub use merge::merge_results;
pub use merge::MergedResults;

pub use table::CellBarcode;
pub use table::CellCounts;
pub use table::ChunkResult;
pub use table::NoMatchTable;
pub use table::ReadLayout;
pub use table::ResultsTable;
pub use table::TagCounts;
pub use table::Umi;
pub use table::UmiCounts;
pub use table::Whitelist;

pub use top_cells::select_top_cells;
