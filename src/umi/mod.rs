pub mod cluster;
pub mod correct;

pub use cluster::Adjacency;
pub use cluster::Cluster;
pub use cluster::SimilarityClusterer;

pub use correct::correct_cells;
pub use correct::correct_umis;
pub use correct::CellCorrectionStats;
pub use correct::CorrectionParams;
pub use correct::UmiCorrectionStats;
