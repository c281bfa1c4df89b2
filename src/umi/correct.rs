use log::{debug, info};

use super::cluster::SimilarityClusterer;
use crate::count::{CellCounts, ResultsTable};

///////////////////////////////
/// Settings for the two correction passes
#[derive(Clone, Copy, Debug)]
pub struct CorrectionParams {
    pub umi_clusterer: SimilarityClusterer,
    pub cell_clusterer: SimilarityClusterer,

    /// Smallest UMI cluster that is folded into its dominant UMI
    pub min_umi_cluster_size: usize,

    pub correct_umis: bool,
    pub correct_cells: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UmiCorrectionStats {
    /// (cell, tag) groups with more than one UMI
    pub n_groups: u64,
    /// UMIs folded into another UMI
    pub n_umis_corrected: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CellCorrectionStats {
    /// Clusters with more than one barcode
    pub n_clusters_merged: u64,
    /// Barcodes folded into another barcode
    pub n_cells_corrected: u64,
}

///////////////////////////////
/// Collapse UMIs that likely are sequencing errors of another UMI, within each (cell, tag).
/// Reads of the minor UMIs are added to the dominant UMI of their cluster
pub fn correct_umis(
    results: &mut ResultsTable,
    clusterer: &SimilarityClusterer,
    min_cluster_size: usize,
) -> UmiCorrectionStats {
    let min_cluster_size = min_cluster_size.max(2);
    let mut stats = UmiCorrectionStats::default();

    for (_cell, tags) in results.iter_mut() {
        for (_tag, umis) in tags.iter_mut() {
            if umis.len() < 2 {
                continue;
            }
            stats.n_groups += 1;

            let clusters = clusterer.cluster(umis.iter().map(|(umi, &cnt)| (umi, cnt)));
            for cluster in clusters {
                if cluster.len() < min_cluster_size {
                    continue;
                }
                let (dominant, minors) = match cluster.split_first() {
                    Some(split) => split,
                    None => continue,
                };
                let mut moved: u64 = 0;
                for minor in minors {
                    if let Some(cnt) = umis.remove(minor) {
                        moved += cnt;
                        stats.n_umis_corrected += 1;
                    }
                }
                *umis.entry(dominant.clone()).or_insert(0) += moved;
            }
        }
    }

    info!(
        "Corrected {} UMIs in {} cell/tag groups",
        stats.n_umis_corrected, stats.n_groups
    );
    stats
}

///////////////////////////////
/// Collapse cell barcodes that likely are sequencing errors of another barcode.
///
/// Barcodes are clustered by their read count. For every cluster with more than one member,
/// the minor barcodes are removed and all their counts, and both per-cell totals, are added
/// to the dominant barcode.
pub fn correct_cells(
    results: &mut ResultsTable,
    umis_per_cell: &mut CellCounts,
    reads_per_cell: &mut CellCounts,
    clusterer: &SimilarityClusterer,
) -> CellCorrectionStats {
    let mut stats = CellCorrectionStats::default();

    let clusters = clusterer.cluster(reads_per_cell.iter().map(|(bc, &cnt)| (bc, cnt)));
    for cluster in clusters {
        let (dominant, minors) = match cluster.split_first() {
            Some(split) if !split.1.is_empty() => split,
            _ => continue,
        };
        stats.n_clusters_merged += 1;

        for minor in minors {
            debug!(
                "Merging cell {} into {}",
                String::from_utf8_lossy(minor),
                String::from_utf8_lossy(dominant)
            );
            if let Some(tags) = results.remove(minor) {
                results.merge_cell(dominant, tags);
            }
            fold_count(umis_per_cell, minor, dominant);
            fold_count(reads_per_cell, minor, dominant);
            stats.n_cells_corrected += 1;
        }
    }

    info!(
        "Corrected {} cell barcodes in {} clusters",
        stats.n_cells_corrected, stats.n_clusters_merged
    );
    stats
}

fn fold_count(counts: &mut CellCounts, from: &[u8], into: &[u8]) {
    if let Some(cnt) = counts.remove(from) {
        *counts.entry(into.to_vec()).or_insert(0) += cnt;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::umi::Adjacency;

    fn clusterer() -> SimilarityClusterer {
        SimilarityClusterer::new(1, Adjacency::Connected)
    }

    #[test]
    fn umi_errors_fold_into_dominant() {
        let mut results = ResultsTable::new();
        results.add(b"AAAA", "CD3", b"TTTT", 2);
        results.add(b"AAAA", "CD3", b"TTTA", 1);
        results.add(b"AAAA", "CD4", b"CCCC", 1);
        results.add(b"AAAA", "CD4", b"GGGG", 1);
        let total = results.total_reads();

        let stats = correct_umis(&mut results, &clusterer(), 2);

        let cd3 = &results.get(b"AAAA").unwrap()["CD3"];
        assert_eq!(cd3.len(), 1);
        assert_eq!(cd3[&b"TTTT".to_vec()], 3);
        assert_eq!(results.get(b"AAAA").unwrap()["CD4"].len(), 2);
        assert_eq!(results.total_reads(), total);
        assert_eq!(stats.n_umis_corrected, 1);
        assert_eq!(stats.n_groups, 2);
    }

    #[test]
    fn small_umi_clusters_can_be_kept() {
        let mut results = ResultsTable::new();
        results.add(b"AAAA", "CD3", b"TTTT", 2);
        results.add(b"AAAA", "CD3", b"TTTA", 1);

        let stats = correct_umis(&mut results, &clusterer(), 3);
        assert_eq!(stats.n_umis_corrected, 0);
        assert_eq!(results.get(b"AAAA").unwrap()["CD3"].len(), 2);
    }

    #[test]
    fn cell_errors_fold_into_dominant() {
        let mut results = ResultsTable::new();
        results.add(b"GGGG", "CD3", b"TTTT", 5);
        results.add(b"GGGT", "CD3", b"TTTT", 1);
        results.add(b"GGGT", "CD8", b"ACAC", 1);
        results.add(b"CCCC", "CD3", b"TTTT", 2);
        let total = results.total_reads();

        let mut reads_per_cell = CellCounts::default();
        reads_per_cell.insert(b"GGGG".to_vec(), 5);
        reads_per_cell.insert(b"GGGT".to_vec(), 2);
        reads_per_cell.insert(b"CCCC".to_vec(), 2);
        let mut umis_per_cell = CellCounts::default();
        umis_per_cell.insert(b"GGGG".to_vec(), 1);
        umis_per_cell.insert(b"GGGT".to_vec(), 2);
        umis_per_cell.insert(b"CCCC".to_vec(), 1);

        let stats = correct_cells(
            &mut results,
            &mut umis_per_cell,
            &mut reads_per_cell,
            &clusterer(),
        );

        assert_eq!(stats.n_cells_corrected, 1);
        assert!(!results.contains_cell(b"GGGT"));
        assert!(!reads_per_cell.contains_key(&b"GGGT".to_vec()));
        assert!(!umis_per_cell.contains_key(&b"GGGT".to_vec()));
        assert_eq!(reads_per_cell[&b"GGGG".to_vec()], 7);
        assert_eq!(umis_per_cell[&b"GGGG".to_vec()], 3);
        assert_eq!(results.count(b"GGGG", "CD3", b"TTTT"), 6);
        assert_eq!(results.count(b"GGGG", "CD8", b"ACAC"), 1);
        assert_eq!(results.count(b"CCCC", "CD3", b"TTTT"), 2);
        assert_eq!(results.total_reads(), total);
    }
}
