use log::debug;

use super::table::{add_umi_counts, CellCounts, ChunkResult, NoMatchTable, ResultsTable, TagCounts};
use crate::tags::UNMAPPED_TAG;

///////////////////////////////
/// All worker results combined into one set of tables
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MergedResults {
    pub results: ResultsTable,
    pub umis_per_cell: CellCounts,
    pub reads_per_cell: CellCounts,
    pub no_match: NoMatchTable,
    pub n_reads: u64,
    pub n_filtered: u64,
    pub n_malformed: u64,
    pub n_ambiguous: u64,
}

///////////////////////////////
/// Combine per-worker results. The order of the chunks does not matter.
///
/// `umis_per_cell` adds the number of distinct UMIs of each tag within each chunk. A UMI seen
/// in two chunks is thus counted twice; this matches how the counts have always been reported.
pub fn merge_results<I>(chunks: I) -> MergedResults
where
    I: IntoIterator<Item = ChunkResult>,
{
    let mut merged = MergedResults::default();

    for (i, chunk) in chunks.into_iter().enumerate() {
        debug!(
            "Merging chunk {} with {} cells and {} reads",
            i,
            chunk.results.num_cells(),
            chunk.n_reads
        );

        for (cell_barcode, tags) in chunk.results {
            merged.results.ensure_cell(&cell_barcode);

            let mut cell_umis: u64 = 0;
            let mut cell_reads: u64 = 0;
            let mut cell_tags = TagCounts::default();
            for (tag, umis) in tags {
                if umis.is_empty() {
                    continue;
                }
                if tag != UNMAPPED_TAG {
                    cell_umis += umis.len() as u64;
                    cell_reads += umis.values().sum::<u64>();
                }
                add_umi_counts(cell_tags.entry(tag).or_default(), umis);
            }
            merged.results.merge_cell(&cell_barcode, cell_tags);

            if cell_reads > 0 {
                *merged.umis_per_cell.entry(cell_barcode.clone()).or_insert(0) += cell_umis;
                *merged.reads_per_cell.entry(cell_barcode).or_insert(0) += cell_reads;
            }
        }

        merged.no_match.merge(chunk.no_match);
        merged.n_reads += chunk.n_reads;
        merged.n_filtered += chunk.n_filtered;
        merged.n_malformed += chunk.n_malformed;
        merged.n_ambiguous += chunk.n_ambiguous;
    }

    merged
}
