use std::fs::create_dir_all;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use log::{debug, info};
use rayon::prelude::*;

use super::constants::*;
use super::determine_thread_counts_1;
use crate::count::{
    classify_fastq_range, merge_results, select_top_cells, CellBarcode, ChunkResult, ReadLayout,
    Whitelist,
};
use crate::fileformat::{
    assemble_matrices, count_records, plan_chunks, read_cell_list_file, verify_input_fq_file,
    whitelist_from_list, write_count_matrices, write_no_match_table, CountWidth,
};
use crate::tags::{MatchParams, TagLibrary, TagMatcher};
use crate::umi::{
    correct_cells, correct_umis, Adjacency, CellCorrectionStats, CorrectionParams,
    SimilarityClusterer, UmiCorrectionStats,
};

#[derive(Args)]
pub struct CountCMD {
    /// FASTQ with cell barcode and UMI (read 1)
    #[arg(long = "r1", value_parser)]
    pub path_r1: PathBuf,

    /// FASTQ with the tag sequence (read 2)
    #[arg(long = "r2", value_parser)]
    pub path_r2: PathBuf,

    /// CSV file with tags: sequence,name
    #[arg(short = 't', long = "tags", value_parser)]
    pub path_tags: PathBuf,

    /// Output directory
    #[arg(short = 'o', long = "output", value_parser)]
    pub path_out: PathBuf,

    /// First base of the cell barcode in read 1 (1-based)
    #[arg(long = "cb-first", default_value_t = COUNT_DEFAULT_CB_FIRST)]
    pub cb_first: usize,

    /// Last base of the cell barcode in read 1 (1-based, inclusive)
    #[arg(long = "cb-last", default_value_t = COUNT_DEFAULT_CB_LAST)]
    pub cb_last: usize,

    /// First base of the UMI in read 1 (1-based)
    #[arg(long = "umi-first", default_value_t = COUNT_DEFAULT_UMI_FIRST)]
    pub umi_first: usize,

    /// Last base of the UMI in read 1 (1-based, inclusive)
    #[arg(long = "umi-last", default_value_t = COUNT_DEFAULT_UMI_LAST)]
    pub umi_last: usize,

    /// Maximum edit distance between a tag and read 2
    #[arg(long = "max-error", default_value_t = COUNT_DEFAULT_MAX_ERROR)]
    pub max_error: u8,

    /// Tags are preceded by a fixed 6bp prefix in read 2
    #[arg(long = "legacy")]
    pub legacy: bool,

    /// List of cell barcodes to keep; all other cells are dropped
    #[arg(long = "whitelist", value_parser)]
    pub path_whitelist: Option<PathBuf>,

    /// Number of cells in the output, most reads first. 0 means all
    #[arg(long = "expect-cells", default_value_t = COUNT_DEFAULT_EXPECT_CELLS)]
    pub expect_cells: usize,

    /// Edit distance at which UMIs are collapsed
    #[arg(long = "umi-collapsing-dist", default_value_t = COUNT_DEFAULT_UMI_COLLAPSING_DIST)]
    pub umi_collapsing_dist: u32,

    /// Edit distance at which cell barcodes are collapsed
    #[arg(long = "bc-collapsing-dist", default_value_t = COUNT_DEFAULT_BC_COLLAPSING_DIST)]
    pub bc_collapsing_dist: u32,

    #[arg(long = "no-umi-correction")]
    pub no_umi_correction: bool,

    #[arg(long = "no-cell-correction")]
    pub no_cell_correction: bool,

    /// Smallest UMI cluster that is collapsed
    #[arg(long = "umi-min-cluster-size", default_value_t = COUNT_DEFAULT_UMI_MIN_CLUSTER_SIZE)]
    pub umi_min_cluster_size: usize,

    /// Use directional adjacency (UMI-tools) when clustering
    #[arg(long = "directional")]
    pub directional: bool,

    /// Integer width of the output matrices
    #[arg(long = "count-width", value_enum, default_value_t = CountWidth::U32)]
    pub count_width: CountWidth,

    /// Number of unmatched sequences to report
    #[arg(long = "unmapped-tags", default_value_t = COUNT_DEFAULT_UNMAPPED_TAGS)]
    pub unmapped_tags: usize,

    /// Only use the first N read pairs
    #[arg(long = "first-n")]
    pub first_n: Option<u64>,

    //Thread settings
    #[arg(short = '@', long = "threads", value_parser = clap::value_parser!(usize))]
    pub num_threads_total: Option<usize>,
}
impl CountCMD {
    pub fn try_execute(&mut self) -> Result<()> {
        let num_threads = determine_thread_counts_1(self.num_threads_total)?;
        info!("Using threads {}", num_threads);

        let adjacency = if self.directional {
            Adjacency::Directional
        } else {
            Adjacency::Connected
        };

        let summary = TagCount::run(&TagCount {
            path_r1: self.path_r1.clone(),
            path_r2: self.path_r2.clone(),
            path_tags: self.path_tags.clone(),
            path_out: self.path_out.clone(),
            path_whitelist: self.path_whitelist.clone(),
            layout: ReadLayout::from_one_based(
                self.cb_first,
                self.cb_last,
                self.umi_first,
                self.umi_last,
            )?,
            match_params: MatchParams {
                max_distance: self.max_error,
                legacy: self.legacy,
            },
            correction: CorrectionParams {
                umi_clusterer: SimilarityClusterer::new(self.umi_collapsing_dist, adjacency),
                cell_clusterer: SimilarityClusterer::new(self.bc_collapsing_dist, adjacency),
                min_umi_cluster_size: self.umi_min_cluster_size,
                correct_umis: !self.no_umi_correction,
                correct_cells: !self.no_cell_correction,
            },
            expect_cells: self.expect_cells,
            count_width: self.count_width,
            unmapped_tags: self.unmapped_tags,
            first_n: self.first_n,
            num_threads,
        })?;

        info!("Count has finished successfully; {} reads counted", summary.n_reads);
        Ok(())
    }
}

///////////////////////////////
/// What a run did, for reporting
#[derive(Clone, Debug, Default)]
pub struct RunSummary {
    pub n_reads: u64,
    pub n_filtered: u64,
    pub n_malformed: u64,
    pub n_ambiguous: u64,
    pub n_unmapped: u64,
    pub n_cells_seen: usize,
    pub n_cells_reported: usize,
    pub umi_correction: UmiCorrectionStats,
    pub cell_correction: CellCorrectionStats,
}

///////////////////////////////
/// Counting of tags per cell, from paired FASTQ to count matrices
pub struct TagCount {
    pub path_r1: PathBuf,
    pub path_r2: PathBuf,
    pub path_tags: PathBuf,
    pub path_out: PathBuf,
    pub path_whitelist: Option<PathBuf>,

    pub layout: ReadLayout,
    pub match_params: MatchParams,
    pub correction: CorrectionParams,

    pub expect_cells: usize,
    pub count_width: CountWidth,
    pub unmapped_tags: usize,
    pub first_n: Option<u64>,
    pub num_threads: usize,
}
impl TagCount {
    pub fn run(params: &TagCount) -> Result<RunSummary> {
        let start = Instant::now();

        verify_input_fq_file(&params.path_r1)?;
        verify_input_fq_file(&params.path_r2)?;

        let library = TagLibrary::from_csv(&params.path_tags)
            .with_context(|| format!("Could not load tags from {}", params.path_tags.display()))?;
        library.check_distance_budget(params.match_params.max_distance);
        info!("Loaded {} tags", library.len());

        let whitelist: Option<(Vec<CellBarcode>, Whitelist)> = match &params.path_whitelist {
            Some(p) => {
                let list = read_cell_list_file(p)?;
                let set = whitelist_from_list(&list);
                Some((list, set))
            }
            None => None,
        };

        //Plan ranges so that workers can each open their own file handles
        let mut n_records = count_records(&params.path_r1)?;
        if let Some(first_n) = params.first_n {
            n_records = n_records.min(first_n);
        }
        let ranges = plan_chunks(n_records, params.num_threads);
        info!("Counting {} read pairs in {} chunks", n_records, ranges.len());

        let matcher = TagMatcher::new(&library, params.match_params);
        let thread_pool = rayon::ThreadPoolBuilder::new()
            .num_threads(params.num_threads)
            .build()?;

        //A single failing chunk fails the run; no partial results are merged
        let chunks: Vec<ChunkResult> = thread_pool.install(|| {
            ranges
                .par_iter()
                .map(|range| {
                    classify_fastq_range(
                        &params.path_r1,
                        &params.path_r2,
                        *range,
                        &params.layout,
                        whitelist.as_ref().map(|(_, set)| set),
                        matcher.clone(),
                    )
                })
                .collect::<Result<Vec<_>, _>>()
        })?;

        let mut merged = merge_results(chunks);
        let n_cells_seen = merged.results.num_cells();
        info!("Counted {} reads in {} cells", merged.n_reads, n_cells_seen);

        let umi_correction = if params.correction.correct_umis {
            correct_umis(
                &mut merged.results,
                &params.correction.umi_clusterer,
                params.correction.min_umi_cluster_size,
            )
        } else {
            UmiCorrectionStats::default()
        };

        let cell_correction = if params.correction.correct_cells {
            correct_cells(
                &mut merged.results,
                &mut merged.umis_per_cell,
                &mut merged.reads_per_cell,
                &params.correction.cell_clusterer,
            )
        } else {
            debug!("Skipping cell barcode correction");
            CellCorrectionStats::default()
        };

        let top_cells = match &whitelist {
            Some((list, _)) => list.clone(),
            None => select_top_cells(&merged.reads_per_cell, params.expect_cells),
        };

        let features = library.feature_index(true);
        let matrices = assemble_matrices(&merged.results, &features, &top_cells, params.count_width)?;

        create_dir_all(&params.path_out).with_context(|| {
            format!("Could not create output directory {}", params.path_out.display())
        })?;
        write_count_matrices(&params.path_out, &matrices)?;
        write_no_match_table(
            &params.path_out.join(COUNT_FILENAME_UNMAPPED),
            &merged.no_match,
            params.unmapped_tags,
        )?;

        let summary = RunSummary {
            n_reads: merged.n_reads,
            n_filtered: merged.n_filtered,
            n_malformed: merged.n_malformed,
            n_ambiguous: merged.n_ambiguous,
            n_unmapped: merged.no_match.total(),
            n_cells_seen,
            n_cells_reported: top_cells.len(),
            umi_correction,
            cell_correction,
        };
        log_summary(&summary, start);
        Ok(summary)
    }
}

fn log_summary(summary: &RunSummary, start: Instant) {
    info!("Run finished in {:.1}s", start.elapsed().as_secs_f64());
    info!("Reads counted: {}", summary.n_reads);
    info!("Reads without a tag: {}", summary.n_unmapped);
    info!("Reads with an ambiguous tag: {}", summary.n_ambiguous);
    info!("Reads outside the whitelist: {}", summary.n_filtered);
    info!("Reads too short for barcode and UMI: {}", summary.n_malformed);
    info!(
        "Cells: {} seen, {} reported",
        summary.n_cells_seen, summary.n_cells_reported
    );
    info!(
        "Corrected {} UMIs and {} cell barcodes",
        summary.umi_correction.n_umis_corrected, summary.cell_correction.n_cells_corrected
    );
}
