use std::path::Path;
use std::time::Instant;

use log::{debug, info};

use super::table::{ChunkResult, ReadLayout, Whitelist};
use crate::common::ReadPair;
use crate::fileformat::paired_fastq::{PairedFastqReader, RecordRange};
use crate::runtime::Error;
use crate::tags::{TagMatch, TagMatcher, UNMAPPED_TAG};

/// Reads between progress messages, per worker
pub const PROGRESS_INTERVAL: u64 = 1_000_000;

///////////////////////////////
/// Classifies read pairs into one worker-private set of tables
pub struct ChunkClassifier<'a> {
    layout: &'a ReadLayout,
    whitelist: Option<&'a Whitelist>,
    matcher: TagMatcher,
    result: ChunkResult,
}
impl<'a> ChunkClassifier<'a> {
    pub fn new(
        layout: &'a ReadLayout,
        whitelist: Option<&'a Whitelist>,
        matcher: TagMatcher,
    ) -> ChunkClassifier<'a> {
        ChunkClassifier {
            layout,
            whitelist,
            matcher,
            result: ChunkResult::new(),
        }
    }

    ///////////////////////////////
    /// Count one read pair
    pub fn classify_pair(&mut self, rp: &ReadPair) {
        //Records too short for the barcode and UMI are skipped and counted
        let (cell_barcode, umi) = match (self.layout.barcode(rp.r1), self.layout.umi(rp.r1)) {
            (Some(bc), Some(umi)) => (bc, umi),
            _ => {
                self.result.n_malformed += 1;
                return;
            }
        };

        //Reads from non-whitelisted cells are not counted anywhere
        if let Some(whitelist) = self.whitelist {
            if !whitelist.contains(cell_barcode) {
                self.result.n_filtered += 1;
                return;
            }
        }

        let tag_match = self.matcher.find(rp.r2);
        self.record_match(rp, cell_barcode, umi, tag_match);
    }

    ///////////////////////////////
    /// Count a read pair given where its tag matched. Reads without a tag are kept under
    /// the unmapped feature, and their read 2 is recorded in the no-match table
    fn record_match(&mut self, rp: &ReadPair, cell_barcode: &[u8], umi: &[u8], tag_match: TagMatch) {
        match tag_match {
            TagMatch::Matched { tag_index, .. } => {
                let tag = self.matcher.library()[tag_index].name.as_str();
                self.result.results.increment(cell_barcode, tag, umi);
            }
            TagMatch::Ambiguous { distance, .. } => {
                debug!("Ambiguous tag hit at distance {} in {}", distance, rp);
                self.result.n_ambiguous += 1;
                self.result
                    .results
                    .increment(cell_barcode, UNMAPPED_TAG, umi);
                self.result.no_match.add(rp.r2);
            }
            TagMatch::Unmatched => {
                self.result
                    .results
                    .increment(cell_barcode, UNMAPPED_TAG, umi);
                self.result.no_match.add(rp.r2);
            }
        }
        self.result.n_reads += 1;
    }

    pub fn finish(self) -> ChunkResult {
        self.result
    }
}

///////////////////////////////
/// Classify read pairs from any source
pub fn classify_pairs<'r, I>(
    pairs: I,
    layout: &ReadLayout,
    whitelist: Option<&Whitelist>,
    matcher: TagMatcher,
) -> ChunkResult
where
    I: IntoIterator<Item = ReadPair<'r>>,
{
    let mut classifier = ChunkClassifier::new(layout, whitelist, matcher);
    for rp in pairs {
        classifier.classify_pair(&rp);
    }
    classifier.finish()
}

///////////////////////////////
/// Classify one range of records of a pair of FASTQ files. Opens its own file handles
pub fn classify_fastq_range(
    path_r1: &Path,
    path_r2: &Path,
    range: RecordRange,
    layout: &ReadLayout,
    whitelist: Option<&Whitelist>,
    matcher: TagMatcher,
) -> Result<ChunkResult, Error> {
    let mut reader = PairedFastqReader::open(path_r1, path_r2)?;
    reader.skip(range.first)?;

    let mut classifier = ChunkClassifier::new(layout, whitelist, matcher);
    let mut timer = Instant::now();
    let mut n_examined: u64 = 0;

    reader.for_each_pair(range.count, |rp| {
        classifier.classify_pair(&rp);
        n_examined += 1;
        if n_examined % PROGRESS_INTERVAL == 0 {
            info!(
                "Processed {} reads in {:.2}s; {} in total for the chunk starting at record {}",
                PROGRESS_INTERVAL,
                timer.elapsed().as_secs_f64(),
                n_examined,
                range.first
            );
            timer = Instant::now();
        }
    })?;

    let result = classifier.finish();
    info!(
        "Counting done for the chunk starting at record {}. Counted {} reads",
        range.first, result.n_reads
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::{MatchParams, TagLibrary};

    fn setup() -> (ReadLayout, TagMatcher) {
        let layout = ReadLayout::from_one_based(1, 4, 5, 8).unwrap();
        let lib = TagLibrary::new(vec![("ACGTACGTAC", "CD3"), ("TTGGCCAATT", "CD4")]).unwrap();
        let matcher = TagMatcher::new(
            &lib,
            MatchParams {
                max_distance: 1,
                legacy: false,
            },
        );
        (layout, matcher)
    }

    #[test]
    fn counts_matched_and_unmapped_reads() {
        let (layout, matcher) = setup();
        let pairs = vec![
            ReadPair::new(b"AAAATTTTGG", b"ACGTACGTACGG"),
            ReadPair::new(b"AAAATTTTGG", b"ACGTACGTACGG"),
            ReadPair::new(b"AAAATTTACC", b"TTGGCCAATT"),
            ReadPair::new(b"CCCCGGGGAA", b"GGGGGGGGGGGG"),
        ];
        let res = classify_pairs(pairs, &layout, None, matcher);

        assert_eq!(res.n_reads, 4);
        assert_eq!(res.results.count(b"AAAA", "CD3", b"TTTT"), 2);
        assert_eq!(res.results.count(b"AAAA", "CD4", b"TTTA"), 1);
        assert_eq!(res.results.count(b"CCCC", UNMAPPED_TAG, b"GGGG"), 1);
        assert_eq!(res.no_match.get(b"GGGGGGGGGGGG"), 1);
        assert_eq!(res.no_match.total(), 1);
    }

    #[test]
    fn whitelist_drops_reads_entirely() {
        let (layout, matcher) = setup();
        let mut whitelist = Whitelist::default();
        whitelist.insert(b"AAAA".to_vec());

        let pairs = vec![
            ReadPair::new(b"AAAATTTT", b"ACGTACGTAC"),
            ReadPair::new(b"CCCCTTTT", b"GGGGGGGGGG"),
        ];
        let res = classify_pairs(pairs, &layout, Some(&whitelist), matcher);

        assert_eq!(res.n_reads, 1);
        assert_eq!(res.n_filtered, 1);
        assert!(!res.results.contains_cell(b"CCCC"));
        assert!(res.no_match.is_empty());
    }

    #[test]
    fn short_read1_is_skipped_and_counted() {
        let (layout, matcher) = setup();
        let pairs = vec![
            ReadPair::new(b"AAAAT", b"ACGTACGTAC"),
            ReadPair::new(b"AAAATTTT", b"ACGTACGTAC"),
        ];
        let res = classify_pairs(pairs, &layout, None, matcher);

        assert_eq!(res.n_malformed, 1);
        assert_eq!(res.n_reads, 1);
        assert_eq!(res.results.total_reads(), 1);
    }

    #[test]
    fn ambiguous_hit_is_counted_as_unmapped() {
        let (layout, matcher) = setup();
        let mut classifier = ChunkClassifier::new(&layout, None, matcher);
        let rp = ReadPair::new(b"AAAATTTT", b"ACGTACCTACGG");
        classifier.record_match(
            &rp,
            b"AAAA",
            b"TTTT",
            TagMatch::Ambiguous {
                distance: 1,
                span: 0..10,
            },
        );
        let res = classifier.finish();

        assert_eq!(res.n_ambiguous, 1);
        assert_eq!(res.n_reads, 1);
        assert_eq!(res.results.count(b"AAAA", UNMAPPED_TAG, b"TTTT"), 1);
        assert_eq!(res.no_match.get(b"ACGTACCTACGG"), 1);
    }
}
