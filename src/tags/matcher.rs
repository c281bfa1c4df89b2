use std::ops::Range;

use bio::alignment::distance::levenshtein;
use bio::alignment::Alignment;
use bio::pattern_matching::myers::Myers;
use log::debug;

use super::library::TagLibrary;

/// Extra bases searched in legacy constructs, which carry a fixed-length prefix before the tag
pub const LEGACY_PREFIX_LEN: usize = 6;

///////////////////////////////
/// How tags are searched for in read 2
#[derive(Clone, Copy, Debug)]
pub struct MatchParams {
    /// Maximum substitutions + insertions + deletions
    pub max_distance: u8,
    pub legacy: bool,
}

///////////////////////////////
/// Outcome of matching one fragment
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TagMatch {
    Matched {
        tag_index: usize,
        distance: u8,
        span: Range<usize>,
    },

    /// A hit within budget that no tag reproduces at the same distance
    Ambiguous { distance: u8, span: Range<usize> },

    Unmatched,
}
impl TagMatch {
    pub fn tag_index(&self) -> Option<usize> {
        match self {
            TagMatch::Matched { tag_index, .. } => Some(*tag_index),
            _ => None,
        }
    }
}

///////////////////////////////
/// Best hit of one search, before deciding which tag it belongs to
#[derive(Clone, Debug)]
struct Hit {
    distance: u8,
    span: Range<usize>,
}

///////////////////////////////
/// Fuzzy tag matcher. Cloned once per worker: the Myers patterns keep a traceback buffer
#[derive(Clone, Debug)]
pub struct TagMatcher {
    library: TagLibrary,
    patterns: Vec<Myers<u64>>,
    max_distance: u8,
    window: usize,
}
impl TagMatcher {
    pub fn new(library: &TagLibrary, params: MatchParams) -> TagMatcher {
        let patterns = library
            .iter()
            .map(|t| Myers::<u64>::new(t.sequence.as_slice()))
            .collect();

        let mut window = library.longest_tag_len();
        if params.legacy {
            window += LEGACY_PREFIX_LEN;
        }

        TagMatcher {
            library: library.clone(),
            patterns,
            max_distance: params.max_distance,
            window,
        }
    }

    pub fn library(&self) -> &TagLibrary {
        &self.library
    }

    /// Number of read 2 bases that are searched
    pub fn window(&self) -> usize {
        self.window
    }

    ///////////////////////////////
    /// The part of read 2 that is searched
    pub fn tag_region<'a>(&self, read2: &'a [u8]) -> &'a [u8] {
        &read2[..read2.len().min(self.window)]
    }

    ///////////////////////////////
    /// Find the tag in the tag region of read 2
    pub fn find(&mut self, read2: &[u8]) -> TagMatch {
        let region = self.tag_region(read2);
        if region.is_empty() {
            return TagMatch::Unmatched;
        }

        let hit = match self.search(region) {
            Some(hit) => hit,
            None => return TagMatch::Unmatched,
        };

        //Decide which tag produced the hit. First tag in library order wins ties
        let matched_seq = &region[hit.span.clone()];
        for (tag_index, tag) in self.library.iter().enumerate() {
            if levenshtein(&tag.sequence, matched_seq) == u32::from(hit.distance) {
                return TagMatch::Matched {
                    tag_index,
                    distance: hit.distance,
                    span: hit.span,
                };
            }
        }

        debug!(
            "No tag reproduces distance {} for matched sequence {}",
            hit.distance,
            String::from_utf8_lossy(matched_seq)
        );
        TagMatch::Ambiguous {
            distance: hit.distance,
            span: hit.span,
        }
    }

    ///////////////////////////////
    /// Search all tag patterns at once; lowest distance, then leftmost start, then first tag
    fn search(&mut self, region: &[u8]) -> Option<Hit> {
        let mut best: Option<Hit> = None;
        let mut aln = Alignment::default();

        for pattern in self.patterns.iter_mut() {
            let mut matches = pattern.find_all_lazy(region, self.max_distance);
            let best_end = matches.by_ref().min_by_key(|&(_, dist)| dist);

            if let Some((end, distance)) = best_end {
                if !matches.alignment_at(end, &mut aln) {
                    continue;
                }
                let candidate = Hit {
                    distance,
                    span: aln.ystart..aln.yend,
                };
                let better = match &best {
                    None => true,
                    Some(b) => {
                        candidate.distance < b.distance
                            || (candidate.distance == b.distance
                                && candidate.span.start < b.span.start)
                    }
                };
                if better {
                    best = Some(candidate);
                }
            }
        }
        best
    }
}
