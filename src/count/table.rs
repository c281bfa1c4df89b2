use std::ops::Range;

use itertools::Itertools;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::runtime::Error;

pub type CellBarcode = Vec<u8>;
pub type Umi = Vec<u8>;

/// UMI -> reads
pub type UmiCounts = FxHashMap<Umi, u64>;

/// Tag name -> UMI counts
pub type TagCounts = FxHashMap<String, UmiCounts>;

/// Per-cell aggregate, e.g. reads per cell
pub type CellCounts = FxHashMap<CellBarcode, u64>;

pub type Whitelist = FxHashSet<CellBarcode>;

///////////////////////////////
/// Add all UMI counts of one group into another
pub fn add_umi_counts(target: &mut UmiCounts, source: UmiCounts) {
    for (umi, cnt) in source {
        *target.entry(umi).or_insert(0) += cnt;
    }
}

fn add_to_tags(tags: &mut TagCounts, tag: &str, umi: &[u8], count: u64) {
    match tags.get_mut(tag) {
        Some(umis) => match umis.get_mut(umi) {
            Some(cnt) => *cnt += count,
            None => {
                umis.insert(umi.to_vec(), count);
            }
        },
        None => {
            let mut umis = UmiCounts::default();
            umis.insert(umi.to_vec(), count);
            tags.insert(tag.to_string(), umis);
        }
    }
}

///////////////////////////////
/// Read counts per cell, tag and UMI. Only counted entries exist, so every count is > 0
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResultsTable {
    cells: FxHashMap<CellBarcode, TagCounts>,
}
impl ResultsTable {
    pub fn new() -> ResultsTable {
        ResultsTable {
            cells: FxHashMap::default(),
        }
    }

    ///////////////////////////////
    /// Make sure a cell is present, even without any counts
    pub fn ensure_cell(&mut self, cell: &[u8]) {
        if !self.cells.contains_key(cell) {
            self.cells.insert(cell.to_vec(), TagCounts::default());
        }
    }

    ///////////////////////////////
    /// Add reads for one cell, tag and UMI. Adding zero reads is a no-op
    pub fn add(&mut self, cell: &[u8], tag: &str, umi: &[u8], count: u64) {
        if count == 0 {
            return;
        }
        //Only allocate keys for new entries; this is the hot path
        match self.cells.get_mut(cell) {
            Some(tags) => add_to_tags(tags, tag, umi, count),
            None => {
                let mut tags = TagCounts::default();
                add_to_tags(&mut tags, tag, umi, count);
                self.cells.insert(cell.to_vec(), tags);
            }
        }
    }

    pub fn increment(&mut self, cell: &[u8], tag: &str, umi: &[u8]) {
        self.add(cell, tag, umi, 1);
    }

    ///////////////////////////////
    /// Fold a whole tag table into a cell, creating tags and UMIs that are missing
    pub fn merge_cell(&mut self, cell: &[u8], tags: TagCounts) {
        let target = self.cells.entry(cell.to_vec()).or_default();
        for (tag, umis) in tags {
            add_umi_counts(target.entry(tag).or_default(), umis);
        }
    }

    pub fn get(&self, cell: &[u8]) -> Option<&TagCounts> {
        self.cells.get(cell)
    }

    pub fn get_mut(&mut self, cell: &[u8]) -> Option<&mut TagCounts> {
        self.cells.get_mut(cell)
    }

    /// Reads for one cell, tag and UMI; zero if absent
    pub fn count(&self, cell: &[u8], tag: &str, umi: &[u8]) -> u64 {
        self.cells
            .get(cell)
            .and_then(|tags| tags.get(tag))
            .and_then(|umis| umis.get(umi))
            .copied()
            .unwrap_or(0)
    }

    pub fn remove(&mut self, cell: &[u8]) -> Option<TagCounts> {
        self.cells.remove(cell)
    }

    pub fn contains_cell(&self, cell: &[u8]) -> bool {
        self.cells.contains_key(cell)
    }

    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CellBarcode, &TagCounts)> {
        self.cells.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&CellBarcode, &mut TagCounts)> {
        self.cells.iter_mut()
    }

    ///////////////////////////////
    /// Sum of all read counts, all tags including unmapped
    pub fn total_reads(&self) -> u64 {
        self.cells
            .values()
            .flat_map(|tags| tags.values())
            .flat_map(|umis| umis.values())
            .sum()
    }
}

impl IntoIterator for ResultsTable {
    type Item = (CellBarcode, TagCounts);
    type IntoIter = std::collections::hash_map::IntoIter<CellBarcode, TagCounts>;

    fn into_iter(self) -> Self::IntoIter {
        self.cells.into_iter()
    }
}

///////////////////////////////
/// Tag regions that matched no tag, with their number of occurrences
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NoMatchTable {
    counts: FxHashMap<Vec<u8>, u64>,
}
impl NoMatchTable {
    pub fn new() -> NoMatchTable {
        NoMatchTable {
            counts: FxHashMap::default(),
        }
    }

    pub fn add(&mut self, seq: &[u8]) {
        match self.counts.get_mut(seq) {
            Some(cnt) => *cnt += 1,
            None => {
                self.counts.insert(seq.to_vec(), 1);
            }
        }
    }

    pub fn merge(&mut self, other: NoMatchTable) {
        for (seq, cnt) in other.counts {
            *self.counts.entry(seq).or_insert(0) += cnt;
        }
    }

    pub fn get(&self, seq: &[u8]) -> u64 {
        self.counts.get(seq).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    ///////////////////////////////
    /// Most common sequences first, ties by sequence
    pub fn most_common(&self, top_n: usize) -> Vec<(&[u8], u64)> {
        self.counts
            .iter()
            .map(|(seq, &cnt)| (seq.as_slice(), cnt))
            .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)))
            .take(top_n)
            .collect()
    }
}

///////////////////////////////
/// Where the cell barcode and UMI sit in read 1 (0-based, end exclusive)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReadLayout {
    pub barcode: Range<usize>,
    pub umi: Range<usize>,
}
impl ReadLayout {
    pub fn new(barcode: Range<usize>, umi: Range<usize>) -> Result<ReadLayout, Error> {
        if barcode.is_empty() {
            return Err(Error::invalid_layout("the cell barcode is empty"));
        }
        if umi.is_empty() {
            return Err(Error::invalid_layout("the UMI is empty"));
        }
        Ok(ReadLayout { barcode, umi })
    }

    ///////////////////////////////
    /// From 1-based, inclusive coordinates, as given on the command line
    pub fn from_one_based(
        cb_first: usize,
        cb_last: usize,
        umi_first: usize,
        umi_last: usize,
    ) -> Result<ReadLayout, Error> {
        if cb_first == 0 || umi_first == 0 {
            return Err(Error::invalid_layout("positions are 1-based"));
        }
        if cb_last < cb_first || umi_last < umi_first {
            return Err(Error::invalid_layout("last position is before first position"));
        }
        ReadLayout::new((cb_first - 1)..cb_last, (umi_first - 1)..umi_last)
    }

    /// Shortest read 1 that holds both barcode and UMI
    pub fn min_read1_len(&self) -> usize {
        self.barcode.end.max(self.umi.end)
    }

    pub fn barcode<'a>(&self, read1: &'a [u8]) -> Option<&'a [u8]> {
        read1.get(self.barcode.clone())
    }

    pub fn umi<'a>(&self, read1: &'a [u8]) -> Option<&'a [u8]> {
        read1.get(self.umi.clone())
    }
}

///////////////////////////////
/// Everything one worker produces for its range of records
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChunkResult {
    pub results: ResultsTable,
    pub no_match: NoMatchTable,

    /// Records counted, excluding whitelist drops and malformed records
    pub n_reads: u64,
    pub n_filtered: u64,
    pub n_malformed: u64,
    pub n_ambiguous: u64,
}
impl ChunkResult {
    pub fn new() -> ChunkResult {
        ChunkResult::default()
    }
}
