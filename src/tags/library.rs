use std::io::Read;
use std::path::Path;

use log::{debug, warn};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::runtime::Error;

/// Reserved feature name for reads whose tag region matched no tag
pub const UNMAPPED_TAG: &str = "unmapped";

/// Upper bound imposed by the bit-parallel matcher (one 64-bit word per pattern)
pub const MAX_TAG_LENGTH: usize = 64;

///////////////////////////////
/// One tag: a short marker sequence and its human-readable name
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    pub sequence: Vec<u8>,
}

///////////////////////////////
/// Ordered set of tags. Declaration order decides matching ties and matrix row order
#[derive(Clone, Debug)]
pub struct TagLibrary {
    tags: Vec<Tag>,
}
impl TagLibrary {
    ///////////////////////////////
    /// Build a library from (sequence, name) pairs, in declaration order
    pub fn new<S, N, I>(pairs: I) -> Result<TagLibrary, Error>
    where
        I: IntoIterator<Item = (S, N)>,
        S: AsRef<[u8]>,
        N: Into<String>,
    {
        let mut tags: Vec<Tag> = Vec::new();
        let mut seen_seq: FxHashSet<Vec<u8>> = FxHashSet::default();
        let mut seen_name: FxHashSet<String> = FxHashSet::default();

        for (sequence, name) in pairs {
            let sequence = sequence.as_ref().to_ascii_uppercase();
            let name: String = name.into();

            if name.is_empty() {
                return Err(Error::invalid_tag_library("tag with empty name"));
            }
            if name == UNMAPPED_TAG {
                return Err(Error::invalid_tag_library(format!(
                    "the name '{}' is reserved",
                    UNMAPPED_TAG
                )));
            }
            if sequence.is_empty() {
                return Err(Error::invalid_tag_library(format!(
                    "tag '{}' has an empty sequence",
                    name
                )));
            }
            if sequence.len() > MAX_TAG_LENGTH {
                return Err(Error::invalid_tag_library(format!(
                    "tag '{}' is {}bp; at most {}bp is supported",
                    name,
                    sequence.len(),
                    MAX_TAG_LENGTH
                )));
            }
            if let Some(c) = sequence
                .iter()
                .find(|c| !matches!(c, b'A' | b'C' | b'G' | b'T' | b'N'))
            {
                return Err(Error::invalid_tag_library(format!(
                    "tag '{}' contains '{}'; only A, C, G, T and N are allowed",
                    name, *c as char
                )));
            }
            if !seen_seq.insert(sequence.clone()) {
                return Err(Error::invalid_tag_library(format!(
                    "sequence {} is listed more than once",
                    String::from_utf8_lossy(&sequence)
                )));
            }
            if !seen_name.insert(name.clone()) {
                return Err(Error::invalid_tag_library(format!(
                    "name '{}' is listed more than once",
                    name
                )));
            }
            tags.push(Tag { name, sequence });
        }

        if tags.is_empty() {
            return Err(Error::invalid_tag_library("no tags given"));
        }
        Ok(TagLibrary { tags })
    }

    ///////////////////////////////
    /// Read tags from a CSV file with rows of: sequence,name
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<TagLibrary, Error> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|_| Error::file_not_found(path))?;
        Self::from_reader(file).map_err(|e| match e {
            Error::ParseError { msg, .. } => Error::file_not_valid(path, msg),
            other => other,
        })
    }

    pub fn from_reader(src: impl Read) -> Result<TagLibrary, Error> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .trim(csv::Trim::All)
            .comment(Some(b'#'))
            .from_reader(src);

        let mut pairs: Vec<(String, String)> = Vec::new();
        for (i, result) in reader.deserialize().enumerate() {
            let record: TagCsvRow =
                result.map_err(|e| Error::parse_error("tag file", Some(e.to_string())))?;

            //Tolerate a header line
            if i == 0 && record.sequence.eq_ignore_ascii_case("sequence") {
                debug!("Skipping header line of tag file");
                continue;
            }
            pairs.push((record.sequence, record.name));
        }

        //Longest tags first, so that a tag which is a prefix of another cannot take its reads.
        //The sort is stable: equally long tags keep file order
        pairs.sort_by_key(|(seq, _)| std::cmp::Reverse(seq.len()));
        TagLibrary::new(pairs)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tag> {
        self.tags.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Tag> {
        self.tags.get(index)
    }

    pub fn longest_tag_len(&self) -> usize {
        self.tags.iter().map(|t| t.sequence.len()).max().unwrap_or(0)
    }

    ///////////////////////////////
    /// Ordered feature name -> matrix row. The unmapped row, if requested, comes last
    pub fn feature_index(&self, include_unmapped: bool) -> FeatureIndex {
        let mut names: Vec<String> = self.tags.iter().map(|t| t.name.clone()).collect();
        let mut labels: Vec<String> = self
            .tags
            .iter()
            .map(|t| format!("{}-{}", t.name, String::from_utf8_lossy(&t.sequence)))
            .collect();
        if include_unmapped {
            names.push(UNMAPPED_TAG.to_string());
            labels.push(UNMAPPED_TAG.to_string());
        }
        FeatureIndex::new(names, labels)
    }

    ///////////////////////////////
    /// Smallest Levenshtein distance between any two tags, or None for a single tag
    pub fn min_pairwise_distance(&self) -> Option<u32> {
        let mut min: Option<u32> = None;
        for (i, a) in self.tags.iter().enumerate() {
            for b in self.tags.iter().skip(i + 1) {
                let d = bio::alignment::distance::levenshtein(&a.sequence, &b.sequence);
                min = Some(min.map_or(d, |m| m.min(d)));
            }
        }
        min
    }

    ///////////////////////////////
    /// Warn if the matching budget is large enough to confuse two tags
    pub fn check_distance_budget(&self, max_distance: u8) {
        if let Some(min_dist) = self.min_pairwise_distance() {
            if u32::from(max_distance) >= min_dist {
                warn!(
                    "Tags are as close as {} edits but up to {} errors are allowed; ties will go to the tag listed first",
                    min_dist, max_distance
                );
            }
        }
    }
}

impl std::ops::Index<usize> for TagLibrary {
    type Output = Tag;

    fn index(&self, index: usize) -> &Tag {
        &self.tags[index]
    }
}

///////////////////////////////
/// Feature rows of the output matrices
#[derive(Clone, Debug)]
pub struct FeatureIndex {
    names: Vec<String>,
    labels: Vec<String>,
    map_name_to_index: FxHashMap<String, usize>,
}
impl FeatureIndex {
    pub fn new(names: Vec<String>, labels: Vec<String>) -> FeatureIndex {
        let map_name_to_index = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), i))
            .collect();
        FeatureIndex {
            names,
            labels,
            map_name_to_index,
        }
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.map_name_to_index.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Display labels, "name-SEQUENCE" for tags
    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

///////////////////////////////
/// For deserialization: one row in a tag CSV file
#[derive(Debug, serde::Deserialize, Eq, PartialEq)]
struct TagCsvRow {
    sequence: String,
    name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lib() -> TagLibrary {
        TagLibrary::new(vec![("ACGTACGT", "CD3"), ("TTTTGGGG", "CD4"), ("GGGGCCCCAA", "CD8")])
            .unwrap()
    }

    #[test]
    fn keeps_declaration_order() {
        let lib = lib();
        let names: Vec<&str> = lib.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["CD3", "CD4", "CD8"]);
        assert_eq!(lib.longest_tag_len(), 10);
    }

    #[test]
    fn rejects_duplicates_and_reserved_names() {
        assert!(TagLibrary::new(vec![("ACGT", "A"), ("ACGT", "B")]).is_err());
        assert!(TagLibrary::new(vec![("ACGT", "A"), ("TTTT", "A")]).is_err());
        assert!(TagLibrary::new(vec![("ACGT", "unmapped")]).is_err());
        assert!(TagLibrary::new(vec![("ACXT", "A")]).is_err());
        assert!(TagLibrary::new(Vec::<(&str, &str)>::new()).is_err());
    }

    #[test]
    fn lowercase_sequences_are_normalized() {
        let lib = TagLibrary::new(vec![("acgt", "A")]).unwrap();
        assert_eq!(lib.get(0).unwrap().sequence, b"ACGT".to_vec());
    }

    #[test]
    fn feature_index_appends_unmapped_last() {
        let fi = lib().feature_index(true);
        assert_eq!(fi.len(), 4);
        assert_eq!(fi.index_of("CD4"), Some(1));
        assert_eq!(fi.index_of(UNMAPPED_TAG), Some(3));
        assert_eq!(fi.labels()[0], "CD3-ACGTACGT");

        let fi = lib().feature_index(false);
        assert_eq!(fi.index_of(UNMAPPED_TAG), None);
    }

    #[test]
    fn reads_csv_with_and_without_header() {
        let with_header = "sequence,name\nACGTACGT,CD3\nTTTTGGGG,CD4\n";
        let lib = TagLibrary::from_reader(with_header.as_bytes()).unwrap();
        assert_eq!(lib.len(), 2);

        let without = "ACGTACGT,CD3\n TTTTGGGG , CD4\n";
        let lib = TagLibrary::from_reader(without.as_bytes()).unwrap();
        assert_eq!(lib.get(1).unwrap().name, "CD4");
    }

    #[test]
    fn min_pairwise_distance() {
        let lib = TagLibrary::new(vec![("AAAA", "a"), ("AAAT", "b"), ("GGGG", "c")]).unwrap();
        assert_eq!(lib.min_pairwise_distance(), Some(1));
        let lib = TagLibrary::new(vec![("AAAA", "a")]).unwrap();
        assert_eq!(lib.min_pairwise_distance(), None);
    }

    #[test]
    fn loader_puts_longest_tags_first() {
        let csv = "ACGTACGT,short\nTTTTTTTT,other\nACGTACGTAA,long\n";
        let lib = TagLibrary::from_reader(csv.as_bytes()).unwrap();
        let names: Vec<&str> = lib.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["long", "short", "other"]);
        assert_eq!(lib[0].sequence, b"ACGTACGTAA".to_vec());
    }
}
