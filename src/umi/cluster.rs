use std::collections::VecDeque;

use bio::alignment::distance::levenshtein;
use rustc_hash::FxHashMap;

/// Members of one cluster; the dominant member comes first
pub type Cluster = Vec<Vec<u8>>;

///////////////////////////////
/// Which edges of the similarity graph can be followed when growing a cluster
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Adjacency {
    /// Any two sequences within the distance are connected
    #[default]
    Connected,

    /// Only follow an edge from a to b if count(a) >= 2*count(b) - 1, as in UMI-tools
    Directional,
}

#[derive(Debug)]
struct Node {
    seq: Vec<u8>,
    weight: u64,
    visited: bool,
}

///////////////////////////////
/// Groups similar sequences (UMIs, cell barcodes) into clusters that are believed to stem
/// from the same original sequence.
///
/// Sequences are visited by decreasing weight, ties broken by the sequence itself. Each
/// sequence not yet in a cluster starts a new cluster and absorbs, breadth first, every
/// unclustered sequence reachable through the similarity graph.
#[derive(Clone, Copy, Debug)]
pub struct SimilarityClusterer {
    pub max_distance: u32,
    pub adjacency: Adjacency,
}
impl SimilarityClusterer {
    pub fn new(max_distance: u32, adjacency: Adjacency) -> SimilarityClusterer {
        SimilarityClusterer {
            max_distance,
            adjacency,
        }
    }

    ///////////////////////////////
    /// Cluster weighted sequences. Repeated sequences have their weights summed
    pub fn cluster<S, I>(&self, items: I) -> Vec<Cluster>
    where
        I: IntoIterator<Item = (S, u64)>,
        S: AsRef<[u8]>,
    {
        let mut nodes = prepare_nodes(items);
        if nodes.is_empty() {
            return Vec::new();
        }

        let map_seq_to_index: FxHashMap<Vec<u8>, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.seq.clone(), i))
            .collect();
        let alphabet = observed_alphabet(&nodes);

        let mut clusters: Vec<Cluster> = Vec::new();
        let mut queue: VecDeque<usize> = VecDeque::new();
        for root in 0..nodes.len() {
            if nodes[root].visited {
                continue;
            }
            nodes[root].visited = true;
            queue.push_back(root);

            let mut members: Vec<usize> = Vec::new();
            while let Some(idx) = queue.pop_front() {
                members.push(idx);
                for nb in self.neighbours(&nodes, idx, &map_seq_to_index, &alphabet) {
                    if nodes[nb].visited || !self.can_absorb(&nodes[idx], &nodes[nb]) {
                        continue;
                    }
                    nodes[nb].visited = true;
                    queue.push_back(nb);
                }
            }

            //Nodes are sorted by weight, so the root stays first
            members.sort_unstable();
            clusters.push(members.iter().map(|&i| nodes[i].seq.clone()).collect());
        }
        clusters
    }

    fn can_absorb(&self, from: &Node, to: &Node) -> bool {
        match self.adjacency {
            Adjacency::Connected => true,
            Adjacency::Directional => from.weight + 1 >= 2 * to.weight,
        }
    }

    ///////////////////////////////
    /// All other nodes within the edit distance of a node
    fn neighbours(
        &self,
        nodes: &[Node],
        idx: usize,
        map_seq_to_index: &FxHashMap<Vec<u8>, usize>,
        alphabet: &[u8],
    ) -> Vec<usize> {
        let seq = &nodes[idx].seq;
        match self.max_distance {
            0 => Vec::new(),
            1 => one_edit_variants(seq, alphabet)
                .iter()
                .filter_map(|v| map_seq_to_index.get(v).copied())
                .filter(|&j| j != idx)
                .collect(),
            d => {
                //Pairwise comparison; only used for the rarely requested larger distances
                nodes
                    .iter()
                    .enumerate()
                    .filter(|&(j, other)| {
                        j != idx
                            && seq.len().abs_diff(other.seq.len()) <= d as usize
                            && levenshtein(seq, &other.seq) <= d
                    })
                    .map(|(j, _)| j)
                    .collect()
            }
        }
    }
}

///////////////////////////////
/// Unique sequences, heaviest first, ties by sequence
fn prepare_nodes<S, I>(items: I) -> Vec<Node>
where
    I: IntoIterator<Item = (S, u64)>,
    S: AsRef<[u8]>,
{
    let mut weights: FxHashMap<Vec<u8>, u64> = FxHashMap::default();
    for (seq, weight) in items {
        *weights.entry(seq.as_ref().to_vec()).or_insert(0) += weight;
    }

    let mut nodes: Vec<Node> = weights
        .into_iter()
        .map(|(seq, weight)| Node {
            seq,
            weight,
            visited: false,
        })
        .collect();
    nodes.sort_by(|a, b| b.weight.cmp(&a.weight).then_with(|| a.seq.cmp(&b.seq)));
    nodes
}

fn observed_alphabet(nodes: &[Node]) -> Vec<u8> {
    let mut seen = [false; 256];
    for n in nodes {
        for &c in &n.seq {
            seen[c as usize] = true;
        }
    }
    (0..=255u8).filter(|&c| seen[c as usize]).collect()
}

///////////////////////////////
/// Every sequence one substitution, insertion or deletion away, using the given alphabet.
/// A neighbour in the input can only contain letters seen in the input, so this is complete
pub fn one_edit_variants(seq: &[u8], alphabet: &[u8]) -> Vec<Vec<u8>> {
    let mut variants: Vec<Vec<u8>> = Vec::with_capacity(seq.len() * (2 * alphabet.len() + 1));

    for i in 0..seq.len() {
        //Substitutions
        for &c in alphabet {
            if c != seq[i] {
                let mut v = seq.to_vec();
                v[i] = c;
                variants.push(v);
            }
        }

        //Deletions
        let mut v = Vec::with_capacity(seq.len() - 1);
        v.extend_from_slice(&seq[..i]);
        v.extend_from_slice(&seq[i + 1..]);
        variants.push(v);
    }

    //Insertions
    for i in 0..=seq.len() {
        for &c in alphabet {
            let mut v = Vec::with_capacity(seq.len() + 1);
            v.extend_from_slice(&seq[..i]);
            v.push(c);
            v.extend_from_slice(&seq[i..]);
            variants.push(v);
        }
    }
    variants
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clusterer(d: u32) -> SimilarityClusterer {
        SimilarityClusterer::new(d, Adjacency::Connected)
    }

    fn b(s: &str) -> Vec<u8> {
        s.as_bytes().to_vec()
    }

    #[test]
    fn distance_zero_gives_singletons() {
        let items = vec![("ATCG", 5), ("ATCC", 2), ("ATCG", 1)];
        let clusters = clusterer(0).cluster(items);
        assert_eq!(clusters, vec![vec![b("ATCG")], vec![b("ATCC")]]);
    }

    #[test]
    fn one_edit_joins_cluster_with_dominant_first() {
        let items = vec![
            ("ATCGATCG", 5),
            ("ATCGATCC", 2), //1 substitution from above
            ("ATTGATCC", 1), //1 substitution from previous
            ("ATTGATCA", 1), //1 substitution from previous, 2 from the others
            ("GGGGGGGG", 3),
        ];
        let clusters = clusterer(1).cluster(items);
        assert_eq!(clusters.len(), 2);
        assert_eq!(
            clusters[0],
            vec![b("ATCGATCG"), b("ATCGATCC"), b("ATTGATCA"), b("ATTGATCC")]
        );
        assert_eq!(clusters[1], vec![b("GGGGGGGG")]);
    }

    #[test]
    fn insertions_and_deletions_are_edges() {
        let clusters = clusterer(1).cluster(vec![("ACGTACGT", 3), ("ACGACGT", 1)]);
        assert_eq!(clusters.len(), 1);
        let clusters = clusterer(1).cluster(vec![("ACGTACGT", 3), ("ACGTTACGT", 1)]);
        assert_eq!(clusters.len(), 1);
    }

    #[test]
    fn ties_are_broken_by_sequence() {
        let forward = clusterer(1).cluster(vec![("TTTA", 2), ("TTTC", 2)]);
        let reverse = clusterer(1).cluster(vec![("TTTC", 2), ("TTTA", 2)]);
        assert_eq!(forward, vec![vec![b("TTTA"), b("TTTC")]]);
        assert_eq!(forward, reverse);
    }

    #[test]
    fn directional_needs_dominant_counts() {
        let directional = SimilarityClusterer::new(1, Adjacency::Directional);
        //5 >= 2*3-1 holds, so absorbed
        assert_eq!(directional.cluster(vec![("AAAA", 5), ("AAAT", 3)]).len(), 1);
        //4 >= 2*3-1 fails
        assert_eq!(directional.cluster(vec![("AAAA", 4), ("AAAT", 3)]).len(), 2);
        assert_eq!(clusterer(1).cluster(vec![("AAAA", 4), ("AAAT", 3)]).len(), 1);
    }

    #[test]
    fn larger_distances_use_pairwise_comparison() {
        let clusters = clusterer(2).cluster(vec![("AAAAAA", 4), ("AATTAA", 1), ("CCCCCC", 1)]);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0], vec![b("AAAAAA"), b("AATTAA")]);
    }

    #[test]
    fn variants_are_within_one_edit() {
        for v in one_edit_variants(b"ACG", b"ACGT") {
            assert!(levenshtein(b"ACG", &v) <= 1);
        }
        assert!(one_edit_variants(b"ACG", b"ACGT").contains(&b("ACTG")));
    }
}
