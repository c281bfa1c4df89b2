use log::info;

use super::table::{CellBarcode, CellCounts};

///////////////////////////////
/// The cells with most reads, most reads first and ties by barcode.
/// A request of 0 cells means all cells
pub fn select_top_cells(reads_per_cell: &CellCounts, n: usize) -> Vec<CellBarcode> {
    let mut ranked: Vec<(&CellBarcode, u64)> =
        reads_per_cell.iter().map(|(bc, &cnt)| (bc, cnt)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let n = if n == 0 { ranked.len() } else { n.min(ranked.len()) };
    if let Some((_, cnt)) = ranked.get(n.wrapping_sub(1)) {
        info!("Keeping {} cells; the last one has {} reads", n, cnt);
    }
    ranked.into_iter().take(n).map(|(bc, _)| bc.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_by_reads_then_barcode() {
        let mut reads = CellCounts::default();
        reads.insert(b"CCCC".to_vec(), 5);
        reads.insert(b"AAAA".to_vec(), 5);
        reads.insert(b"GGGG".to_vec(), 9);
        reads.insert(b"TTTT".to_vec(), 1);

        let top = select_top_cells(&reads, 3);
        assert_eq!(top, vec![b"GGGG".to_vec(), b"AAAA".to_vec(), b"CCCC".to_vec()]);

        assert_eq!(select_top_cells(&reads, 0).len(), 4);
        assert_eq!(select_top_cells(&reads, 10).len(), 4);
        assert!(select_top_cells(&CellCounts::default(), 3).is_empty());
    }
}
