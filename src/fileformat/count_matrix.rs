use log::debug;
use sprs::{CsMat, TriMat};

use crate::count::{CellBarcode, ResultsTable};
use crate::runtime::Error;
use crate::tags::FeatureIndex;

///////////////////////////////
/// Largest count that may be stored in the matrices
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum CountWidth {
    U16,
    #[default]
    U32,
}
impl CountWidth {
    pub fn max(&self) -> u64 {
        match self {
            CountWidth::U16 => u16::MAX as u64,
            CountWidth::U32 => u32::MAX as u64,
        }
    }

    fn check(&self, count: u64, feature: &str, cell: &[u8]) -> Result<u32, Error> {
        if count > self.max() {
            return Err(Error::count_overflow(feature, cell, count, self.max()));
        }
        //max() never exceeds u32
        Ok(count as u32)
    }
}

///////////////////////////////
/// UMI and read count matrices, features x cells
#[derive(Debug)]
pub struct CountMatrices {
    pub umi: CsMat<u32>,
    pub reads: CsMat<u32>,

    /// Row labels
    pub features: Vec<String>,

    /// Column barcodes
    pub cells: Vec<CellBarcode>,
}

///////////////////////////////
/// Build the count matrices for the given cells, in the given order.
///
/// Entry (feature, cell) of the UMI matrix is the number of distinct UMIs, and of the read
/// matrix the sum of their reads. Cells not in the table get an empty column, and tags
/// without a feature row are left out.
pub fn assemble_matrices(
    results: &ResultsTable,
    features: &FeatureIndex,
    top_cells: &[CellBarcode],
    width: CountWidth,
) -> Result<CountMatrices, Error> {
    let shape = (features.len(), top_cells.len());
    let mut mat_umi = TriMat::<u32>::new(shape);
    let mut mat_reads = TriMat::<u32>::new(shape);

    let mut n_missing = 0;
    for (col, cell) in top_cells.iter().enumerate() {
        let tags = match results.get(cell) {
            Some(tags) => tags,
            None => {
                n_missing += 1;
                continue;
            }
        };

        for (tag, umis) in tags {
            if umis.is_empty() {
                continue;
            }
            let row = match features.index_of(tag) {
                Some(row) => row,
                None => continue,
            };
            let n_umi = width.check(umis.len() as u64, tag, cell)?;
            let n_reads = width.check(umis.values().sum(), tag, cell)?;
            mat_umi.add_triplet(row, col, n_umi);
            mat_reads.add_triplet(row, col, n_reads);
        }
    }
    if n_missing > 0 {
        debug!("{} selected cells have no counts", n_missing);
    }

    Ok(CountMatrices {
        umi: mat_umi.to_csr(),
        reads: mat_reads.to_csr(),
        features: features.labels().to_vec(),
        cells: top_cells.to_vec(),
    })
}
