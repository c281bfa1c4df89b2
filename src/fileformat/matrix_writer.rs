use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use log::info;
use sprs::CsMat;

use super::count_matrix::CountMatrices;
use crate::runtime::Error;

pub const UMI_COUNT_DIR: &str = "umi_count";
pub const READ_COUNT_DIR: &str = "read_count";

///////////////////////////////
/// Write both matrices as MatrixMarket, each in its own directory with the row and column names.
/// Returns the directories written
pub fn write_count_matrices(out_dir: &Path, matrices: &CountMatrices) -> Result<Vec<PathBuf>, Error> {
    let mut written = Vec::new();
    for (name, mat) in [(UMI_COUNT_DIR, &matrices.umi), (READ_COUNT_DIR, &matrices.reads)] {
        let dir = out_dir.join(name);
        write_matrix_dir(&dir, mat, &matrices.features, &matrices.cells)?;
        info!("Wrote {} matrix to {}", name, dir.display());
        written.push(dir);
    }
    Ok(written)
}

fn write_matrix_dir(
    dir: &Path,
    mat: &CsMat<u32>,
    features: &[String],
    cells: &[Vec<u8>],
) -> Result<(), Error> {
    create_dir_all(dir)?;
    sprs::io::write_matrix_market(dir.join("matrix.mtx"), mat)?;
    write_gz_lines(&dir.join("barcodes.tsv.gz"), cells.iter().map(|c| c.as_slice()))?;
    write_gz_lines(&dir.join("features.tsv.gz"), features.iter().map(|f| f.as_bytes()))?;
    Ok(())
}

fn write_gz_lines<'a, I>(path: &Path, lines: I) -> Result<(), Error>
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let file = File::create(path)?;
    let mut writer = BufWriter::new(GzEncoder::new(file, Compression::default()));
    for line in lines {
        writer.write_all(line)?;
        writer.write_all(b"\n")?;
    }
    let encoder = writer.into_inner().map_err(|e| e.into_error())?;
    encoder.finish()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::count::ResultsTable;
    use crate::fileformat::count_matrix::{assemble_matrices, CountWidth};
    use crate::tags::TagLibrary;
    use flate2::read::GzDecoder;
    use std::io::Read;

    #[test]
    fn writes_both_directories() {
        let dir = tempfile::tempdir().unwrap();
        let mut results = ResultsTable::new();
        results.add(b"AAAA", "CD3", b"TTTT", 3);
        let features = TagLibrary::new(vec![("ACGTACGT", "CD3")])
            .unwrap()
            .feature_index(true);
        let m = assemble_matrices(&results, &features, &[b"AAAA".to_vec()], CountWidth::U32).unwrap();

        let written = write_count_matrices(dir.path(), &m).unwrap();
        assert_eq!(written.len(), 2);

        let mtx = std::fs::read_to_string(dir.path().join("read_count/matrix.mtx")).unwrap();
        assert!(mtx.starts_with("%%MatrixMarket"));
        assert!(mtx.lines().any(|l| l.trim() == "1 1 3"));

        let mut features_txt = String::new();
        GzDecoder::new(File::open(dir.path().join("umi_count/features.tsv.gz")).unwrap())
            .read_to_string(&mut features_txt)
            .unwrap();
        assert_eq!(features_txt, "CD3-ACGTACGT\nunmapped\n");
    }
}
