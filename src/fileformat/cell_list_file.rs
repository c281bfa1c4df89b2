use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::{info, warn};

use crate::count::{CellBarcode, Whitelist};
use crate::runtime::Error;

///////////////////////////////
/// Read a list of cell barcodes, one per line; the file may be compressed.
/// A trailing "-1" (as written by Cell Ranger) is removed. Blank lines and repeats are skipped.
/// Barcodes are returned in file order
pub fn read_cell_list_file(path: &Path) -> Result<Vec<CellBarcode>, Error> {
    let file = File::open(path).map_err(|_| Error::file_not_found(path))?;
    let (reader, _compression) = niffler::get_reader(Box::new(file))
        .map_err(|e| Error::file_not_valid(path, Some(e.to_string())))?;

    let mut seen = Whitelist::default();
    let mut list: Vec<CellBarcode> = Vec::new();
    for line in BufReader::new(reader).lines() {
        let line = line?;
        let bc = line.trim();
        let bc = bc.strip_suffix("-1").unwrap_or(bc);
        if bc.is_empty() {
            continue;
        }
        let bc = bc.as_bytes().to_vec();
        if seen.insert(bc.clone()) {
            list.push(bc);
        } else {
            warn!("Barcode {} is listed more than once", line.trim());
        }
    }

    info!("Read {} cell barcodes from {}", list.len(), path.display());
    Ok(list)
}

pub fn whitelist_from_list(list: &[CellBarcode]) -> Whitelist {
    list.iter().cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_and_cleans_barcodes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cells.txt");
        let mut f = File::create(&path).unwrap();
        write!(f, "AAAA-1\n\n  CCCC \nGGGG\nAAAA\n").unwrap();
        drop(f);

        let list = read_cell_list_file(&path).unwrap();
        assert_eq!(list, vec![b"AAAA".to_vec(), b"CCCC".to_vec(), b"GGGG".to_vec()]);

        let whitelist = whitelist_from_list(&list);
        assert!(whitelist.contains(&b"CCCC".to_vec()));
        assert_eq!(whitelist.len(), 3);
    }

    #[test]
    fn gzipped_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cells.txt.gz");
        let mut enc = flate2::write::GzEncoder::new(
            File::create(&path).unwrap(),
            flate2::Compression::default(),
        );
        enc.write_all(b"ACGT\nTTTT\n").unwrap();
        enc.finish().unwrap();

        assert_eq!(read_cell_list_file(&path).unwrap().len(), 2);
    }
}
