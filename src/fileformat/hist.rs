use std::path::Path;

use log::info;

use crate::count::NoMatchTable;
use crate::runtime::Error;

///////////////////////////////
/// Write the most common unmatched tag regions as CSV with columns sequence,count
pub fn write_no_match_table(path: &Path, table: &NoMatchTable, top_n: usize) -> Result<(), Error> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| csv_error(path, e))?;
    writer
        .write_record(["sequence", "count"])
        .map_err(|e| csv_error(path, e))?;

    let top = table.most_common(top_n);
    for (seq, cnt) in &top {
        writer
            .write_record([&*String::from_utf8_lossy(seq), cnt.to_string().as_str()])
            .map_err(|e| csv_error(path, e))?;
    }
    writer.flush()?;

    info!(
        "Wrote {} of {} unmatched sequences to {}",
        top.len(),
        table.len(),
        path.display()
    );
    Ok(())
}

fn csv_error(path: &Path, e: csv::Error) -> Error {
    Error::file_not_valid(path, Some(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_sorted_and_limited() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unmapped.csv");
        let mut table = NoMatchTable::new();
        for seq in [&b"GGGG"[..], b"CCCC", b"GGGG", b"AAAA"] {
            table.add(seq);
        }

        write_no_match_table(&path, &table, 2).unwrap();
        let txt = std::fs::read_to_string(&path).unwrap();
        assert_eq!(txt, "sequence,count\nGGGG,2\nAAAA,1\n");
    }
}
