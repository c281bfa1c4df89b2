use std::fs::File;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use seq_io::fastq::Reader as FastqReader;
use seq_io::fastq::Record as FastqRecord;

use crate::common::ReadPair;
use crate::runtime::Error;

pub type FastqFileReader = FastqReader<Box<dyn std::io::Read>>;

const FASTQ_EXTENSIONS: [&str; 4] = ["fastq", "fq", "fastq.gz", "fq.gz"];

///////////////////////////////
/// A contiguous range of records, counted from the start of the file
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordRange {
    pub first: u64,
    pub count: u64,
}

///////////////////////////////
/// Open a FASTQ file, plain or compressed
pub fn open_fastq(path: &Path) -> Result<FastqFileReader, Error> {
    let file = File::open(path).map_err(|_| Error::file_not_found(path))?;
    let (reader, compression) = niffler::get_reader(Box::new(file))
        .map_err(|e| Error::file_not_valid(path, Some(e.to_string())))?;

    debug!(
        "Opened file {} with compression {:?}",
        path.display(),
        compression
    );
    Ok(FastqReader::new(reader))
}

///////////////////////////////
/// Check that a file looks like FASTQ and can be opened
pub fn verify_input_fq_file(path: &Path) -> Result<(), Error> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if !FASTQ_EXTENSIONS.iter().any(|ext| name.ends_with(&format!(".{}", ext))) {
        return Err(Error::file_not_valid(
            path,
            Some("input file must be a FASTQ file (.fastq, .fq, optionally .gz)"),
        ));
    }

    let file = File::open(path).map_err(|_| Error::file_not_found(path))?;
    if file.metadata()?.len() == 0 {
        warn!("Input file {} is empty", path.display());
    }
    Ok(())
}

fn fastq_error(path: &Path, record: u64, e: seq_io::fastq::Error) -> Error {
    Error::parse_error(
        format!("FASTQ record {} of {}", record, path.display()),
        Some(e.to_string()),
    )
}

///////////////////////////////
/// Number of records in a FASTQ file
pub fn count_records(path: &Path) -> Result<u64, Error> {
    let mut reader = open_fastq(path)?;
    let mut n: u64 = 0;
    while let Some(rec) = reader.next() {
        rec.map_err(|e| fastq_error(path, n, e))?;
        n += 1;
    }
    debug!("Found {} records in {}", n, path.display());
    Ok(n)
}

///////////////////////////////
/// Split records into at most n_chunks contiguous ranges of near-equal size.
/// The ranges cover all records and never overlap; no range is empty
pub fn plan_chunks(n_records: u64, n_chunks: usize) -> Vec<RecordRange> {
    let n_chunks = (n_chunks.max(1) as u64).min(n_records);
    if n_chunks == 0 {
        return Vec::new();
    }

    let base = n_records / n_chunks;
    let extra = n_records % n_chunks;

    let mut ranges = Vec::with_capacity(n_chunks as usize);
    let mut first = 0;
    for i in 0..n_chunks {
        let count = base + if i < extra { 1 } else { 0 };
        ranges.push(RecordRange { first, count });
        first += count;
    }
    ranges
}

///////////////////////////////
/// Reads two FASTQ files in lockstep
pub struct PairedFastqReader {
    path_r1: PathBuf,
    path_r2: PathBuf,
    reader_r1: FastqFileReader,
    reader_r2: FastqFileReader,

    /// Index of the next record
    record: u64,
}
impl PairedFastqReader {
    pub fn open(path_r1: &Path, path_r2: &Path) -> Result<PairedFastqReader, Error> {
        Ok(PairedFastqReader {
            path_r1: path_r1.to_path_buf(),
            path_r2: path_r2.to_path_buf(),
            reader_r1: open_fastq(path_r1)?,
            reader_r2: open_fastq(path_r2)?,
            record: 0,
        })
    }

    ///////////////////////////////
    /// Skip records. Stops quietly at the end of the files
    pub fn skip(&mut self, n: u64) -> Result<u64, Error> {
        self.for_each_pair(n, |_| {})
    }

    ///////////////////////////////
    /// Call f for up to limit read pairs; returns how many were read
    pub fn for_each_pair<F>(&mut self, limit: u64, mut f: F) -> Result<u64, Error>
    where
        F: FnMut(ReadPair),
    {
        let mut n: u64 = 0;
        while n < limit {
            let record = self.record;
            match (self.reader_r1.next(), self.reader_r2.next()) {
                (Some(rec1), Some(rec2)) => {
                    let rec1 = rec1.map_err(|e| fastq_error(&self.path_r1, record, e))?;
                    let rec2 = rec2.map_err(|e| fastq_error(&self.path_r2, record, e))?;
                    f(ReadPair::new(rec1.seq(), rec2.seq()));
                }
                (None, None) => break,
                _ => return Err(Error::UnpairedRead { record }),
            }
            self.record += 1;
            n += 1;
        }
        Ok(n)
    }
}
