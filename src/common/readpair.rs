///////////////////////////////
/// Sequences of one read pair, borrowed from the FASTQ readers
#[derive(Debug, Clone, Copy)]
pub struct ReadPair<'a> {
    pub r1: &'a [u8],
    pub r2: &'a [u8],
}

impl<'a> ReadPair<'a> {
    pub fn new(r1: &'a [u8], r2: &'a [u8]) -> ReadPair<'a> {
        ReadPair { r1, r2 }
    }
}

impl<'a> std::fmt::Display for ReadPair<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "({}, {})",
            String::from_utf8_lossy(self.r1),
            String::from_utf8_lossy(self.r2)
        )
    }
}
