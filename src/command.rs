use clap::Subcommand;

pub mod constants;
pub mod count;
pub mod threadcount;

pub use count::{CountCMD, RunSummary, TagCount};
pub use threadcount::determine_thread_counts_1;

///////////////////////////////
/// Possible subcommands to parse
#[derive(Subcommand)]
pub enum Commands {
    /// Count tags per cell from paired FASTQ
    Count(CountCMD),
}
