pub mod cell_list_file;
pub mod count_matrix;
pub mod hist;
pub mod matrix_writer;
pub mod paired_fastq;

pub use cell_list_file::read_cell_list_file;
pub use cell_list_file::whitelist_from_list;

pub use count_matrix::assemble_matrices;
pub use count_matrix::CountMatrices;
pub use count_matrix::CountWidth;

pub use hist::write_no_match_table;
pub use matrix_writer::write_count_matrices;

pub use paired_fastq::count_records;
pub use paired_fastq::open_fastq;
pub use paired_fastq::plan_chunks;
pub use paired_fastq::verify_input_fq_file;
pub use paired_fastq::PairedFastqReader;
pub use paired_fastq::RecordRange;
