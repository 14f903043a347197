pub mod count_matrix;
pub mod paired_fastq;
pub mod processed_fastq;
mod detect_fileformat;

pub use count_matrix::CountMatrix;

pub use detect_fileformat::DetectedFileformat;
pub use detect_fileformat::detect_fq_format;
pub use detect_fileformat::verify_input_fq_file;

pub use paired_fastq::Decompression;
pub use paired_fastq::PairedFastqReader;
pub use paired_fastq::ReadPairRecord;

pub use processed_fastq::make_processed_readname;
pub use processed_fastq::ProcessedFastqWriter;
