mod detect_software;
mod dna;

pub use detect_software::check_gzip;

pub use dna::is_acgt;
pub use dna::reverse_complement;
pub use dna::single_substitutions;
pub use dna::NUCLEOTIDES;
