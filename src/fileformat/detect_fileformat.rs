use std::fs::File;
use std::path::Path;

use log::warn;

use crate::runtime::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectedFileformat {
    FASTQ,
    GzipFASTQ,
    Other,
}

pub fn detect_fq_format(p: &Path) -> DetectedFileformat {
    let p_string = match p.file_name() {
        Some(name) => name.to_string_lossy(),
        None => return DetectedFileformat::Other,
    };

    if p_string.ends_with(".fq.gz") | p_string.ends_with(".fastq.gz") {
        DetectedFileformat::GzipFASTQ
    } else if p_string.ends_with(".fq") | p_string.ends_with(".fastq") {
        DetectedFileformat::FASTQ
    } else {
        DetectedFileformat::Other
    }
}

/////// Check that the specified file exists and is a FASTQ file
pub fn verify_input_fq_file(path_in: &Path) -> Result<(), Error> {
    let file = File::open(path_in).map_err(|_| Error::file_not_found(path_in))?;
    let len = file
        .metadata()
        .map_err(|e| Error::file_not_valid(path_in, Some(e.to_string())))?
        .len();
    if len == 0 {
        warn!("Input file {} is empty", path_in.display());
    }

    if detect_fq_format(path_in) == DetectedFileformat::Other {
        return Err(Error::file_not_valid(
            path_in,
            Some("input file must be a FASTQ file (.fq, .fastq, .fq.gz or .fastq.gz)"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_fq_format() {
        assert_eq!(
            detect_fq_format(Path::new("run/R1.fastq.gz")),
            DetectedFileformat::GzipFASTQ
        );
        assert_eq!(detect_fq_format(Path::new("R2.fq")), DetectedFileformat::FASTQ);
        assert_eq!(
            detect_fq_format(Path::new("R2.bam")),
            DetectedFileformat::Other
        );
    }

    #[test]
    fn test_missing_file() {
        let res = verify_input_fq_file(Path::new("does/not/exist.fastq.gz"));
        assert!(matches!(res, Err(Error::FileNotFound { .. })));
    }
}
